//! Tests for pip-code dice parsing, formatting and rolling

use rand::rngs::StdRng;
use rand::SeedableRng;
use sheetrolls::dice::{self, DiceCode, DiceCodeError, DieKind, MIN_ROLL_VALUE};

#[test]
fn test_format_values() {
    assert_eq!(dice::format(0), "0D");
    assert_eq!(dice::format(3), "1D");
    assert_eq!(dice::format(7), "2D+1");
    assert_eq!(dice::format(8), "2D+2");
    assert_eq!(dice::format(30), "10D");
}

#[test]
fn test_format_is_inverted_by_both_parsers() {
    for value in 0..=60 {
        let text = dice::format(value);
        assert_eq!(text.parse::<DiceCode>(), Ok(DiceCode(value)), "{}", text);
        assert_eq!(dice::parse_dice(&text), value, "{}", text);
    }
}

#[test]
fn test_parse_dice_lenient_forms() {
    assert_eq!(dice::parse_dice("2k6+1"), 7);
    assert_eq!(dice::parse_dice("3D"), 9);
    assert_eq!(dice::parse_dice("3d"), 9);
    assert_eq!(dice::parse_dice("4K+2"), 14);
    assert_eq!(dice::parse_dice("  5 "), 15);
    assert_eq!(dice::parse_dice("[2D+1]"), 7);
    assert_eq!(dice::parse_dice("2D + 2"), 8);
}

#[test]
fn test_parse_dice_malformed_is_zero() {
    assert_eq!(dice::parse_dice(""), 0);
    assert_eq!(dice::parse_dice("abc"), 0);
    assert_eq!(dice::parse_dice("D6"), 0);
}

#[test]
fn test_strict_parse_rejects_loose_text() {
    assert_eq!("".parse::<DiceCode>(), Err(DiceCodeError::Empty));
    assert!(matches!(
        "2k6".parse::<DiceCode>(),
        Err(DiceCodeError::InvalidFormat(_))
    ));
    assert_eq!("2D+3".parse::<DiceCode>(), Err(DiceCodeError::InvalidPips(3)));
}

#[test]
fn test_roll_shape_follows_value() {
    let mut rng = StdRng::seed_from_u64(42);
    for value in MIN_ROLL_VALUE..=40 {
        let result = dice::roll_with(&mut rng, value, "Próba");
        let full = result.full_dice().count() as u32;
        assert_eq!(full, value / 3);
        assert!(result.full_dice().all(|d| (1..=6).contains(&d.face)));

        match value % 3 {
            0 => assert!(result.partial_die().is_none()),
            1 => {
                let die = result.partial_die().unwrap();
                assert_eq!(die.kind, DieKind::Partial { pips: 1 });
                assert!((1..=3).contains(&die.face));
            }
            _ => {
                let die = result.partial_die().unwrap();
                assert_eq!(die.kind, DieKind::Partial { pips: 2 });
                assert!((2..=4).contains(&die.face));
            }
        }

        assert_eq!(result.total, result.faces().iter().sum::<u32>());
    }
}

#[test]
fn test_roll_below_one_die_is_empty() {
    for value in 0..MIN_ROLL_VALUE {
        let result = dice::roll(value, "Semmi");
        assert!(result.is_empty());
        assert_eq!(result.total, 0);
    }
}

#[test]
fn test_roll_summary_uses_label_and_code() {
    let result = dice::roll(7, "Atlétika");
    assert_eq!(result.summary(), "Atlétika: 2D+1");
    assert!(result.to_string().ends_with(&format!("= {}", result.total)));
}

#[test]
fn test_hotkeys() {
    assert_eq!(dice::hotkey_value('1'), Some(3));
    assert_eq!(dice::hotkey_value('9'), Some(27));
    assert_eq!(dice::hotkey_value('0'), Some(30));
    assert_eq!(dice::hotkey_value('x'), None);
}
