//! D6 pip-code dice engine
//!
//! Every rollable value on a Star Wars sheet is a *pip count*: three pips make
//! one die, so `7` reads as `2D+1`. This module converts between pip counts and
//! their printed form, parses the loose dice text players type into weapon and
//! save fields, and rolls the dice.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pips that make up one whole die.
pub const PIPS_PER_DIE: u32 = 3;

/// Smallest value that still contains a whole die.
pub const MIN_ROLL_VALUE: u32 = PIPS_PER_DIE;

/// Most whole dice a single code may hold.
pub const MAX_DICE: u32 = 99;

/// Largest pip count the engine reads, stores or rolls (`99D+2`).
pub const MAX_ROLL_VALUE: u32 = MAX_DICE * PIPS_PER_DIE + (PIPS_PER_DIE - 1);

/// Faces on every die the system uses.
pub const DIE_FACES: u32 = 6;

// ============================================================================
// Dice Codes
// ============================================================================

/// Error when strictly parsing a printed dice code such as `2D+1`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceCodeError {
    #[error("Empty dice code")]
    Empty,
    #[error("Invalid dice code: {0}")]
    InvalidFormat(String),
    #[error("Pip suffix must be +1 or +2, got +{0}")]
    InvalidPips(u32),
    #[error("Too many dice: {0}D (at most 99D)")]
    TooManyDice(u32),
}

/// A pip count with its canonical `<dice>D<+pips>` rendering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DiceCode(pub u32);

impl DiceCode {
    pub fn from_dice(dice: u32, pips: u32) -> Self {
        Self(dice.saturating_mul(PIPS_PER_DIE).saturating_add(pips))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Whole dice in this code.
    pub fn dice(self) -> u32 {
        self.0 / PIPS_PER_DIE
    }

    /// Leftover pips, always `0..=2`.
    pub fn pips(self) -> u32 {
        self.0 % PIPS_PER_DIE
    }

    pub fn is_rollable(self) -> bool {
        self.0 >= MIN_ROLL_VALUE
    }
}

impl fmt::Display for DiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pips() {
            0 => write!(f, "{}D", self.dice()),
            pips => write!(f, "{}D+{}", self.dice(), pips),
        }
    }
}

impl FromStr for DiceCode {
    type Err = DiceCodeError;

    /// Strict inverse of [`format`]: accepts `XD`, `XD+1` and `XD+2` only
    /// (the `D` may be lowercase).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DiceCodeError::Empty);
        }

        let d_pos = s
            .find(|c: char| c == 'D' || c == 'd')
            .ok_or_else(|| DiceCodeError::InvalidFormat(format!("Missing 'D' in '{}'", s)))?;

        let count_str = &s[..d_pos];
        if count_str.is_empty() || !count_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DiceCodeError::InvalidFormat(format!(
                "Invalid dice count: '{}'",
                count_str
            )));
        }
        let dice: u32 = count_str.parse().map_err(|_| {
            DiceCodeError::InvalidFormat(format!("Dice count out of range: '{}'", count_str))
        })?;
        if dice > MAX_DICE {
            return Err(DiceCodeError::TooManyDice(dice));
        }

        let after_d = &s[d_pos + 1..];
        let pips = if after_d.is_empty() {
            0
        } else {
            let pip_str = after_d.strip_prefix('+').ok_or_else(|| {
                DiceCodeError::InvalidFormat(format!("Unexpected suffix: '{}'", after_d))
            })?;
            let pips: u32 = pip_str.parse().map_err(|_| {
                DiceCodeError::InvalidFormat(format!("Invalid pips: '+{}'", pip_str))
            })?;
            if !(1..PIPS_PER_DIE).contains(&pips) {
                return Err(DiceCodeError::InvalidPips(pips));
            }
            pips
        };

        Ok(Self::from_dice(dice, pips))
    }
}

/// Render a pip count as `<dice>D`, `<dice>D+1` or `<dice>D+2`.
pub fn format(value: u32) -> String {
    DiceCode(value).to_string()
}

/// Leniently read dice text typed into a free-form field.
///
/// Grammar: optional decoration (whitespace, brackets, symbols), a die count,
/// an optional die letter (`D` or the Hungarian `k` for *kocka*) optionally
/// followed by a die size, then an optional `+<pips>` suffix. The die size is
/// ignored since every die is a d6. Returns the pip count, capped at
/// [`MAX_ROLL_VALUE`], or `0` when no leading count is found.
///
/// ```
/// use sheetrolls::dice::parse_dice;
/// assert_eq!(parse_dice("2k6+1"), 7);
/// assert_eq!(parse_dice("(4D)"), 12);
/// assert_eq!(parse_dice("abc"), 0);
/// ```
pub fn parse_dice(text: &str) -> u32 {
    let rest = text.trim_start_matches(|c: char| !c.is_alphanumeric());
    let Some((count, rest)) = take_number(rest) else {
        return 0;
    };

    let rest = rest.trim_start();
    let rest = match rest.chars().next() {
        Some('D' | 'd' | 'K' | 'k') => rest[1..].trim_start_matches(|c: char| c.is_ascii_digit()),
        _ => rest,
    };

    let pips = rest
        .trim_start()
        .strip_prefix('+')
        .and_then(|p| take_number(p.trim_start()))
        .map(|(pips, _)| pips)
        .unwrap_or(0);

    count
        .saturating_mul(PIPS_PER_DIE)
        .saturating_add(pips)
        .min(MAX_ROLL_VALUE)
}

fn take_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    s[..end].parse().ok().map(|n| (n, &s[end..]))
}

/// Pip count rolled by a number-row hotkey: `1`..`9` roll that many dice and
/// `0` rolls ten.
pub fn hotkey_value(key: char) -> Option<u32> {
    let dice = match key {
        '0' => 10,
        '1'..='9' => key.to_digit(10)?,
        _ => return None,
    };
    Some(dice * PIPS_PER_DIE)
}

// ============================================================================
// Rolling
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DieKind {
    /// A whole d6.
    Full,
    /// The fractional die standing in for leftover pips.
    Partial { pips: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolledDie {
    pub kind: DieKind,
    pub face: u32,
}

impl RolledDie {
    pub fn is_full(&self) -> bool {
        self.kind == DieKind::Full
    }
}

/// Outcome of a single roll. Transient, never persisted with the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub label: String,
    /// Pip count that was rolled.
    pub value: u32,
    /// Faces in roll order: whole dice first, then the partial die if any.
    pub dice: Vec<RolledDie>,
    pub total: u32,
}

impl RollResult {
    fn empty(label: &str, value: u32) -> Self {
        Self {
            label: label.to_string(),
            value,
            dice: Vec::new(),
            total: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn faces(&self) -> Vec<u32> {
        self.dice.iter().map(|d| d.face).collect()
    }

    pub fn full_dice(&self) -> impl Iterator<Item = &RolledDie> {
        self.dice.iter().filter(|d| d.is_full())
    }

    pub fn partial_die(&self) -> Option<&RolledDie> {
        self.dice.iter().find(|d| !d.is_full())
    }

    /// Headline such as `Atlétika: 4D`.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.label, format(self.value))
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, die) in self.dice.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            match die.kind {
                DieKind::Full => write!(f, "[{}]", die.face)?,
                DieKind::Partial { .. } => write!(f, "({})", die.face)?,
            }
        }
        write!(f, " = {}", self.total)
    }
}

/// Roll a pip count with the thread-local generator.
///
/// Values below [`MIN_ROLL_VALUE`] roll nothing and return an empty result;
/// callers are expected to reject them before getting here.
pub fn roll(value: u32, label: &str) -> RollResult {
    roll_with(&mut rand::thread_rng(), value, label)
}

/// Roll a pip count with a caller-supplied generator.
///
/// Counts above [`MAX_ROLL_VALUE`] are rolled as `MAX_ROLL_VALUE`.
pub fn roll_with<R: Rng + ?Sized>(rng: &mut R, value: u32, label: &str) -> RollResult {
    let value = value.min(MAX_ROLL_VALUE);
    let code = DiceCode(value);
    if !code.is_rollable() {
        return RollResult::empty(label, value);
    }

    let mut dice = Vec::with_capacity(code.dice() as usize + 1);
    for _ in 0..code.dice() {
        dice.push(RolledDie {
            kind: DieKind::Full,
            face: rng.gen_range(1..=DIE_FACES),
        });
    }

    match code.pips() {
        0 => {}
        pips => dice.push(RolledDie {
            kind: DieKind::Partial { pips },
            face: partial_face(rng, pips),
        }),
    }

    let total = dice.iter().map(|d| d.face).sum();
    RollResult {
        label: label.to_string(),
        value,
        dice,
        total,
    }
}

/// One pip is a d3 (1..=3), two pips a d3+1 (2..=4). Both stay below a
/// full die's spread.
fn partial_face<R: Rng + ?Sized>(rng: &mut R, pips: u32) -> u32 {
    rng.gen_range(1..=DIE_FACES / 2) + (pips - 1)
}
