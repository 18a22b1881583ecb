//! Generic fantasy character sheet data
//!
//! Small-number attributes (0..=3), toggled skills and abilities, and an armor
//! total derived from armor type, shield and the "Kemény" ability.

use serde::{Deserialize, Serialize};

use super::character::SheetError;

/// Ability that adds one point of armor while held.
pub const TOUGH_ABILITY: &str = "Kemény";

pub const MAX_ATTRIBUTE: u8 = 3;
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 10;
pub const MAX_SUM_ARMOR: u8 = 10;
pub const MAX_HP_DICE: u8 = 10;
pub const MAX_HP: u8 = 50;

/// Skills granted when a class is chosen.
pub fn class_skills(class: &str) -> &'static [&'static str] {
    match class {
        "Harcos" => &["Atlétika"],
        "Tolvaj" => &["Lopakodás"],
        "Pap" => &["Rejtélyfejtés", "Gyógyítás"],
        "Varázsló" => &["Mágiaismeret"],
        "Kósza" => &["Túlélés"],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArmorType {
    #[default]
    #[serde(rename = "Nincs")]
    None,
    #[serde(rename = "Könnyű")]
    Light,
    #[serde(rename = "Teljes")]
    Full,
}

impl ArmorType {
    /// Armor points the type is worth.
    pub fn points(&self) -> u8 {
        match self {
            ArmorType::None => 0,
            ArmorType::Light => 1,
            ArmorType::Full => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArmorType::None => "Nincs",
            ArmorType::Light => "Könnyű",
            ArmorType::Full => "Teljes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FantasyAttribute {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl FantasyAttribute {
    pub const ALL: [FantasyAttribute; 6] = [
        FantasyAttribute::Strength,
        FantasyAttribute::Dexterity,
        FantasyAttribute::Constitution,
        FantasyAttribute::Intelligence,
        FantasyAttribute::Wisdom,
        FantasyAttribute::Charisma,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FantasyAttribute::Strength => "Erő",
            FantasyAttribute::Dexterity => "Ügyesség",
            FantasyAttribute::Constitution => "Egészség",
            FantasyAttribute::Intelligence => "Intelligencia",
            FantasyAttribute::Wisdom => "Bölcsesség",
            FantasyAttribute::Charisma => "Karizma",
        }
    }
}

/// Character ability scores
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FantasyAttributes {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl FantasyAttributes {
    pub fn get(&self, attribute: FantasyAttribute) -> u8 {
        match attribute {
            FantasyAttribute::Strength => self.strength,
            FantasyAttribute::Dexterity => self.dexterity,
            FantasyAttribute::Constitution => self.constitution,
            FantasyAttribute::Intelligence => self.intelligence,
            FantasyAttribute::Wisdom => self.wisdom,
            FantasyAttribute::Charisma => self.charisma,
        }
    }

    fn get_mut(&mut self, attribute: FantasyAttribute) -> &mut u8 {
        match attribute {
            FantasyAttribute::Strength => &mut self.strength,
            FantasyAttribute::Dexterity => &mut self.dexterity,
            FantasyAttribute::Constitution => &mut self.constitution,
            FantasyAttribute::Intelligence => &mut self.intelligence,
            FantasyAttribute::Wisdom => &mut self.wisdom,
            FantasyAttribute::Charisma => &mut self.charisma,
        }
    }

    /// Get all attributes as a vec of (label, score) tuples
    pub fn as_vec(&self) -> Vec<(&'static str, u8)> {
        FantasyAttribute::ALL
            .iter()
            .map(|a| (a.label(), self.get(*a)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FantasyText {
    Name,
    PlayerName,
    Weapons,
    Gear,
    NotesLeft,
    NotesRight,
    Money,
}

impl FantasyText {
    pub fn max_len(&self) -> usize {
        match self {
            FantasyText::Name | FantasyText::PlayerName | FantasyText::Money => 50,
            FantasyText::Weapons
            | FantasyText::Gear
            | FantasyText::NotesLeft
            | FantasyText::NotesRight => 1000,
        }
    }
}

/// Complete fantasy sheet payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FantasyData {
    pub name: String,
    pub class: String,
    pub player_name: String,
    pub level: u8,
    pub attributes: FantasyAttributes,
    pub skills: Vec<String>,
    pub abilities: Vec<String>,
    pub weapons: String,
    pub gear: String,
    pub armor: ArmorType,
    pub shield: bool,
    pub sum_armor: u8,
    pub hp_dice: u8,
    pub hp: u8,
    pub notes_left: String,
    pub notes_right: String,
    pub money: String,
    pub next_level: i32,
    pub xp: i32,
}

impl Default for FantasyData {
    fn default() -> Self {
        Self {
            name: String::new(),
            class: String::new(),
            player_name: String::new(),
            level: MIN_LEVEL,
            attributes: FantasyAttributes::default(),
            skills: Vec::new(),
            abilities: Vec::new(),
            weapons: String::new(),
            gear: String::new(),
            armor: ArmorType::None,
            shield: false,
            sum_armor: 0,
            hp_dice: 1,
            hp: 0,
            notes_left: String::new(),
            notes_right: String::new(),
            money: String::new(),
            next_level: 0,
            xp: 0,
        }
    }
}

fn clamp_u8(value: i64, min: u8, max: u8) -> u8 {
    value.clamp(min as i64, max as i64) as u8
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl FantasyData {
    pub fn set_text(&mut self, field: FantasyText, value: &str) {
        let value: String = value.chars().take(field.max_len()).collect();
        let slot = match field {
            FantasyText::Name => &mut self.name,
            FantasyText::PlayerName => &mut self.player_name,
            FantasyText::Weapons => &mut self.weapons,
            FantasyText::Gear => &mut self.gear,
            FantasyText::NotesLeft => &mut self.notes_left,
            FantasyText::NotesRight => &mut self.notes_right,
            FantasyText::Money => &mut self.money,
        };
        *slot = value;
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    pub fn has_ability(&self, ability: &str) -> bool {
        self.abilities.iter().any(|a| a == ability)
    }

    /// Armor total implied by armor type, shield and abilities.
    pub fn derived_armor(&self) -> u8 {
        let tough = u8::from(self.has_ability(TOUGH_ABILITY));
        self.armor.points() + u8::from(self.shield) + tough
    }

    pub fn set_attribute(&mut self, attribute: FantasyAttribute, value: i64) {
        *self.attributes.get_mut(attribute) = clamp_u8(value, 0, MAX_ATTRIBUTE);
    }

    pub fn toggle_skill(&mut self, skill: &str) {
        if self.has_skill(skill) {
            self.skills.retain(|s| s != skill);
        } else {
            self.skills.push(skill.to_string());
        }
    }

    /// Toggle an ability. The tough ability nudges the armor total by one
    /// point so a hand-edited total is kept.
    pub fn toggle_ability(&mut self, ability: &str) {
        let gaining = !self.has_ability(ability);
        if ability == TOUGH_ABILITY {
            self.sum_armor = if gaining {
                self.sum_armor.saturating_add(1).min(MAX_SUM_ARMOR)
            } else {
                self.sum_armor.saturating_sub(1)
            };
        }
        if gaining {
            self.abilities.push(ability.to_string());
        } else {
            self.abilities.retain(|a| a != ability);
        }
    }

    pub fn set_armor(&mut self, armor: ArmorType) {
        self.armor = armor;
        self.sum_armor = self.derived_armor();
    }

    pub fn set_shield(&mut self, shield: bool) {
        self.shield = shield;
        self.sum_armor = self.derived_armor();
    }

    /// Pick a class and learn its class skills if they are missing.
    pub fn set_class(&mut self, class: &str) {
        for skill in class_skills(class) {
            if !self.has_skill(skill) {
                self.skills.push(skill.to_string());
            }
        }
        self.class = class.to_string();
    }

    pub fn set_level(&mut self, level: i64) {
        self.level = clamp_u8(level, MIN_LEVEL, MAX_LEVEL);
    }

    pub fn set_sum_armor(&mut self, value: i64) {
        self.sum_armor = clamp_u8(value, 0, MAX_SUM_ARMOR);
    }

    pub fn set_hp_dice(&mut self, value: i64) {
        self.hp_dice = clamp_u8(value, 1, MAX_HP_DICE);
    }

    pub fn set_hp(&mut self, value: i64) {
        self.hp = clamp_u8(value, 0, MAX_HP);
    }

    pub fn set_next_level(&mut self, value: i64) {
        self.next_level = clamp_i32(value);
    }

    pub fn set_xp(&mut self, value: i64) {
        self.xp = clamp_i32(value);
    }

    pub fn validate(&self) -> Result<(), SheetError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            return Err(SheetError::invalid(format!(
                "level {} outside {}..={}",
                self.level, MIN_LEVEL, MAX_LEVEL
            )));
        }
        if let Some((label, score)) = self
            .attributes
            .as_vec()
            .into_iter()
            .find(|(_, score)| *score > MAX_ATTRIBUTE)
        {
            return Err(SheetError::invalid(format!(
                "attribute {} = {} exceeds {}",
                label, score, MAX_ATTRIBUTE
            )));
        }
        if self.sum_armor > MAX_SUM_ARMOR {
            return Err(SheetError::invalid(format!(
                "armor total {} exceeds {}",
                self.sum_armor, MAX_SUM_ARMOR
            )));
        }
        if self.hp_dice > MAX_HP_DICE || self.hp > MAX_HP {
            return Err(SheetError::invalid("hit points out of range"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_is_clamped() {
        let mut data = FantasyData::default();
        data.set_attribute(FantasyAttribute::Strength, 7);
        data.set_attribute(FantasyAttribute::Wisdom, -2);
        assert_eq!(data.attributes.strength, MAX_ATTRIBUTE);
        assert_eq!(data.attributes.wisdom, 0);
    }

    #[test]
    fn test_armor_type_and_shield_recompute_total() {
        let mut data = FantasyData::default();
        data.set_armor(ArmorType::Full);
        assert_eq!(data.sum_armor, 2);
        data.set_shield(true);
        assert_eq!(data.sum_armor, 3);
        data.set_armor(ArmorType::Light);
        assert_eq!(data.sum_armor, 2);
    }

    #[test]
    fn test_tough_ability_adjusts_manual_total() {
        let mut data = FantasyData::default();
        data.set_sum_armor(5);
        data.toggle_ability(TOUGH_ABILITY);
        assert_eq!(data.sum_armor, 6);
        data.toggle_ability(TOUGH_ABILITY);
        assert_eq!(data.sum_armor, 5);
        assert!(!data.has_ability(TOUGH_ABILITY));
    }

    #[test]
    fn test_tough_counts_in_derived_armor() {
        let mut data = FantasyData::default();
        data.toggle_ability(TOUGH_ABILITY);
        data.set_shield(true);
        assert_eq!(data.sum_armor, 2);
    }

    #[test]
    fn test_class_adds_missing_skills_once() {
        let mut data = FantasyData::default();
        data.toggle_skill("Gyógyítás");
        data.set_class("Pap");
        assert_eq!(data.class, "Pap");
        assert_eq!(data.skills, vec!["Gyógyítás", "Rejtélyfejtés"]);
    }

    #[test]
    fn test_custom_class_grants_nothing() {
        let mut data = FantasyData::default();
        data.set_class("Egyedi");
        assert!(data.skills.is_empty());
    }

    #[test]
    fn test_xp_and_next_level_clamp_to_i32() {
        let mut data = FantasyData::default();
        data.set_xp(i64::MAX);
        data.set_next_level(i64::MIN);
        assert_eq!(data.xp, i32::MAX);
        assert_eq!(data.next_level, i32::MIN);
        data.set_xp(1200);
        assert_eq!(data.xp, 1200);
    }

    #[test]
    fn test_level_clamped_and_validated() {
        let mut data = FantasyData::default();
        data.set_level(42);
        assert_eq!(data.level, MAX_LEVEL);
        assert!(data.validate().is_ok());
        data.level = 0;
        assert!(data.validate().is_err());
    }
}
