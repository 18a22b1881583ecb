//! Star Wars (D6) character sheet data
//!
//! Attributes own skills and skills own specializations. Every value is a pip
//! count, and each level is a modifier on top of its parent, so the value that
//! actually gets rolled for a specialization is the sum of all three.

use serde::{Deserialize, Serialize};

use super::character::SheetError;
use crate::dice::{self, MAX_ROLL_VALUE, PIPS_PER_DIE};
use crate::settings::RoomSettings;

/// Attributes every new sheet starts with.
pub const DEFAULT_ATTRIBUTES: [&str; 6] = [
    "Ügyesség",
    "Tudás",
    "Gépészet",
    "Érzékelés",
    "Erő",
    "Technika",
];

/// A freshly learnt skill is worth one pip.
pub const NEW_SKILL_VALUE: u32 = 1;
/// A new specialization starts one whole die above its skill.
pub const NEW_SPEC_VALUE: u32 = PIPS_PER_DIE;
/// Each active wound condition costs one die.
pub const WOUND_PENALTY: u32 = PIPS_PER_DIE;

pub const MIN_MOVE: u32 = 1;
pub const MAX_MOVE: u32 = 20;
pub const DEFAULT_MOVE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Specialization {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub value: u32,
    #[serde(default)]
    pub specs: Vec<Specialization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: u32,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl Attribute {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn skill(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name == name)
    }

    fn skill_mut(&mut self, name: &str) -> Option<&mut Skill> {
        self.skills.iter_mut().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub range: String,
    /// Free dice text, read with [`dice::parse_dice`] when rolled.
    pub damage: String,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeaponField {
    Name,
    Range,
    Damage,
    Notes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForcePower {
    Control,
    Sense,
    Alter,
}

impl ForcePower {
    pub fn label(&self) -> &'static str {
        match self {
            ForcePower::Control => "Kontrol",
            ForcePower::Sense => "Észlelés",
            ForcePower::Alter => "Változtatás",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Defence {
    Block,
    Dodge,
    Parry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Stunned,
    Wounded,
    Wounded2,
    Incapacitated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveKind {
    Energy,
    Physical,
}

impl SaveKind {
    pub fn label(&self) -> &'static str {
        match self {
            SaveKind::Energy => "Erő dobás energia ellen",
            SaveKind::Physical => "Erő dobás fizikai ellen",
        }
    }
}

/// Free-text fields and their input length limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StarWarsText {
    Name,
    Species,
    Gender,
    Age,
    PlayerName,
    PhysicalDescription,
    Personality,
    ForcePoints,
    DarkSidePoints,
    TotalCharacterPoints,
    SaveAgainstEnergy,
    SaveAgainstPhysical,
    Notes,
    SpecialAbilities,
    Equipment,
}

impl StarWarsText {
    pub fn max_len(&self) -> Option<usize> {
        match self {
            StarWarsText::Name => Some(50),
            StarWarsText::Species | StarWarsText::PlayerName => Some(20),
            StarWarsText::Gender | StarWarsText::Age => Some(5),
            StarWarsText::PhysicalDescription | StarWarsText::Personality => Some(1000),
            StarWarsText::ForcePoints
            | StarWarsText::DarkSidePoints
            | StarWarsText::TotalCharacterPoints
            | StarWarsText::SaveAgainstEnergy
            | StarWarsText::SaveAgainstPhysical => Some(10),
            StarWarsText::Notes | StarWarsText::SpecialAbilities | StarWarsText::Equipment => None,
        }
    }
}

/// Complete Star Wars sheet payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StarWarsData {
    pub name: String,
    pub species: String,
    pub gender: String,
    pub age: String,
    pub player_name: String,
    pub physical_description: String,
    pub personality: String,
    pub profile_image_url: Option<String>,

    pub attributes: Vec<Attribute>,

    pub force_sensitive: bool,
    pub control: u32,
    pub sense: u32,
    pub alter: u32,

    pub block: i32,
    pub dodge: i32,
    pub parry: i32,
    #[serde(rename = "move")]
    pub movement: u32,

    pub weapons: Vec<Weapon>,

    pub force_points: String,
    pub dark_side_points: String,
    pub total_character_points: String,
    pub character_points: u32,

    pub save_against_energy: String,
    pub save_against_physical: String,

    pub stunned: bool,
    pub wounded: bool,
    pub wounded2: bool,
    pub incapacitated: bool,

    pub notes: String,
    pub special_abilities: String,
    pub equipment: String,
}

impl Default for StarWarsData {
    fn default() -> Self {
        Self {
            name: String::new(),
            species: String::new(),
            gender: String::new(),
            age: String::new(),
            player_name: String::new(),
            physical_description: String::new(),
            personality: String::new(),
            profile_image_url: None,
            attributes: DEFAULT_ATTRIBUTES.iter().map(|n| Attribute::new(n)).collect(),
            force_sensitive: false,
            control: 0,
            sense: 0,
            alter: 0,
            block: 0,
            dodge: 0,
            parry: 0,
            movement: DEFAULT_MOVE,
            weapons: Vec::new(),
            force_points: String::new(),
            dark_side_points: String::new(),
            total_character_points: String::new(),
            character_points: 0,
            save_against_energy: String::new(),
            save_against_physical: String::new(),
            stunned: false,
            wounded: false,
            wounded2: false,
            incapacitated: false,
            notes: String::new(),
            special_abilities: String::new(),
            equipment: String::new(),
        }
    }
}

impl StarWarsData {
    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    pub fn skill(&self, attribute: &str, skill: &str) -> Option<&Skill> {
        self.attribute(attribute)?.skill(skill)
    }

    /// Find the attribute owning a skill by skill name alone.
    pub fn find_skill(&self, skill: &str) -> Option<(&Attribute, &Skill)> {
        self.attributes
            .iter()
            .find_map(|a| a.skill(skill).map(|s| (a, s)))
    }

    /// Every skill name on the sheet, in attribute order.
    pub fn skill_names(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .flat_map(|a| a.skills.iter().map(|s| s.name.as_str()))
            .collect()
    }

    fn text_mut(&mut self, field: StarWarsText) -> &mut String {
        match field {
            StarWarsText::Name => &mut self.name,
            StarWarsText::Species => &mut self.species,
            StarWarsText::Gender => &mut self.gender,
            StarWarsText::Age => &mut self.age,
            StarWarsText::PlayerName => &mut self.player_name,
            StarWarsText::PhysicalDescription => &mut self.physical_description,
            StarWarsText::Personality => &mut self.personality,
            StarWarsText::ForcePoints => &mut self.force_points,
            StarWarsText::DarkSidePoints => &mut self.dark_side_points,
            StarWarsText::TotalCharacterPoints => &mut self.total_character_points,
            StarWarsText::SaveAgainstEnergy => &mut self.save_against_energy,
            StarWarsText::SaveAgainstPhysical => &mut self.save_against_physical,
            StarWarsText::Notes => &mut self.notes,
            StarWarsText::SpecialAbilities => &mut self.special_abilities,
            StarWarsText::Equipment => &mut self.equipment,
        }
    }

    pub fn force_power(&self, power: ForcePower) -> u32 {
        match power {
            ForcePower::Control => self.control,
            ForcePower::Sense => self.sense,
            ForcePower::Alter => self.alter,
        }
    }

    pub fn save_text(&self, kind: SaveKind) -> &str {
        match kind {
            SaveKind::Energy => &self.save_against_energy,
            SaveKind::Physical => &self.save_against_physical,
        }
    }

    // ------------------------------------------------------------------------
    // Effective roll values
    // ------------------------------------------------------------------------

    pub fn attribute_value(&self, attribute: &str) -> Option<u32> {
        self.attribute(attribute).map(|a| a.value)
    }

    /// Skill value on top of its attribute.
    pub fn skill_roll_value(&self, attribute: &str, skill: &str) -> Option<u32> {
        let attr = self.attribute(attribute)?;
        attr.skill(skill).map(|s| attr.value.saturating_add(s.value))
    }

    /// Specialization value on top of its skill and attribute.
    pub fn spec_roll_value(&self, attribute: &str, skill: &str, spec: &str) -> Option<u32> {
        let attr = self.attribute(attribute)?;
        let sk = attr.skill(skill)?;
        sk.specs
            .iter()
            .find(|s| s.name == spec)
            .map(|s| attr.value.saturating_add(sk.value).saturating_add(s.value))
    }

    pub fn weapon_damage(&self, index: usize) -> Option<u32> {
        self.weapons
            .get(index)
            .map(|w| dice::parse_dice(&w.damage))
    }

    pub fn save_value(&self, kind: SaveKind) -> u32 {
        dice::parse_dice(self.save_text(kind))
    }

    /// Pips deducted from every roll for the active wound conditions.
    ///
    /// `wounded2` only counts in rooms that enable the second wound level.
    pub fn wound_penalty(&self, room: &RoomSettings) -> u32 {
        let active = [self.stunned, self.wounded, room.wounded2 && self.wounded2];
        active.iter().filter(|a| **a).count() as u32 * WOUND_PENALTY
    }

    pub fn is_hurt(&self, room: &RoomSettings) -> bool {
        self.wound_penalty(room) > 0
    }

    // ------------------------------------------------------------------------
    // Totals shown at the bottom of the sheet
    // ------------------------------------------------------------------------

    pub fn attributes_sum(&self) -> u32 {
        saturating_sum(self.attributes.iter().map(|a| a.value))
    }

    pub fn skills_sum(&self) -> u32 {
        saturating_sum(
            self.attributes
                .iter()
                .flat_map(|a| a.skills.iter())
                .map(|s| s.value),
        )
    }

    pub fn specs_sum(&self) -> u32 {
        saturating_sum(
            self.attributes
                .iter()
                .flat_map(|a| a.skills.iter())
                .flat_map(|s| s.specs.iter())
                .map(|s| s.value),
        )
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    pub fn set_text(&mut self, field: StarWarsText, value: &str) {
        let value = match field.max_len() {
            Some(max) => value.chars().take(max).collect(),
            None => value.to_string(),
        };
        *self.text_mut(field) = value;
    }

    pub fn set_attribute(&mut self, attribute: &str, value: u32) -> bool {
        match self.attribute_mut(attribute) {
            Some(attr) => {
                attr.value = value.min(MAX_ROLL_VALUE);
                true
            }
            None => false,
        }
    }

    /// Set a skill's value; zero forgets the skill along with its
    /// specializations.
    pub fn set_skill(&mut self, attribute: &str, skill: &str, value: u32) -> bool {
        let Some(attr) = self.attribute_mut(attribute) else {
            return false;
        };
        if value == 0 {
            let before = attr.skills.len();
            attr.skills.retain(|s| s.name != skill);
            return attr.skills.len() != before;
        }
        match attr.skill_mut(skill) {
            Some(sk) => {
                sk.value = value.min(MAX_ROLL_VALUE);
                true
            }
            None => false,
        }
    }

    /// Set a specialization's value; zero removes it from its skill.
    pub fn set_spec(&mut self, attribute: &str, skill: &str, spec: &str, value: u32) -> bool {
        let Some(sk) = self
            .attribute_mut(attribute)
            .and_then(|a| a.skill_mut(skill))
        else {
            return false;
        };
        if value == 0 {
            let before = sk.specs.len();
            sk.specs.retain(|s| s.name != spec);
            return sk.specs.len() != before;
        }
        match sk.specs.iter_mut().find(|s| s.name == spec) {
            Some(sp) => {
                sp.value = value.min(MAX_ROLL_VALUE);
                true
            }
            None => false,
        }
    }

    /// Learn a new skill under an attribute. Names already on the sheet are
    /// refused so a skill only lives under one attribute.
    pub fn add_skill(&mut self, attribute: &str, skill: &str) -> bool {
        let skill = skill.trim();
        if skill.is_empty() || self.find_skill(skill).is_some() {
            return false;
        }
        match self.attribute_mut(attribute) {
            Some(attr) => {
                attr.skills.push(Skill {
                    name: skill.to_string(),
                    value: NEW_SKILL_VALUE,
                    specs: Vec::new(),
                });
                true
            }
            None => false,
        }
    }

    pub fn add_spec(&mut self, attribute: &str, skill: &str, spec: &str) -> bool {
        let spec = spec.trim();
        if spec.is_empty() {
            return false;
        }
        let Some(sk) = self
            .attribute_mut(attribute)
            .and_then(|a| a.skill_mut(skill))
        else {
            return false;
        };
        if sk.specs.iter().any(|s| s.name == spec) {
            return false;
        }
        sk.specs.push(Specialization {
            name: spec.to_string(),
            value: NEW_SPEC_VALUE,
        });
        true
    }

    pub fn set_force_power(&mut self, power: ForcePower, value: u32) {
        let value = value.min(MAX_ROLL_VALUE);
        match power {
            ForcePower::Control => self.control = value,
            ForcePower::Sense => self.sense = value,
            ForcePower::Alter => self.alter = value,
        }
    }

    pub fn set_defence(&mut self, defence: Defence, value: i32) {
        match defence {
            Defence::Block => self.block = value,
            Defence::Dodge => self.dodge = value,
            Defence::Parry => self.parry = value,
        }
    }

    pub fn set_move(&mut self, value: i64) {
        self.movement = value.clamp(MIN_MOVE as i64, MAX_MOVE as i64) as u32;
    }

    pub fn add_weapon(&mut self) {
        self.weapons.push(Weapon::default());
    }

    pub fn delete_weapon(&mut self, index: usize) -> bool {
        if index < self.weapons.len() {
            self.weapons.remove(index);
            true
        } else {
            false
        }
    }

    pub fn update_weapon(&mut self, index: usize, field: WeaponField, value: &str) -> bool {
        let Some(weapon) = self.weapons.get_mut(index) else {
            return false;
        };
        let slot = match field {
            WeaponField::Name => &mut weapon.name,
            WeaponField::Range => &mut weapon.range,
            WeaponField::Damage => &mut weapon.damage,
            WeaponField::Notes => &mut weapon.notes,
        };
        *slot = value.chars().take(20).collect();
        true
    }

    pub fn set_character_points(&mut self, value: i64) {
        self.character_points = value.clamp(0, u32::MAX as i64) as u32;
    }

    pub fn adjust_character_points(&mut self, delta: i64) {
        self.set_character_points((self.character_points as i64).saturating_add(delta));
    }

    pub fn set_condition(&mut self, condition: Condition, active: bool) {
        match condition {
            Condition::Stunned => self.stunned = active,
            Condition::Wounded => self.wounded = active,
            Condition::Wounded2 => self.wounded2 = active,
            Condition::Incapacitated => self.incapacitated = active,
        }
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    pub fn validate(&self) -> Result<(), SheetError> {
        for (idx, attr) in self.attributes.iter().enumerate() {
            if attr.name.trim().is_empty() {
                return Err(SheetError::invalid("attribute with an empty name"));
            }
            if self.attributes[..idx].iter().any(|a| a.name == attr.name) {
                return Err(SheetError::invalid(format!(
                    "duplicate attribute '{}'",
                    attr.name
                )));
            }
            for (sidx, skill) in attr.skills.iter().enumerate() {
                if skill.name.trim().is_empty() {
                    return Err(SheetError::invalid(format!(
                        "skill with an empty name under '{}'",
                        attr.name
                    )));
                }
                if attr.skills[..sidx].iter().any(|s| s.name == skill.name) {
                    return Err(SheetError::invalid(format!(
                        "duplicate skill '{}' under '{}'",
                        skill.name, attr.name
                    )));
                }
                if skill.specs.iter().any(|s| s.name.trim().is_empty()) {
                    return Err(SheetError::invalid(format!(
                        "specialization with an empty name under '{}'",
                        skill.name
                    )));
                }
                check_pips(&skill.name, skill.value)?;
                for spec in &skill.specs {
                    check_pips(&spec.name, spec.value)?;
                }
            }
            check_pips(&attr.name, attr.value)?;
        }

        for power in [ForcePower::Control, ForcePower::Sense, ForcePower::Alter] {
            check_pips(power.label(), self.force_power(power))?;
        }

        if !(MIN_MOVE..=MAX_MOVE).contains(&self.movement) {
            return Err(SheetError::invalid(format!(
                "move {} outside {}..={}",
                self.movement, MIN_MOVE, MAX_MOVE
            )));
        }

        Ok(())
    }
}

fn saturating_sum(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0, u32::saturating_add)
}

fn check_pips(name: &str, value: u32) -> Result<(), SheetError> {
    if value > MAX_ROLL_VALUE {
        return Err(SheetError::invalid(format!(
            "'{}' is {}, above {}",
            name,
            value,
            dice::format(MAX_ROLL_VALUE)
        )));
    }
    Ok(())
}
