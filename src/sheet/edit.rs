//! Sheet edits
//!
//! Every user change is an edit value. [`SheetData::apply`] never touches the
//! state it is given: it returns the next state, or `None` when the edit does
//! not change anything (unknown skill, wrong system, same value).

use serde::{Deserialize, Serialize};

use super::character::SheetData;
use super::fantasy::{ArmorType, FantasyAttribute, FantasyData, FantasyText};
use super::star_wars::{
    Condition, Defence, ForcePower, StarWarsData, StarWarsText, WeaponField,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StarWarsEdit {
    SetText {
        field: StarWarsText,
        value: String,
    },
    SetProfileImage(Option<String>),
    SetAttribute {
        attribute: String,
        value: u32,
    },
    SetSkill {
        attribute: String,
        skill: String,
        value: u32,
    },
    SetSpec {
        attribute: String,
        skill: String,
        spec: String,
        value: u32,
    },
    AddSkill {
        attribute: String,
        skill: String,
    },
    AddSpec {
        attribute: String,
        skill: String,
        spec: String,
    },
    SetForceSensitive(bool),
    SetForcePower {
        power: ForcePower,
        value: u32,
    },
    SetDefence {
        defence: Defence,
        value: i32,
    },
    SetMove(i64),
    AddWeapon,
    DeleteWeapon(usize),
    UpdateWeapon {
        index: usize,
        field: WeaponField,
        value: String,
    },
    SetCharacterPoints(i64),
    AdjustCharacterPoints(i64),
    SetCondition {
        condition: Condition,
        active: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FantasyEdit {
    SetText { field: FantasyText, value: String },
    SetAttribute { attribute: FantasyAttribute, value: i64 },
    ToggleSkill(String),
    ToggleAbility(String),
    SetArmor(ArmorType),
    SetShield(bool),
    SetClass(String),
    SetLevel(i64),
    SetSumArmor(i64),
    SetHpDice(i64),
    SetHp(i64),
    SetNextLevel(i64),
    SetXp(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetEdit {
    StarWars(StarWarsEdit),
    Fantasy(FantasyEdit),
}

impl From<StarWarsEdit> for SheetEdit {
    fn from(edit: StarWarsEdit) -> Self {
        SheetEdit::StarWars(edit)
    }
}

impl From<FantasyEdit> for SheetEdit {
    fn from(edit: FantasyEdit) -> Self {
        SheetEdit::Fantasy(edit)
    }
}

impl SheetData {
    /// Apply an edit, returning the next state if anything changed.
    pub fn apply(&self, edit: &SheetEdit) -> Option<SheetData> {
        let mut next = self.clone();
        match (&mut next, edit) {
            (SheetData::StarWars(data), SheetEdit::StarWars(edit)) => apply_star_wars(data, edit),
            (SheetData::Fantasy(data), SheetEdit::Fantasy(edit)) => apply_fantasy(data, edit),
            _ => return None,
        }
        (next != *self).then_some(next)
    }
}

fn apply_star_wars(data: &mut StarWarsData, edit: &StarWarsEdit) {
    match edit {
        StarWarsEdit::SetText { field, value } => data.set_text(*field, value),
        StarWarsEdit::SetProfileImage(url) => data.profile_image_url = url.clone(),
        StarWarsEdit::SetAttribute { attribute, value } => {
            data.set_attribute(attribute, *value);
        }
        StarWarsEdit::SetSkill {
            attribute,
            skill,
            value,
        } => {
            data.set_skill(attribute, skill, *value);
        }
        StarWarsEdit::SetSpec {
            attribute,
            skill,
            spec,
            value,
        } => {
            data.set_spec(attribute, skill, spec, *value);
        }
        StarWarsEdit::AddSkill { attribute, skill } => {
            data.add_skill(attribute, skill);
        }
        StarWarsEdit::AddSpec {
            attribute,
            skill,
            spec,
        } => {
            data.add_spec(attribute, skill, spec);
        }
        StarWarsEdit::SetForceSensitive(sensitive) => data.force_sensitive = *sensitive,
        StarWarsEdit::SetForcePower { power, value } => data.set_force_power(*power, *value),
        StarWarsEdit::SetDefence { defence, value } => data.set_defence(*defence, *value),
        StarWarsEdit::SetMove(value) => data.set_move(*value),
        StarWarsEdit::AddWeapon => data.add_weapon(),
        StarWarsEdit::DeleteWeapon(index) => {
            data.delete_weapon(*index);
        }
        StarWarsEdit::UpdateWeapon {
            index,
            field,
            value,
        } => {
            data.update_weapon(*index, *field, value);
        }
        StarWarsEdit::SetCharacterPoints(value) => data.set_character_points(*value),
        StarWarsEdit::AdjustCharacterPoints(delta) => data.adjust_character_points(*delta),
        StarWarsEdit::SetCondition { condition, active } => {
            data.set_condition(*condition, *active)
        }
    }
}

fn apply_fantasy(data: &mut FantasyData, edit: &FantasyEdit) {
    match edit {
        FantasyEdit::SetText { field, value } => data.set_text(*field, value),
        FantasyEdit::SetAttribute { attribute, value } => data.set_attribute(*attribute, *value),
        FantasyEdit::ToggleSkill(skill) => data.toggle_skill(skill),
        FantasyEdit::ToggleAbility(ability) => data.toggle_ability(ability),
        FantasyEdit::SetArmor(armor) => data.set_armor(*armor),
        FantasyEdit::SetShield(shield) => data.set_shield(*shield),
        FantasyEdit::SetClass(class) => data.set_class(class),
        FantasyEdit::SetLevel(level) => data.set_level(*level),
        FantasyEdit::SetSumArmor(value) => data.set_sum_armor(*value),
        FantasyEdit::SetHpDice(value) => data.set_hp_dice(*value),
        FantasyEdit::SetHp(value) => data.set_hp(*value),
        FantasyEdit::SetNextLevel(value) => data.set_next_level(*value),
        FantasyEdit::SetXp(value) => data.set_xp(*value),
    }
}
