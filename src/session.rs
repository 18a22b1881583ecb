//! Character sheet editing session
//!
//! [`EditorSession`] owns one open sheet: it applies edits, schedules
//! debounced writes through the [`SheetStore`], flushes on close and rolls
//! dice from the sheet's values.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::autosave::{AutosaveController, AutosaveState, Clock, Completion, Flush, SystemClock};
use crate::dice::{self, RollResult, MIN_ROLL_VALUE};
use crate::settings::{EditorSettings, RoomSettings};
use crate::sheet::{
    CharacterSheet, ForcePower, SaveKind, SheetData, SheetEdit, SheetId, SheetSummary,
    StarWarsData,
};
use crate::store::{SheetStore, StoreError};

/// Label used for hotkey rolls.
pub const HOTKEY_LABEL: &str = "Dobás";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RollError {
    #[error("Nincs dobható kocka.")]
    NoDice,

    #[error("Nothing to roll for '{0}'")]
    UnknownTarget(String),

    #[error("Rolling is only supported on Star Wars sheets")]
    WrongSystem,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Session for sheet {0} is closed")]
    Closed(SheetId),
}

/// How a roll should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollSeverity {
    Normal,
    /// A wound condition is reducing the roll.
    Hurt,
}

/// What a roll is made against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollTarget {
    Attribute(String),
    Skill {
        attribute: String,
        skill: String,
    },
    Spec {
        attribute: String,
        skill: String,
        spec: String,
    },
    Force(ForcePower),
    Weapon(usize),
    Save(SaveKind),
    Hotkey(char),
}

impl RollTarget {
    /// Attribute, skill, specialization and Force rolls suffer the wound
    /// penalty. Weapon damage, saves and hotkeys do not.
    pub fn applies_wound_penalty(&self) -> bool {
        matches!(
            self,
            RollTarget::Attribute(_)
                | RollTarget::Skill { .. }
                | RollTarget::Spec { .. }
                | RollTarget::Force(_)
        )
    }
}

/// Roll a pip count, refusing values below one whole die.
pub fn roll_dice(value: u32, label: &str) -> Result<RollResult, RollError> {
    if value < MIN_ROLL_VALUE {
        return Err(RollError::NoDice);
    }
    let result = dice::roll(value, label);
    info!("{} -> {}", result.summary(), result);
    Ok(result)
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Read-only sessions ignore edits.
    pub editable: bool,
    pub autosave_delay: Duration,
    pub room: RoomSettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_settings(&EditorSettings::default(), true)
    }
}

impl SessionOptions {
    pub fn from_settings(settings: &EditorSettings, editable: bool) -> Self {
        Self {
            editable,
            autosave_delay: settings.autosave_delay(),
            room: settings.room,
        }
    }
}

type SavedCallback = Box<dyn FnMut(&SheetSummary)>;

/// One open character sheet.
pub struct EditorSession<S: SheetStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    id: SheetId,
    owner: String,
    editable: bool,
    room: RoomSettings,
    controller: AutosaveController<SheetData>,
    on_saved: Option<SavedCallback>,
    closed: bool,
}

impl<S: SheetStore> EditorSession<S> {
    pub fn open(store: S, id: SheetId, options: SessionOptions) -> Result<Self, SessionError> {
        Self::open_with_clock(store, SystemClock, id, options)
    }
}

impl<S: SheetStore, C: Clock> EditorSession<S, C> {
    pub fn open_with_clock(
        store: S,
        clock: C,
        id: SheetId,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let sheet = store.load(id)?;
        info!(
            "Opened sheet {} ({}) {}",
            id,
            sheet.data.name(),
            if options.editable { "for editing" } else { "read-only" }
        );

        Ok(Self {
            store,
            clock,
            id,
            owner: sheet.owner,
            editable: options.editable,
            room: options.room,
            controller: AutosaveController::new(sheet.data, options.autosave_delay),
            on_saved: None,
            closed: false,
        })
    }

    /// Called with the sheet's listing fields after every successful write.
    pub fn on_saved(&mut self, callback: impl FnMut(&SheetSummary) + 'static) {
        self.on_saved = Some(Box::new(callback));
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn data(&self) -> &SheetData {
        self.controller.current()
    }

    pub fn sheet(&self) -> CharacterSheet {
        CharacterSheet::new(self.id, &self.owner, self.data().clone())
    }

    pub fn summary(&self) -> SheetSummary {
        self.sheet().summary()
    }

    pub fn is_editable(&self) -> bool {
        self.editable && !self.closed
    }

    pub fn room(&self) -> &RoomSettings {
        &self.room
    }

    pub fn autosave_state(&self) -> AutosaveState {
        self.controller.state()
    }

    pub fn is_dirty(&self) -> bool {
        self.controller.is_dirty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Editing & saving
    // ------------------------------------------------------------------------

    /// Apply an edit and schedule a save. Returns whether the sheet changed.
    pub fn apply(&mut self, edit: impl Into<SheetEdit>) -> bool {
        if !self.is_editable() {
            return false;
        }
        let edit = edit.into();
        let Some(next) = self.data().apply(&edit) else {
            debug!("Sheet {}: edit had no effect: {:?}", self.id, edit);
            return false;
        };
        self.controller.mark_dirty(next, self.clock.now());
        true
    }

    /// Write the pending state if its quiet period has elapsed.
    pub fn tick(&mut self) -> Option<Completion> {
        if self.closed {
            return None;
        }
        let flush = self.controller.poll(self.clock.now())?;
        Some(self.write(flush))
    }

    /// Write the latest state now, skipping the debounce.
    pub fn flush(&mut self) -> Option<Completion> {
        if self.closed {
            return None;
        }
        let flush = self.controller.flush_now()?;
        Some(self.write(flush))
    }

    fn write(&mut self, flush: Flush<SheetData>) -> Completion {
        let sheet = CharacterSheet::new(self.id, &self.owner, flush.state);
        let outcome = self.store.save(&sheet);
        let completion = self
            .controller
            .complete(flush.version, outcome, self.clock.now());

        if completion.is_saved() {
            debug!("Sheet {}: saved version {}", self.id, flush.version);
            if let Some(callback) = self.on_saved.as_mut() {
                callback(&sheet.summary());
            }
        }
        completion
    }

    /// Flush anything pending and stop accepting edits.
    pub fn close(mut self) -> Option<Completion> {
        self.finish()
    }

    fn finish(&mut self) -> Option<Completion> {
        if self.closed {
            return None;
        }
        let completion = self.flush();
        self.closed = true;
        if let Some(Completion::Failed(e)) = &completion {
            warn!("Sheet {}: final save failed: {}", self.id, e);
        }
        completion
    }

    /// Delete the sheet from the store. Pending edits are discarded.
    pub fn delete(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed(self.id));
        }
        self.store.delete(self.id)?;
        self.closed = true;
        info!("Sheet {} deleted", self.id);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Rolling
    // ------------------------------------------------------------------------

    fn star_wars(&self) -> Result<&StarWarsData, RollError> {
        self.data().as_star_wars().ok_or(RollError::WrongSystem)
    }

    /// Wound penalty currently applied to penalized rolls, in pips.
    pub fn wound_penalty(&self) -> u32 {
        self.data()
            .as_star_wars()
            .map(|data| data.wound_penalty(&self.room))
            .unwrap_or(0)
    }

    pub fn roll_severity(&self) -> RollSeverity {
        match self.data().as_star_wars() {
            Some(data) if data.is_hurt(&self.room) => RollSeverity::Hurt,
            _ => RollSeverity::Normal,
        }
    }

    /// Label and pip count a roll against `target` would use, wound
    /// penalty included.
    pub fn roll_value(&self, target: &RollTarget) -> Result<(String, u32), RollError> {
        let data = self.star_wars()?;
        let unknown = || RollError::UnknownTarget(format!("{:?}", target));

        let (label, value) = match target {
            RollTarget::Attribute(name) => {
                (name.clone(), data.attribute_value(name).ok_or_else(unknown)?)
            }
            RollTarget::Skill { attribute, skill } => (
                skill.clone(),
                data.skill_roll_value(attribute, skill)
                    .ok_or_else(unknown)?,
            ),
            RollTarget::Spec {
                attribute,
                skill,
                spec,
            } => (
                spec.clone(),
                data.spec_roll_value(attribute, skill, spec)
                    .ok_or_else(unknown)?,
            ),
            RollTarget::Force(power) => (power.label().to_string(), data.force_power(*power)),
            RollTarget::Weapon(index) => {
                let weapon = data.weapons.get(*index).ok_or_else(unknown)?;
                let damage = data.weapon_damage(*index).ok_or_else(unknown)?;
                (weapon.name.clone(), damage)
            }
            RollTarget::Save(kind) => (kind.label().to_string(), data.save_value(*kind)),
            RollTarget::Hotkey(key) => (
                HOTKEY_LABEL.to_string(),
                dice::hotkey_value(*key).ok_or_else(unknown)?,
            ),
        };

        let value = if target.applies_wound_penalty() {
            value.saturating_sub(data.wound_penalty(&self.room))
        } else {
            value
        };
        Ok((label, value))
    }

    pub fn roll(&self, target: &RollTarget) -> Result<RollResult, RollError> {
        let (label, value) = self.roll_value(target)?;
        roll_dice(value, &label)
    }

    pub fn roll_attribute(&self, attribute: &str) -> Result<RollResult, RollError> {
        self.roll(&RollTarget::Attribute(attribute.to_string()))
    }

    pub fn roll_skill(&self, attribute: &str, skill: &str) -> Result<RollResult, RollError> {
        self.roll(&RollTarget::Skill {
            attribute: attribute.to_string(),
            skill: skill.to_string(),
        })
    }

    pub fn roll_spec(
        &self,
        attribute: &str,
        skill: &str,
        spec: &str,
    ) -> Result<RollResult, RollError> {
        self.roll(&RollTarget::Spec {
            attribute: attribute.to_string(),
            skill: skill.to_string(),
            spec: spec.to_string(),
        })
    }

    pub fn roll_force(&self, power: ForcePower) -> Result<RollResult, RollError> {
        self.roll(&RollTarget::Force(power))
    }

    pub fn roll_weapon(&self, index: usize) -> Result<RollResult, RollError> {
        self.roll(&RollTarget::Weapon(index))
    }

    pub fn roll_save(&self, kind: SaveKind) -> Result<RollResult, RollError> {
        self.roll(&RollTarget::Save(kind))
    }

    pub fn roll_hotkey(&self, key: char) -> Result<RollResult, RollError> {
        self.roll(&RollTarget::Hotkey(key))
    }
}

impl<S: SheetStore, C: Clock> Drop for EditorSession<S, C> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::ManualClock;
    use crate::dice::MAX_ROLL_VALUE;
    use crate::sheet::{Condition, StarWarsEdit, StarWarsText, WeaponField};
    use crate::store::SurrealSheetStore;

    fn star_wars_store() -> (SurrealSheetStore, SheetId) {
        let store = SurrealSheetStore::open_in_memory().unwrap();
        let mut data = StarWarsData::default();
        data.set_text(StarWarsText::Name, "Kira");
        data.set_attribute("Erő", 9);
        data.add_skill("Erő", "Atlétika");
        data.set_skill("Erő", "Atlétika", 3);
        let id = store.create("anna", SheetData::StarWars(data)).unwrap();
        (store, id)
    }

    #[test]
    fn test_read_only_session_ignores_edits() {
        let (store, id) = star_wars_store();
        let options = SessionOptions {
            editable: false,
            ..SessionOptions::default()
        };
        let mut session =
            EditorSession::open_with_clock(&store, ManualClock::new(), id, options).unwrap();

        assert!(!session.apply(StarWarsEdit::SetMove(5)));
        assert_eq!(session.autosave_state(), AutosaveState::Clean);
    }

    #[test]
    fn test_roll_applies_wound_penalty() {
        let (store, id) = star_wars_store();
        let clock = ManualClock::new();
        let mut session =
            EditorSession::open_with_clock(&store, clock, id, SessionOptions::default()).unwrap();

        let skill = RollTarget::Skill {
            attribute: "Erő".to_string(),
            skill: "Atlétika".to_string(),
        };
        assert_eq!(session.roll_value(&skill).unwrap().1, 12);
        assert_eq!(session.roll_severity(), RollSeverity::Normal);

        session.apply(StarWarsEdit::SetCondition {
            condition: Condition::Stunned,
            active: true,
        });
        assert_eq!(session.roll_value(&skill).unwrap().1, 9);
        assert_eq!(session.roll_severity(), RollSeverity::Hurt);
        assert_eq!(session.roll_skill("Erő", "Atlétika").unwrap().dice.len(), 3);
    }

    #[test]
    fn test_wounded2_only_counts_when_room_enables_it() {
        let (store, id) = star_wars_store();
        let mut session =
            EditorSession::open_with_clock(&store, ManualClock::new(), id, SessionOptions::default())
                .unwrap();
        session.apply(StarWarsEdit::SetCondition {
            condition: Condition::Wounded2,
            active: true,
        });
        assert_eq!(session.wound_penalty(), 0);
        session.close();

        let options = SessionOptions {
            room: RoomSettings { wounded2: true },
            ..SessionOptions::default()
        };
        let session = EditorSession::open_with_clock(&store, ManualClock::new(), id, options).unwrap();
        assert_eq!(session.wound_penalty(), 3);
    }

    #[test]
    fn test_no_dice_below_one_die() {
        let (store, id) = star_wars_store();
        let session =
            EditorSession::open_with_clock(&store, ManualClock::new(), id, SessionOptions::default())
                .unwrap();

        let err = session.roll_attribute("Tudás").unwrap_err();
        assert_eq!(err, RollError::NoDice);
        assert_eq!(err.to_string(), "Nincs dobható kocka.");
    }

    #[test]
    fn test_weapon_and_hotkey_ignore_wounds() {
        let (store, id) = star_wars_store();
        let mut session =
            EditorSession::open_with_clock(&store, ManualClock::new(), id, SessionOptions::default())
                .unwrap();
        session.apply(StarWarsEdit::AddWeapon);
        session.apply(StarWarsEdit::UpdateWeapon {
            index: 0,
            field: WeaponField::Damage,
            value: "4k+2".to_string(),
        });
        session.apply(StarWarsEdit::SetCondition {
            condition: Condition::Wounded,
            active: true,
        });

        assert_eq!(session.roll_value(&RollTarget::Weapon(0)).unwrap().1, 14);
        assert_eq!(
            session.roll_value(&RollTarget::Hotkey('0')).unwrap(),
            (HOTKEY_LABEL.to_string(), 30)
        );
        assert!(matches!(
            session.roll_weapon(3),
            Err(RollError::UnknownTarget(_))
        ));
    }

    fn stunned_session(
        store: &SurrealSheetStore,
        id: SheetId,
    ) -> EditorSession<&SurrealSheetStore, ManualClock> {
        let mut session =
            EditorSession::open_with_clock(store, ManualClock::new(), id, SessionOptions::default())
                .unwrap();
        session.apply(StarWarsEdit::SetCondition {
            condition: Condition::Stunned,
            active: true,
        });
        session
    }

    #[test]
    fn test_force_roll_takes_wound_penalty() {
        let (store, id) = star_wars_store();
        let mut session = stunned_session(&store, id);
        session.apply(StarWarsEdit::SetForcePower {
            power: ForcePower::Control,
            value: 7,
        });

        assert_eq!(
            session.roll_value(&RollTarget::Force(ForcePower::Control)).unwrap(),
            ("Kontrol".to_string(), 4)
        );
        let result = session.roll_force(ForcePower::Control).unwrap();
        assert_eq!(result.value, 4);
        assert_eq!(result.dice.len(), 2);
        assert_eq!(session.roll_force(ForcePower::Sense), Err(RollError::NoDice));
    }

    #[test]
    fn test_spec_roll_sums_levels_minus_wounds() {
        let (store, id) = star_wars_store();
        let mut session = stunned_session(&store, id);
        session.apply(StarWarsEdit::AddSpec {
            attribute: "Erő".to_string(),
            skill: "Atlétika".to_string(),
            spec: "Mászás".to_string(),
        });

        // 9 + 3 + 3 pips, one die lost to the stun
        let result = session.roll_spec("Erő", "Atlétika", "Mászás").unwrap();
        assert_eq!(result.label, "Mászás");
        assert_eq!(result.value, 12);
        assert_eq!(result.full_dice().count(), 4);
        assert_eq!(session.roll_severity(), RollSeverity::Hurt);
    }

    #[test]
    fn test_save_ignores_wounds() {
        let (store, id) = star_wars_store();
        let mut session = stunned_session(&store, id);
        session.apply(StarWarsEdit::SetText {
            field: StarWarsText::SaveAgainstEnergy,
            value: "2D+1".to_string(),
        });

        let result = session.roll_save(SaveKind::Energy).unwrap();
        assert_eq!(result.label, "Erő dobás energia ellen");
        assert_eq!(result.value, 7);
        assert!(result.partial_die().is_some());
    }

    #[test]
    fn test_save_without_count_has_no_dice() {
        let (store, id) = star_wars_store();
        let mut session = stunned_session(&store, id);
        session.apply(StarWarsEdit::SetText {
            field: StarWarsText::SaveAgainstPhysical,
            value: "D+2".to_string(),
        });

        assert_eq!(session.roll_save(SaveKind::Physical), Err(RollError::NoDice));
        assert_eq!(session.roll_save(SaveKind::Energy), Err(RollError::NoDice));
    }

    #[test]
    fn test_roll_dice_refuses_partial_only_values() {
        assert_eq!(roll_dice(2, "Dobás"), Err(RollError::NoDice));
        assert_eq!(roll_dice(0, "Dobás"), Err(RollError::NoDice));
        assert_eq!(roll_dice(3, "Dobás").unwrap().dice.len(), 1);
    }

    #[test]
    fn test_oversized_weapon_damage_rolls_capped() {
        let (store, id) = star_wars_store();
        let mut session =
            EditorSession::open_with_clock(&store, ManualClock::new(), id, SessionOptions::default())
                .unwrap();
        session.apply(StarWarsEdit::AddWeapon);
        session.apply(StarWarsEdit::UpdateWeapon {
            index: 0,
            field: WeaponField::Damage,
            value: "999999999D".to_string(),
        });

        let result = session.roll_weapon(0).unwrap();
        assert_eq!(result.value, MAX_ROLL_VALUE);
        assert_eq!(result.full_dice().count(), 99);
    }

    #[test]
    fn test_fantasy_sheet_cannot_roll() {
        let store = SurrealSheetStore::open_in_memory().unwrap();
        let id = store
            .create("anna", SheetData::new(crate::sheet::GameSystem::Fantasy))
            .unwrap();
        let session = EditorSession::open(&store, id, SessionOptions::default()).unwrap();
        assert_eq!(session.roll_hotkey('3'), Err(RollError::WrongSystem));
    }

    #[test]
    fn test_delete_discards_pending_edits() {
        let (store, id) = star_wars_store();
        let mut session =
            EditorSession::open_with_clock(&store, ManualClock::new(), id, SessionOptions::default())
                .unwrap();
        session.apply(StarWarsEdit::SetMove(3));
        session.delete().unwrap();
        assert_eq!(session.delete(), Err(SessionError::Closed(id)));
        drop(session);

        assert_eq!(store.load(id), Err(StoreError::NotFound(id)));
    }
}
