//! Autosave behaviour of an editing session, driven by a manual clock

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use sheetrolls::autosave::{AutosaveState, Completion, ManualClock};
use sheetrolls::session::{EditorSession, SessionOptions};
use sheetrolls::sheet::{
    CharacterSheet, GameSystem, SheetData, SheetId, SheetSummary, StarWarsEdit,
};
use sheetrolls::store::{SheetStore, StoreError};

/// In-memory store that records every write.
#[derive(Default)]
struct RecordingStore {
    sheets: Mutex<BTreeMap<SheetId, CharacterSheet>>,
    writes: Mutex<Vec<CharacterSheet>>,
    failing: AtomicBool,
}

impl RecordingStore {
    fn with_sheet() -> (Self, SheetId) {
        let store = Self::default();
        let id = store
            .create("anna", SheetData::new(GameSystem::StarWars))
            .unwrap();
        (store, id)
    }

    fn writes(&self) -> Vec<CharacterSheet> {
        self.writes.lock().unwrap().clone()
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl SheetStore for RecordingStore {
    fn load(&self, id: SheetId) -> Result<CharacterSheet, StoreError> {
        self.sheets
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn save(&self, sheet: &CharacterSheet) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::backend("connection reset"));
        }
        self.writes.lock().unwrap().push(sheet.clone());
        self.sheets.lock().unwrap().insert(sheet.id, sheet.clone());
        Ok(())
    }

    fn delete(&self, id: SheetId) -> Result<(), StoreError> {
        self.sheets
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn create(&self, owner: &str, data: SheetData) -> Result<SheetId, StoreError> {
        let mut sheets = self.sheets.lock().unwrap();
        let id = SheetId(sheets.keys().last().map(|id| id.0 + 1).unwrap_or(1));
        sheets.insert(id, CharacterSheet::new(id, owner, data));
        Ok(id)
    }

    fn list(&self) -> Result<Vec<SheetSummary>, StoreError> {
        Ok(self
            .sheets
            .lock()
            .unwrap()
            .values()
            .map(CharacterSheet::summary)
            .collect())
    }
}

fn set_move(value: i64) -> StarWarsEdit {
    StarWarsEdit::SetMove(value)
}

fn moved(sheet: &CharacterSheet) -> u32 {
    sheet.data.as_star_wars().unwrap().movement
}

#[test]
fn test_debounced_edits_write_once_with_latest_state() {
    let (store, id) = RecordingStore::with_sheet();
    let clock = ManualClock::new();
    let mut session =
        EditorSession::open_with_clock(&store, clock.clone(), id, SessionOptions::default())
            .unwrap();

    assert!(session.apply(set_move(1)));
    clock.advance_ms(200);
    assert!(session.apply(set_move(2)));
    clock.advance_ms(200);
    assert!(session.apply(set_move(3)));

    // 1000 ms after the first edit, but only 600 ms after the last one
    clock.advance_ms(600);
    assert_eq!(session.tick(), None);
    assert!(store.writes().is_empty());

    clock.advance_ms(400);
    assert_eq!(session.tick(), Some(Completion::Saved));
    assert_eq!(session.autosave_state(), AutosaveState::Clean);

    let writes = store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(moved(&writes[0]), 3);

    clock.advance_ms(5000);
    assert_eq!(session.tick(), None);
    drop(session);
    assert_eq!(store.writes().len(), 1);
}

#[test]
fn test_close_flushes_exactly_once() {
    let (store, id) = RecordingStore::with_sheet();
    let clock = ManualClock::new();
    let mut session =
        EditorSession::open_with_clock(&store, clock.clone(), id, SessionOptions::default())
            .unwrap();

    session.apply(set_move(7));
    clock.advance_ms(10);
    assert_eq!(session.close(), Some(Completion::Saved));

    clock.advance_ms(5000);
    let writes = store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(moved(&writes[0]), 7);
}

#[test]
fn test_drop_flushes_pending_edit() {
    let (store, id) = RecordingStore::with_sheet();
    {
        let mut session =
            EditorSession::open_with_clock(&store, ManualClock::new(), id, SessionOptions::default())
                .unwrap();
        session.apply(set_move(4));
    }

    assert_eq!(store.writes().len(), 1);
    assert_eq!(moved(&store.load(id).unwrap()), 4);
}

#[test]
fn test_close_after_debounced_write_does_not_rewrite() {
    let (store, id) = RecordingStore::with_sheet();
    let clock = ManualClock::new();
    let mut session =
        EditorSession::open_with_clock(&store, clock.clone(), id, SessionOptions::default())
            .unwrap();

    session.apply(set_move(5));
    clock.advance_ms(1000);
    assert_eq!(session.tick(), Some(Completion::Saved));
    assert_eq!(session.close(), None);
    assert_eq!(store.writes().len(), 1);
}

#[test]
fn test_failed_save_stays_dirty_and_retries() {
    let (store, id) = RecordingStore::with_sheet();
    let clock = ManualClock::new();
    let mut session =
        EditorSession::open_with_clock(&store, clock.clone(), id, SessionOptions::default())
            .unwrap();

    store.set_failing(true);
    session.apply(set_move(8));
    clock.advance_ms(1000);
    assert!(matches!(session.tick(), Some(Completion::Failed(_))));
    assert!(session.is_dirty());
    assert_eq!(session.autosave_state(), AutosaveState::DirtyPending);

    store.set_failing(false);
    clock.advance_ms(500);
    assert_eq!(session.tick(), None, "retry waits for the debounce");
    clock.advance_ms(500);
    assert_eq!(session.tick(), Some(Completion::Saved));
    assert!(!session.is_dirty());

    let writes = store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(moved(&writes[0]), 8);
}

#[test]
fn test_edit_after_write_schedules_second_write() {
    let (store, id) = RecordingStore::with_sheet();
    let clock = ManualClock::new();
    let mut session =
        EditorSession::open_with_clock(&store, clock.clone(), id, SessionOptions::default())
            .unwrap();

    session.apply(set_move(11));
    clock.advance_ms(1000);
    assert_eq!(session.tick(), Some(Completion::Saved));

    session.apply(set_move(12));
    clock.advance_ms(999);
    assert_eq!(session.tick(), None);
    clock.advance_ms(1);
    assert_eq!(session.tick(), Some(Completion::Saved));

    let moves: Vec<u32> = store.writes().iter().map(moved).collect();
    assert_eq!(moves, vec![11, 12]);
}

#[test]
fn test_saved_callback_receives_summary() {
    let (store, id) = RecordingStore::with_sheet();
    let clock = ManualClock::new();
    let mut session =
        EditorSession::open_with_clock(&store, clock.clone(), id, SessionOptions::default())
            .unwrap();

    let seen: Rc<RefCell<Vec<SheetSummary>>> = Rc::default();
    let sink = Rc::clone(&seen);
    session.on_saved(move |summary| sink.borrow_mut().push(summary.clone()));

    session.apply(StarWarsEdit::SetText {
        field: sheetrolls::sheet::StarWarsText::Name,
        value: "Kira Vess".to_string(),
    });
    store.set_failing(true);
    clock.advance_ms(1000);
    session.tick();
    assert!(seen.borrow().is_empty(), "failed writes are not announced");

    store.set_failing(false);
    clock.advance_ms(1000);
    session.tick();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].id, id);
    assert_eq!(seen[0].name, "Kira Vess");
    assert_eq!(seen[0].owner, "anna");
}

#[test]
fn test_unchanged_edit_does_not_schedule_write() {
    let (store, id) = RecordingStore::with_sheet();
    let clock = ManualClock::new();
    let mut session =
        EditorSession::open_with_clock(&store, clock.clone(), id, SessionOptions::default())
            .unwrap();

    // New sheets start at the default move of 10
    assert!(!session.apply(set_move(10)));
    clock.advance_ms(2000);
    assert_eq!(session.tick(), None);
    assert_eq!(session.close(), None);
    assert!(store.writes().is_empty());
}
