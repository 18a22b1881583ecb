//! Embedded SurrealDB store for character sheets & settings.
//!
//! This module provides persistent storage for:
//! - character sheets (both game systems)
//! - editor settings
//!
//! Sheet payloads are stored as JSON strings next to a few plain listing
//! fields. The payload is a tagged union, and keeping it as a string sidesteps
//! SurrealDB's own enum serialization.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use surrealdb::engine::local::{Db, Mem, SurrealKv};
use surrealdb::Surreal;

use super::{SheetStore, StoreError};
use crate::sheet::{CharacterSheet, GameSystem, SheetData, SheetId, SheetSummary};

/// SurrealDB folder name (embedded database).
const DATABASE_FOLDER: &str = "sheets.surrealdb";
/// App data folder name.
const APP_DATA_FOLDER: &str = "SheetRolls";

const NS: &str = "sheetrolls";
const DB: &str = "sheetrolls";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SheetDocument {
    /// Stable internal ID (never changes).
    sid: i64,
    /// Convenience fields for listing/indexing.
    owner: String,
    name: String,
    player_name: String,
    /// `GameSystem` tag as a plain string.
    system: String,
    /// Full sheet as JSON.
    sheet: String,
}

/// Resolve the per-user app data directory, creating it if needed.
///
/// Uses LocalAppData on Windows, Application Support on macOS and the XDG
/// data home on Linux.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    #[cfg(target_os = "windows")]
    {
        if let Ok(local_app_data) = std::env::var("LOCALAPPDATA") {
            let app_dir = PathBuf::from(&local_app_data).join(APP_DATA_FOLDER);
            match std::fs::create_dir_all(&app_dir) {
                Ok(_) => return Ok(app_dir),
                Err(e) => {
                    warn!("Failed to create app data directory {:?}: {}", app_dir, e);
                }
            }
        }

        if let Ok(user_profile) = std::env::var("USERPROFILE") {
            let app_dir = PathBuf::from(&user_profile)
                .join("AppData")
                .join("Local")
                .join(APP_DATA_FOLDER);
            if std::fs::create_dir_all(&app_dir).is_ok() {
                return Ok(app_dir);
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            let app_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DATA_FOLDER);
            std::fs::create_dir_all(&app_dir).map_err(|e| {
                StoreError::Io(format!("Failed to create app data directory: {}", e))
            })?;
            return Ok(app_dir);
        }
    }

    #[cfg(target_os = "linux")]
    {
        let base = if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
            Some(PathBuf::from(data_home))
        } else if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("share"))
        } else {
            None
        };
        if let Some(base) = base {
            let app_dir = base.join(APP_DATA_FOLDER);
            std::fs::create_dir_all(&app_dir).map_err(|e| {
                StoreError::Io(format!("Failed to create app data directory: {}", e))
            })?;
            return Ok(app_dir);
        }
    }

    std::env::current_dir()
        .map_err(|e| StoreError::Io(format!("Unable to determine data directory: {}", e)))
}

fn system_tag(system: GameSystem) -> Result<String, StoreError> {
    match serde_json::to_value(system) {
        Ok(JsonValue::String(tag)) => Ok(tag),
        Ok(other) => Err(StoreError::backend(format!(
            "Unexpected game system encoding: {}",
            other
        ))),
        Err(e) => Err(StoreError::backend(format!(
            "Failed to encode game system: {}",
            e
        ))),
    }
}

fn parse_system_tag(tag: &str) -> Result<GameSystem, StoreError> {
    serde_json::from_value(JsonValue::String(tag.to_string()))
        .map_err(|e| StoreError::backend(format!("Unknown game system '{}': {}", tag, e)))
}

fn backup_suffix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Character sheet store on an embedded SurrealDB datastore.
///
/// Owns a tokio runtime and blocks on it, so every method is synchronous and
/// must not be called from inside another async runtime.
pub struct SurrealSheetStore {
    rt: tokio::runtime::Runtime,
    db: Mutex<Surreal<Db>>,
    /// Path to the embedded datastore.
    pub db_path: PathBuf,
}

impl SurrealSheetStore {
    fn make_runtime() -> Result<tokio::runtime::Runtime, StoreError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| StoreError::backend(format!("Failed to create tokio runtime: {}", e)))
    }

    async fn init(db: &Surreal<Db>) -> Result<(), StoreError> {
        db.use_ns(NS)
            .use_db(DB)
            .await
            .map_err(|e| StoreError::backend(format!("Failed to select namespace/db: {}", e)))?;

        let schema = r#"
            DEFINE TABLE sheet SCHEMALESS;
            DEFINE INDEX sheet_sid_unique ON sheet FIELDS sid UNIQUE;
            DEFINE INDEX sheet_name ON sheet FIELDS name;

            DEFINE TABLE setting SCHEMALESS;
        "#;

        db.query(schema)
            .await
            .map_err(|e| StoreError::backend(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    /// Open or create the datastore in the per-user data directory.
    pub fn open() -> Result<Self, StoreError> {
        let data_dir = data_dir()?;
        Self::open_in_dir(data_dir)
    }

    /// Open or create the datastore inside `data_dir`, backing up and
    /// recreating it if it turns out unreadable.
    pub fn open_in_dir(data_dir: PathBuf) -> Result<Self, StoreError> {
        let db_path = data_dir.join(DATABASE_FOLDER);
        let rt = Self::make_runtime()?;

        std::fs::create_dir_all(&data_dir).map_err(|e| {
            StoreError::Io(format!(
                "Failed to create app data directory {:?}: {}",
                data_dir, e
            ))
        })?;

        // SurrealKV expects a directory path.
        if db_path.exists() && db_path.is_file() {
            let backup_path =
                data_dir.join(format!("{}.file.bak-{}", DATABASE_FOLDER, backup_suffix()));
            warn!(
                "Database path {:?} is a file; backing up to {:?} and recreating as a directory",
                db_path, backup_path
            );
            std::fs::rename(&db_path, &backup_path).map_err(|e| {
                StoreError::Io(format!(
                    "Failed to back up database file {:?} -> {:?}: {}",
                    db_path, backup_path, e
                ))
            })?;
        }

        std::fs::create_dir_all(&db_path).map_err(|e| {
            StoreError::Io(format!(
                "Failed to create SurrealDB datastore dir {:?}: {}",
                db_path, e
            ))
        })?;

        let db_path_str = db_path.to_string_lossy().to_string();
        let db = match rt.block_on(async { Surreal::new::<SurrealKv>(db_path_str.clone()).await }) {
            Ok(db) => db,
            Err(e) => {
                let err_string = format!("Failed to open SurrealDB: {}", e);
                let is_recoverable_datastore_issue = err_string
                    .contains("Unsupported manifest format version")
                    || err_string.contains("Failed to load manifest")
                    || err_string.contains("unexpected end of file")
                    || err_string.contains("failed to fill whole buffer")
                    || err_string.contains("There was a problem with the underlying datastore");

                if !is_recoverable_datastore_issue {
                    return Err(StoreError::Backend(err_string));
                }

                let backup_path =
                    data_dir.join(format!("{}.bak-{}", DATABASE_FOLDER, backup_suffix()));
                warn!(
                    "SurrealDB datastore appears unreadable at {:?} ({}). Backing up to {:?} and recreating.",
                    db_path, err_string, backup_path
                );
                std::fs::rename(&db_path, &backup_path).map_err(|re| {
                    StoreError::Io(format!(
                        "{} (also failed to back up {:?} -> {:?}: {})",
                        err_string, db_path, backup_path, re
                    ))
                })?;
                std::fs::create_dir_all(&db_path).map_err(|ce| {
                    StoreError::Io(format!(
                        "{} (also failed to recreate datastore dir {:?}: {})",
                        err_string, db_path, ce
                    ))
                })?;

                rt.block_on(async { Surreal::new::<SurrealKv>(db_path_str.clone()).await })
                    .map_err(|e| StoreError::backend(format!("Failed to open SurrealDB: {}", e)))?
            }
        };

        rt.block_on(Self::init(&db))?;
        info!("Opened sheet store at {:?}", db_path);

        Ok(Self {
            rt,
            db: Mutex::new(db),
            db_path,
        })
    }

    /// In-memory datastore, used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let rt = Self::make_runtime()?;
        let db = rt
            .block_on(async { Surreal::new::<Mem>(()).await })
            .map_err(|e| StoreError::backend(format!("Failed to open SurrealDB (mem): {}", e)))?;

        rt.block_on(Self::init(&db))?;

        Ok(Self {
            rt,
            db: Mutex::new(db),
            db_path: PathBuf::new(),
        })
    }

    fn with_db<T>(
        &self,
        f: impl FnOnce(&Surreal<Db>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let db = self
            .db
            .lock()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        f(&db)
    }

    fn next_sheet_id(&self) -> Result<i64, StoreError> {
        self.with_db(|db| {
            self.rt.block_on(async {
                let mut response = db
                    .query("SELECT VALUE sid FROM sheet ORDER BY sid DESC LIMIT 1")
                    .await
                    .map_err(|e| StoreError::backend(format!("Failed to query next id: {}", e)))?;
                let rows: Vec<i64> = response
                    .take(0)
                    .map_err(|e| StoreError::backend(format!("Failed to decode next id: {}", e)))?;
                Ok(rows.first().map(|sid| sid + 1).unwrap_or(1))
            })
        })
    }

    fn to_doc(sheet: &CharacterSheet) -> Result<SheetDocument, StoreError> {
        Ok(SheetDocument {
            sid: sheet.id.0,
            owner: sheet.owner.clone(),
            name: sheet.data.name().to_string(),
            player_name: sheet.data.player_name().to_string(),
            system: system_tag(sheet.data.system())?,
            sheet: sheet.to_json()?,
        })
    }

    fn upsert_sheet(&self, sheet: &CharacterSheet) -> Result<(), StoreError> {
        let doc = Self::to_doc(sheet)?;
        let sid = doc.sid;

        self.with_db(|db| {
            self.rt.block_on(async {
                let _: Option<SheetDocument> = db
                    .upsert(("sheet", sid))
                    .content(doc)
                    .await
                    .map_err(|e| StoreError::backend(format!("Failed to save sheet: {}", e)))?;
                Ok(())
            })
        })
    }

    /// Number of stored sheets.
    pub fn sheet_count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }

    /// Load a document by key from the `setting` table.
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let key = key.to_owned();
        self.with_db(move |db| {
            self.rt.block_on(async {
                #[derive(Deserialize)]
                struct SettingRecord {
                    value: String,
                }

                let record: Option<SettingRecord> = db
                    .select(("setting", key.clone()))
                    .await
                    .map_err(|e| {
                        StoreError::backend(format!("Failed to load setting '{}': {}", key, e))
                    })?;

                match record {
                    Some(record) => {
                        let decoded: T = serde_json::from_str(&record.value).map_err(|e| {
                            StoreError::backend(format!(
                                "Failed to decode setting '{}' from JSON string: {}",
                                key, e
                            ))
                        })?;
                        Ok(Some(decoded))
                    }
                    None => Ok(None),
                }
            })
        })
    }

    /// Upsert a document by key into the `setting` table.
    pub fn set_setting<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let key = key.to_owned();
        // Stored as a JSON string under a single `value` field, which keeps
        // primitives and structs loadable the same way.
        let json_string = serde_json::to_string(value).map_err(|e| {
            StoreError::backend(format!(
                "Failed to serialize setting '{}' to JSON string: {}",
                key, e
            ))
        })?;

        self.with_db(move |db| {
            self.rt.block_on(async {
                #[derive(Serialize)]
                struct SettingDoc {
                    value: String,
                }

                #[derive(Deserialize)]
                struct SettingSaved {
                    #[allow(dead_code)]
                    value: String,
                }

                let _: Option<SettingSaved> = db
                    .upsert(("setting", key.clone()))
                    .content(SettingDoc { value: json_string })
                    .await
                    .map_err(|e| {
                        StoreError::backend(format!("Failed to save setting '{}': {}", key, e))
                    })?;
                Ok(())
            })
        })
    }
}

impl SheetStore for SurrealSheetStore {
    fn load(&self, id: SheetId) -> Result<CharacterSheet, StoreError> {
        let doc: Option<SheetDocument> = self.with_db(|db| {
            self.rt.block_on(async {
                db.select(("sheet", id.0))
                    .await
                    .map_err(|e| StoreError::backend(format!("Failed to load sheet: {}", e)))
            })
        })?;

        let Some(doc) = doc else {
            return Err(StoreError::NotFound(id));
        };

        let sheet = CharacterSheet::from_json(&doc.sheet)?;
        debug!("Loaded sheet {} ({})", id, sheet.data.name());
        Ok(sheet)
    }

    fn save(&self, sheet: &CharacterSheet) -> Result<(), StoreError> {
        self.upsert_sheet(sheet)?;
        debug!("Saved sheet {}", sheet.id);
        Ok(())
    }

    fn delete(&self, id: SheetId) -> Result<(), StoreError> {
        let deleted: Option<SheetDocument> = self.with_db(|db| {
            self.rt.block_on(async {
                db.delete(("sheet", id.0))
                    .await
                    .map_err(|e| StoreError::backend(format!("Failed to delete sheet: {}", e)))
            })
        })?;

        match deleted {
            Some(_) => {
                info!("Deleted sheet {}", id);
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn create(&self, owner: &str, data: SheetData) -> Result<SheetId, StoreError> {
        data.validate()?;
        let id = SheetId(self.next_sheet_id()?);
        self.upsert_sheet(&CharacterSheet::new(id, owner, data))?;
        info!("Created sheet {}", id);
        Ok(id)
    }

    fn list(&self) -> Result<Vec<SheetSummary>, StoreError> {
        #[derive(Deserialize)]
        struct ListRow {
            id: i64,
            name: String,
            player_name: String,
            owner: String,
            system: String,
        }

        let rows: Vec<ListRow> = self.with_db(|db| {
            self.rt.block_on(async {
                let mut response = db
                    .query(
                        "SELECT sid AS id, name, player_name, owner, system FROM sheet ORDER BY name",
                    )
                    .await
                    .map_err(|e| StoreError::backend(format!("Failed to query sheets: {}", e)))?;
                response
                    .take::<Vec<ListRow>>(0)
                    .map_err(|e| StoreError::backend(format!("Failed to decode sheet list: {}", e)))
            })
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(SheetSummary {
                    id: SheetId(row.id),
                    system: parse_system_tag(&row.system)?,
                    name: row.name,
                    player_name: row.player_name,
                    owner: row.owner,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EditorSettings;
    use crate::sheet::{StarWarsData, StarWarsText};

    fn star_wars_named(name: &str) -> SheetData {
        let mut data = StarWarsData::default();
        data.set_text(StarWarsText::Name, name);
        SheetData::StarWars(data)
    }

    #[test]
    fn test_create_and_load_sheet() {
        let store = SurrealSheetStore::open_in_memory().unwrap();
        let id = store.create("luke", star_wars_named("Kira Vess")).unwrap();

        let loaded = store.load(id).unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.owner, "luke");
        assert_eq!(loaded.data.name(), "Kira Vess");
    }

    #[test]
    fn test_save_overwrites_sheet() {
        let store = SurrealSheetStore::open_in_memory().unwrap();
        let id = store.create("luke", star_wars_named("Kira")).unwrap();

        let mut sheet = store.load(id).unwrap();
        sheet.data = star_wars_named("Kira Vess");
        store.save(&sheet).unwrap();

        assert_eq!(store.load(id).unwrap().data.name(), "Kira Vess");
        assert_eq!(store.sheet_count().unwrap(), 1);
    }

    #[test]
    fn test_list_sheets_sorted_by_name() {
        let store = SurrealSheetStore::open_in_memory().unwrap();
        store.create("a", star_wars_named("Tarn")).unwrap();
        store.create("b", SheetData::new(GameSystem::Fantasy)).unwrap();
        store.create("c", star_wars_named("Bel")).unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].name, "");
        assert_eq!(list[0].system, GameSystem::Fantasy);
        assert_eq!(list[1].name, "Bel");
        assert_eq!(list[2].name, "Tarn");
    }

    #[test]
    fn test_delete_sheet() {
        let store = SurrealSheetStore::open_in_memory().unwrap();
        let id = store.create("luke", star_wars_named("Kira")).unwrap();

        store.delete(id).unwrap();
        assert_eq!(store.load(id), Err(StoreError::NotFound(id)));
        assert_eq!(store.delete(id), Err(StoreError::NotFound(id)));
    }

    #[test]
    fn test_ids_are_sequential() {
        let store = SurrealSheetStore::open_in_memory().unwrap();
        let first = store.create("a", star_wars_named("A")).unwrap();
        let second = store.create("a", star_wars_named("B")).unwrap();
        assert_eq!(second.0, first.0 + 1);
    }

    #[test]
    fn test_settings_round_trip() {
        let store = SurrealSheetStore::open_in_memory().unwrap();
        assert!(store
            .get_setting::<EditorSettings>("editor_settings")
            .unwrap()
            .is_none());

        let mut settings = EditorSettings::default();
        settings.autosave_delay_ms = 250;
        settings.room.wounded2 = true;
        store.set_setting("editor_settings", &settings).unwrap();

        let loaded: EditorSettings = store.get_setting("editor_settings").unwrap().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_persist_to_disk_round_trip() {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("sheetrolls-test-{}", ts));

        let id = {
            let store = SurrealSheetStore::open_in_dir(dir.clone()).unwrap();
            store.create("luke", star_wars_named("Kira")).unwrap()
        };

        {
            let store = SurrealSheetStore::open_in_dir(dir.clone()).unwrap();
            assert_eq!(store.load(id).unwrap().data.name(), "Kira");
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
