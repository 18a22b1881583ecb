//! Editor settings types and persistence
//!
//! Settings live in the sheet store's `setting` table as a JSON string.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::store::{StoreError, SurrealSheetStore};

// ============================================================================
// Room Settings
// ============================================================================

/// Table rules shared by everyone playing in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    /// Count the second wound level toward the roll penalty.
    pub wounded2: bool,
}

// ============================================================================
// Editor Settings
// ============================================================================

fn default_autosave_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Quiet period after the last edit before the sheet is written.
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,

    #[serde(default)]
    pub room: RoomSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave_delay_ms: default_autosave_delay_ms(),
            room: RoomSettings::default(),
        }
    }
}

impl EditorSettings {
    pub const SETTINGS_DB_KEY: &'static str = "editor_settings";

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Load settings from the store, falling back to defaults.
    pub fn load(db: &SurrealSheetStore) -> Self {
        match db.get_setting::<EditorSettings>(Self::SETTINGS_DB_KEY) {
            Ok(Some(settings)) => {
                info!("Loaded editor settings from SurrealDB");
                settings
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Failed to load editor settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, db: &SurrealSheetStore) -> Result<(), StoreError> {
        db.set_setting(Self::SETTINGS_DB_KEY, self)
    }
}
