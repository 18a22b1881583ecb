//! Sheet Rolls - tabletop character sheets with D6 pip-code dice
//!
//! Crate layout:
//! - `dice` - Pip-code parsing, formatting and rolling
//! - `sheet` - Character sheet model and pure edits
//! - `autosave` - Debounced, versioned dirty-state tracking
//! - `session` - An open sheet: edits, autosave, rolls
//! - `store` - Sheet and image persistence
//! - `settings` - Editor and room settings

pub mod autosave;
pub mod dice;
pub mod session;
pub mod settings;
pub mod sheet;
pub mod store;

pub use session::{EditorSession, RollError, RollSeverity, RollTarget, SessionError, SessionOptions};
