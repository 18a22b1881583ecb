//! Debounced autosave
//!
//! This module is organized into submodules:
//! - `clock` - Injectable time source
//! - `debounce` - Trailing-edge quiet-period timer
//! - `controller` - Versioned dirty-state machine handing out writes

pub mod clock;
pub mod controller;
pub mod debounce;

pub use clock::*;
pub use controller::*;
pub use debounce::*;
