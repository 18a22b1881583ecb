//! Character sheet model
//!
//! This module is organized into submodules:
//! - `character` - Sheet envelope, ids, the per-system payload union
//! - `star_wars` - D6 attributes, skills, specializations and derived values
//! - `fantasy` - Fantasy sheet scores, armor and class rules
//! - `edit` - Edit values and the pure update function

pub mod character;
pub mod edit;
pub mod fantasy;
pub mod star_wars;

// Re-export all public types for convenient access
pub use character::*;
pub use edit::*;
pub use fantasy::*;
pub use star_wars::*;
