//! Persistence collaborators
//!
//! The editor core only talks to these traits:
//! - [`SheetStore`] - load / save / delete character sheets by id
//! - [`ImageStore`] - upload profile images and get back a path and URL
//!
//! `database` holds the embedded SurrealDB implementation and `images` a
//! directory-backed image store.

use std::sync::Arc;
use thiserror::Error;

use crate::sheet::{CharacterSheet, SheetData, SheetError, SheetId, SheetSummary};

pub mod database;
pub mod images;

pub use database::*;
pub use images::*;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Character sheet {0} not found")]
    NotFound(SheetId),

    /// The backing database refused or failed the operation
    #[error("Database error: {0}")]
    Backend(String),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("Storage IO error: {0}")]
    Io(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Sheet persistence keyed by [`SheetId`].
pub trait SheetStore {
    fn load(&self, id: SheetId) -> Result<CharacterSheet, StoreError>;

    /// Write the full sheet, replacing whatever is stored under its id.
    fn save(&self, sheet: &CharacterSheet) -> Result<(), StoreError>;

    fn delete(&self, id: SheetId) -> Result<(), StoreError>;

    /// Store a new sheet and return its freshly assigned id.
    fn create(&self, owner: &str, data: SheetData) -> Result<SheetId, StoreError>;

    /// Summaries of every stored sheet, ordered by name.
    fn list(&self) -> Result<Vec<SheetSummary>, StoreError>;
}

impl<S: SheetStore + ?Sized> SheetStore for &S {
    fn load(&self, id: SheetId) -> Result<CharacterSheet, StoreError> {
        (**self).load(id)
    }

    fn save(&self, sheet: &CharacterSheet) -> Result<(), StoreError> {
        (**self).save(sheet)
    }

    fn delete(&self, id: SheetId) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn create(&self, owner: &str, data: SheetData) -> Result<SheetId, StoreError> {
        (**self).create(owner, data)
    }

    fn list(&self) -> Result<Vec<SheetSummary>, StoreError> {
        (**self).list()
    }
}

impl<S: SheetStore + ?Sized> SheetStore for Arc<S> {
    fn load(&self, id: SheetId) -> Result<CharacterSheet, StoreError> {
        (**self).load(id)
    }

    fn save(&self, sheet: &CharacterSheet) -> Result<(), StoreError> {
        (**self).save(sheet)
    }

    fn delete(&self, id: SheetId) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn create(&self, owner: &str, data: SheetData) -> Result<SheetId, StoreError> {
        (**self).create(owner, data)
    }

    fn list(&self) -> Result<Vec<SheetSummary>, StoreError> {
        (**self).list()
    }
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Path relative to the store root (`<bucket>/<file>`).
    pub path: String,
    pub url: String,
}

/// Object storage for profile images.
pub trait ImageStore {
    fn upload(&self, bucket: &str, file_name: &str, bytes: &[u8])
        -> Result<StoredImage, StoreError>;
}
