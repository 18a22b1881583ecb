//! Directory-backed profile image store.

use std::path::{Path, PathBuf};
use tracing::info;

use super::{ImageStore, StoreError, StoredImage};

/// Largest accepted profile image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Stores uploads as files under `<root>/<bucket>/<file_name>`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

impl ImageStore for LocalImageStore {
    fn upload(
        &self,
        bucket: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredImage, StoreError> {
        if !is_plain_segment(bucket) || !is_plain_segment(file_name) {
            return Err(StoreError::Io(format!(
                "Invalid image location {}/{}",
                bucket, file_name
            )));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(StoreError::UnsupportedImage(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }

        let format = image::guess_format(bytes)
            .map_err(|e| StoreError::UnsupportedImage(e.to_string()))?;

        let dir = self.root.join(bucket);
        std::fs::create_dir_all(&dir).map_err(|e| {
            StoreError::Io(format!("Failed to create image directory {:?}: {}", dir, e))
        })?;

        let path = dir.join(file_name);
        std::fs::write(&path, bytes)
            .map_err(|e| StoreError::Io(format!("Failed to write image {:?}: {}", path, e)))?;

        let absolute = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        info!("Stored {:?} image at {:?}", format, absolute);

        Ok(StoredImage {
            path: format!("{}/{}", bucket, file_name),
            url: format!("file://{}", absolute.to_string_lossy().replace('\\', "/")),
        })
    }
}
