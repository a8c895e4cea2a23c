//! Transient listing cache.
//!
//! The listing phase stores the raw response here and the filter phase
//! reads it back, so filtering never re-queries the external system. Each
//! store replaces the previous content.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ListingCache {
    path: PathBuf,
}

impl ListingCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the cache with `raw` (temp file, then rename).
    pub fn store(&self, raw: &str) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::internal_io(
                format!("Invalid path: {}", self.path.display()),
                Some("write listing cache".to_string()),
            )
        })?;

        let filename = self.path.file_name().ok_or_else(|| {
            Error::internal_io(
                format!("Invalid path: {}", self.path.display()),
                Some("write listing cache".to_string()),
            )
        })?;

        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
            })?;
        }

        let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

        fs::write(&tmp_path, raw)
            .map_err(|e| Error::internal_io(e.to_string(), Some("write temp file".to_string())))?;

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| Error::internal_io(e.to_string(), Some("rename temp file".to_string())))?;

        tracing::debug!(path = %self.path.display(), bytes = raw.len(), "listing cached");
        Ok(())
    }

    /// Read the cached listing. A missing file is an error, never an empty listing.
    pub fn load(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::cache_missing(self.path.display().to_string())
            } else {
                Error::internal_io(e.to_string(), Some("read listing cache".to_string()))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn store_overwrites_previous_listing() {
        let dir = tempdir().unwrap();
        let cache = ListingCache::new(dir.path().join("listing.txt"));

        cache.store("first-index 2024-01-01 1mb\nsecond 2024-01-02 2mb\n").unwrap();
        cache.store("third 2024-01-03 3mb\n").unwrap();

        assert_eq!(cache.load().unwrap(), "third 2024-01-03 3mb\n");
    }

    #[test]
    fn store_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let cache = ListingCache::new(dir.path().join("nested").join("cache").join("l.txt"));

        cache.store("x").unwrap();
        assert!(cache.path().exists());
    }

    #[test]
    fn missing_cache_is_an_error() {
        let dir = tempdir().unwrap();
        let cache = ListingCache::new(dir.path().join("absent.txt"));

        let err = cache.load().unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::CacheMissing);
    }
}
