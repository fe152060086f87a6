//! Persistence for memo lines.
//!
//! The store hands the full line list to its repository after every change
//! and reads it back once at construction.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use super::line::MemoLine;
use crate::files;

/// Errors reading or writing persisted memo state.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Filesystem access failed.
    #[error("memo storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Stored content could not be parsed.
    #[error("memo storage at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Lines could not be serialized.
    #[error("failed to serialize memo: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Loads and saves the full memo line list.
pub trait MemoRepository {
    /// Read the persisted lines. Missing state is an empty memo, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the state exists but cannot be read or parsed.
    fn load(&self) -> Result<Vec<MemoLine>, RepositoryError>;

    /// Replace the persisted lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines cannot be written.
    fn save(&self, lines: &[MemoLine]) -> Result<(), RepositoryError>;
}

/// Stores the memo as one JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Create a repository backed by the file at `path`.
    ///
    /// Nothing is touched on disk until the first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> RepositoryError {
        RepositoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl MemoRepository for JsonFileRepository {
    fn load(&self) -> Result<Vec<MemoLine>, RepositoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| RepositoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, lines: &[MemoLine]) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(lines).map_err(RepositoryError::Serialize)?;

        files::write_atomic(&self.path, json).map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), lines = lines.len(), "memo saved");
        Ok(())
    }
}

/// Keeps the memo in process memory.
///
/// Clones share the same storage, so a test can hand one clone to a store
/// and inspect the other, or build a second store over the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    lines: Arc<Mutex<Vec<MemoLine>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given persisted lines.
    #[must_use]
    pub fn with_lines(lines: Vec<MemoLine>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
        }
    }

    /// Copy of what is currently persisted.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MemoLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MemoRepository for InMemoryRepository {
    fn load(&self) -> Result<Vec<MemoLine>, RepositoryError> {
        Ok(self.snapshot())
    }

    fn save(&self, lines: &[MemoLine]) -> Result<(), RepositoryError> {
        *self.lines.lock().unwrap_or_else(PoisonError::into_inner) = lines.to_vec();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use tooldepot_core::Product;

    use super::*;

    fn sample_lines() -> Vec<MemoLine> {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Hex Bolt",
            "variants": [
                { "id": "m8", "name": "M8", "price": "12.50", "stock": "400", "unit": "pcs" },
                { "id": "m10", "name": "M10", "price": "15", "stock": "250", "unit": "pcs" }
            ]
        }))
        .unwrap();

        product
            .variants
            .iter()
            .enumerate()
            .map(|(i, variant)| MemoLine::new(&product, variant, Decimal::from(i + 1)))
            .collect()
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("memo.json"));

        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("nested/dir/memo.json"));
        let lines = sample_lines();

        repo.save(&lines).unwrap();

        assert_eq!(repo.load().unwrap(), lines);
        assert!(!files::temp_path(repo.path()).exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("memo.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileRepository::new(&path).load().unwrap_err();
        assert!(matches!(err, RepositoryError::Corrupt { .. }));
    }

    #[test]
    fn test_blank_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("memo.json");
        fs::write(&path, "\n").unwrap();

        assert!(JsonFileRepository::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_in_memory_clones_share_storage() {
        let repo = InMemoryRepository::new();
        let other = repo.clone();

        repo.save(&sample_lines()).unwrap();

        assert_eq!(other.load().unwrap().len(), 2);
    }
}
