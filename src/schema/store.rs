//! Schema persistence
//!
//! The store holds exactly one document and only supports whole-document
//! overwrite. `FileSchemaStore::save` is crash-safe:
//! 1. serialize to `<file>.tmp`
//! 2. fsync the temp file
//! 3. rename over the target
//! 4. fsync the parent directory
//!
//! A crash at any step leaves either the old or the new document on disk,
//! never a partial one.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use super::errors::{SchemaError, SchemaResult};
use super::types::SchemaDocument;
use super::validator::FieldValidator;

/// Durable holder of the current schema document.
pub trait SchemaStore: Send + Sync {
    /// Reads the persisted document
    fn load(&self) -> SchemaResult<SchemaDocument>;

    /// Replaces the persisted document
    fn save(&self, document: &SchemaDocument) -> SchemaResult<()>;
}

/// File-backed schema store.
pub struct FileSchemaStore {
    path: PathBuf,
}

impl FileSchemaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a document only if no file exists yet. Used for seeding.
    pub fn create(&self, document: &SchemaDocument) -> SchemaResult<()> {
        if self.path.exists() {
            return Err(SchemaError::internal(format!(
                "Schema file '{}' already exists",
                self.path.display()
            )));
        }
        self.save(document)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SchemaStore for FileSchemaStore {
    fn load(&self) -> SchemaResult<SchemaDocument> {
        let display = self.path.display().to_string();

        let content = fs::read_to_string(&self.path).map_err(|e| {
            SchemaError::malformed_schema(&display, format!("Failed to read file: {}", e))
        })?;

        let document: SchemaDocument = serde_json::from_str(&content)
            .map_err(|e| SchemaError::malformed_schema(&display, format!("Invalid JSON: {}", e)))?;

        FieldValidator::validate_document(&document)?;

        Ok(document)
    }

    fn save(&self, document: &SchemaDocument) -> SchemaResult<()> {
        let content = serde_json::to_string_pretty(document)
            .map_err(|e| SchemaError::internal(format!("Failed to serialize schema: {}", e)))?;

        atomic_write(&self.path, &self.temp_path(), content.as_bytes()).map_err(|e| {
            SchemaError::internal(format!(
                "Failed to persist schema '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Writes `bytes` to `path` through `temp`, with fsync before and after the rename.
pub(crate) fn atomic_write(path: &Path, temp: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    {
        let mut file = File::create(temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(temp, path) {
        let _ = fs::remove_file(temp);
        return Err(e);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fsync_dir(parent)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// In-memory schema store.
///
/// Can be switched into a failing mode to exercise persistence errors.
pub struct MemorySchemaStore {
    document: RwLock<SchemaDocument>,
    fail_saves: Mutex<bool>,
}

impl MemorySchemaStore {
    pub fn new(document: SchemaDocument) -> Self {
        Self {
            document: RwLock::new(document),
            fail_saves: Mutex::new(false),
        }
    }

    /// Makes every subsequent `save` fail (or succeed again)
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.lock() {
            *flag = fail;
        }
    }
}

impl SchemaStore for MemorySchemaStore {
    fn load(&self) -> SchemaResult<SchemaDocument> {
        let document = self
            .document
            .read()
            .map_err(|_| SchemaError::internal("Lock poisoned"))?;
        Ok(document.clone())
    }

    fn save(&self, document: &SchemaDocument) -> SchemaResult<()> {
        let failing = self
            .fail_saves
            .lock()
            .map_err(|_| SchemaError::internal("Lock poisoned"))?;
        if *failing {
            return Err(SchemaError::internal("Schema store is unavailable"));
        }

        let mut current = self
            .document
            .write()
            .map_err(|_| SchemaError::internal("Lock poisoned"))?;
        *current = document.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldCatalog, FieldDefinition, FieldType, ScalarType, SchemaErrorKind, VersionTag};
    use tempfile::TempDir;

    fn sample_document() -> SchemaDocument {
        let mut fields = FieldCatalog::new();
        fields.insert(
            "financeID",
            FieldDefinition::new(FieldType::Scalar(ScalarType::String)).required().system(),
        );
        fields.insert("amount", FieldDefinition::new(FieldType::Scalar(ScalarType::Number)));
        SchemaDocument::new("finance", "finances", "financesHistory", VersionTag::Number(1), fields)
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSchemaStore::new(temp_dir.path().join("schema").join("finance.json"));

        store.save(&sample_document()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, sample_document());

        // No temp file left behind
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_save_overwrites_whole_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSchemaStore::new(temp_dir.path().join("finance.json"));
        store.save(&sample_document()).unwrap();

        let mut next = sample_document();
        next.fields.remove("amount");
        store.save(&next).unwrap();

        let loaded = store.load().unwrap();
        assert!(!loaded.fields.contains("amount"));
        assert_eq!(loaded.fields.len(), 1);
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSchemaStore::new(temp_dir.path().join("finance.json"));

        store.create(&sample_document()).unwrap();
        assert!(store.create(&sample_document()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSchemaStore::new(temp_dir.path().join("absent.json"));

        let err = store.load().unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::Internal);
        assert!(err.message().contains("absent.json"));
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = FileSchemaStore::new(&path).load().unwrap_err();
        assert!(err.message().contains("Invalid JSON"));
    }

    #[test]
    fn test_memory_store_failure_mode() {
        let store = MemorySchemaStore::new(sample_document());
        store.set_fail_saves(true);

        let mut next = sample_document();
        next.fields.remove("amount");
        assert!(store.save(&next).is_err());
        assert_eq!(store.load().unwrap(), sample_document());

        store.set_fail_saves(false);
        store.save(&next).unwrap();
        assert_eq!(store.load().unwrap(), next);
    }
}
