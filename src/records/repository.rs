//! Record repositories
//!
//! Records are plain JSON objects keyed by the resource's identity field.
//! The repository does not know about schemas; validation happens in the
//! model before anything reaches it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;

use crate::schema::atomic_write;

use super::errors::{RecordError, RecordResult};

/// Record repository trait
///
/// Abstracts the document store behind the record routes.
pub trait RecordRepository: Send + Sync {
    /// Find a record by id
    fn find(&self, id: &str) -> RecordResult<Option<Value>>;

    /// All records, in insertion order
    fn find_all(&self) -> RecordResult<Vec<Value>>;

    /// Store a new record
    fn insert(&self, record: Value) -> RecordResult<()>;

    /// Replace an existing record
    fn replace(&self, id: &str, record: Value) -> RecordResult<()>;

    /// Delete a record
    fn remove(&self, id: &str) -> RecordResult<()>;
}

fn record_id<'a>(record: &'a Value, id_field: &str) -> Option<&'a str> {
    record.get(id_field).and_then(Value::as_str)
}

fn insert_into(records: &mut Vec<Value>, id_field: &str, record: Value) -> RecordResult<()> {
    let id = record_id(&record, id_field)
        .ok_or_else(|| RecordError::BadInput(format!("The field '{}' is not present", id_field)))?;

    if records.iter().any(|r| record_id(r, id_field) == Some(id)) {
        return Err(RecordError::AlreadyExists(id.to_string()));
    }

    records.push(record);
    Ok(())
}

fn replace_in(records: &mut [Value], id_field: &str, id: &str, record: Value) -> RecordResult<()> {
    let existing = records
        .iter_mut()
        .find(|r| record_id(r, id_field) == Some(id))
        .ok_or(RecordError::NotFound)?;
    *existing = record;
    Ok(())
}

fn remove_from(records: &mut Vec<Value>, id_field: &str, id: &str) -> RecordResult<()> {
    let len_before = records.len();
    records.retain(|r| record_id(r, id_field) != Some(id));

    if records.len() == len_before {
        Err(RecordError::NotFound)
    } else {
        Ok(())
    }
}

/// In-memory record repository
#[derive(Debug)]
pub struct InMemoryRecordRepository {
    id_field: &'static str,
    records: RwLock<Vec<Value>>,
}

impl InMemoryRecordRepository {
    pub fn new(id_field: &'static str) -> Self {
        Self {
            id_field,
            records: RwLock::new(Vec::new()),
        }
    }
}

impl RecordRepository for InMemoryRecordRepository {
    fn find(&self, id: &str) -> RecordResult<Option<Value>> {
        let records = self
            .records
            .read()
            .map_err(|_| RecordError::Storage("Lock poisoned".to_string()))?;
        Ok(records.iter().find(|r| record_id(r, self.id_field) == Some(id)).cloned())
    }

    fn find_all(&self) -> RecordResult<Vec<Value>> {
        let records = self
            .records
            .read()
            .map_err(|_| RecordError::Storage("Lock poisoned".to_string()))?;
        Ok(records.clone())
    }

    fn insert(&self, record: Value) -> RecordResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RecordError::Storage("Lock poisoned".to_string()))?;
        insert_into(&mut records, self.id_field, record)
    }

    fn replace(&self, id: &str, record: Value) -> RecordResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RecordError::Storage("Lock poisoned".to_string()))?;
        replace_in(&mut records, self.id_field, id, record)
    }

    fn remove(&self, id: &str) -> RecordResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RecordError::Storage("Lock poisoned".to_string()))?;
        remove_from(&mut records, self.id_field, id)
    }
}

/// Record repository persisted as a single JSON array file.
///
/// Every mutation rewrites the file atomically before it becomes visible.
#[derive(Debug)]
pub struct JsonFileRecordRepository {
    id_field: &'static str,
    path: PathBuf,
    records: RwLock<Vec<Value>>,
}

impl JsonFileRecordRepository {
    /// Opens the repository, reading existing records if the file exists.
    pub fn open(path: impl Into<PathBuf>, id_field: &'static str) -> RecordResult<Self> {
        let path = path.into();

        let records = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                RecordError::Storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str::<Vec<Value>>(&content).map_err(|e| {
                RecordError::Storage(format!("Invalid record file {}: {}", path.display(), e))
            })?
        } else {
            Vec::new()
        };

        Ok(Self {
            id_field,
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &[Value]) -> RecordResult<()> {
        let content = serde_json::to_vec_pretty(records)
            .map_err(|e| RecordError::Storage(format!("Failed to serialize records: {}", e)))?;

        let temp = self.path.with_extension("json.tmp");
        atomic_write(&self.path, &temp, &content).map_err(|e| {
            RecordError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    /// Applies `change` to a copy, persists the copy, then makes it visible.
    fn mutate<F>(&self, change: F) -> RecordResult<()>
    where
        F: FnOnce(&mut Vec<Value>) -> RecordResult<()>,
    {
        let mut records = self
            .records
            .write()
            .map_err(|_| RecordError::Storage("Lock poisoned".to_string()))?;

        let mut next = records.clone();
        change(&mut next)?;
        self.persist(&next)?;
        *records = next;
        Ok(())
    }
}

impl RecordRepository for JsonFileRecordRepository {
    fn find(&self, id: &str) -> RecordResult<Option<Value>> {
        let records = self
            .records
            .read()
            .map_err(|_| RecordError::Storage("Lock poisoned".to_string()))?;
        Ok(records.iter().find(|r| record_id(r, self.id_field) == Some(id)).cloned())
    }

    fn find_all(&self) -> RecordResult<Vec<Value>> {
        let records = self
            .records
            .read()
            .map_err(|_| RecordError::Storage("Lock poisoned".to_string()))?;
        Ok(records.clone())
    }

    fn insert(&self, record: Value) -> RecordResult<()> {
        self.mutate(|records| insert_into(records, self.id_field, record))
    }

    fn replace(&self, id: &str, record: Value) -> RecordResult<()> {
        self.mutate(|records| replace_in(records, self.id_field, id, record))
    }

    fn remove(&self, id: &str) -> RecordResult<()> {
        self.mutate(|records| remove_from(records, self.id_field, id))
    }
}
