//! Record Store collaborator.
//!
//! Rows describe outreach to projects: who was contacted, when the first
//! recording happened and when discussions took place. Rows are kept newest
//! first, so index 0 is the most recent entry.

pub mod dates;
pub mod reports;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::{PoisonError, RwLock},
};
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    pub ticker: String,
    pub project_name: String,
    pub x_handle: String,
    pub twitter_outreach: String,
    pub lock_status: String,
    pub contact_person: String,
    pub initial_recording_date: String,
    pub discussion_date: String,
}

impl Record {
    /// A record needs at least a ticker or a project name to be stored.
    #[must_use]
    pub fn is_identifiable(&self) -> bool {
        !self.ticker.trim().is_empty() || !self.project_name.trim().is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("Ticker or project name is required")]
    MissingIdentity,
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

/// Source of rows for the report endpoints.
pub trait RecordStore: Send + Sync {
    /// All rows, newest first.
    ///
    /// # Errors
    /// Returns `Unavailable` when the backing store cannot be read.
    fn rows(&self) -> Result<Vec<Record>, RecordStoreError>;

    /// Insert a record above every existing row.
    ///
    /// # Errors
    /// Returns `MissingIdentity` for records without ticker and project name.
    fn insert(&self, record: Record) -> Result<(), RecordStoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    rows: RwLock<Vec<Record>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new(rows: Vec<Record>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Seed the store from a JSON array of records.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a JSON array of records.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records file {}", path.display()))?;
        let rows: Vec<Record> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid records file {}", path.display()))?;
        info!("Loaded {} record(s) from {}", rows.len(), path.display());
        Ok(Self::new(rows))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryRecordStore {
    fn rows(&self) -> Result<Vec<Record>, RecordStoreError> {
        Ok(self
            .rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn insert(&self, record: Record) -> Result<(), RecordStoreError> {
        if !record.is_identifiable() {
            return Err(RecordStoreError::MissingIdentity);
        }
        debug!("Inserting record for {}", record.project_name);
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, record);
        Ok(())
    }
}
