use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::library_store::{
    LibraryRecords, LibraryStore as LibraryStoreTrait, Result, StoredRecords,
};

/// In-memory implementation of LibraryStore
///
/// Starts from the given stored records (all `None` simulates a fresh data directory)
/// and keeps the last saved snapshot so tests can inspect what would be written.
pub struct LibraryStore {
    stored: Mutex<StoredRecords>,
    saved: Mutex<Option<LibraryRecords>>,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::with_records(StoredRecords::default())
    }

    pub fn with_records(stored: StoredRecords) -> Self {
        Self {
            stored: Mutex::new(stored),
            saved: Mutex::new(None),
        }
    }

    /// Last snapshot passed to `save`
    pub fn saved(&self) -> Option<LibraryRecords> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for LibraryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryStoreTrait for LibraryStore {
    async fn load(&self) -> Result<StoredRecords> {
        Ok(self.stored.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    /// Keep the snapshot and make it what the next `load` returns
    async fn save(&self, records: &LibraryRecords) -> Result<()> {
        *self.stored.lock().unwrap_or_else(|e| e.into_inner()) = StoredRecords {
            books: Some(records.books.clone()),
            patrons: Some(records.patrons.clone()),
            loans: Some(records.loans.clone()),
            fines: Some(records.fines.clone()),
        };
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(records.clone());
        Ok(())
    }
}
