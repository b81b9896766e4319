// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities.

use parking_lot::Mutex;
use serde_json::Value;

use crate::codec::document;
use crate::error::{Error, Result};
use crate::storage::{select_page, ListQuery, Storage};
use crate::trial::Trial;

/// In-memory storage backend for tests.
///
/// Runs every save and load through the document codec so tests exercise
/// the same round trip the real backends do. Listing returns the most
/// recently saved trials first.
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<Vec<(String, Value)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn save(&self, trial: &Trial) -> Result<String> {
        let key = trial.uuid().to_string();
        let doc = document::encode(trial);

        let mut records = self.records.lock();
        match records.iter_mut().find(|(stored, _)| *stored == key) {
            Some((_, existing)) => *existing = doc,
            None => records.push((key.clone(), doc)),
        }
        Ok(key)
    }

    fn get(&self, trial_id: &str) -> Result<Trial> {
        let records = self.records.lock();
        let doc = records
            .iter()
            .find(|(key, _)| key == trial_id)
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| Error::NotFound(trial_id.to_string()))?;
        document::decode(&doc)
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Trial>> {
        let records = self.records.lock();
        let trials: Vec<Trial> = records
            .iter()
            .rev()
            .map(|(_, doc)| document::decode(doc))
            .collect::<Result<_>>()?;
        Ok(select_page(trials, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_overwrites_by_uuid() {
        let storage = MemoryStorage::new();
        let mut trial = Trial::new("t");

        storage.save(&trial).unwrap();
        trial.add_tag("rerun");
        storage.save(&trial).unwrap();

        assert_eq!(storage.len(), 1);
        let recovered = storage.get(&trial.uuid().to_string()).unwrap();
        assert_eq!(recovered.tags(), &["rerun".to_string()]);
    }

    #[test]
    fn test_memory_storage_get_missing() {
        let storage = MemoryStorage::new();
        assert!(matches!(storage.get("missing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_memory_storage_lists_newest_first() {
        let storage = MemoryStorage::new();
        storage.save(&Trial::new("old")).unwrap();
        storage.save(&Trial::new("new")).unwrap();

        let trials = storage.list(&ListQuery::new()).unwrap();
        let names: Vec<&str> = trials.iter().map(Trial::name).collect();
        assert_eq!(names, vec!["new", "old"]);
    }
}
