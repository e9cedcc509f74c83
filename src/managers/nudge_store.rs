//! Nudge records, kept under `nudge_<id>`.
//!
//! Records are written by the plan executor and read by the nudge engine.
//! Running a nudge does not delete its record.

use std::collections::HashMap;

use log::warn;

use crate::managers::kv_store::KeyValueStore;
use crate::types::errors::StorageError;
use crate::types::nudge::NudgeRecord;
use crate::types::tab::TabId;

const KEY_PREFIX: &str = "nudge_";

pub struct NudgeStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> NudgeStore<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn key(tab_id: TabId) -> String {
        format!("{}{}", KEY_PREFIX, tab_id)
    }

    pub fn put(&self, tab_id: TabId, record: &NudgeRecord) -> Result<(), StorageError> {
        self.store
            .set(&Self::key(tab_id), &serde_json::to_value(record)?)
    }

    pub fn get(&self, tab_id: TabId) -> Result<Option<NudgeRecord>, StorageError> {
        match self.store.get(&Self::key(tab_id))? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn all(&self) -> Result<HashMap<TabId, NudgeRecord>, StorageError> {
        let mut records = HashMap::new();
        for (key, value) in self.store.entries_with_prefix(KEY_PREFIX)? {
            let tab_id = key[KEY_PREFIX.len()..].parse::<TabId>();
            let record = serde_json::from_value::<NudgeRecord>(value);
            match (tab_id, record) {
                (Ok(id), Ok(record)) => {
                    records.insert(id, record);
                }
                _ => warn!("Skipping unreadable nudge entry {}", key),
            }
        }
        Ok(records)
    }

    pub fn remove(&self, tab_id: TabId) -> Result<(), StorageError> {
        self.store.delete(&Self::key(tab_id))
    }
}
