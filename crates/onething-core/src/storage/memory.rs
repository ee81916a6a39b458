use std::collections::HashMap;
use std::sync::Mutex;

use super::StateStore;
use crate::error::Result;

/// In-process [`StateStore`], used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.records().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
