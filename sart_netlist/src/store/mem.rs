use std::sync::RwLock;

use sart_data_structures::FxIndexMap;

use super::{LevelRecord, LevelStore};
use crate::{Error, Result};

/// Keeps records in memory, in the order they were first saved.
#[derive(Debug, Default)]
pub struct MemStore {
    records: RwLock<FxIndexMap<String, LevelRecord>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LevelStore for MemStore {
    fn save(&self, record: &LevelRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| Error::Poisoned)?;
        records.insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<LevelRecord> {
        let records = self.records.read().map_err(|_| Error::Poisoned)?;
        records
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingLevel(name.to_string()))
    }

    fn level_names(&self) -> Result<Vec<String>> {
        let records = self.records.read().map_err(|_| Error::Poisoned)?;
        Ok(records.keys().cloned().collect())
    }
}
