use std::sync::Mutex;

use crate::checkpoint::CheckpointStore;
use crate::core::encoding::CanonicalKey;
use crate::core::position::Outcome;
use crate::utils::prelude::*;

/// An in-process, non-durable [`CheckpointStore`] backed by a mutex-guarded
/// hash map. Used by unit and property tests so they never touch the
/// filesystem.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    table: Mutex<HashMap<CanonicalKey, Outcome>>,
    meta: Mutex<HashMap<String, String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> MemoryCheckpointStore {
        MemoryCheckpointStore::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn put(&self, canonical: CanonicalKey, outcome: Outcome) -> Result<()> {
        self.table.lock().unwrap().insert(canonical, outcome);
        Ok(())
    }

    fn put_many(&self, entries: &[(CanonicalKey, Outcome)]) -> Result<()> {
        let mut table = self.table.lock().unwrap();
        for &(canonical, outcome) in entries {
            table.insert(canonical, outcome);
        }
        Ok(())
    }

    fn put_meta(&self, key: &str, value: &str) -> Result<()> {
        self.meta.lock().unwrap().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<(CanonicalKey, Outcome)>> {
        Ok(self.table.lock().unwrap().iter().map(|(&k, &v)| (k, v)).collect())
    }

    fn scan_meta(&self) -> Result<Vec<(String, String)>> {
        Ok(self.meta.lock().unwrap().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn clear(&self) -> Result<()> {
        self.table.lock().unwrap().clear();
        self.meta.lock().unwrap().clear();
        Ok(())
    }
}
