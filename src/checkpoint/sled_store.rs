use std::path::Path;

use sled::{Batch, Db};

use crate::checkpoint::CheckpointStore;
use crate::core::encoding::CanonicalKey;
use crate::core::position::Outcome;
use crate::utils::prelude::*;

const META_PREFIX: &[u8] = b"meta/";

fn canonical_key_bytes(canonical: CanonicalKey) -> [u8; 8] {
    canonical.0.to_be_bytes()
}

fn decode_outcome(bytes: &[u8]) -> Result<Outcome> {
    let arr: [u8; 1] = bytes
        .try_into()
        .map_err(|_| anyhow!("checkpoint outcome value must be exactly 1 byte, got {}", bytes.len()))?;
    Outcome::from_value(i8::from_be_bytes(arr))
}

fn meta_key(key: &str) -> Vec<u8> {
    let mut full = META_PREFIX.to_vec();
    full.extend_from_slice(key.as_bytes());
    full
}

/// A durable [`CheckpointStore`] backed by `sled`, an embedded crash-safe
/// B-tree. Canonical keys are stored as their big-endian 8-byte form (the
/// same bytes as the external wire format, spec.md 6); outcomes as a single
/// signed byte. Meta counters share the same tree under a `meta/` key
/// prefix, so one file backs both maps and `scan_meta` is an ordinary
/// prefix scan.
pub struct SledCheckpointStore {
    db: Db,
}

impl SledCheckpointStore {
    pub fn open(path: impl AsRef<Path>) -> Result<SledCheckpointStore> {
        let db = sled::open(path).context("failed to open sled checkpoint store")?;
        Ok(SledCheckpointStore { db })
    }
}

impl CheckpointStore for SledCheckpointStore {
    fn put(&self, canonical: CanonicalKey, outcome: Outcome) -> Result<()> {
        self.db
            .insert(canonical_key_bytes(canonical), &[outcome.value() as u8])
            .context("sled insert failed")?;
        Ok(())
    }

    fn put_many(&self, entries: &[(CanonicalKey, Outcome)]) -> Result<()> {
        let mut batch = Batch::default();
        for &(canonical, outcome) in entries {
            batch.insert(&canonical_key_bytes(canonical), &outcome.value().to_be_bytes());
        }
        self.db.apply_batch(batch).context("sled batch write failed")?;
        Ok(())
    }

    fn put_meta(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(meta_key(key), value.as_bytes()).context("sled meta insert failed")?;
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<(CanonicalKey, Outcome)>> {
        let mut out = Vec::new();
        for entry in self.db.iter() {
            let (key, value) = entry.context("sled scan failed")?;
            if key.starts_with(META_PREFIX) {
                continue;
            }
            let key_arr: [u8; 8] = key
                .as_ref()
                .try_into()
                .map_err(|_| anyhow!("corrupt checkpoint key, expected 8 bytes, got {}", key.len()))?;
            out.push((CanonicalKey(u64::from_be_bytes(key_arr)), decode_outcome(&value)?));
        }
        Ok(out)
    }

    fn scan_meta(&self) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        for entry in self.db.scan_prefix(META_PREFIX) {
            let (key, value) = entry.context("sled meta scan failed")?;
            let name = String::from_utf8_lossy(&key[META_PREFIX.len()..]).into_owned();
            let value = String::from_utf8_lossy(&value).into_owned();
            out.push((name, value));
        }
        Ok(out)
    }

    fn clear(&self) -> Result<()> {
        self.db.clear().context("sled clear failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::Player;

    fn temp_store() -> SledCheckpointStore {
        let mut path = std::env::temp_dir();
        path.push(format!("gobblers-sled-test-{}", std::process::id()));
        SledCheckpointStore::open(path).unwrap()
    }

    #[test]
    fn put_many_then_scan_all_roundtrips() {
        let store = temp_store();
        store.clear().unwrap();
        let entries = [
            (CanonicalKey(0), Outcome::Draw),
            (CanonicalKey(1), Outcome::win_for(Player::P1)),
            (CanonicalKey(2), Outcome::win_for(Player::P2)),
        ];
        store.put_many(&entries).unwrap();

        let mut scanned = store.scan_all().unwrap();
        scanned.sort_by_key(|(k, _)| k.0);
        assert_eq!(scanned, entries.to_vec());
    }

    #[test]
    fn meta_scan_excludes_outcome_entries() {
        let store = temp_store();
        store.clear().unwrap();
        store.put(CanonicalKey(7), Outcome::Draw).unwrap();
        store.put_meta("max_depth", "12").unwrap();

        let meta = store.scan_meta().unwrap();
        assert_eq!(meta, vec![("max_depth".to_owned(), "12".to_owned())]);
    }
}
