mod memory;
mod sled_store;

pub use memory::MemoryCheckpointStore;
pub use sled_store::SledCheckpointStore;

use crate::core::encoding::CanonicalKey;
use crate::core::position::Outcome;
use crate::utils::prelude::*;

/// The keyed persistent map the solver core depends on, not on any specific
/// backing store (spec.md 6): canonical position to outcome, plus a small
/// set of scalar counters. Every fallible operation takes `&self` so a
/// single store can be shared behind a `Box<dyn CheckpointStore>` without
/// the solver needing exclusive access to it.
pub trait CheckpointStore: Send + Sync {
    fn put(&self, canonical: CanonicalKey, outcome: Outcome) -> Result<()>;

    /// Batched variant. Implementations must commit the whole batch
    /// atomically with respect to readers.
    fn put_many(&self, entries: &[(CanonicalKey, Outcome)]) -> Result<()>;

    fn put_meta(&self, key: &str, value: &str) -> Result<()>;

    fn scan_all(&self) -> Result<Vec<(CanonicalKey, Outcome)>>;

    fn scan_meta(&self) -> Result<Vec<(String, String)>>;

    fn clear(&self) -> Result<()>;
}
