//! Partition identifier generation.

use parking_lot::Mutex;
use ulid::Generator;

use crate::sketch::PartitionId;

/// Thread-safe, monotonic [`PartitionId`] generator.
///
/// ULIDs are time-ordered, which is what gives the catalog its newest-first
/// output order for free. One generator per ingestion path; IDs from
/// different generators still sort correctly by creation time.
pub struct PartitionIdGenerator {
    inner: Mutex<Generator>,
}

impl PartitionIdGenerator {
    /// Create a generator seeded with the current time.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Generator::new()),
        }
    }

    /// Produce the next [`PartitionId`] in a monotonic sequence.
    pub fn generate(&self) -> PartitionId {
        self.inner
            .lock()
            .generate()
            .expect("partition id generator should advance without error")
    }
}

impl Default for PartitionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
