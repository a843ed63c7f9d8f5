//! Explicit, process-scoped configuration.
//!
//! A [`SiftConfig`] is built once at startup and passed by reference into the
//! catalog and the sketch builders. There is no hidden global state: two
//! catalogs in one process can run with different configurations.

/// Sizing parameters for Bloom filter synopses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomParams {
    /// Expected number of distinct values per partition field.
    pub expected_items: u64,
    /// Target false-positive rate in `(0, 1)`.
    pub false_positive_rate: f64,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            expected_items: 16_384,
            false_positive_rate: 0.01,
        }
    }
}

/// Configuration for sketch construction and catalog bookkeeping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SiftConfig {
    /// Parameters used for `bloomfilter` attributes that carry no arguments.
    pub default_bloom: BloomParams,
    /// If set, a warning is logged when a sealed sketch exceeds this size.
    pub max_sketch_bytes: Option<usize>,
}
