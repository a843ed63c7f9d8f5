//! Bloom filter synopses for equality pruning.

use std::f64::consts::LN_2;

use crate::{
    bloom::BlockedBloomFilter,
    expr::{ComparisonOp, Predicate},
    hash::hash_scalar,
    scalar::ScalarValue,
};

/// Approximate membership summary over the distinct values of one field.
///
/// Sized with the classic Bloom formulas for `n` expected distinct values at
/// false-positive rate `p`: `m = ceil(-n·ln(p)/ln²2)` bits and
/// `k = round(m/n·ln 2)` probes. Only decides `==` (and `in` as a disjunction
/// of `==`); every other operator is inconclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilterSynopsis {
    expected_items: u64,
    false_positive_rate: f64,
    filter: BlockedBloomFilter,
}

impl BloomFilterSynopsis {
    /// Create a synopsis sized for `n` distinct values at false-positive
    /// rate `p`. Out-of-range parameters are clamped to sane values rather
    /// than rejected; the sketch builder has no error channel for them.
    pub fn new(expected_items: u64, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1);
        let p = false_positive_rate.clamp(1e-6, 0.5);
        let m = (-(n as f64) * p.ln() / (LN_2 * LN_2)).ceil();
        let k = ((m / n as f64) * LN_2).round() as u32;
        Self {
            expected_items: n,
            false_positive_rate: p,
            filter: BlockedBloomFilter::with_bits(m as u64, k.max(1)),
        }
    }

    /// Rebuild from serialized parts.
    pub(crate) fn from_parts(
        expected_items: u64,
        false_positive_rate: f64,
        filter: BlockedBloomFilter,
    ) -> Self {
        Self {
            expected_items,
            false_positive_rate,
            filter,
        }
    }

    /// Expected distinct count the filter was sized for.
    pub fn expected_items(&self) -> u64 {
        self.expected_items
    }

    /// Target false-positive rate the filter was sized for.
    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    pub(crate) fn filter(&self) -> &BlockedBloomFilter {
        &self.filter
    }

    /// Insert one observed value.
    pub fn add(&mut self, value: &ScalarValue) {
        self.filter.add(hash_scalar(value));
    }

    /// Evaluate a predicate; `true` means "might match".
    pub fn lookup(&self, pred: &Predicate) -> bool {
        match pred.op() {
            ComparisonOp::Eq => self.filter.contains(hash_scalar(pred.value())),
            ComparisonOp::In => pred
                .set()
                .iter()
                .any(|v| self.filter.contains(hash_scalar(v))),
            // A membership filter cannot decide ordering, inequality, or
            // pattern matches.
            _ => true,
        }
    }
}
