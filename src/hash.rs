//! Value hashing for filter input.

use xxhash_rust::xxh3::xxh3_64;

use crate::scalar::ScalarValue;

/// 64-bit digest of a scalar's stable byte encoding.
///
/// All filter membership goes through this one function so that build-time
/// and query-time hashing can never diverge.
pub(crate) fn hash_scalar(value: &ScalarValue) -> u64 {
    let mut buf = Vec::with_capacity(16);
    value.write_index_bytes(&mut buf);
    xxh3_64(&buf)
}
