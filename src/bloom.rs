//! Cache-friendly blocked Bloom filter.
//!
//! The bit array is split into 512-bit blocks (one cache line). Every element
//! hashes to exactly one block and to `k` bit positions inside it, so a
//! membership probe touches a single cache line no matter how large the
//! filter grows. The price is a slightly worse false-positive rate than an
//! unblocked filter of the same size.

/// Bits per block; one x86 cache line.
const BLOCK_BITS: u64 = 512;
/// 64-bit words per block.
const BLOCK_WORDS: usize = 8;

/// A fixed-size Bloom filter with cache-line-confined probes.
///
/// No remove operation and no false negatives; the false-positive rate is
/// tuned through total size and `k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockedBloomFilter {
    words: Vec<u64>,
    num_blocks: u64,
    k: u32,
}

impl BlockedBloomFilter {
    /// Create a filter with at least `total_bits` bits and `k` probes per
    /// element. The size is rounded up to whole blocks; `k` is clamped to
    /// `1..=64`.
    pub fn with_bits(total_bits: u64, k: u32) -> Self {
        let num_blocks = total_bits.div_ceil(BLOCK_BITS).max(1);
        Self {
            words: vec![0u64; num_blocks as usize * BLOCK_WORDS],
            num_blocks,
            k: k.clamp(1, 64),
        }
    }

    /// Rebuild a filter from its serialized parts.
    pub(crate) fn from_parts(words: Vec<u64>, k: u32) -> Option<Self> {
        if words.is_empty() || words.len() % BLOCK_WORDS != 0 {
            return None;
        }
        let num_blocks = (words.len() / BLOCK_WORDS) as u64;
        Some(Self {
            words,
            num_blocks,
            k: k.clamp(1, 64),
        })
    }

    /// Total number of bits.
    pub fn bit_len(&self) -> u64 {
        self.num_blocks * BLOCK_BITS
    }

    /// Number of probes per element.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Raw filter words, for serialization.
    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }

    /// Insert a hashed element.
    pub fn add(&mut self, hash: u64) {
        let base = self.block_base(hash);
        let (h1, h2) = Self::split(hash);
        for i in 0..self.k {
            let bit = Self::probe(h1, h2, i);
            self.words[base + (bit / 64) as usize] |= 1u64 << (bit % 64);
        }
    }

    /// Whether a hashed element may have been inserted.
    pub fn contains(&self, hash: u64) -> bool {
        let base = self.block_base(hash);
        let (h1, h2) = Self::split(hash);
        (0..self.k).all(|i| {
            let bit = Self::probe(h1, h2, i);
            self.words[base + (bit / 64) as usize] & (1u64 << (bit % 64)) != 0
        })
    }

    /// First word index of the block selected by `hash`.
    fn block_base(&self, hash: u64) -> usize {
        // Multiply-shift maps the high hash bits uniformly onto block indices
        // without a modulo.
        let block = ((u128::from(hash >> 32) * u128::from(self.num_blocks)) >> 32) as usize;
        block * BLOCK_WORDS
    }

    fn split(hash: u64) -> (u32, u32) {
        // Double hashing within the block: h1 + i*h2, h2 forced odd.
        (hash as u32, (hash >> 32) as u32 | 1)
    }

    fn probe(h1: u32, h2: u32, i: u32) -> u64 {
        u64::from(h1.wrapping_add(i.wrapping_mul(h2))) % BLOCK_BITS
    }
}
