//! Compressed row-ID sets.
//!
//! [`Ids`] is a logically unbounded bit sequence indexed by event ID, stored
//! as coalesced fill runs. Equality and the set algebra are defined over the
//! decoded bit sequence, never over the run layout; the shorter operand of a
//! binary operation is implicitly zero-extended.

use std::ops::{BitAnd, BitOr, BitXor, Not, Range};

/// One maximal run of identical bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Fill {
    bit: bool,
    len: u64,
}

/// A compressed, append-only bit sequence representing a set of row IDs.
///
/// The materialized length is the highest position ever touched; positions
/// beyond it read as `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ids {
    // Invariant: no zero-length runs, adjacent runs have distinct bits.
    // Appends maintain this, so derived equality is content equality.
    runs: Vec<Fill>,
    len: u64,
}

impl Ids {
    /// The empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sequence of `len` copies of `bit`.
    pub fn with_bits(bit: bool, len: u64) -> Self {
        let mut ids = Self::new();
        ids.append_bits(bit, len);
        ids
    }

    /// Number of materialized bits.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether no bit was ever appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a single bit.
    pub fn append_bit(&mut self, bit: bool) {
        self.append_bits(bit, 1);
    }

    /// Append `count` copies of `bit`.
    pub fn append_bits(&mut self, bit: bool, count: u64) {
        if count == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.bit == bit => last.len += count,
            _ => self.runs.push(Fill { bit, len: count }),
        }
        self.len += count;
    }

    /// The bit at `pos`; positions past the end read as `false`.
    pub fn get(&self, pos: u64) -> bool {
        let mut offset = 0;
        for run in &self.runs {
            offset += run.len;
            if pos < offset {
                return run.bit;
            }
        }
        false
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u64 {
        self.runs.iter().filter(|r| r.bit).map(|r| r.len).sum()
    }

    /// Iterate over the decoded bits.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.runs
            .iter()
            .flat_map(|r| std::iter::repeat(r.bit).take(r.len as usize))
    }

    /// Iterate over the positions of set bits.
    pub fn ones(&self) -> impl Iterator<Item = u64> + '_ {
        let mut pos = 0u64;
        self.runs.iter().flat_map(move |r| {
            let start = pos;
            pos += r.len;
            let range = if r.bit { start..pos } else { start..start };
            range
        })
    }

    /// Bitwise AND; the shorter operand is zero-extended.
    pub fn and(&self, other: &Ids) -> Ids {
        binary(self, other, |a, b| a & b)
    }

    /// Bitwise OR; the shorter operand is zero-extended.
    pub fn or(&self, other: &Ids) -> Ids {
        binary(self, other, |a, b| a | b)
    }

    /// Bitwise XOR; the shorter operand is zero-extended.
    pub fn xor(&self, other: &Ids) -> Ids {
        binary(self, other, |a, b| a ^ b)
    }

    /// Complement over the materialized length.
    pub fn flip(&self) -> Ids {
        let runs = self
            .runs
            .iter()
            .map(|r| Fill {
                bit: !r.bit,
                len: r.len,
            })
            .collect();
        Ids {
            runs,
            len: self.len,
        }
    }
}

fn binary(lhs: &Ids, rhs: &Ids, f: impl Fn(bool, bool) -> bool) -> Ids {
    let total = lhs.len.max(rhs.len);
    let mut out = Ids::new();
    let mut lc = Cursor::new(&lhs.runs);
    let mut rc = Cursor::new(&rhs.runs);
    let mut pos = 0;
    while pos < total {
        let remaining = total - pos;
        let (lb, ln) = lc.peek(remaining);
        let (rb, rn) = rc.peek(remaining);
        let step = ln.min(rn);
        out.append_bits(f(lb, rb), step);
        lc.advance(step);
        rc.advance(step);
        pos += step;
    }
    out
}

/// Read position over a run list; past-the-end reads as an endless false run.
struct Cursor<'a> {
    runs: &'a [Fill],
    idx: usize,
    off: u64,
}

impl<'a> Cursor<'a> {
    fn new(runs: &'a [Fill]) -> Self {
        Self { runs, idx: 0, off: 0 }
    }

    fn peek(&self, cap: u64) -> (bool, u64) {
        match self.runs.get(self.idx) {
            Some(run) => (run.bit, (run.len - self.off).min(cap)),
            None => (false, cap),
        }
    }

    fn advance(&mut self, n: u64) {
        if let Some(run) = self.runs.get(self.idx) {
            self.off += n;
            if self.off >= run.len {
                self.idx += 1;
                self.off = 0;
            }
        }
    }
}

impl BitAnd for &Ids {
    type Output = Ids;

    fn bitand(self, rhs: Self) -> Ids {
        self.and(rhs)
    }
}

impl BitOr for &Ids {
    type Output = Ids;

    fn bitor(self, rhs: Self) -> Ids {
        self.or(rhs)
    }
}

impl BitXor for &Ids {
    type Output = Ids;

    fn bitxor(self, rhs: Self) -> Ids {
        self.xor(rhs)
    }
}

impl Not for &Ids {
    type Output = Ids;

    fn not(self) -> Ids {
        self.flip()
    }
}

/// Half-open row-ID range `[first, last)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdRange {
    /// First position in the range.
    pub first: u64,
    /// One past the last position.
    pub last: u64,
}

impl From<u64> for IdRange {
    fn from(pos: u64) -> Self {
        IdRange {
            first: pos,
            last: pos + 1,
        }
    }
}

impl From<(u64, u64)> for IdRange {
    fn from((first, last): (u64, u64)) -> Self {
        IdRange { first, last }
    }
}

impl From<Range<u64>> for IdRange {
    fn from(r: Range<u64>) -> Self {
        IdRange {
            first: r.start,
            last: r.end,
        }
    }
}

/// Build the [`Ids`] marking the union of half-open ranges.
///
/// Positions inside any range read as `!default_bit`, everything else as
/// `default_bit`; total length is `max(min_size, max(range.last))`. The
/// result is independent of range order and overlap: equivalent range lists
/// always yield bit-identical sequences.
pub fn make_ids<R>(ranges: impl IntoIterator<Item = R>, min_size: u64, default_bit: bool) -> Ids
where
    R: Into<IdRange>,
{
    let mut ranges: Vec<IdRange> = ranges
        .into_iter()
        .map(Into::into)
        .filter(|r| r.first < r.last)
        .collect();
    ranges.sort_by_key(|r| (r.first, r.last));
    let mut ids = Ids::new();
    let mut pos = 0u64;
    for range in ranges {
        // Overlapping or contained ranges collapse into the covered prefix.
        let last = range.last.max(pos);
        let first = range.first.max(pos);
        if first > pos {
            ids.append_bits(default_bit, first - pos);
        }
        ids.append_bits(!default_bit, last - first);
        pos = last;
    }
    if pos < min_size {
        ids.append_bits(default_bit, min_size - pos);
    }
    ids
}
