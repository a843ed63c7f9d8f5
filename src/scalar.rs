//! Typed field values and predicate literals.

use std::cmp::Ordering;

use crate::timestamp::Timestamp;

/// An owned, typed value as it appears in a row or a predicate literal.
///
/// `ScalarValue` carries a total order so that it can key ordered maps and
/// drive range comparisons: values of the same kind compare naturally, values
/// of different kinds compare by kind rank, and floats use IEEE `total_cmp`
/// (no `NaN` panics).
#[derive(Clone, Debug)]
pub enum ScalarValue {
    /// Absent value. Nulls never enter synopses or value bitmaps.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer.
    UInt(u64),
    /// 64-bit float.
    Float(f64),
    /// Event timestamp.
    Timestamp(Timestamp),
    /// UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl ScalarValue {
    /// Whether this value is the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Stable byte encoding used for hashing into Bloom filters.
    ///
    /// The tag byte keeps values of different kinds from colliding (e.g.
    /// `Int(1)` vs `UInt(1)`), and the encoding never changes across versions
    /// because sealed filters outlive the process that built them.
    pub(crate) fn write_index_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            ScalarValue::Null => buf.push(0),
            ScalarValue::Bool(v) => {
                buf.push(1);
                buf.push(*v as u8);
            }
            ScalarValue::Int(v) => {
                buf.push(2);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            ScalarValue::UInt(v) => {
                buf.push(3);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            ScalarValue::Float(v) => {
                buf.push(4);
                // -0.0 and 0.0 hash alike; they are distinct under total_cmp
                // but equal for membership purposes.
                let v = if *v == 0.0 { 0.0 } else { *v };
                buf.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            ScalarValue::Timestamp(v) => {
                buf.push(5);
                buf.extend_from_slice(&v.nanos().to_le_bytes());
            }
            ScalarValue::Str(v) => {
                buf.push(6);
                buf.extend_from_slice(v.as_bytes());
            }
            ScalarValue::Bytes(v) => {
                buf.push(7);
                buf.extend_from_slice(v);
            }
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            ScalarValue::Null => 0,
            ScalarValue::Bool(_) => 1,
            ScalarValue::Int(_) => 2,
            ScalarValue::UInt(_) => 3,
            ScalarValue::Float(_) => 4,
            ScalarValue::Timestamp(_) => 5,
            ScalarValue::Str(_) => 6,
            ScalarValue::Bytes(_) => 7,
        }
    }

    /// The value if it is a signed integer.
    ///
    /// Strict on kind: `UInt` literals do not coerce. Predicate literals must
    /// match the field type; a mismatched literal is inconclusive at the
    /// sketch level and matches no rows at the index level.
    pub(crate) fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value if it is an unsigned integer. Strict on kind, like
    /// [`ScalarValue::as_int`].
    pub(crate) fn as_uint(&self) -> Option<u64> {
        match self {
            ScalarValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a non-`NaN` `f64`.
    pub(crate) fn as_float(&self) -> Option<f64> {
        match self {
            ScalarValue::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// The value as a timestamp.
    pub(crate) fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            ScalarValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a string slice.
    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScalarValue {}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScalarValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use ScalarValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (UInt(a), UInt(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Str(a), Str(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int(v)
    }
}

impl From<u64> for ScalarValue {
    fn from(v: u64) -> Self {
        ScalarValue::UInt(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float(v)
    }
}

impl From<Timestamp> for ScalarValue {
    fn from(v: Timestamp) -> Self {
        ScalarValue::Timestamp(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Str(v.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Str(v)
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(v: Vec<u8>) -> Self {
        ScalarValue::Bytes(v)
    }
}
