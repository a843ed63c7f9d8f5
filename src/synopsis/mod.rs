//! Per-field approximate summaries.
//!
//! The synopsis kind set is closed, so the variants live in one exhaustively
//! matched enum rather than behind a trait object. Every variant answers
//! [`Synopsis::lookup`] with one-sided error: `true` means "might match",
//! `false` means "definitely no match".

mod bloom;
mod min_max;

pub use bloom::BloomFilterSynopsis;
pub use min_max::{MinMaxSynopsis, MinMaxValue, TimeSynopsis};

use crate::{
    bloom::BlockedBloomFilter,
    config::SiftConfig,
    error::DecodeError,
    expr::Predicate,
    scalar::ScalarValue,
    schema::{DataType, Field, SynopsisSpec},
    serdes::{Reader, Writer},
    timestamp::Timestamp,
};

/// One field's summary inside a partition sketch.
#[derive(Clone, Debug, PartialEq)]
pub enum Synopsis {
    /// Membership filter over hashed values; decides `==`/`in`.
    Bloom(BloomFilterSynopsis),
    /// Range over signed integers.
    Int(MinMaxSynopsis<i64>),
    /// Range over unsigned integers.
    UInt(MinMaxSynopsis<u64>),
    /// Range over floats.
    Float(MinMaxSynopsis<f64>),
    /// Range over timestamps.
    Time(TimeSynopsis),
}

const KIND_BLOOM: u8 = 0;
const KIND_INT: u8 = 1;
const KIND_UINT: u8 = 2;
const KIND_FLOAT: u8 = 3;
const KIND_TIME: u8 = 4;

impl Synopsis {
    /// Instantiate the synopsis a field calls for, if any.
    ///
    /// Timestamp fields always get a time synopsis; the attribute only tunes
    /// other kinds. A `minmax` attribute on a type without a natural order
    /// yields no synopsis.
    pub(crate) fn for_field(field: &Field, config: &SiftConfig) -> Option<Synopsis> {
        match field.synopsis {
            Some(SynopsisSpec::Bloom {
                expected_items,
                false_positive_rate,
            }) => Some(Synopsis::Bloom(BloomFilterSynopsis::new(
                expected_items,
                false_positive_rate,
            ))),
            Some(SynopsisSpec::BloomDefault) => Some(Synopsis::Bloom(BloomFilterSynopsis::new(
                config.default_bloom.expected_items,
                config.default_bloom.false_positive_rate,
            ))),
            Some(SynopsisSpec::MinMax) => match field.data_type {
                DataType::Int => Some(Synopsis::Int(MinMaxSynopsis::new())),
                DataType::UInt => Some(Synopsis::UInt(MinMaxSynopsis::new())),
                DataType::Float => Some(Synopsis::Float(MinMaxSynopsis::new())),
                DataType::Timestamp => Some(Synopsis::Time(TimeSynopsis::new())),
                DataType::Bool | DataType::Str | DataType::Bytes => None,
            },
            None => match field.data_type {
                DataType::Timestamp => Some(Synopsis::Time(TimeSynopsis::new())),
                _ => None,
            },
        }
    }

    /// Feed one observed value. Nulls and type-incompatible values are
    /// ignored; they can never widen what the synopsis may rule out.
    pub fn add(&mut self, value: &ScalarValue) {
        if value.is_null() {
            return;
        }
        match self {
            Synopsis::Bloom(s) => s.add(value),
            Synopsis::Int(s) => {
                if let Some(v) = <i64 as MinMaxValue>::from_scalar(value) {
                    s.add(v);
                }
            }
            Synopsis::UInt(s) => {
                if let Some(v) = <u64 as MinMaxValue>::from_scalar(value) {
                    s.add(v);
                }
            }
            Synopsis::Float(s) => {
                if let Some(v) = <f64 as MinMaxValue>::from_scalar(value) {
                    s.add(v);
                }
            }
            Synopsis::Time(s) => {
                if let Some(v) = <Timestamp as MinMaxValue>::from_scalar(value) {
                    s.add(v);
                }
            }
        }
    }

    /// Evaluate a predicate; `true` means "might match".
    pub fn lookup(&self, pred: &Predicate) -> bool {
        match self {
            Synopsis::Bloom(s) => s.lookup(pred),
            Synopsis::Int(s) => s.lookup(pred),
            Synopsis::UInt(s) => s.lookup(pred),
            Synopsis::Float(s) => s.lookup(pred),
            Synopsis::Time(s) => s.lookup(pred),
        }
    }

    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Synopsis::Bloom(_) => "bloomfilter",
            Synopsis::Int(_) => "minmax<i64>",
            Synopsis::UInt(_) => "minmax<u64>",
            Synopsis::Float(_) => "minmax<f64>",
            Synopsis::Time(_) => "minmax<time>",
        }
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        match self {
            Synopsis::Bloom(s) => {
                w.put_u8(KIND_BLOOM);
                w.put_u64(s.expected_items());
                w.put_f64(s.false_positive_rate());
                w.put_u32(s.filter().k());
                let words = s.filter().words();
                w.put_u32(words.len() as u32);
                for word in words {
                    w.put_u64(*word);
                }
            }
            Synopsis::Int(s) => {
                w.put_u8(KIND_INT);
                encode_range(w, s.bounds(), |w, v| w.put_i64(v));
            }
            Synopsis::UInt(s) => {
                w.put_u8(KIND_UINT);
                encode_range(w, s.bounds(), |w, v| w.put_u64(v));
            }
            Synopsis::Float(s) => {
                w.put_u8(KIND_FLOAT);
                encode_range(w, s.bounds(), |w, v| w.put_f64(v));
            }
            Synopsis::Time(s) => {
                w.put_u8(KIND_TIME);
                encode_range(w, s.bounds(), |w, v: Timestamp| w.put_i64(v.nanos()));
            }
        }
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let kind = r.u8()?;
        match kind {
            KIND_BLOOM => {
                let expected_items = r.u64()?;
                let false_positive_rate = r.f64()?;
                let k = r.u32()?;
                let num_words = r.u32()? as usize;
                let mut words = Vec::with_capacity(num_words);
                for _ in 0..num_words {
                    words.push(r.u64()?);
                }
                let filter = BlockedBloomFilter::from_parts(words, k)
                    .ok_or(DecodeError::UnexpectedEof(r.pos()))?;
                Ok(Synopsis::Bloom(BloomFilterSynopsis::from_parts(
                    expected_items,
                    false_positive_rate,
                    filter,
                )))
            }
            KIND_INT => decode_range(r, |r| r.i64()).map(Synopsis::Int),
            KIND_UINT => decode_range(r, |r| r.u64()).map(Synopsis::UInt),
            KIND_FLOAT => decode_range(r, |r| r.f64()).map(Synopsis::Float),
            KIND_TIME => {
                decode_range(r, |r| r.i64().map(Timestamp::from_nanos)).map(Synopsis::Time)
            }
            other => Err(DecodeError::UnknownSynopsisKind(other)),
        }
    }
}

fn encode_range<T: MinMaxValue>(
    w: &mut Writer,
    bounds: Option<(T, T)>,
    put: impl Fn(&mut Writer, T),
) {
    match bounds {
        Some((min, max)) => {
            w.put_u8(1);
            put(w, min);
            put(w, max);
        }
        None => w.put_u8(0),
    }
}

fn decode_range<T: MinMaxValue>(
    r: &mut Reader<'_>,
    get: impl Fn(&mut Reader<'_>) -> Result<T, DecodeError>,
) -> Result<MinMaxSynopsis<T>, DecodeError> {
    let mut out = MinMaxSynopsis::new();
    if r.u8()? != 0 {
        out.add(get(r)?);
        out.add(get(r)?);
    }
    Ok(out)
}
