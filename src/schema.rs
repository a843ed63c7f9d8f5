//! Row schema and per-field synopsis attributes.
//!
//! The schema is supplied by the external ingestion path. The only piece this
//! crate interprets is the optional synopsis attribute on a field, e.g.
//! `#synopsis=bloomfilter(1000,0.01)`. An unparsable or missing attribute
//! simply means the field gets no synopsis and every sketch lookup on it is
//! inconclusive.

use log::Level;

use crate::logging::sift_log;

/// Logical type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// Boolean.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    UInt,
    /// 64-bit float.
    Float,
    /// Event timestamp.
    Timestamp,
    /// UTF-8 string.
    Str,
    /// Raw bytes.
    Bytes,
}

/// Parsed synopsis attribute of a field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SynopsisSpec {
    /// `bloomfilter(n,p)`: Bloom filter sized for `n` distinct values at
    /// false-positive rate `p`.
    Bloom {
        /// Expected number of distinct values.
        expected_items: u64,
        /// Target false-positive rate.
        false_positive_rate: f64,
    },
    /// `bloomfilter` without arguments: sized from [`crate::SiftConfig`].
    BloomDefault,
    /// `minmax`: range summary over the observed values.
    MinMax,
}

impl SynopsisSpec {
    /// Parse a synopsis attribute string.
    ///
    /// Accepts the bare value (`bloomfilter(1000,0.01)`) or the full
    /// `#synopsis=` form. Returns `None` for anything unparsable; the caller
    /// treats that as "no synopsis".
    pub fn parse(attr: &str) -> Option<Self> {
        let attr = attr.trim();
        let attr = attr.strip_prefix("#synopsis=").unwrap_or(attr);
        match attr {
            "minmax" => return Some(SynopsisSpec::MinMax),
            "bloomfilter" => return Some(SynopsisSpec::BloomDefault),
            _ => {}
        }
        let inner = attr.strip_prefix("bloomfilter(")?.strip_suffix(')')?;
        let (n, p) = inner.split_once(',')?;
        let expected_items = n.trim().parse::<u64>().ok()?;
        let false_positive_rate = p.trim().parse::<f64>().ok()?;
        if expected_items == 0 || !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return None;
        }
        Some(SynopsisSpec::Bloom {
            expected_items,
            false_positive_rate,
        })
    }
}

/// A named, typed field with an optional synopsis attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Field name, unique within a schema.
    pub name: String,
    /// Logical type.
    pub data_type: DataType,
    /// Parsed synopsis attribute, if any.
    pub synopsis: Option<SynopsisSpec>,
}

impl Field {
    /// Create a field without a synopsis attribute.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            synopsis: None,
        }
    }

    /// Attach a synopsis attribute string, e.g. `bloomfilter(1000,0.01)`.
    ///
    /// Unparsable attributes are logged and ignored, leaving the field
    /// without a synopsis.
    pub fn with_attribute(mut self, attr: &str) -> Self {
        match SynopsisSpec::parse(attr) {
            Some(spec) => self.synopsis = Some(spec),
            None => {
                sift_log!(
                    Level::Debug,
                    "synopsis_attr_ignored",
                    "field={} attr={:?}",
                    self.name,
                    attr,
                );
            }
        }
        self
    }

    /// Attach an already-parsed synopsis spec.
    pub fn with_synopsis(mut self, spec: SynopsisSpec) -> Self {
        self.synopsis = Some(spec);
        self
    }
}

/// An ordered list of fields describing one row layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create a schema from its fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Find a field and its row position by name.
    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
    }
}
