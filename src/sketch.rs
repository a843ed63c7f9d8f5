//! Per-partition sketches: one synopsis per summarized field.
//!
//! A sketch is built once while the partition is open, frozen at seal time,
//! and serialized into a single immutable blob. At query time the catalog
//! evaluates expression trees against it with one-sided error.

use std::collections::BTreeMap;

use log::Level;
use ulid::Ulid;

use crate::{
    config::SiftConfig,
    error::DecodeError,
    expr::{Expr, Predicate},
    logging::sift_log,
    scalar::ScalarValue,
    schema::Schema,
    serdes::{Reader, Writer},
    synopsis::Synopsis,
};

/// Identifier of an immutable data partition.
pub type PartitionId = Ulid;

/// Blob header magic: `SIFT`.
const SKETCH_MAGIC: u32 = 0x5349_4654;
/// Current blob format version.
const SKETCH_VERSION: u8 = 1;

/// Accumulates synopses for one partition while it is open.
///
/// Single-threaded by design: the external ingestion path drives it, and the
/// finished sketch is what gets shared.
#[derive(Debug)]
pub struct PartitionSketchBuilder<'a> {
    schema: &'a Schema,
    // (row position, field name, synopsis) for each summarized field.
    builders: Vec<(usize, String, Synopsis)>,
    rows: u64,
}

impl<'a> PartitionSketchBuilder<'a> {
    /// Set up a synopsis for every field whose type calls for one.
    pub fn new(schema: &'a Schema, config: &SiftConfig) -> Self {
        let builders = schema
            .fields()
            .iter()
            .enumerate()
            .filter_map(|(idx, field)| {
                Synopsis::for_field(field, config)
                    .map(|synopsis| (idx, field.name.clone(), synopsis))
            })
            .collect();
        Self {
            schema,
            builders,
            rows: 0,
        }
    }

    /// Feed one row, laid out in schema field order.
    pub fn add_row(&mut self, values: &[ScalarValue]) {
        debug_assert_eq!(values.len(), self.schema.fields().len());
        for (idx, _, synopsis) in &mut self.builders {
            if let Some(value) = values.get(*idx) {
                synopsis.add(value);
            }
        }
        self.rows += 1;
    }

    /// Seal the sketch. The builder is consumed; the result never mutates.
    pub fn finish(self, partition_id: PartitionId) -> PartitionSketch {
        let fields: BTreeMap<String, Synopsis> = self
            .builders
            .into_iter()
            .map(|(_, name, synopsis)| (name, synopsis))
            .collect();
        sift_log!(
            Level::Debug,
            "sketch_sealed",
            "partition={} rows={} fields={}",
            partition_id,
            self.rows,
            fields.len(),
        );
        PartitionSketch {
            partition_id,
            rows: self.rows,
            fields,
        }
    }
}

/// Immutable per-partition summary: field name to synopsis.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionSketch {
    partition_id: PartitionId,
    rows: u64,
    fields: BTreeMap<String, Synopsis>,
}

impl PartitionSketch {
    /// The partition this sketch summarizes.
    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// Number of rows the partition held at seal time.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// The synopsis for a field, if the field carries one.
    pub fn synopsis(&self, field: &str) -> Option<&Synopsis> {
        self.fields.get(field)
    }

    /// Evaluate one predicate; `true` means "might match".
    ///
    /// A field without a synopsis is always inconclusive.
    pub fn lookup(&self, pred: &Predicate) -> bool {
        match self.fields.get(pred.field()) {
            Some(synopsis) => synopsis.lookup(pred),
            None => true,
        }
    }

    /// Evaluate an expression tree; `true` means "might match".
    ///
    /// Negated sub-trees are always inconclusive: a structure with one-sided
    /// error cannot be negated without risking false negatives.
    pub fn matches(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Pred(pred) => self.lookup(pred),
            Expr::And(children) => children.iter().all(|child| self.matches(child)),
            Expr::Or(children) => children.iter().any(|child| self.matches(child)),
            Expr::Not(_) => true,
        }
    }

    /// Serialize into one immutable blob with a CRC32 trailer.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.put_u32(SKETCH_MAGIC);
        w.put_u8(SKETCH_VERSION);
        w.put_u128(self.partition_id.0);
        w.put_u64(self.rows);
        w.put_u32(self.fields.len() as u32);
        for (name, synopsis) in &self.fields {
            w.put_str(name);
            synopsis.encode(&mut w);
        }
        let crc = crc32fast::hash(w.as_bytes());
        w.put_u32(crc);
        w.into_inner()
    }

    /// Serialized size in bytes, for memory accounting.
    pub fn encoded_size(&self) -> usize {
        self.encode().len()
    }

    /// Deserialize a blob produced by [`PartitionSketch::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < 4 {
            return Err(DecodeError::UnexpectedEof(bytes.len()));
        }
        let (payload, trailer) = bytes.split_at(bytes.len() - 4);
        let stored = u32::from_le_bytes(trailer.try_into().unwrap());
        let computed = crc32fast::hash(payload);
        if stored != computed {
            return Err(DecodeError::ChecksumMismatch { stored, computed });
        }
        let mut r = Reader::new(payload);
        let magic = r.u32()?;
        if magic != SKETCH_MAGIC {
            return Err(DecodeError::BadMagic {
                expected: SKETCH_MAGIC,
                found: magic,
            });
        }
        let version = r.u8()?;
        if version != SKETCH_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let partition_id = Ulid(r.u128()?);
        let rows = r.u64()?;
        let num_fields = r.u32()? as usize;
        let mut fields = BTreeMap::new();
        for _ in 0..num_fields {
            let name = r.str()?;
            let synopsis = Synopsis::decode(&mut r)?;
            fields.insert(name, synopsis);
        }
        if !r.is_empty() {
            return Err(DecodeError::TrailingBytes(payload.len() - r.pos()));
        }
        Ok(Self {
            partition_id,
            rows,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, Field};
    use crate::timestamp::Timestamp;

    fn test_schema() -> Schema {
        Schema::new(vec![
            Field::new("ts", DataType::Timestamp),
            Field::new("src", DataType::Str).with_attribute("bloomfilter(100,0.01)"),
            Field::new("port", DataType::UInt).with_attribute("minmax"),
            Field::new("note", DataType::Str),
        ])
    }

    fn row(ts: i64, src: &str, port: u64) -> Vec<ScalarValue> {
        vec![
            Timestamp::from_secs(ts).into(),
            src.into(),
            port.into(),
            ScalarValue::Null,
        ]
    }

    fn build() -> PartitionSketch {
        let schema = test_schema();
        let config = SiftConfig::default();
        let mut builder = PartitionSketchBuilder::new(&schema, &config);
        builder.add_row(&row(100, "10.0.0.1", 443));
        builder.add_row(&row(200, "10.0.0.2", 80));
        builder.add_row(&row(300, "10.0.0.1", 8080));
        builder.finish(PartitionId::from_parts(1, 1))
    }

    #[test]
    fn lookup_delegates_to_field_synopses() {
        let sketch = build();
        assert_eq!(sketch.rows(), 3);
        assert!(sketch.lookup(&Predicate::eq("src", "10.0.0.1")));
        assert!(!sketch.lookup(&Predicate::gt("port", 8080u64)));
        assert!(sketch.lookup(&Predicate::le("port", 80u64)));
        assert!(!sketch.lookup(&Predicate::lt(
            "ts",
            Timestamp::from_secs(100)
        )));
    }

    #[test]
    fn field_without_synopsis_is_inconclusive() {
        let sketch = build();
        assert!(sketch.lookup(&Predicate::eq("note", "anything")));
        assert!(sketch.lookup(&Predicate::eq("no_such_field", 1i64)));
    }

    #[test]
    fn expression_algebra() {
        let sketch = build();
        let hit: Expr = Predicate::eq("src", "10.0.0.1").into();
        let miss: Expr = Predicate::gt("port", 100_000u64).into();

        assert!(sketch.matches(&Expr::and([hit.clone(), hit.clone()])));
        assert!(!sketch.matches(&Expr::and([hit.clone(), miss.clone()])));
        assert!(sketch.matches(&Expr::or([miss.clone(), hit.clone()])));
        assert!(!sketch.matches(&Expr::or([miss.clone(), miss.clone()])));
        // Negation never prunes.
        assert!(sketch.matches(&Expr::not(hit)));
        assert!(sketch.matches(&Expr::not(miss)));
    }

    #[test]
    fn encode_decode_roundtrip() {
        let sketch = build();
        let blob = sketch.encode();
        assert_eq!(blob.len(), sketch.encoded_size());
        let decoded = PartitionSketch::decode(&blob).expect("decode");
        assert_eq!(decoded, sketch);
    }

    #[test]
    fn corrupt_blob_fails_checksum() {
        let mut blob = build().encode();
        let mid = blob.len() / 2;
        blob[mid] ^= 0xFF;
        assert!(matches!(
            PartitionSketch::decode(&blob),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let blob = build().encode();
        assert!(PartitionSketch::decode(&blob[..blob.len() - 10]).is_err());
        assert!(matches!(
            PartitionSketch::decode(&[]),
            Err(DecodeError::UnexpectedEof(0))
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut payload = build().encode();
        payload.truncate(payload.len() - 4);
        payload.push(0);
        let crc = crc32fast::hash(&payload);
        payload.extend_from_slice(&crc.to_le_bytes());
        assert!(matches!(
            PartitionSketch::decode(&payload),
            Err(DecodeError::TrailingBytes(1))
        ));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut payload = build().encode();
        payload.truncate(payload.len() - 4);
        payload[0] ^= 0xFF;
        let crc = crc32fast::hash(&payload);
        payload.extend_from_slice(&crc.to_le_bytes());
        assert!(matches!(
            PartitionSketch::decode(&payload),
            Err(DecodeError::BadMagic { .. })
        ));
    }
}
