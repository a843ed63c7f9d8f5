#![deny(missing_docs)]
//! Predicate-driven data pruning for a columnar event store.
//!
//! Security telemetry accumulates as immutable, time-bounded partitions. To
//! answer a query without scanning all of them, this crate keeps two layers
//! of index structures:
//!
//! - **Partition sketches**: per-field approximate summaries (Bloom filters,
//!   min/max ranges) with one-sided error. The [`Catalog`] evaluates an
//!   expression tree against every sketch and returns the partitions that
//!   *might* contain matches, never missing one that does.
//! - **Bitmap indexes**: per-(partition, field) exact value-to-rows maps over
//!   compressed [`Ids`] bitmaps. Within a surviving partition, the same
//!   expression tree resolves to the exact set of matching row IDs.
//!
//! Row data encoding, query parsing, scheduling, and I/O live outside this
//! crate: it consumes typed rows, schemas, and expression trees, and produces
//! candidate lists and row-ID bitmaps.
//!
//! ```
//! use sift::{
//!     Catalog, DataType, Field, PartitionInfo, PartitionIdGenerator,
//!     PartitionSketchBuilder, Predicate, Schema, SiftConfig,
//! };
//!
//! let schema = Schema::new(vec![
//!     Field::new("src", DataType::Str).with_attribute("bloomfilter(1000,0.01)"),
//!     Field::new("port", DataType::UInt).with_attribute("minmax"),
//! ]);
//! let config = SiftConfig::default();
//! let ids = PartitionIdGenerator::new();
//!
//! let mut builder = PartitionSketchBuilder::new(&schema, &config);
//! builder.add_row(&["10.0.0.1".into(), 443u64.into()]);
//! let sketch = builder.finish(ids.generate());
//!
//! let catalog = Catalog::new(config);
//! catalog.add(sketch, PartitionInfo::default());
//!
//! let resolution = catalog.resolve(&Predicate::eq("src", "10.0.0.1").into());
//! assert_eq!(resolution.candidates.len(), 1);
//! ```

pub mod bloom;
pub mod catalog;
pub mod config;
pub mod error;
pub mod expr;
pub mod ids;
pub mod index;
pub mod schema;
pub mod sketch;
pub mod synopsis;

mod hash;
mod id;
mod logging;
mod scalar;
mod serdes;
mod timestamp;

pub use catalog::{Catalog, PartitionInfo, Resolution};
pub use config::{BloomParams, SiftConfig};
pub use error::DecodeError;
pub use expr::{ComparisonOp, Expr, Predicate};
pub use id::PartitionIdGenerator;
pub use ids::{make_ids, IdRange, Ids};
pub use index::{BitmapIndex, PartitionIndexes};
pub use scalar::ScalarValue;
pub use schema::{DataType, Field, Schema, SynopsisSpec};
pub use sketch::{PartitionId, PartitionSketch, PartitionSketchBuilder};
pub use synopsis::{BloomFilterSynopsis, MinMaxSynopsis, Synopsis, TimeSynopsis};
pub use timestamp::Timestamp;
