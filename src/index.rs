//! Exact per-partition value indexes.
//!
//! A [`BitmapIndex`] maps every distinct value of one field to the [`Ids`] of
//! the rows holding it. All bitmaps stay the same length (the partition's
//! row count) at every snapshot; that uniformity is what makes the boolean
//! algebra over them exact. [`PartitionIndexes`] groups the per-field indexes
//! of one partition and evaluates whole expression trees.

use std::collections::BTreeMap;

use crate::{
    expr::{ComparisonOp, Expr, Predicate},
    ids::Ids,
    scalar::ScalarValue,
    schema::Schema,
    sketch::PartitionId,
};

/// Exact value-to-rows index for one `(partition, field)` pair.
///
/// Append-only while the partition is open; frozen and shared read-only once
/// sealed. The distinct-value domain is assumed small relative to the row
/// count, so ordering lookups scan it linearly.
#[derive(Clone, Debug, PartialEq)]
pub struct BitmapIndex {
    partition_id: PartitionId,
    field: String,
    rows: u64,
    map: BTreeMap<ScalarValue, Ids>,
    // Rows where the field was null; excluded from every value bitmap and
    // from complements.
    nulls: Ids,
}

impl BitmapIndex {
    /// An empty index for one field of one partition.
    pub fn new(partition_id: PartitionId, field: impl Into<String>) -> Self {
        Self {
            partition_id,
            field: field.into(),
            rows: 0,
            map: BTreeMap::new(),
            nulls: Ids::new(),
        }
    }

    /// The field this index covers.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Current row count; every stored bitmap has exactly this length.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Number of distinct indexed values.
    pub fn distinct_values(&self) -> usize {
        self.map.len()
    }

    /// Append one row's value.
    ///
    /// The value's bitmap gets a `true`, every other bitmap a `false`, so all
    /// bitmaps keep identical length.
    pub fn push_back(&mut self, value: &ScalarValue) {
        if value.is_null() {
            self.nulls.append_bit(true);
            for ids in self.map.values_mut() {
                ids.append_bit(false);
            }
        } else {
            self.nulls.append_bit(false);
            if !self.map.contains_key(value) {
                // First occurrence: backfill the new bitmap with the rows
                // seen before it.
                self.map
                    .insert(value.clone(), Ids::with_bits(false, self.rows));
            }
            for (key, ids) in self.map.iter_mut() {
                ids.append_bit(key == value);
            }
        }
        self.rows += 1;
        debug_assert!(self.map.values().all(|ids| ids.len() == self.rows));
    }

    /// Exact row set satisfying `pred`. Never a false positive or negative.
    ///
    /// Literals are compared with strict typing: a literal whose kind differs
    /// from the stored values (`Int(80)` against a `UInt` column, say)
    /// matches no rows. The sketch layer treats the same predicate as
    /// inconclusive, so both layers agree on the final result.
    pub fn lookup(&self, pred: &Predicate) -> Ids {
        debug_assert_eq!(pred.field(), self.field);
        let result = match pred.op() {
            ComparisonOp::Eq => self.eq_bitmap(pred.value()),
            ComparisonOp::Ne => {
                // Complement of the matching rows, minus nulls: a row with no
                // value neither equals nor differs from the literal.
                self.eq_bitmap(pred.value()).flip().and(&self.nulls.flip())
            }
            ComparisonOp::Lt => self.fold_keys(|key| key < pred.value()),
            ComparisonOp::Le => self.fold_keys(|key| key <= pred.value()),
            ComparisonOp::Gt => self.fold_keys(|key| key > pred.value()),
            ComparisonOp::Ge => self.fold_keys(|key| key >= pred.value()),
            ComparisonOp::In => pred
                .set()
                .iter()
                .fold(self.all_false(), |acc, v| acc.or(&self.eq_bitmap(v))),
            ComparisonOp::Match => match pred.regex() {
                Some(re) => self.fold_keys(|key| key.as_str().is_some_and(|s| re.is_match(s))),
                None => self.all_false(),
            },
        };
        assert_eq!(
            result.len(),
            self.rows,
            "bitmap length diverged from row count in index for field {}",
            self.field
        );
        result
    }

    fn eq_bitmap(&self, value: &ScalarValue) -> Ids {
        self.map
            .get(value)
            .cloned()
            .unwrap_or_else(|| self.all_false())
    }

    fn fold_keys(&self, mut keep: impl FnMut(&ScalarValue) -> bool) -> Ids {
        self.map
            .iter()
            .filter(|(key, _)| keep(key))
            .fold(self.all_false(), |acc, (_, ids)| acc.or(ids))
    }

    fn all_false(&self) -> Ids {
        Ids::with_bits(false, self.rows)
    }
}

/// All per-field bitmap indexes of one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionIndexes {
    partition_id: PartitionId,
    rows: u64,
    // Schema field order; push_row relies on it.
    fields: Vec<BitmapIndex>,
}

impl PartitionIndexes {
    /// One bitmap index per schema field.
    pub fn new(partition_id: PartitionId, schema: &Schema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|f| BitmapIndex::new(partition_id, &*f.name))
            .collect();
        Self {
            partition_id,
            rows: 0,
            fields,
        }
    }

    /// The partition these indexes cover.
    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// Current row count.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// The index for one field.
    pub fn index(&self, field: &str) -> Option<&BitmapIndex> {
        self.fields.iter().find(|idx| idx.field() == field)
    }

    /// Append one row, laid out in schema field order.
    pub fn push_row(&mut self, values: &[ScalarValue]) {
        debug_assert_eq!(values.len(), self.fields.len());
        for (index, value) in self.fields.iter_mut().zip(values) {
            index.push_back(value);
        }
        self.rows += 1;
    }

    /// Exact row set satisfying an expression tree.
    ///
    /// Unlike the sketch level, negation is exact here: the complement over
    /// the partition's materialized row count.
    pub fn evaluate(&self, expr: &Expr) -> Ids {
        match expr {
            Expr::Pred(pred) => match self.index(pred.field()) {
                Some(index) => index.lookup(pred),
                // The partition has no such column, so no row matches.
                None => Ids::with_bits(false, self.rows),
            },
            Expr::And(children) => children.iter().fold(Ids::with_bits(true, self.rows), |acc, child| {
                acc.and(&self.evaluate(child))
            }),
            Expr::Or(children) => children.iter().fold(Ids::with_bits(false, self.rows), |acc, child| {
                acc.or(&self.evaluate(child))
            }),
            Expr::Not(child) => self.evaluate(child).flip(),
        }
    }
}
