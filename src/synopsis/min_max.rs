//! Min/max range synopses.

use crate::{
    expr::{ComparisonOp, Predicate},
    scalar::ScalarValue,
    timestamp::Timestamp,
};

/// Value types a [`MinMaxSynopsis`] can summarize.
pub trait MinMaxValue: Copy + PartialOrd {
    /// Initial `min` sentinel: the type's maximum, so the first `add`
    /// establishes the real lower bound.
    const EMPTY_MIN: Self;
    /// Initial `max` sentinel: the type's minimum.
    const EMPTY_MAX: Self;

    /// Convert a predicate literal into this value type, if compatible.
    fn from_scalar(value: &ScalarValue) -> Option<Self>;
}

impl MinMaxValue for i64 {
    const EMPTY_MIN: Self = i64::MAX;
    const EMPTY_MAX: Self = i64::MIN;

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        value.as_int()
    }
}

impl MinMaxValue for u64 {
    const EMPTY_MIN: Self = u64::MAX;
    const EMPTY_MAX: Self = u64::MIN;

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        value.as_uint()
    }
}

impl MinMaxValue for f64 {
    const EMPTY_MIN: Self = f64::MAX;
    const EMPTY_MAX: Self = f64::MIN;

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        value.as_float()
    }
}

impl MinMaxValue for Timestamp {
    const EMPTY_MIN: Self = Timestamp::MAX;
    const EMPTY_MAX: Self = Timestamp::MIN;

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        value.as_timestamp()
    }
}

/// Range summary `[min, max]` over the values of one field.
///
/// Starts at the empty-range sentinel `[max, min]`; each `add` widens the
/// bounds. Lookups answer "might a value in `[min, max]` satisfy this
/// comparison" with one-sided error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxSynopsis<T> {
    min: T,
    max: T,
}

/// Range synopsis over event timestamps.
pub type TimeSynopsis = MinMaxSynopsis<Timestamp>;

impl<T: MinMaxValue> Default for MinMaxSynopsis<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MinMaxValue> MinMaxSynopsis<T> {
    /// Create an empty range.
    pub fn new() -> Self {
        Self {
            min: T::EMPTY_MIN,
            max: T::EMPTY_MAX,
        }
    }

    /// Whether no value was ever added.
    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    /// Current bounds, `None` while empty.
    pub fn bounds(&self) -> Option<(T, T)> {
        if self.is_empty() {
            None
        } else {
            Some((self.min, self.max))
        }
    }

    /// Widen the range to cover `value`.
    pub fn add(&mut self, value: T) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Evaluate a predicate against the range.
    ///
    /// `true` means "might match". Operators the range cannot decide (`!=`,
    /// `match`) are always inconclusive. A literal whose kind differs from
    /// `T` is also inconclusive, even across numeric kinds: claiming "no
    /// match" on a type confusion would be unsound.
    pub fn lookup(&self, pred: &Predicate) -> bool {
        if self.is_empty() {
            // No value was ever observed for this field, so no row can
            // satisfy a comparison against it.
            return match pred.op() {
                ComparisonOp::Eq
                | ComparisonOp::Lt
                | ComparisonOp::Le
                | ComparisonOp::Gt
                | ComparisonOp::Ge
                | ComparisonOp::In => false,
                ComparisonOp::Ne | ComparisonOp::Match => true,
            };
        }
        match pred.op() {
            ComparisonOp::Eq => match T::from_scalar(pred.value()) {
                Some(lit) => self.covers(lit),
                None => true,
            },
            ComparisonOp::In => {
                let mut convertible = true;
                let any_inside = pred.set().iter().any(|v| match T::from_scalar(v) {
                    Some(lit) => self.covers(lit),
                    None => {
                        convertible = false;
                        false
                    }
                });
                any_inside || !convertible
            }
            ComparisonOp::Lt => match T::from_scalar(pred.value()) {
                Some(lit) => self.min < lit,
                None => true,
            },
            ComparisonOp::Le => match T::from_scalar(pred.value()) {
                Some(lit) => self.min <= lit,
                None => true,
            },
            ComparisonOp::Gt => match T::from_scalar(pred.value()) {
                Some(lit) => self.max > lit,
                None => true,
            },
            ComparisonOp::Ge => match T::from_scalar(pred.value()) {
                Some(lit) => self.max >= lit,
                None => true,
            },
            ComparisonOp::Ne | ComparisonOp::Match => true,
        }
    }

    fn covers(&self, lit: T) -> bool {
        self.min <= lit && lit <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Predicate;

    fn filled() -> MinMaxSynopsis<i64> {
        let mut mm = MinMaxSynopsis::<i64>::new();
        for v in [10, -3, 7, 42] {
            mm.add(v);
        }
        mm
    }

    #[test]
    fn add_establishes_bounds() {
        let mm = filled();
        assert_eq!(mm.bounds(), Some((-3, 42)));
    }

    #[test]
    fn operator_table() {
        let mm = filled();
        assert!(mm.lookup(&Predicate::eq("f", 42i64)));
        assert!(mm.lookup(&Predicate::eq("f", 0i64)));
        assert!(!mm.lookup(&Predicate::eq("f", 43i64)));
        assert!(!mm.lookup(&Predicate::eq("f", -4i64)));

        assert!(mm.lookup(&Predicate::lt("f", -2i64)));
        assert!(!mm.lookup(&Predicate::lt("f", -3i64)));
        assert!(mm.lookup(&Predicate::le("f", -3i64)));

        assert!(mm.lookup(&Predicate::gt("f", 41i64)));
        assert!(!mm.lookup(&Predicate::gt("f", 42i64)));
        assert!(mm.lookup(&Predicate::ge("f", 42i64)));
        assert!(!mm.lookup(&Predicate::ge("f", 43i64)));

        // Undecidable operators stay inconclusive.
        assert!(mm.lookup(&Predicate::ne("f", 100i64)));
        assert!(mm.lookup(&Predicate::matches("f", "x")));
    }

    #[test]
    fn in_checks_each_member() {
        let mm = filled();
        assert!(mm.lookup(&Predicate::is_in("f", [100i64, 7])));
        assert!(!mm.lookup(&Predicate::is_in("f", [100i64, 200])));
    }

    #[test]
    fn empty_range_matches_nothing() {
        let mm = MinMaxSynopsis::<i64>::new();
        assert!(mm.is_empty());
        assert!(!mm.lookup(&Predicate::eq("f", 0i64)));
        assert!(!mm.lookup(&Predicate::gt("f", i64::MIN)));
        assert!(!mm.lookup(&Predicate::lt("f", i64::MAX)));
        // One-sided error still applies to undecidable operators.
        assert!(mm.lookup(&Predicate::ne("f", 0i64)));
    }

    #[test]
    fn incompatible_literal_is_inconclusive() {
        let mm = filled();
        assert!(mm.lookup(&Predicate::eq("f", "not a number")));
    }

    #[test]
    fn cross_kind_numeric_literal_is_inconclusive() {
        // Numeric kinds do not coerce; a mismatched literal stays
        // inconclusive.
        let mm = filled();
        assert!(mm.lookup(&Predicate::eq("f", 1_000u64)));

        let mut unsigned = MinMaxSynopsis::<u64>::new();
        unsigned.add(10);
        assert!(unsigned.lookup(&Predicate::gt("f", 1_000i64)));
    }

    #[test]
    fn time_synopsis_scenario() {
        // Partition covering [2020-01-01, 2020-01-31].
        let jan_01 = Timestamp::from_secs(1_577_836_800);
        let jan_15 = Timestamp::from_secs(1_579_046_400);
        let jan_31 = Timestamp::from_secs(1_580_428_800);
        let feb_01 = Timestamp::from_secs(1_580_515_200);

        let mut ts = TimeSynopsis::new();
        ts.add(jan_01);
        ts.add(jan_31);

        assert!(!ts.lookup(&Predicate::gt("ts", feb_01)));
        assert!(ts.lookup(&Predicate::gt("ts", jan_15)));
        assert!(ts.lookup(&Predicate::eq("ts", jan_15)));
        assert!(!ts.lookup(&Predicate::lt("ts", jan_01)));
    }
}
