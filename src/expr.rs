//! Predicates and boolean expression trees.
//!
//! The expression tree is the hand-off format from the query front end: a
//! parser turns query text into [`Expr`] values, and both the catalog (for
//! approximate pruning) and the per-partition bitmap indexes (for exact
//! evaluation) walk the same tree.

use std::fmt;

use log::Level;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::{logging::sift_log, scalar::ScalarValue};

/// Relational operator of a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// Membership in a literal set.
    In,
    /// Regular-expression match over string values.
    Match,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::In => "in",
            ComparisonOp::Match => "match",
        };
        f.write_str(s)
    }
}

/// A single comparison between a field and a literal.
///
/// Immutable once built; the compiled regex for [`ComparisonOp::Match`] is
/// cached lazily on first use.
#[derive(Clone, Debug)]
pub struct Predicate {
    field: String,
    op: ComparisonOp,
    value: ScalarValue,
    set: Vec<ScalarValue>,
    regex: OnceCell<Regex>,
}

impl Predicate {
    fn new(field: impl Into<String>, op: ComparisonOp, value: ScalarValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
            set: Vec::new(),
            regex: OnceCell::new(),
        }
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::new(field, ComparisonOp::Eq, value.into())
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::new(field, ComparisonOp::Ne, value.into())
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::new(field, ComparisonOp::Lt, value.into())
    }

    /// `field <= value`
    pub fn le(field: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::new(field, ComparisonOp::Le, value.into())
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::new(field, ComparisonOp::Gt, value.into())
    }

    /// `field >= value`
    pub fn ge(field: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::new(field, ComparisonOp::Ge, value.into())
    }

    /// `field in {values}`
    pub fn is_in(
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<ScalarValue>>,
    ) -> Self {
        let mut pred = Self::new(field, ComparisonOp::In, ScalarValue::Null);
        pred.set = values.into_iter().map(Into::into).collect();
        pred
    }

    /// `field match /pattern/`
    pub fn matches(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, ComparisonOp::Match, ScalarValue::Str(pattern.into()))
    }

    /// The field path this predicate constrains.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The relational operator.
    pub fn op(&self) -> ComparisonOp {
        self.op
    }

    /// The literal operand. [`ScalarValue::Null`] for `in` predicates.
    pub fn value(&self) -> &ScalarValue {
        &self.value
    }

    /// The literal set of an `in` predicate; empty for every other operator.
    pub fn set(&self) -> &[ScalarValue] {
        &self.set
    }

    /// The compiled regex of a `match` predicate.
    ///
    /// Compiled once and cached. `None` if this is not a `match` predicate or
    /// the pattern fails to compile; an uncompilable pattern is logged and
    /// evaluates to "matches nothing" at the exact level and "inconclusive"
    /// at the sketch level.
    pub fn regex(&self) -> Option<&Regex> {
        if self.op != ComparisonOp::Match {
            return None;
        }
        let pattern = self.value.as_str()?;
        self.regex
            .get_or_try_init(|| {
                Regex::new(pattern).map_err(|err| {
                    sift_log!(
                        Level::Warn,
                        "bad_match_pattern",
                        "field={} pattern={:?} error={}",
                        self.field,
                        pattern,
                        err,
                    );
                    err
                })
            })
            .ok()
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        // The cached regex is derived state and excluded on purpose.
        self.field == other.field
            && self.op == other.op
            && self.value == other.value
            && self.set == other.set
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op == ComparisonOp::In {
            write!(f, "{} in <{} values>", self.field, self.set.len())
        } else {
            write!(f, "{} {} {:?}", self.field, self.op, self.value)
        }
    }
}

/// A boolean combination of predicates. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// All sub-expressions must hold.
    And(Vec<Expr>),
    /// At least one sub-expression must hold.
    Or(Vec<Expr>),
    /// The sub-expression must not hold.
    Not(Box<Expr>),
    /// A leaf comparison.
    Pred(Predicate),
}

impl Expr {
    /// Conjunction of sub-expressions.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(exprs.into_iter().collect())
    }

    /// Disjunction of sub-expressions.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Negation of a sub-expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }
}

impl From<Predicate> for Expr {
    fn from(pred: Predicate) -> Self {
        Expr::Pred(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_compiles_once_and_caches() {
        let pred = Predicate::matches("uri", r"^/admin/");
        let first = pred.regex().expect("valid pattern") as *const Regex;
        let second = pred.regex().expect("valid pattern") as *const Regex;
        assert_eq!(first, second);
        assert!(pred.regex().unwrap().is_match("/admin/login"));
    }

    #[test]
    fn invalid_regex_yields_none() {
        let pred = Predicate::matches("uri", "([unclosed");
        assert!(pred.regex().is_none());
        // Repeated calls stay None and do not panic.
        assert!(pred.regex().is_none());
    }

    #[test]
    fn non_match_predicate_has_no_regex() {
        assert!(Predicate::eq("x", 1i64).regex().is_none());
    }

    #[test]
    fn predicate_equality_ignores_regex_cache() {
        let a = Predicate::matches("uri", "ab+");
        let b = Predicate::matches("uri", "ab+");
        let _ = a.regex();
        assert_eq!(a, b);
    }

    #[test]
    fn builders_shape_the_tree() {
        let expr = Expr::and([
            Predicate::eq("proto", "tcp").into(),
            Expr::not(Predicate::lt("port", 1024i64).into()),
        ]);
        match expr {
            Expr::And(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[1], Expr::Not(_)));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
