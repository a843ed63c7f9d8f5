//! End-to-end pruning and exact-evaluation tests over randomized data.
//!
//! The oracle is a brute-force scan over the generated rows: whatever the
//! oracle finds, the sketch layer must not prune and the index layer must
//! return exactly.

use sift::{
    Catalog, DataType, Expr, Field, PartitionIndexes, PartitionInfo, PartitionId,
    PartitionIdGenerator, PartitionSketchBuilder, Predicate, ScalarValue, Schema, SiftConfig,
};

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("src", DataType::Str).with_attribute("bloomfilter(512,0.01)"),
        Field::new("port", DataType::UInt).with_attribute("minmax"),
    ])
}

struct Partition {
    id: PartitionId,
    rows: Vec<(String, u64)>,
    indexes: PartitionIndexes,
}

/// Generate partitions with random rows, register their sketches, and keep
/// the raw rows around as the oracle.
fn build_store(num_partitions: usize, rows_per_partition: usize) -> (Catalog, Vec<Partition>) {
    let schema = schema();
    let config = SiftConfig::default();
    let generator = PartitionIdGenerator::new();
    let catalog = Catalog::new(config.clone());
    let mut partitions = Vec::new();

    for _ in 0..num_partitions {
        let id = generator.generate();
        let mut builder = PartitionSketchBuilder::new(&schema, &config);
        let mut indexes = PartitionIndexes::new(id, &schema);
        let mut rows = Vec::new();
        for _ in 0..rows_per_partition {
            let src = format!("10.0.{}.{}", fastrand::u8(0..4), fastrand::u8(0..32));
            let port = *fastrand::choice(&[22u64, 53, 80, 443, 8080]).unwrap();
            let row: Vec<ScalarValue> = vec![src.as_str().into(), port.into()];
            builder.add_row(&row);
            indexes.push_row(&row);
            rows.push((src, port));
        }
        catalog.add(
            builder.finish(id),
            PartitionInfo {
                rows: rows.len() as u64,
                time_range: None,
            },
        );
        partitions.push(Partition { id, rows, indexes });
    }
    (catalog, partitions)
}

fn oracle_matches(row: &(String, u64), expr: &Expr) -> bool {
    match expr {
        Expr::And(children) => children.iter().all(|c| oracle_matches(row, c)),
        Expr::Or(children) => children.iter().any(|c| oracle_matches(row, c)),
        Expr::Not(child) => !oracle_matches(row, child),
        Expr::Pred(pred) => {
            let (src, port) = row;
            match pred.field() {
                "src" => match (pred.op(), pred.value()) {
                    (sift::ComparisonOp::Eq, ScalarValue::Str(s)) => src == s,
                    (sift::ComparisonOp::Ne, ScalarValue::Str(s)) => src != s,
                    _ => panic!("oracle does not model {pred}"),
                },
                "port" => {
                    let lit = match pred.value() {
                        ScalarValue::UInt(v) => *v,
                        other => panic!("oracle does not model literal {other:?}"),
                    };
                    match pred.op() {
                        sift::ComparisonOp::Eq => *port == lit,
                        sift::ComparisonOp::Ne => *port != lit,
                        sift::ComparisonOp::Lt => *port < lit,
                        sift::ComparisonOp::Le => *port <= lit,
                        sift::ComparisonOp::Gt => *port > lit,
                        sift::ComparisonOp::Ge => *port >= lit,
                        other => panic!("oracle does not model {other}"),
                    }
                }
                other => panic!("oracle does not know field {other}"),
            }
        }
    }
}

fn random_expr() -> Expr {
    let src = format!("10.0.{}.{}", fastrand::u8(0..4), fastrand::u8(0..32));
    let port = *fastrand::choice(&[22u64, 53, 80, 443, 8080, 9999]).unwrap();
    let src_pred: Expr = Predicate::eq("src", src.as_str()).into();
    let port_pred: Expr = match fastrand::u8(0..4) {
        0 => Predicate::eq("port", port).into(),
        1 => Predicate::lt("port", port).into(),
        2 => Predicate::ge("port", port).into(),
        _ => Predicate::ne("port", port).into(),
    };
    match fastrand::u8(0..4) {
        0 => src_pred,
        1 => port_pred,
        2 => Expr::and([src_pred, port_pred]),
        _ => Expr::or([src_pred, port_pred]),
    }
}

#[test]
fn sketch_pruning_is_sound() {
    fastrand::seed(0x5EED);
    let (catalog, partitions) = build_store(8, 64);
    for _ in 0..200 {
        let expr = random_expr();
        let resolution = catalog.resolve(&expr);
        for partition in &partitions {
            let has_match = partition.rows.iter().any(|row| oracle_matches(row, &expr));
            if has_match {
                assert!(
                    resolution.candidates.contains(&partition.id),
                    "partition with a true match was pruned for {expr:?}"
                );
            }
        }
    }
}

#[test]
fn index_evaluation_is_exact() {
    fastrand::seed(0xACE);
    let (_catalog, partitions) = build_store(4, 48);
    for _ in 0..100 {
        let expr = random_expr();
        // Wrap in a negation half the time; negation is exact at this level.
        let expr = if fastrand::bool() {
            Expr::not(expr)
        } else {
            expr
        };
        for partition in &partitions {
            let got: Vec<u64> = partition.indexes.evaluate(&expr).ones().collect();
            let want: Vec<u64> = partition
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| oracle_matches(row, &expr))
                .map(|(i, _)| i as u64)
                .collect();
            assert_eq!(got, want, "exact evaluation diverged for {expr:?}");
        }
    }
}

#[test]
fn conjunction_equals_intersection_when_leaves_are_exact() {
    // Min/max leaves are exact for ordering operators over this data: every
    // partition holds a single distinct port value, so [min, max] is a point.
    let schema = Schema::new(vec![
        Field::new("port", DataType::UInt).with_attribute("minmax")
    ]);
    let config = SiftConfig::default();
    let generator = PartitionIdGenerator::new();
    let catalog = Catalog::new(config.clone());
    for port in [80u64, 443, 8080, 443, 80, 22] {
        let mut builder = PartitionSketchBuilder::new(&schema, &config);
        builder.add_row(&[port.into()]);
        catalog.add(builder.finish(generator.generate()), PartitionInfo::default());
    }

    let a: Expr = Predicate::ge("port", 100u64).into();
    let b: Expr = Predicate::le("port", 1000u64).into();
    let both = catalog.resolve(&Expr::and([a.clone(), b.clone()]));

    let res_a = catalog.resolve(&a);
    let res_b = catalog.resolve(&b);
    let intersection: Vec<_> = res_a
        .candidates
        .iter()
        .filter(|id| res_b.candidates.contains(id))
        .copied()
        .collect();
    assert_eq!(both.candidates, intersection);
}

#[test]
fn resolve_is_idempotent_and_newest_first() {
    fastrand::seed(7);
    let (catalog, partitions) = build_store(6, 16);
    let expr: Expr = Predicate::ge("port", 0u64).into();
    let first = catalog.resolve(&expr);
    let second = catalog.resolve(&expr);
    assert_eq!(first, second);

    // Everything matches `port >= 0`; order must be newest (largest id) first.
    let mut expected: Vec<_> = partitions.iter().map(|p| p.id).collect();
    expected.reverse();
    assert_eq!(first.candidates, expected);
}

#[test]
fn resolve_is_consistent_under_concurrent_appends() {
    let schema = schema();
    let config = SiftConfig::default();
    let generator = PartitionIdGenerator::new();
    let catalog = Catalog::new(config.clone());
    let total = 64;

    // Single appender, several readers hammering resolve. Each resolution
    // must be a consistent snapshot: newest-first, no duplicates, never more
    // partitions than were ever registered, and no panics.
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let expr: Expr = Predicate::ge("port", 0u64).into();
                loop {
                    let done = catalog.len() == total;
                    let resolution = catalog.resolve(&expr);
                    assert!(resolution.candidates.len() <= total);
                    assert!(resolution
                        .candidates
                        .windows(2)
                        .all(|pair| pair[0] > pair[1]));
                    assert!(resolution.degraded.is_empty());
                    if done {
                        break;
                    }
                }
            });
        }
        for i in 0..total {
            let mut builder = PartitionSketchBuilder::new(&schema, &config);
            builder.add_row(&["10.0.0.1".into(), (i as u64).into()]);
            catalog.add(builder.finish(generator.generate()), PartitionInfo::default());
        }
    });

    // All appends visible once the writer is done.
    let settled = catalog.resolve(&Predicate::ge("port", 0u64).into());
    assert_eq!(settled.candidates.len(), total);
}

#[test]
fn corrupt_sketch_widens_but_never_narrows() {
    fastrand::seed(11);
    let (catalog, partitions) = build_store(3, 8);
    let bad_id = PartitionId::from_parts(u64::MAX, 1);
    let err = catalog.add_sketch(bad_id, &[0xAB; 16], PartitionInfo::default());
    assert!(err.is_err());

    let expr: Expr = Predicate::eq("src", "10.99.99.99").into();
    let resolution = catalog.resolve(&expr);
    // The corrupt partition is always a candidate; sound partitions with no
    // possible match may still be pruned.
    assert!(resolution.candidates.contains(&bad_id));
    assert_eq!(resolution.degraded, vec![bad_id]);
    assert!(resolution.candidates.len() <= partitions.len() + 1);
}
