//! Scoring regression tests for canopy-forest.
//!
//! Random but seeded forests of complete binary trees: every internal split
//! has a complementary `greaterThan` / `lessOrEqual` pair, so every record
//! must reach a scored leaf in every tree.

use std::collections::HashMap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use canopy_forest::{Forest, ForestError, Label, NodeSpec, Schema, Segment};

const FIELDS: [&str; 4] = ["f0", "f1", "f2", "f3"];
const LABELS: [&str; 3] = ["0", "1", "2"];

// ---------------------------------------------------------------------------
// Helpers: deterministic synthetic forests and records
// ---------------------------------------------------------------------------

/// Grow the children of `node` down to `depth` levels.
fn grow(node: NodeSpec, depth: usize, next_id: &mut usize, rng: &mut ChaCha8Rng) -> NodeSpec {
    if depth == 0 {
        return node;
    }
    let field = FIELDS[rng.gen_range(0..FIELDS.len())];
    let threshold = (rng.r#gen::<f64>() * 10.0).round() / 2.0;

    let mut node = node;
    for operator in ["lessOrEqual", "greaterThan"] {
        *next_id += 1;
        let mut child = NodeSpec::new(next_id.to_string()).with_predicate(field, operator, threshold);
        if depth == 1 {
            child = child.with_score(LABELS[rng.gen_range(0..LABELS.len())]);
        } else {
            child = grow(child, depth - 1, next_id, rng);
        }
        node = node.with_child(child);
    }
    node
}

fn make_forest(n_trees: usize, depth: usize, seed: u64) -> Forest {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let segments: Vec<Segment> = (0..n_trees)
        .map(|t| {
            let mut next_id = 1;
            Segment {
                id: format!("tree{t}"),
                root: grow(NodeSpec::new("1"), depth, &mut next_id, &mut rng),
            }
        })
        .collect();
    Forest::build(&segments).unwrap()
}

fn make_records(n: usize, seed: u64) -> Vec<HashMap<String, f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            FIELDS
                .iter()
                .map(|f| (f.to_string(), rng.r#gen::<f64>() * 5.0))
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn complete_trees_always_score() {
    let forest = make_forest(25, 4, 42);
    for record in make_records(200, 7) {
        let vote = forest.vote(&record).unwrap();
        assert_eq!(vote.total(), 25);
        assert!(LABELS.contains(&vote.label().as_str()));
    }
}

#[test]
fn predicates_are_shared_across_trees() {
    let forest = make_forest(25, 4, 42);
    // Thresholds are drawn from 11 half-steps over 4 fields with 2 operators.
    assert!(forest.registry().len() <= FIELDS.len() * 11 * 2);
    let total_edges: usize = forest.trees().iter().map(|t| t.n_edges()).sum();
    assert!(forest.registry().len() < total_edges);
}

#[test]
fn winner_has_maximum_count() {
    let forest = make_forest(15, 3, 3);
    for record in make_records(100, 11) {
        let vote = forest.vote(&record).unwrap();
        let max = vote.tally().iter().map(|&(_, c)| c).max().unwrap();
        assert_eq!(vote.count(vote.label()), max);

        // Among labels sharing the maximum, the winner is the one whose
        // running count reached it first, replaying trees in order.
        let results = forest.evaluate_predicates(&record).unwrap();
        let mut running: HashMap<&Label, usize> = HashMap::new();
        let mut first_to_max = None;
        for tree in forest.trees() {
            let label = tree.classify(&results).unwrap();
            let count = running.entry(label).or_default();
            *count += 1;
            if *count == max && first_to_max.is_none() {
                first_to_max = Some(label);
            }
        }
        assert_eq!(first_to_max, Some(vote.label()));
    }
}

#[test]
fn same_seed_same_predictions() {
    let a = make_forest(10, 3, 99);
    let b = make_forest(10, 3, 99);
    let records = make_records(50, 5);
    assert_eq!(
        a.classify_batch(&records).unwrap(),
        b.classify_batch(&records).unwrap()
    );
}

#[test]
fn positional_rows_match_named_records() {
    let forest = make_forest(10, 3, 21);
    let records = make_records(40, 8);
    let schema = Schema::new(FIELDS);
    let rows: Vec<Vec<f64>> = records
        .iter()
        .map(|r| FIELDS.iter().map(|f| r[*f]).collect())
        .collect();

    let by_name = forest.classify_batch(&records).unwrap();
    let by_row = forest.classify_rows(&schema, &rows).unwrap();
    assert_eq!(by_name, by_row);
}

#[test]
fn batch_fails_on_any_incomplete_record() {
    let forest = make_forest(5, 2, 4);
    let mut records = make_records(10, 2);
    records[6].clear();
    let err = forest.classify_batch(&records).unwrap_err();
    assert!(matches!(err, ForestError::MissingField { .. }));
}

#[test]
fn labels_cover_reachable_outputs() {
    let forest = make_forest(20, 3, 13);
    let known: Vec<&Label> = forest.labels();
    for record in make_records(100, 17) {
        let label = forest.classify(&record).unwrap();
        assert!(known.contains(&&label));
    }
}
