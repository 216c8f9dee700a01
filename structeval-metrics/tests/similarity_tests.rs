use approx::assert_relative_eq;
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{json, Value};
use structeval_core::{MetricCalculator, Structure, Table};
use structeval_metrics::*;

// ===== Similarity Tests =====

#[rstest]
#[case(json!({"a": 1, "b": 2}), json!({"a": 1, "b": 2}), 1.0)]
#[case(json!({"a": 1}), json!({"b": 1}), 0.0)]
#[case(json!([1, 2, 3]), json!([1, 2]), 0.5 * (2.0 / 3.0) + 0.5)]
#[case(json!(1), json!("1"), 0.0)]
#[case(json!({}), json!({}), 1.0)]
#[case(json!([]), json!([]), 1.0)]
#[case(json!([]), json!([1]), 0.0)]
#[case(json!({"a": 1}), json!({}), 0.0)]
#[case(json!({"a": 1, "b": 2}), json!({"a": 1, "c": 2}), 0.5 * 0.5 + 0.5)]
#[case(json!({"a": 1, "b": 2}), json!({"a": 2, "b": 2}), 0.5 + 0.5 * 0.5)]
#[case(json!([1, 2]), json!([2, 1]), 0.5)]
#[case(json!("x"), json!("x"), 1.0)]
#[case(json!(null), json!(null), 1.0)]
fn test_structure_similarity(#[case] a: Value, #[case] b: Value, #[case] expected: f64) {
    assert_relative_eq!(structure_similarity(&a, &b), expected, epsilon = 1e-12);
}

#[test]
fn test_array_vs_object_is_mismatch() {
    assert_eq!(structure_similarity(&json!([]), &json!({})), 0.0);
    assert_eq!(structure_similarity(&json!([1]), &json!({"0": 1})), 0.0);
}

#[test]
fn test_integer_vs_float_is_mismatch() {
    assert_eq!(structure_similarity(&json!(1), &json!(1.0)), 0.0);
    assert_eq!(structure_similarity(&json!(true), &json!(1)), 0.0);
}

#[test]
fn test_nested_similarity() {
    let input = json!({"book": {"title": "Dune", "tags": ["sf", "classic"]}});
    let output = json!({"book": {"title": "Dune", "tags": ["sf"]}});

    // tags: 0.5 * 1/2 + 0.5 * 1 = 0.75; book: 0.5 + 0.5 * (1 + 0.75) / 2 = 0.9375
    let expected = 0.5 + 0.5 * 0.9375;
    assert_relative_eq!(structure_similarity(&input, &output), expected, epsilon = 1e-12);
}

#[test]
fn test_extra_array_positions_only_cost_length_ratio() {
    let long = json!([1, 2, "three", {"four": 4}]);
    let short = json!([1, 2]);

    assert_relative_eq!(structure_similarity(&long, &short), 0.75, epsilon = 1e-12);
}

fn single_column(header: &str, cells: &[&str]) -> Structure {
    Structure::Table(Table::new(
        vec![header.into()],
        cells.iter().map(|cell| vec![cell.to_string()]).collect(),
    ))
}

#[test]
fn test_table_compares_as_rows_with_header() {
    let table = single_column("name", &["apple"]);
    let rows = Structure::Tree(json!([["name"], ["apple"]]));

    assert_eq!(structures_similarity(&table, &rows), 1.0);
    assert_eq!(structures_similarity(&table, &table.clone()), 1.0);
}

#[test]
fn test_table_against_records_list() {
    let table = single_column("a", &["1", "2"]);
    let records = Structure::Tree(json!([{"a": 1}, {"a": 2}]));

    // Three rows against two objects: only the length ratio contributes.
    assert_relative_eq!(
        structures_similarity(&records, &table),
        1.0 / 3.0,
        epsilon = 1e-12
    );
}

#[tokio::test]
async fn test_similarity_calculator() {
    let calculator = StructureSimilarityCalculator::new();

    let result = calculator
        .calculate(SimilarityInput {
            reference: Structure::Tree(json!({"a": 1})),
            candidate: Structure::Tree(json!({"a": 1})),
        })
        .await
        .unwrap();

    assert_eq!(result.score, rust_decimal::Decimal::ONE);
    assert_eq!(result.metadata["metric"], json!("structure_similarity"));
}

// ===== Properties =====

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(Value::from),
        "[ab]{0,2}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]", inner, 0..3)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_similarity_in_unit_interval(a in arb_json(), b in arb_json()) {
        let score = structure_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score), "score {score}");
    }

    #[test]
    fn prop_similarity_is_reflexive(a in arb_json()) {
        prop_assert!((structure_similarity(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prop_similarity_is_symmetric(a in arb_json(), b in arb_json()) {
        let forward = structure_similarity(&a, &b);
        let backward = structure_similarity(&b, &a);
        prop_assert!((forward - backward).abs() < 1e-12);
    }
}
