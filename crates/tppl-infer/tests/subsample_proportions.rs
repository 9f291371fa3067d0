use serde_json::json;
use tppl_core::{ErrorKind, RngHandle, Value};
use tppl_infer::{draw_indices, InferenceResult};
use tppl_wire::{Decoder, VariantRegistry};

#[test]
fn equal_log_weights_split_draws_evenly() {
    let result = InferenceResult::new(
        vec![Value::from("A"), Value::from("B")],
        vec![0.0, 0.0],
        f64::NAN,
    )
    .unwrap();
    let mut rng = RngHandle::from_seed(2024);
    let draws = result.subsample(100_000, &mut rng).unwrap();
    assert_eq!(draws.len(), 100_000);
    let a = draws.iter().filter(|value| ***value == Value::from("A")).count();
    // Binomial standard deviation is about 158 draws.
    assert!((a as i64 - 50_000).abs() < 1_500, "A drawn {a} times");
}

#[test]
fn draws_follow_relative_weights() {
    let result = InferenceResult::new(
        vec![Value::Int(0), Value::Int(1)],
        vec![0.0, 3f64.ln()],
        -1.0,
    )
    .unwrap();
    let mut rng = RngHandle::from_seed(11);
    let indices = result.subsample_indices(40_000, &mut rng).unwrap();
    let ones = indices.iter().filter(|idx| **idx == 1).count();
    assert!((ones as i64 - 30_000).abs() < 1_000, "index 1 drawn {ones} times");
}

#[test]
fn subsampling_is_reproducible_per_seed() {
    let result = InferenceResult::new(
        (0..10).map(Value::Int).collect(),
        (0..10).map(|idx| -(idx as f64)).collect(),
        0.0,
    )
    .unwrap();
    let first = result
        .subsample_indices(50, &mut RngHandle::from_seed(3))
        .unwrap();
    let second = result
        .subsample_indices(50, &mut RngHandle::from_seed(3))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn zero_weights_are_degenerate() {
    let mut rng = RngHandle::from_seed(1);
    let err = draw_indices(&[0.0, 0.0, 0.0], 10, &mut rng).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateWeights);
    assert_eq!(err.info().code, "all-zero-weights");

    let err = draw_indices(&[], 10, &mut rng).unwrap_err();
    assert_eq!(err.info().code, "empty-weights");
}

#[test]
fn zero_weight_results_are_degenerate() {
    let registry = VariantRegistry::standard();
    let decoder = Decoder::new(&registry);
    let document = json!({"samples": [1.0, 2.0, 3.0], "weights": [null, null, null]});
    let result = InferenceResult::from_document(&document, &decoder).unwrap();
    let err = result
        .subsample(5, &mut RngHandle::from_seed(9))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateWeights);

    let empty = InferenceResult::new(Vec::new(), Vec::new(), f64::NAN).unwrap();
    let err = empty.subsample(1, &mut RngHandle::from_seed(9)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateWeights);
}

#[test]
fn huge_log_weights_do_not_overflow() {
    let result = InferenceResult::new(
        vec![Value::Int(0), Value::Int(1)],
        vec![5_000.0, f64::NEG_INFINITY],
        0.0,
    )
    .unwrap();
    let draws = result
        .subsample_indices(100, &mut RngHandle::from_seed(4))
        .unwrap();
    assert!(draws.iter().all(|idx| *idx == 0));
}
