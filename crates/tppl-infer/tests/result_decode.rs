use std::io::Cursor;

use serde_json::json;
use tppl_core::{ErrorKind, RngHandle, Value};
use tppl_infer::{InferenceResult, OutputConfig, ResultSummary};
use tppl_wire::{Decoder, Tree, VariantRegistry};

fn decode(document: serde_json::Value) -> Result<InferenceResult, tppl_core::TpplError> {
    let registry = VariantRegistry::standard();
    InferenceResult::from_document(&document, &Decoder::new(&registry))
}

#[test]
fn tree_samples_decode_with_weights() {
    let bytes = br#"{
        "samples": [
            {"__constructor__": "Node",
             "left": {"__constructor__": "Leaf", "age": 0.0},
             "right": {"__constructor__": "Leaf", "age": 0.0},
             "age": 1.0},
            {"__constructor__": "Leaf", "age": 0.0}
        ],
        "weights": [-0.5, -1.5],
        "normConst": -2.25
    }"#;
    let registry = VariantRegistry::standard();
    let result =
        InferenceResult::from_slice(bytes, &Decoder::new(&registry), &OutputConfig::default())
            .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.norm_const(), -2.25);
    assert_eq!(result.log_weights(), &[-0.5, -1.5]);
    let trees: Vec<Tree> = result
        .samples()
        .iter()
        .map(|sample| Tree::from_value(sample).unwrap())
        .collect();
    assert_eq!(trees[0].leaf_count(), 2);
    assert!(trees[1].is_leaf());

    let nweights = result.nweights();
    assert!((nweights[0] - (-0.5f64).exp()).abs() < 1e-15);
    assert_eq!(nweights, result.normalized_weights());
}

#[test]
fn missing_keys_take_defaults() {
    let result = decode(json!({"samples": [1, 2, 3]})).unwrap();
    assert_eq!(result.len(), 3);
    assert!(result.log_weights().is_empty());
    assert!(result.norm_const().is_nan());

    let err = result.subsample(2, &mut RngHandle::from_seed(1)).unwrap_err();
    assert_eq!(err.info().code, "empty-weights");
    let err = result.effective_sample_size().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateWeights);
    assert_eq!(result.summary().ess, None);
    assert_eq!(result.summary().ess_error.as_deref(), Some("weights-missing"));

    let empty = decode(json!({})).unwrap();
    assert!(empty.is_empty());
    assert!(empty.log_weights().is_empty());
}

#[test]
fn misaligned_weights_are_malformed() {
    let err = decode(json!({"samples": [1, 2], "weights": [0.0]})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedOutput);
    assert_eq!(err.info().code, "length-mismatch");
}

#[test]
fn structural_problems_are_malformed() {
    for document in [
        json!([1, 2, 3]),
        json!({"samples": 3}),
        json!({"samples": [1], "weights": ["x"]}),
        json!({"samples": [1], "weights": 0.0}),
        json!({"samples": [1], "normConst": "high"}),
    ] {
        assert_eq!(decode(document).unwrap_err().kind(), ErrorKind::MalformedOutput);
    }
}

#[test]
fn unknown_sample_tags_fail_the_whole_result() {
    let err = decode(json!({"samples": [{"__constructor__": "Bogus"}], "weights": [0.0]}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTag);
}

#[test]
fn garbled_stdout_is_malformed() {
    let registry = VariantRegistry::standard();
    let output = OutputConfig { preview_bytes: 12 };
    let err = InferenceResult::from_reader(
        Cursor::new(b"Segmentation fault\n{\"samples\": [".to_vec()),
        &Decoder::new(&registry),
        &output,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedOutput);
    assert_eq!(err.info().context["preview"], "Segmentation...");
}

#[test]
fn items_project_named_fields() {
    let result = decode(json!({
        "samples": [
            {"lambda": 0.5, "mu": 0.1},
            {"lambda": 0.7, "mu": 0.2}
        ],
        "weights": [0.0, 0.0]
    }))
    .unwrap();
    let items = result.items(&["mu", "lambda"]).unwrap();
    assert_eq!(items[1], vec![&Value::Real(0.2), &Value::Real(0.7)]);

    let err = result.items(&["sigma"]).unwrap_err();
    assert_eq!(err.info().code, "missing-field");
}

#[test]
fn summary_reports_ess_and_constants() {
    let result = decode(json!({
        "samples": [1.0, 1.0, 2.0],
        "weights": [0.0, 0.0, 0.0],
        "normConst": -4.0
    }))
    .unwrap();
    let summary = result.summary();
    assert_eq!(summary.samples, 3);
    assert_eq!(summary.norm_const, Some(-4.0));
    assert!((summary.ess.unwrap() - 1.8).abs() < 1e-12);
    assert_eq!(summary.max_log_weight, Some(0.0));

    let json = serde_json::to_value(&summary).unwrap();
    let back: ResultSummary = serde_json::from_value(json).unwrap();
    assert_eq!(back, summary);

    let trees = decode(json!({"samples": [{"__constructor__": "Leaf", "age": 0.0}]})).unwrap();
    let summary = trees.summary();
    assert_eq!(summary.ess, None);
    assert_eq!(summary.ess_error.as_deref(), Some("weights-missing"));
    assert_eq!(summary.norm_const, None);
}

#[test]
fn summary_keeps_the_reason_ess_is_missing() {
    let trees = decode(json!({
        "samples": [{"__constructor__": "Leaf", "age": 0.0}],
        "weights": [0.0]
    }))
    .unwrap();
    assert_eq!(trees.summary().ess_error.as_deref(), Some("non-real-sample"));

    let poisoned = InferenceResult::new(
        vec![Value::Real(1.0), Value::Real(2.0)],
        vec![0.0, f64::NAN],
        0.0,
    )
    .unwrap();
    let summary = poisoned.summary();
    assert_eq!(summary.ess, None);
    assert_eq!(summary.ess_error.as_deref(), Some("non-finite-log-weight"));

    let healthy = InferenceResult::new(vec![Value::Real(1.0)], vec![0.0], 0.0).unwrap();
    let summary = healthy.summary();
    assert_eq!(summary.ess, Some(1.0));
    assert_eq!(summary.ess_error, None);
    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("ess_error").is_none());
}
