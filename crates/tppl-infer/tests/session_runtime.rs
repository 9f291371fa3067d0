use std::cell::RefCell;

use serde_json::json;
use tppl_core::{ErrorInfo, ErrorKind, TpplError, Value};
use tppl_infer::{RunConfig, Runtime, Session};
use tppl_wire::{input_digest, Arguments, Tree, VariantRegistry};

struct CountLeaves {
    seen: RefCell<Vec<serde_json::Value>>,
}

impl Runtime for CountLeaves {
    fn invoke(&self, input: &[u8]) -> Result<Vec<u8>, TpplError> {
        let document: serde_json::Value = serde_json::from_slice(input).unwrap();
        let tree = serde_json::to_string(&document["tree"]).unwrap();
        let leaves = tree.matches("\"Leaf\"").count();
        self.seen.borrow_mut().push(document);
        Ok(serde_json::to_vec(&json!({
            "samples": [leaves],
            "weights": [0.0],
            "normConst": 0.0
        }))
        .unwrap())
    }
}

fn tree_args() -> Arguments {
    let tree = Tree::node(
        Tree::node(Tree::leaf(0.0), Tree::leaf(0.0), 0.5),
        Tree::leaf(0.0),
        1.0,
    );
    let mut args = Arguments::new();
    args.insert("tree".into(), tree.to_value().unwrap());
    args
}

#[test]
fn session_round_trips_through_runtime() {
    let registry = VariantRegistry::standard();
    let runtime = CountLeaves {
        seen: RefCell::new(Vec::new()),
    };
    let mut session = Session::new(runtime, &registry, RunConfig::default());

    let first = session.call(&tree_args()).unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(first.result.samples(), &[Value::Int(3)]);
    assert_eq!(first.result.norm_const(), 0.0);

    let second = session.call(&tree_args()).unwrap();
    assert_eq!(second.index, 1);
    assert_eq!(second.input_digest, first.input_digest);
    assert_eq!(session.calls(), 2);

    let expected = tppl_wire::encode_arguments(&tree_args()).unwrap();
    assert_eq!(first.input_digest, input_digest(&expected).unwrap());
}

#[test]
fn call_rngs_are_independent_substreams() {
    use rand::RngCore;

    let registry = VariantRegistry::standard();
    let runtime = |_: &[u8]| -> Result<Vec<u8>, TpplError> {
        Ok(br#"{"samples": [1, 2], "weights": [0.0, 0.0]}"#.to_vec())
    };
    let mut session = Session::new(runtime, &registry, RunConfig::default());
    let a = session.call(&Arguments::new()).unwrap();
    let b = session.call(&Arguments::new()).unwrap();
    assert_ne!(
        session.rng_for(&a).next_u64(),
        session.rng_for(&b).next_u64()
    );
    assert_eq!(
        session.rng_for(&a).next_u64(),
        session.rng_for(&a).next_u64()
    );
}

#[test]
fn runtime_failures_propagate_unchanged() {
    let registry = VariantRegistry::standard();
    let runtime = |_: &[u8]| -> Result<Vec<u8>, TpplError> {
        Err(TpplError::Runtime(ErrorInfo::new("exit-status", "runtime exited with 1")))
    };
    let mut session = Session::new(runtime, &registry, RunConfig::default());
    let err = session.call(&Arguments::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(session.calls(), 0);
}

#[test]
fn crashed_runtime_output_is_malformed() {
    let registry = VariantRegistry::standard();
    let runtime =
        |_: &[u8]| -> Result<Vec<u8>, TpplError> { Ok(b"{\"samples\": [1.0, 2".to_vec()) };
    let mut session = Session::new(runtime, &registry, RunConfig::default());
    let err = session.call(&Arguments::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedOutput);
}
