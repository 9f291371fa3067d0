use std::fs;
use std::process::Command;

use serde_json::Value;

const OUTPUT: &str = r#"{
    "samples": [
        {"__constructor__": "Leaf", "age": 0.0},
        {"__constructor__": "Leaf", "age": 1.0},
        {"__constructor__": "Leaf", "age": 1.0}
    ],
    "weights": [-1.0, 0.0, null],
    "normConst": -3.5
}"#;

fn tppl(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tppl"))
        .args(args)
        .output()
        .expect("run tppl")
}

#[test]
fn summarize_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    fs::write(&path, OUTPUT).unwrap();

    let output = tppl(&["summarize", "--output", path.to_str().unwrap()]);
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(summary["samples"], 3);
    assert_eq!(summary["norm_const"], -3.5);
    assert_eq!(summary["ess"], Value::Null);
}

#[test]
fn subsample_is_reproducible_for_a_seed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    fs::write(&path, OUTPUT).unwrap();

    let output = tppl(&[
        "subsample",
        "--count",
        "50",
        "--seed",
        "7",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let draws: Value = serde_json::from_slice(&output.stdout).expect("json");
    let draws = draws.as_array().expect("array");
    assert_eq!(draws.len(), 50);
    assert!(draws
        .iter()
        .all(|draw| draw["__constructor__"] == "Leaf" && draw["age"].as_f64().is_some()));

    let again = tppl(&[
        "subsample",
        "--count",
        "50",
        "--seed",
        "7",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert_eq!(again.stdout, output.stdout);
}

#[test]
fn encode_canonicalises_and_rejects_unknown_tags() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("args.json");
    fs::write(
        &good,
        r#"{"tree": {"age": 2, "__constructor__": "Leaf"}, "rho": 0.5}"#,
    )
    .unwrap();
    let output = tppl(&["encode", "--input", good.to_str().unwrap(), "--digest"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.trim(),
        r#"{"tree":{"__constructor__":"Leaf","age":2},"rho":0.5}"#
    );
    let digest = String::from_utf8(output.stderr).unwrap();
    assert!(digest.lines().any(|line| line.len() == 64));

    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"tree": {"__constructor__": "Bogus"}}"#).unwrap();
    let output = tppl(&["encode", "--input", bad.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn compile_args_follow_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("run.yaml");
    fs::write(&config, "particles: 250\nsubsamples: 10\n").unwrap();
    let output = tppl(&[
        "compile-args",
        "--config",
        config.to_str().unwrap(),
        "--source",
        "model.tppl",
    ]);
    assert!(output.status.success());
    let args: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        args,
        ["model.tppl", "-m", "smc-bpf", "-p", "250", "--subsample", "-n", "10"]
    );
}
