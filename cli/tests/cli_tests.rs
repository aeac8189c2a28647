// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use gotrain_cli::sgf_load::{self, SgfLoadArgs};
use gotrain_cli::train::{fit, write_report, BackendKind, TrainArgs};
use gotrain_trainer::{AutoencoderConfig, GrayImage, TrainingConfig, TrainingReport};
use std::fs;
use std::path::Path;

const GAME: &str = "(;GM[1]FF[4]SZ[9]C[a \\] b];B[ee](;W[gc])(;W[cc]))";

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn run_sgf(args: &[&str]) -> anyhow::Result<String> {
    let args = SgfLoadArgs::try_parse_from(args)?;
    let mut out = Vec::new();
    sgf_load::run(&args, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn prints_parse_tree_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "game.sgf", GAME);

    let out = run_sgf(&["sgf-load", doc.to_str().unwrap()]).unwrap();
    assert!(out.starts_with("collection:"), "{out}");
    assert!(out.contains("game_tree:"));
    assert!(out.contains("\"SZ\""));
}

#[test]
fn prints_properties_one_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "game.sgf", GAME);

    let out = run_sgf(&["sgf-load", "--properties", doc.to_str().unwrap()]).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        ["GM[1]", "FF[4]", "SZ[9]", "C[a \\] b]", "B[ee]", "W[gc]", "W[cc]"]
    );
}

#[test]
fn properties_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "game.sgf", GAME);

    let out = run_sgf(&["sgf-load", "--properties", "--json", doc.to_str().unwrap()]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 7);
    assert_eq!(list[3]["key"], "C");
    assert_eq!(list[3]["value"], "a ] b");
    assert_eq!(list[3]["pattern"], "()[]");
}

#[test]
fn emit_grammar_writes_ebnf() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "game.sgf", GAME);
    let emitted = dir.path().join("sgf.out.ebnf");

    run_sgf(&[
        "sgf-load",
        "--emit-grammar",
        emitted.to_str().unwrap(),
        doc.to_str().unwrap(),
    ])
    .unwrap();
    let text = fs::read_to_string(&emitted).unwrap();
    assert!(text.contains("game_tree ="));
}

#[test]
fn failed_parse_emits_no_grammar() {
    let dir = tempfile::tempdir().unwrap();
    let emitted = dir.path().join("sgf.out.ebnf");
    let bad = write(dir.path(), "bad.sgf", "(;B[ee]");

    for doc in [dir.path().join("missing.sgf"), bad] {
        let result = run_sgf(&[
            "sgf-load",
            "--emit-grammar",
            emitted.to_str().unwrap(),
            doc.to_str().unwrap(),
        ]);
        assert!(result.is_err());
        assert!(!emitted.exists());
    }
}

#[test]
fn flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "loader.json",
        r#"{ "start_rule": "game_tree", "max_depth": 64 }"#,
    );

    let args = SgfLoadArgs::try_parse_from([
        "sgf-load",
        "--config",
        config.to_str().unwrap(),
        "--start-rule",
        "collection",
        "doc.sgf",
    ])
    .unwrap();
    let loader = args.loader_config().unwrap();
    assert_eq!(loader.start_rule.as_deref(), Some("collection"));
    assert_eq!(loader.max_depth, 64);
    assert_eq!(loader.grammar_path, None);
}

#[test]
fn malformed_document_fails() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "bad.sgf", "(;B[ee]");

    let err = run_sgf(&["sgf-load", doc.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("parse error"), "{err:#}");
}

#[test]
fn missing_document_fails() {
    assert!(run_sgf(&["sgf-load", "/nonexistent/game.sgf"]).is_err());
}

#[test]
fn train_flags_override_defaults() {
    let args = TrainArgs::try_parse_from([
        "train-autoencoder",
        "--epochs",
        "3",
        "--batch-size",
        "32",
        "--learning-rate",
        "0.01",
        "--backend",
        "ndarray",
        "--no-viewer",
    ])
    .unwrap();
    assert_eq!(args.backend, BackendKind::Ndarray);
    assert!(args.no_viewer);

    let config = args.training_config().unwrap();
    assert_eq!(config.epochs, 3);
    assert_eq!(config.batch_size, 32);
    assert!((config.learning_rate - 0.01).abs() < f64::EPSILON);
    assert_eq!(config.train_size, TrainingConfig::default().train_size);
}

#[test]
fn backend_defaults_to_wgpu_and_rejects_unknown() {
    let args = TrainArgs::try_parse_from(["train-autoencoder"]).unwrap();
    assert_eq!(args.backend, BackendKind::Wgpu);
    assert!(TrainArgs::try_parse_from(["train-autoencoder", "--backend", "cuda"]).is_err());
}

#[test]
fn train_config_file_is_merged_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "train.json", r#"{ "train_size": 100, "seed": 9 }"#);

    let args = TrainArgs::try_parse_from([
        "train-autoencoder",
        "--config",
        config.to_str().unwrap(),
        "--seed",
        "11",
    ])
    .unwrap();
    let merged = args.training_config().unwrap();
    assert_eq!(merged.train_size, 100);
    assert_eq!(merged.seed, 11);

    let zero = TrainArgs::try_parse_from(["train-autoencoder", "--epochs", "0"]).unwrap();
    assert!(zero.training_config().is_err());
}

#[test]
fn fit_returns_original_and_reconstruction_pairs() {
    use burn::backend::{Autodiff, NdArray};

    let images: Vec<GrayImage> = (0..4)
        .map(|n| {
            let pixels = (0..100).map(|i| ((i + n) % 7) as f32 / 7.0).collect();
            GrayImage::new(10, 10, pixels).unwrap()
        })
        .collect();
    let config = TrainingConfig {
        model: AutoencoderConfig {
            depth: 0,
            ..AutoencoderConfig::default()
        },
        batch_size: 2,
        ..TrainingConfig::default()
    };

    let device = Default::default();
    let (report, pairs) = fit::<Autodiff<NdArray>>(&config, &images, &images[..1], &device).unwrap();
    assert_eq!(report.steps, 2);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0, images[0]);
    assert_eq!((pairs[0].1.width, pairs[0].1.height), (10, 10));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    write_report(&path, &report).unwrap();
    let back: TrainingReport = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back.steps, 2);
}
