//! Integration tests for the declass CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_declass"))
}

/// Write a default config into `dir` and return its path.
fn init_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.json");
    cli()
        .arg("config")
        .arg("init")
        .arg("-c")
        .arg(&path)
        .assert()
        .success();
    path
}

/// Stage a split detection model plus companions in `import`.
fn stage_models(dir: &Path, config: &Path) -> (PathBuf, Vec<u8>) {
    let import = dir.join("import");
    let source = dir.join("det.onnx");
    let det: Vec<u8> = (0u8..=250).collect();
    fs::write(&source, &det).unwrap();

    cli()
        .args(["models", "split"])
        .arg(&source)
        .args(["-n", "3", "-o"])
        .arg(&import)
        .arg("-c")
        .arg(config)
        .assert()
        .success()
        .stdout(predicate::str::contains("into 3 parts"));

    fs::write(import.join("en_rec.onnx"), b"rec").unwrap();
    fs::write(import.join("en_dict.txt"), b"a\nb\n").unwrap();
    (import, det)
}

// ============ CONFIG ============

#[test]
fn test_config_init_and_get() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    assert!(config.exists());

    cli()
        .args(["config", "get", "models.detection_model", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("det.onnx"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());

    cli()
        .args(["config", "init", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());

    cli()
        .args(["config", "set", "models.import_dri", "/srv", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));

    cli()
        .args(["config", "set", "models.import_dir", "/srv", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Set models.import_dir"));
}

#[test]
fn test_config_path_reports_missing() {
    let dir = TempDir::new().unwrap();

    cli()
        .args(["config", "path", "-c"])
        .arg(dir.path().join("nope.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}

// ============ MODELS ============

#[test]
fn test_models_split_then_assemble() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    let (import, det) = stage_models(dir.path(), &config);
    let model_dir = dir.path().join("models");

    for part in ["det.onnx.1", "det.onnx.2", "det.onnx.3"] {
        assert!(import.join(part).exists(), "missing {}", part);
    }

    cli()
        .args(["models", "assemble", "--import-dir"])
        .arg(&import)
        .arg("-m")
        .arg(&model_dir)
        .arg("-c")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Models ready"));

    assert_eq!(fs::read(model_dir.join("det.onnx")).unwrap(), det);
    assert_eq!(fs::read(model_dir.join("en_rec.onnx")).unwrap(), b"rec");
    assert_eq!(fs::read(model_dir.join("en_dict.txt")).unwrap(), b"a\nb\n");
}

#[test]
fn test_models_assemble_missing_part() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    let (import, _) = stage_models(dir.path(), &config);
    fs::remove_file(import.join("det.onnx.2")).unwrap();

    cli()
        .args(["models", "assemble", "--import-dir"])
        .arg(&import)
        .arg("-m")
        .arg(dir.path().join("models"))
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("det.onnx.2"));
}

#[test]
fn test_models_status_and_clean() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    let (import, _) = stage_models(dir.path(), &config);
    let model_dir = dir.path().join("models");

    cli()
        .args(["models", "status", "--import-dir"])
        .arg(&import)
        .arg("-m")
        .arg(&model_dir)
        .arg("-c")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("missing"))
        .stdout(predicate::str::contains("declass models assemble"));

    cli()
        .args(["models", "assemble", "--import-dir"])
        .arg(&import)
        .arg("-m")
        .arg(&model_dir)
        .arg("-c")
        .arg(&config)
        .assert()
        .success();

    cli()
        .args(["models", "clean", "-m"])
        .arg(&model_dir)
        .arg("-c")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 3 files"));

    assert!(!model_dir.join("det.onnx").exists());
}

// ============ PROCESS / BATCH ============

#[test]
fn test_process_missing_input() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());

    cli()
        .arg("process")
        .arg(dir.path().join("missing.png"))
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_batch_no_matching_files() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

    cli()
        .arg("batch")
        .arg(format!("{}/*", dir.path().display()))
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_process_help() {
    cli()
        .args(["process", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--model-dir"));
}
