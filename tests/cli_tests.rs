//! End-to-end tests of the tramd binary
#![allow(deprecated)] // Command::cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tramd() -> Command {
    Command::cargo_bin("tramd").unwrap()
}

#[test]
fn test_out_file_writes_columns_and_figures() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("run");

    tramd()
        .arg(fixture("test_data.out"))
        .arg("-o")
        .arg(&base)
        .args(["-n", "2000", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Replicas:                 15"))
        .stdout(predicate::str::contains("Effective residence time:"))
        .stderr(predicate::str::contains("Found 15 dissociation times in 1 file."));

    let times = fs::read_to_string(dir.path().join("run_times.dat")).unwrap();
    let lines: Vec<&str> = times.lines().collect();
    assert_eq!(lines.len(), 15);
    assert!(lines[0].starts_with("1.742"));
    assert!(lines[0].ends_with("e+00"));

    let bootstrap = fs::read_to_string(dir.path().join("run_bootstrap.dat")).unwrap();
    assert_eq!(bootstrap.lines().count(), 2000);

    assert!(dir.path().join("run_times.svg").exists());
    assert!(dir.path().join("run_bootstrap.svg").exists());
}

#[test]
fn test_same_seed_same_output() {
    let dir = TempDir::new().unwrap();
    for name in ["a", "b"] {
        tramd()
            .arg(fixture("test_data.out"))
            .arg("-o")
            .arg(dir.path().join(name))
            .args(["-n", "500", "--seed", "99", "--no-plots"])
            .assert()
            .success();
    }
    let a = fs::read(dir.path().join("a_bootstrap.dat")).unwrap();
    let b = fs::read(dir.path().join("b_bootstrap.dat")).unwrap();
    assert_eq!(a, b);
    assert!(!dir.path().join("a_times.svg").exists());
}

#[test]
fn test_json_summary() {
    let dir = TempDir::new().unwrap();
    let output = tramd()
        .arg(fixture("test_data.out"))
        .arg("-o")
        .arg(dir.path().join("run"))
        .args(["-n", "300", "--seed", "5", "--format", "json", "--no-plots"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["replicas"], 15);
    assert_eq!(summary["n_samples"], 300);
    assert_eq!(summary["sample_size"], 12);
    assert_eq!(summary["seed"], 5);
}

#[test]
fn test_invalid_mode_fails_naming_allowed_values() {
    tramd()
        .arg(fixture("test_data.out"))
        .args(["--mode", "xvg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"log\""))
        .stderr(predicate::str::contains("\"out\""));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    tramd()
        .arg(dir.path().join("nope.out"))
        .arg("-o")
        .arg(dir.path().join("run"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.out"));
}

#[test]
fn test_sample_size_too_large_fails() {
    let dir = TempDir::new().unwrap();
    tramd()
        .arg(fixture("test_data.out"))
        .arg("-o")
        .arg(dir.path().join("run"))
        .args(["--sample-size", "16", "--no-plots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sample_size"));
}

#[test]
fn test_parallel_run() {
    let dir = TempDir::new().unwrap();
    tramd()
        .arg(fixture("test_data.out"))
        .arg("-o")
        .arg(dir.path().join("run"))
        .args(["-n", "3000", "--seed", "4", "--parallel", "--threads", "2", "--no-plots"])
        .assert()
        .success();
    let bootstrap = fs::read_to_string(dir.path().join("run_bootstrap.dat")).unwrap();
    assert_eq!(bootstrap.lines().count(), 3000);
}

#[test]
fn test_config_file_with_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("tramd.toml");
    fs::write(&config, "n_samples = 100\nseed = 3\nsample_size = 5\n").unwrap();

    tramd()
        .arg(fixture("test_data.out"))
        .arg("-o")
        .arg(dir.path().join("run"))
        .arg("--config")
        .arg(&config)
        .args(["-n", "250", "--no-plots"])
        .assert()
        .success()
        .stdout(predicate::str::contains("250 samples of 5 replicas"));
}

#[test]
fn test_colvar_mode() {
    let dir = TempDir::new().unwrap();
    let mut cmd = tramd();
    for (i, cross) in [12.0, 30.0, 18.0, 45.0].iter().enumerate() {
        let path = dir.path().join(format!("COLVAR.{}", i));
        fs::write(
            &path,
            format!(
                "#! FIELDS time r angle\n0 0.5 10\n{} 2.5 20\n60 3.0 30\n",
                cross
            ),
        )
        .unwrap();
        cmd.arg(path);
    }

    cmd.arg("-o")
        .arg(dir.path().join("cv"))
        .args(["--colvar", "--r-diss", "2.0", "-n", "200", "--seed", "8"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Found 4 dissociation times in 4 time series."));

    let times = fs::read_to_string(dir.path().join("cv_times.dat")).unwrap();
    assert_eq!(times.lines().next(), Some("1.200000000000000000e+01"));
    assert!(dir.path().join("cv_cv").join("angle").join("sim3.svg").exists());
    assert!(dir.path().join("cv_cv").join("r").join("sim0.svg").exists());
}
