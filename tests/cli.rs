//! Integration tests: run the tandem binary and check exit codes and output.

use std::io::Write;
use std::process::Command;

fn tandem() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tandem"));
    cmd.env("NO_COLOR", "1").env_remove("TANDEM_WORKERS");
    cmd
}

fn data_file() -> String {
    format!("{}/data/pokedex.json", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_help() {
    let out = tandem().arg("--help").output().unwrap();
    assert!(out.status.success(), "tandem --help should succeed");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("cook"));
    assert!(stdout.contains("break"));
    assert!(stdout.contains("queue"));
}

#[test]
fn test_version() {
    let out = tandem().arg("--version").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cook_reports_both_timings() {
    let out = tandem()
        .args(["--workers", "2", "cook", "--unit-ms", "20"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("SequentialExecution"));
    assert!(stdout.contains("ParallelExecution"));
    assert!(stdout.contains("Elapsed Time:"));
    assert!(stdout.contains("Enjoy It!"));
}

#[test]
fn test_env_workers_overrides_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"workers": 1}}"#).unwrap();
    let out = tandem()
        .env("TANDEM_WORKERS", "3")
        .args(["--config", file.path().to_str().unwrap(), "cook", "--unit-ms", "1"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("on 3 workers"), "stdout: {}", stdout);
}

#[test]
fn test_workers_flag_overrides_env() {
    let out = tandem()
        .env("TANDEM_WORKERS", "3")
        .args(["--workers", "2", "cook", "--unit-ms", "1"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("on 2 workers"), "stdout: {}", stdout);
}

#[test]
fn test_zero_workers_rejected_from_every_source() {
    let out = tandem()
        .args(["--workers", "0", "cook", "--unit-ms", "1"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("workers must be at least 1"));

    let out = tandem()
        .env("TANDEM_WORKERS", "0")
        .args(["cook", "--unit-ms", "1"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("TANDEM_WORKERS"));
}

#[test]
fn test_break_reports_lowest_index() {
    let out = tandem()
        .args(["break", "--at", "10", "--count", "30", "--delay-ms", "1"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Executed all items? false"));
    assert!(stdout.contains("Lowest Break Iteration: 10"));
}

#[test]
fn test_break_never_requested() {
    let out = tandem()
        .args(["-q", "break", "--count", "20", "--delay-ms", "1"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Executed all items? true"));
    assert!(stdout.contains("Lowest Break Iteration: none"));
}

#[test]
fn test_continue_runs_failure_branch() {
    let out = tandem().arg("continue").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Ops! An error occurred!"));
    assert!(!stdout.contains("World!"));
    assert!(stdout.contains("failure continuation ran"));
}

#[test]
fn test_continue_succeed_runs_success_branch() {
    let out = tandem().args(["continue", "--succeed"]).output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Hello"));
    assert!(stdout.contains("World!"));
}

#[test]
fn test_queue_completes_all_items() {
    let out = tandem()
        .args(["queue", "--count", "4", "--delay-ms", "5"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Is Thread in Pool Thread? true"));
    assert!(stdout.contains("Queued 4 item(s): 4 completed, 0 failed."));
}

#[test]
fn test_names_from_data_file() {
    let out = tandem()
        .args(["names", "--degree", "2", "--data", &data_file()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Pokemon : Bulbasaur"));
    assert!(stdout.contains("10 record(s)."));
}

#[test]
fn test_names_missing_data_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let out = tandem()
        .args(["names", "--data", missing.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Failed to read"));
}

#[test]
fn test_explicit_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"workers": 1, "dataFile": "{}"}}"#, data_file()).unwrap();
    let out = tandem()
        .args(["--config", file.path().to_str().unwrap(), "names", "--sequential"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Pokemon : Pikachu"));
}

#[test]
fn test_invalid_config_file_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"workers": 0}}"#).unwrap();
    let out = tandem()
        .args(["--config", file.path().to_str().unwrap(), "cook", "--unit-ms", "1"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}
