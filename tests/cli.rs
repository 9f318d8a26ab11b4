#![cfg(feature = "http")]

use std::path::Path;
use std::process::{Command, Output};

fn cli(config: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_roast-monitor"));
    command.arg("--config").arg(config);
    command
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let config = serde_json::json!({
        "acquisition": { "sample_interval_ms": 10 },
        "sensor": { "kind": "simulated", "failure_rate": 0.0 },
        "store": { "data_dir": dir.join("roasts") },
    });
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout utf8")
}

#[test]
fn record_list_show_delete() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = cli(&config)
        .args(["record", "--seconds", "1", "--bean-info", "CLI test beans"])
        .output()
        .expect("record command");
    assert!(
        output.status.success(),
        "record exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Saved roast 1"));

    let output = cli(&config).arg("list").output().expect("list command");
    assert!(output.status.success());
    assert!(stdout(&output).contains(" - CLI test b"));

    let output = cli(&config).args(["show", "1"]).output().expect("show command");
    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("record JSON");
    assert_eq!(record["bean_info"], "CLI test beans");
    assert_eq!(record["elapsed_seconds"][0], 0.0);

    let output = cli(&config).args(["delete", "1"]).output().expect("delete command");
    assert!(output.status.success());

    let output = cli(&config).args(["show", "1"]).output().expect("show command");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn list_with_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = cli(&config).arg("list").output().expect("list command");
    assert!(output.status.success());
    assert!(stdout(&output).contains("No saved roasts"));
}
