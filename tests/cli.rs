use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

const PATTERNS: &str = r#"
svc:
  filePattern: "svc.*\\.log$"
  lineFormat: '(?P<timestamp>\S+) (?P<level>\w+) (?P<msg>.*)'
  show: [level, msg]
  patterns:
    - regex: 'WARN'
      color: amarillo
"#;

fn logmerge(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logmerge"))
        .arg("--path")
        .arg(root.join("logs"))
        .arg("--highlight-config")
        .arg(root.join("log_patterns.yaml"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    fs::create_dir_all(logs.join("east/alpha")).unwrap();
    fs::create_dir_all(logs.join("east/beta")).unwrap();
    fs::write(
        logs.join("east/alpha/svc.log"),
        "2024-01-01T10:00:00.000Z INFO from alpha\n",
    )
    .unwrap();
    fs::write(
        logs.join("east/beta/svc.log"),
        "2024-01-01T09:00:00.000Z WARN from beta\n",
    )
    .unwrap();
    fs::write(dir.path().join("log_patterns.yaml"), PATTERNS).unwrap();
    dir
}

#[test]
fn test_earlier_controller_line_prints_first() {
    let dir = fixture();
    let out = logmerge(dir.path(), &["--output", "plain"]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "2024-01-01 09:00:00.000+00:00 east/beta svc: WARN from beta\n\
         2024-01-01 10:00:00.000+00:00 east/alpha svc: INFO from alpha\n"
    );
}

#[test]
fn test_json_output() {
    let dir = fixture();
    let out = logmerge(dir.path(), &["--output", "json", "--controllers", "beta"]);
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["store"], "east");
    assert_eq!(record["controller"], "beta");
    assert_eq!(record["component"], "svc");
    assert_eq!(record["message"], "WARN from beta");
    assert_eq!(record["highlights"][0]["color"], "yellow");
}

#[test]
fn test_missing_config_fails() {
    let dir = fixture();
    fs::remove_file(dir.path().join("log_patterns.yaml")).unwrap();
    let out = logmerge(dir.path(), &["--output", "plain"]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("log_patterns.yaml"));
}

#[test]
fn test_bad_offset_rejected() {
    let dir = fixture();
    let out = logmerge(dir.path(), &["--naive-offset", "sideways"]);
    assert!(!out.status.success());
}
