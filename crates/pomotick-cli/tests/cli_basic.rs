//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data
//! directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pomotick"));
    cmd.env("POMOTICK_DATA_DIR", data_dir).env("RUST_LOG", "off");
    cmd
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = cli(data_dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    stdout
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let stdout = run_cli_success(data_dir, args);
    serde_json::from_str(&stdout).expect("output is JSON")
}

#[test]
fn test_task_set_and_current() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_cli_success(dir.path(), &["task", "current"]).trim(), "No task set");

    let out = run_cli_success(dir.path(), &["task", "set", "write", "the", "docs"]);
    assert!(out.contains("write the docs"));
    assert_eq!(
        run_cli_success(dir.path(), &["task", "current"]).trim(),
        "write the docs"
    );
}

#[test]
fn test_task_set_rejects_blank() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["task", "set", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Task description must not be empty"), "{stderr}");
}

#[test]
fn test_task_list_json_and_filter() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["task", "set", "first"]);
    run_cli_success(dir.path(), &["task", "mark", "completed"]);
    run_cli_success(dir.path(), &["task", "set", "second"]);

    let all = run_json(dir.path(), &["task", "list", "--json"]);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["description"], "second");
    assert_eq!(all[0]["status"], "ongoing");
    assert_eq!(all[1]["status"], "completed");

    let done = run_json(dir.path(), &["task", "list", "--filter", "completed", "--json"]);
    assert_eq!(done.as_array().unwrap().len(), 1);
    assert_eq!(done[0]["description"], "first");

    let text = run_cli_success(dir.path(), &["task", "list"]);
    assert!(text.contains("second (ongoing)"), "{text}");
}

#[test]
fn test_task_mark_without_history_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["task", "mark", "completed"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"), "{stderr}");
}

#[test]
fn test_timer_status_defaults() {
    let dir = TempDir::new().unwrap();
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["mode"], "focus");
    assert_eq!(status["remaining_seconds"], 1500);
    assert_eq!(status["clock"], "25:00");
    assert_eq!(status["completed_focus_count"], 0);
}

#[test]
fn test_timer_duration_persists() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["timer", "duration", "--focus", "50", "--break", "10"]);

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["focus_duration"], 3000);
    assert_eq!(status["break_duration"], 600);
    assert_eq!(status["remaining_seconds"], 3000);
}

#[test]
fn test_timer_duration_out_of_range() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "duration", "--focus", "90", "--break", "5"]);
    assert_eq!(code, 1);
    assert!(
        stderr.contains("Focus time must be between 1-60 minutes (got 90)"),
        "{stderr}"
    );
}

#[test]
fn test_timer_switch_and_reset() {
    let dir = TempDir::new().unwrap();
    let switched = run_json(dir.path(), &["timer", "switch"]);
    assert_eq!(switched["mode"], "break");
    assert_eq!(switched["remaining_seconds"], 300);

    let status = run_json(dir.path(), &["timer", "reset"]);
    assert_eq!(status["mode"], "break");
    assert_eq!(status["remaining_seconds"], 300);
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "timer.focus_minutes"]).trim(),
        "25"
    );
    run_cli_success(dir.path(), &["config", "set", "timer.focus_minutes", "45"]);
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "timer.focus_minutes"]).trim(),
        "45"
    );
    assert!(dir.path().join("config.toml").exists());

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.focus_minutes", "0"]);
    assert_eq!(code, 1);
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown config key: timer.nope"), "{stderr}");

    run_cli_success(dir.path(), &["config", "reset"]);
    let list = run_json(dir.path(), &["config", "list", "--json"]);
    assert_eq!(list["timer"]["focus_minutes"], 25);
    let text = run_cli_success(dir.path(), &["config", "list"]);
    assert!(text.contains("notifications.timeout_secs = 10"), "{text}");

    let path = run_cli_success(dir.path(), &["config", "path"]);
    assert!(path.trim().ends_with("config.toml"), "{path}");
}

#[test]
fn test_run_reads_commands_from_stdin() {
    let dir = TempDir::new().unwrap();
    let mut child = cli(dir.path())
        .args(["run", "--focus", "2", "--break", "1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"t review the plan\nl\nq\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Focus 02:00"), "{stdout}");
    assert!(stdout.contains("Current task: review the plan"), "{stdout}");

    assert_eq!(
        run_cli_success(dir.path(), &["task", "current"]).trim(),
        "review the plan"
    );
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["focus_duration"], 120);
}

#[test]
fn test_run_rejects_blank_task() {
    let dir = TempDir::new().unwrap();
    let output = cli(dir.path())
        .args(["run", "--task", "   "])
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("error: Task description must not be empty"), "{stderr}");
    assert_eq!(run_cli_success(dir.path(), &["task", "current"]).trim(), "No task set");
}
