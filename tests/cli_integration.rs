// CLI integration tests for the feed and config flows.
use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_diagline");
    Command::new(exe)
}

fn run_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(input)
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn first_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    parse_json(line)
}

fn last_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().last().expect("json line");
    parse_json(line)
}

const TUNNELS: &str =
    r#"{"noticeType":"Tunnels","timestamp":"2006-01-02T15:04:05.000-07:00","data":{"count":2}}"#;

#[test]
fn feed_converts_notice_lines() {
    let output = run_with_stdin(&["feed"], format!("{TUNNELS}\n").as_bytes());
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "[2006-01-02T15:04:05.000-07:00] Tunnels: {\"count\":2}\n"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn feed_reads_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("notices.jsonl");
    std::fs::write(&path, format!("{TUNNELS}\n{TUNNELS}\n")).expect("write");

    let output = cmd()
        .args(["feed", path.to_str().unwrap()])
        .output()
        .expect("feed");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);
}

#[test]
fn feed_json_format_emits_records() {
    let output = run_with_stdin(
        &["feed", "--format", "json"],
        format!("{TUNNELS}\n").as_bytes(),
    );
    assert!(output.status.success());
    let record = first_json_line(&output.stdout);
    assert_eq!(record["message"], "Tunnels: {\"count\":2}");
    assert_eq!(record["timestamp"], "2006-01-02T15:04:05.000-07:00");
}

#[test]
fn feed_skip_reports_and_continues() {
    let input = format!("{TUNNELS}\nnot-json\n{TUNNELS}\n");
    let output = run_with_stdin(&["feed"], input.as_bytes());
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);

    let report = first_json_line(&output.stderr);
    assert_eq!(report["skipped"]["line"], 2);
    let message = report["skipped"]["message"].as_str().expect("message");
    assert!(message.starts_with("notice-error.103:"), "message was: {message}");
    assert_eq!(report["skipped"]["snippet"], "not-json");
}

#[test]
fn feed_stop_exits_with_taxonomy_code() {
    let output = run_with_stdin(&["feed", "--errors", "stop"], b"not-json\n");
    assert_eq!(output.status.code().unwrap(), 7);
    assert!(output.stdout.is_empty());

    let error = first_json_line(&output.stderr);
    assert_eq!(error["error"]["domain"], "notice-error");
    assert_eq!(error["error"]["code"], 103);
    let message = error["error"]["message"].as_str().expect("message");
    assert!(message.starts_with("line 1:"), "message was: {message}");
    assert!(
        error["error"]["hint"]
            .as_str()
            .expect("hint")
            .contains("--errors skip")
    );
    assert!(error["error"]["causes"].as_array().expect("causes").len() >= 1);
}

#[test]
fn feed_summary_counts_every_line() {
    let input = format!(
        "{TUNNELS}\n{{\"other\":true}}\nnot-json\n\n{{\"noticeType\":\"NoData\"}}\n"
    );
    let output = run_with_stdin(&["feed", "--summary"], input.as_bytes());
    assert!(output.status.success());

    let summary = last_json_line(&output.stderr);
    assert_eq!(summary["summary"]["lines"], 4);
    assert_eq!(summary["summary"]["notices"], 1);
    assert_eq!(summary["summary"]["skipped"], 1);
    assert_eq!(summary["summary"]["failed"], 2);
}

#[test]
fn config_check_reports_keys() {
    let output = run_with_stdin(&["config", "check"], br#"{"a":1,"b":{"c":2}}"#);
    assert!(output.status.success());
    let result = first_json_line(&output.stdout);
    assert_eq!(result["ok"], true);
    assert_eq!(result["keys"], 2);
}

#[test]
fn config_check_rejects_non_object_with_taxonomy_code() {
    let output = run_with_stdin(&["config", "check"], b"[1,2,3]");
    assert_eq!(output.status.code().unwrap(), 3);

    let error = first_json_line(&output.stderr);
    assert_eq!(error["error"]["domain"], "config-error");
    assert_eq!(error["error"]["code"], 1);
    assert_eq!(error["error"]["message"], "unexpected config type: array");
    assert!(error["error"]["hint"].as_str().is_some());
}

#[test]
fn config_normalize_round_trips_content() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("client.config");
    let original = r#"{
        "SponsorId" : "0000000000000000",
        "Nested" : { "list": [1, 2, 3], "flag": true }
    }"#;
    std::fs::write(&path, original).expect("write");

    let output = cmd()
        .args(["config", "normalize", path.to_str().unwrap()])
        .output()
        .expect("normalize");
    assert!(output.status.success());

    let normalized: Value =
        serde_json::from_slice(&output.stdout).expect("normalized json");
    let expected: Value = serde_json::from_str(original).expect("original json");
    assert_eq!(normalized, expected);
}

#[test]
fn usage_errors_exit_two() {
    let output = run_with_stdin(&["feed", "--format", "xml"], b"");
    assert_eq!(output.status.code().unwrap(), 2);
    let error = first_json_line(&output.stderr);
    assert_eq!(error["error"]["domain"], "cli-error");
    assert_eq!(error["error"]["code"], 2);
}

#[test]
fn missing_input_file_exits_one() {
    let output = cmd()
        .args(["feed", "/nonexistent/diagline-input.jsonl"])
        .output()
        .expect("feed");
    assert_eq!(output.status.code().unwrap(), 1);
    let error = first_json_line(&output.stderr);
    assert_eq!(error["error"]["domain"], "cli-error");
    assert_eq!(error["error"]["code"], 1);
    assert!(error["error"]["causes"].as_array().expect("causes").len() >= 1);
}

#[test]
fn bare_invocation_prints_help() {
    let output = cmd().output().expect("run");
    assert_eq!(output.status.code().unwrap(), 2);
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("COMMANDS"), "stderr was: {text}");
}

#[test]
fn completions_emit_a_script() {
    let output = cmd().args(["completions", "bash"]).output().expect("run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("diagline"));
}
