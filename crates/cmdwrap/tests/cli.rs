use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

use cmdwrap::generate::generate_from_bytes;
use cmdwrap_contracts::CMDWRAP_REPORT_SCHEMA_VERSION;

fn repo_root() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn schema_path(name: &str) -> PathBuf {
    repo_root().join("tests/schemas").join(name)
}

fn run_cmdwrap(args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_cmdwrap");
    Command::new(exe)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run cmdwrap")
}

fn parse_json_stdout(out: &std::process::Output) -> Value {
    serde_json::from_slice(&out.stdout).expect("parse stdout JSON")
}

fn stderr(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn path_str(p: &Path) -> &str {
    p.to_str().expect("utf-8 path")
}

#[test]
fn usage_errors_exit_non_zero() {
    let out = run_cmdwrap(&[]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Usage"), "stderr:\n{}", stderr(&out));

    let net = schema_path("net.json");
    let out = run_cmdwrap(&[path_str(&net), path_str(&net)]);
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
}

#[test]
fn generates_both_artifacts_and_is_idempotent() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let net = schema_path("net.json");
    let args = [
        path_str(&net),
        "--out-dir",
        path_str(tmp.path()),
        "--report-json",
    ];

    let out = run_cmdwrap(&args);
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    let v = parse_json_stdout(&out);
    assert_eq!(v["schema_version"], CMDWRAP_REPORT_SCHEMA_VERSION);
    assert_eq!(v["command"], "generate");
    assert_eq!(v["ok"], true);
    let artifacts = v["artifacts"].as_array().expect("artifacts[]");
    assert_eq!(artifacts.len(), 2);
    assert!(artifacts.iter().all(|a| a["outcome"] == "written"));

    let expected = generate_from_bytes(&std::fs::read(&net).expect("read schema"))
        .expect("generate net")
        .artifacts;
    let h = std::fs::read_to_string(tmp.path().join("net_commands.h")).expect("read header");
    let c = std::fs::read_to_string(tmp.path().join("net_commands.c")).expect("read source");
    assert_eq!(h, expected.header_src);
    assert_eq!(c, expected.source_src);

    let first_sha: Vec<Value> = artifacts.iter().map(|a| a["sha256"].clone()).collect();
    let out = run_cmdwrap(&args);
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    let v = parse_json_stdout(&out);
    let artifacts = v["artifacts"].as_array().expect("artifacts[]");
    assert!(artifacts.iter().all(|a| a["outcome"] == "unchanged"));
    let second_sha: Vec<Value> = artifacts.iter().map(|a| a["sha256"].clone()).collect();
    assert_eq!(first_sha, second_sha);
}

#[test]
fn check_mode_detects_missing_and_stale_artifacts() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let sw = schema_path("switch.json");
    let dir = path_str(tmp.path());

    let out = run_cmdwrap(&[path_str(&sw), "--out-dir", dir, "--check"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("missing"), "stderr:\n{}", stderr(&out));

    let out = run_cmdwrap(&[path_str(&sw), "--out-dir", dir, "--write-policy", "direct"]);
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));

    let out = run_cmdwrap(&[path_str(&sw), "--out-dir", dir, "--check"]);
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));

    std::fs::write(tmp.path().join("vde_switch_commands.c"), "/* edited */\n").expect("edit");
    let out = run_cmdwrap(&[path_str(&sw), "--out-dir", dir, "--check", "--report-json"]);
    assert_eq!(out.status.code(), Some(1));
    let v = parse_json_stdout(&out);
    assert_eq!(v["command"], "check");
    assert_eq!(v["ok"], false);
    assert_eq!(v["diagnostics"][0]["code"], "CMDWRAP-CHECK-STALE-0001");
    assert_eq!(v["artifacts"][0]["outcome"], "fresh");
    assert_eq!(v["artifacts"][1]["outcome"], "stale");
}

#[test]
fn unknown_type_is_reported_with_location() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let bad = schema_path("bad_type.json");

    let out = run_cmdwrap(&[path_str(&bad), "--out-dir", path_str(tmp.path())]);
    assert_eq!(out.status.code(), Some(2));
    let err = stderr(&out);
    assert!(err.contains("\"float\""), "stderr:\n{err}");
    assert!(err.contains("/wrappables/0/parameters/0/type"), "stderr:\n{err}");
    assert!(err.contains("bad_type.json"), "stderr:\n{err}");
    assert!(!tmp.path().join("bad_commands.h").exists());

    let out = run_cmdwrap(&[path_str(&bad), "--out-dir", path_str(tmp.path()), "--report-json"]);
    assert_eq!(out.status.code(), Some(2));
    let v = parse_json_stdout(&out);
    assert_eq!(v["ok"], false);
    assert_eq!(v["exit_code"], 2);
    assert_eq!(v["diagnostics"][0]["code"], "CMDWRAP-TYPE-UNKNOWN-0001");
    assert_eq!(
        v["diagnostics"][0]["loc"]["ptr"],
        "/wrappables/0/parameters/0/type"
    );
}

#[test]
fn unreadable_and_malformed_schemas_fail_cleanly() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let missing = tmp.path().join("nope.json");
    let out = run_cmdwrap(&[path_str(&missing)]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("nope.json"), "stderr:\n{}", stderr(&out));

    let malformed = tmp.path().join("broken.json");
    std::fs::write(&malformed, b"{\"basename\": \"x\", ").expect("write schema");
    let out = run_cmdwrap(&[path_str(&malformed), "--report-json"]);
    assert_eq!(out.status.code(), Some(2));
    let v = parse_json_stdout(&out);
    assert_eq!(v["diagnostics"][0]["code"], "CMDWRAP-SCHEMA-LOAD-0001");

    let no_wrappables = tmp.path().join("partial.json");
    std::fs::write(&no_wrappables, b"{\"basename\": \"x\"}").expect("write schema");
    let out = run_cmdwrap(&[path_str(&no_wrappables), "--report-json"]);
    assert_eq!(out.status.code(), Some(2));
    let v = parse_json_stdout(&out);
    assert_eq!(v["diagnostics"][0]["code"], "CMDWRAP-SCHEMA-FORMAT-0001");
    assert!(v["diagnostics"][0]["message"]
        .as_str()
        .expect("message")
        .contains("missing required field: wrappables"));
}

#[test]
fn lint_findings_do_not_block_generation() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let schema = tmp.path().join("dup.json");
    std::fs::write(
        &schema,
        br#"{"basename": "dup", "wrappables": [
            {"name": "a.b", "fun": "a_b", "description": "", "parameters": []},
            {"name": "a.b", "fun": "a_b2", "description": "", "parameters": []}
        ]}"#,
    )
    .expect("write schema");
    let out_dir = tmp.path().join("out");
    let out = run_cmdwrap(&[path_str(&schema), "--out-dir", path_str(&out_dir), "--report-json"]);
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    let v = parse_json_stdout(&out);
    assert_eq!(v["ok"], true);
    assert_eq!(v["diagnostics"][0]["code"], "CMDWRAP-LINT-DUP-NAME-0001");
    assert_eq!(v["diagnostics"][0]["severity"], "warning");
    assert!(stderr(&out).contains("duplicate command name"));

    let h = std::fs::read_to_string(out_dir.join("dup_commands.h")).expect("read header");
    assert_eq!(h.matches("{ \"a.b\", ").count(), 2);
}

#[test]
fn schema_size_limit_is_configurable() {
    let net = schema_path("net.json");
    let out = Command::new(env!("CARGO_BIN_EXE_cmdwrap"))
        .args([path_str(&net), "--check", "--report-json"])
        .env("CMDWRAP_MAX_SCHEMA_BYTES", "16")
        .output()
        .expect("run cmdwrap");
    assert_eq!(out.status.code(), Some(2));
    let v = parse_json_stdout(&out);
    assert_eq!(v["diagnostics"][0]["code"], "CMDWRAP-SCHEMA-LOAD-0001");
    assert!(v["diagnostics"][0]["message"]
        .as_str()
        .expect("message")
        .contains("schema too large"));
}

#[test]
fn basename_cannot_leave_the_out_dir() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let schema = tmp.path().join("escape.json");
    std::fs::write(&schema, br#"{"basename": "../escaped", "wrappables": []}"#)
        .expect("write schema");
    let out_dir = tmp.path().join("out");

    let out = run_cmdwrap(&[path_str(&schema), "--out-dir", path_str(&out_dir), "--report-json"]);
    assert_eq!(out.status.code(), Some(2));
    let v = parse_json_stdout(&out);
    assert_eq!(v["diagnostics"][0]["code"], "CMDWRAP-SCHEMA-FORMAT-0001");
    assert_eq!(v["diagnostics"][0]["loc"]["ptr"], "/basename");
    assert!(!tmp.path().join("escaped_commands.h").exists());
}
