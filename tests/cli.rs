//! CLI behavior tests: exit codes, output formats, init. Fixtures are
//! written to a temp directory per-test rather than checked into the repo,
//! since the gate verdict depends on gate stage thresholds, not fixed
//! golden scores.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sandwich_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sandwich"))
}

fn write_source(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn no_args_returns_error_not_panic() {
    let mut cmd = sandwich_cmd();
    cmd.assert().failure().code(2).stderr(predicate::str::contains("path"));
}

#[test]
fn trivial_function_passes_mvp_gate() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.ts", "function add(a, b) { return a + b; }");
    let mut cmd = sandwich_cmd();
    cmd.arg(&file).arg("--stage").arg("mvp");
    cmd.assert().success();
}

#[test]
fn deeply_nested_function_fails_mvp_gate() {
    let dir = TempDir::new().unwrap();
    let mut src = String::from("function f(x) {\n");
    for _ in 0..6 {
        src.push_str("if (x) {\n");
    }
    for _ in 0..6 {
        src.push_str("}\n");
    }
    src.push_str("}\n");
    let file = write_source(&dir, "deep.ts", &src);

    let mut cmd = sandwich_cmd();
    cmd.arg(&file).arg("--stage").arg("mvp");
    cmd.assert().failure().code(1);
}

#[test]
fn deeply_nested_function_passes_poc_gate() {
    let dir = TempDir::new().unwrap();
    let mut src = String::from("function f(x) {\n");
    for _ in 0..6 {
        src.push_str("if (x) {\n");
    }
    for _ in 0..6 {
        src.push_str("}\n");
    }
    src.push_str("}\n");
    let file = write_source(&dir, "deep.ts", &src);

    let mut cmd = sandwich_cmd();
    cmd.arg(&file).arg("--stage").arg("poc");
    cmd.assert().success();
}

#[test]
fn json_output_is_valid_and_has_expected_shape() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.ts", "function add(a, b) { return a + b; }");

    let mut cmd = sandwich_cmd();
    cmd.arg(&file).arg("--json");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let s = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(s.trim()).expect("valid JSON");
    assert!(parsed.get("result").is_some());
    assert!(parsed.get("gate").is_some());
    assert!(parsed["result"]["raw"].get("bread").is_some());
}

#[test]
fn sarif_output_is_valid_and_has_runs() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.ts", "function add(a, b) { return a + b; }");

    let mut cmd = sandwich_cmd();
    cmd.arg(&file).arg("--sarif");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let s = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(s.trim()).expect("valid SARIF JSON");
    assert!(parsed.get("runs").is_some());
    assert_eq!(parsed["version"], "2.1.0");
}

#[test]
fn file_not_found_exit_2() {
    let mut cmd = sandwich_cmd();
    cmd.arg("nonexistent.ts");
    cmd.assert().failure().code(2);
}

#[test]
fn unknown_stage_is_an_input_error() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.ts", "function add(a, b) { return a + b; }");
    let mut cmd = sandwich_cmd();
    cmd.arg(&file).arg("--stage").arg("nope");
    cmd.assert().failure().code(2);
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(".sandwich.json");
    let mut cmd = sandwich_cmd();
    cmd.arg("init").arg("--dir").arg(dir.path());
    cmd.assert().success();
    assert!(config_path.exists());
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("defaultStage"));
}

#[test]
fn init_does_not_overwrite_existing_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(".sandwich.json");
    fs::write(&config_path, r#"{"defaultStage":"production"}"#).unwrap();

    let mut cmd = sandwich_cmd();
    cmd.arg("init").arg("--dir").arg(dir.path());
    cmd.assert().success();

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("production"));
}

#[test]
fn init_with_stage_option_is_reflected_in_config() {
    let dir = TempDir::new().unwrap();
    let mut cmd = sandwich_cmd();
    cmd.arg("init").arg("--dir").arg(dir.path()).arg("--stage").arg("production");
    cmd.assert().success();

    let content = fs::read_to_string(dir.path().join(".sandwich.json")).unwrap();
    assert!(content.contains("production"));
}

#[test]
fn analyze_directory_returns_output() {
    let dir = TempDir::new().unwrap();
    write_source(&dir, "a.ts", "function add(a, b) { return a + b; }");
    write_source(&dir, "b.ts", "function sub(a, b) { return a - b; }");

    let mut cmd = sandwich_cmd();
    cmd.arg(dir.path()).arg("--stage").arg("poc");
    cmd.assert().success();
}

#[test]
fn check_gate_subcommand_prints_verdict_json() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.ts", "function add(a, b) { return a + b; }");
    let mut cmd = sandwich_cmd();
    cmd.arg("check-gate").arg(&file).arg("--stage").arg("poc");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(parsed.get("passed").is_some());
}

#[test]
fn check_gate_subcommand_exits_1_on_failing_gate() {
    let dir = TempDir::new().unwrap();
    let mut src = String::from("function f(x) {\n");
    for _ in 0..6 {
        src.push_str("if (x) {\n");
    }
    for _ in 0..6 {
        src.push_str("}\n");
    }
    src.push_str("}\n");
    let file = write_source(&dir, "deep.ts", &src);
    let mut cmd = sandwich_cmd();
    cmd.arg("check-gate").arg(&file).arg("--stage").arg("mvp");
    cmd.assert().failure().code(1);
}

#[test]
fn suggest_refactor_subcommand_prints_a_json_array() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.ts", "function add(a, b) { return a + b; }");
    let mut cmd = sandwich_cmd();
    cmd.arg("suggest-refactor").arg(&file);
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(parsed.is_array());
}

#[test]
fn get_label_subcommand_prints_label_and_confidence() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.ts", "function add(a, b) { return a + b; }");
    let mut cmd = sandwich_cmd();
    cmd.arg("get-label").arg(&file);
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(parsed.get("label").is_some());
    assert!(parsed.get("confidence").is_some());
}

#[test]
fn check_budget_subcommand_prints_verdict_json() {
    let dir = TempDir::new().unwrap();
    let before = write_source(&dir, "before.ts", "function add(a, b) { return a + b; }");
    let after = write_source(&dir, "after.ts", "function add(a, b) { return a + b; }");
    let mut cmd = sandwich_cmd();
    cmd.arg("check-budget").arg(&before).arg(&after);
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(parsed.get("withinBudget").is_some());
}

#[test]
fn check_degradation_subcommand_prints_report_json() {
    let dir = TempDir::new().unwrap();
    let before = write_source(&dir, "before.ts", "function add(a, b) { return a + b; }");
    let after = write_source(&dir, "after.ts", "function add(a, b) { return a + b; }");
    let mut cmd = sandwich_cmd();
    cmd.arg("check-degradation").arg(&before).arg(&after);
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(parsed.get("severity").is_some());
}

#[test]
fn quiet_flag_does_not_panic_and_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "math.ts", "function add(a, b) { return a + b; }");
    let mut cmd = sandwich_cmd();
    cmd.arg(&file).arg("--quiet").arg("--stage").arg("poc");
    cmd.assert().success();
}
