//! End-to-end tests for the query-sentinel binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(rel)
}

fn sentinel() -> Command {
    Command::cargo_bin("query-sentinel").expect("binary builds")
}

#[test]
fn test_analyze_clean_stream_passes() {
    sentinel()
        .arg("analyze")
        .arg(fixture("streams/clean.json"))
        .arg("--policy-root")
        .arg(fixture("policy"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No unsafe call sites found"));
}

#[test]
fn test_analyze_tainted_stream_fails_with_diagnostic() {
    sentinel()
        .arg("analyze")
        .arg(fixture("streams/tainted.json"))
        .arg("--policy-root")
        .arg(fixture("policy"))
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("QueryBuilder::where"))
        .stdout(predicate::str::contains("1 High"));
}

#[test]
fn test_analyze_without_policy_denies_by_default() {
    // With only built-ins the call is never vetted: unsafe but silent.
    sentinel()
        .arg("analyze")
        .arg(fixture("streams/tainted.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No unsafe call sites found"));
}

#[test]
fn test_analyze_json_format() {
    sentinel()
        .arg("analyze")
        .arg(fixture("streams/tainted.json"))
        .arg("--policy-root")
        .arg(fixture("policy"))
        .arg("--format")
        .arg("json")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"diagnostics\""))
        .stdout(predicate::str::contains("\"unsafe_argument\""));
}

#[test]
fn test_analyze_markdown_format() {
    sentinel()
        .arg("analyze")
        .arg(fixture("streams/tainted.json"))
        .arg("--policy-root")
        .arg(fixture("policy"))
        .arg("--format")
        .arg("markdown")
        .assert()
        .failure()
        .stdout(predicate::str::contains("# "))
        .stdout(predicate::str::contains("QueryBuilder"));
}

#[test]
fn test_analyze_severity_filter_drops_info() {
    sentinel()
        .arg("analyze")
        .arg(fixture("streams/tainted.json"))
        .arg("--policy-root")
        .arg(fixture("policy"))
        .arg("--severity")
        .arg("critical")
        .assert()
        .success()
        .stdout(predicate::str::contains("No unsafe call sites found"));
}

#[test]
fn test_analyze_directory_of_streams() {
    sentinel()
        .arg("analyze")
        .arg(fixture("streams"))
        .arg("--policy-root")
        .arg(fixture("policy"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("QueryBuilder::where"));
}

#[test]
fn test_policy_command_lists_tables() {
    sentinel()
        .arg("policy")
        .arg(fixture("policy"))
        .assert()
        .success()
        .stdout(predicate::str::contains("check_methods"))
        .stdout(predicate::str::contains("trusted_data.json"));
}

#[test]
fn test_version_command() {
    sentinel()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
