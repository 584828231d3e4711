use std::io::Write;
use std::process::Command;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::NamedTempFile;

// Test configuration constants
const VALID_CONFIG: &str = r#"{
  "rolename": "cli-test-role",
  "assumeRolePolicyDocument": "{\"Version\":\"2012-10-17\",\"Statement\":[{\"Effect\":\"Allow\",\"Principal\":{\"Service\":\"ec2.amazonaws.com\"},\"Action\":\"sts:AssumeRole\"}]}",
  "policies": [
    { "arn": "arn:aws:iam::aws:policy/ReadOnlyAccess" },
    { "policyName": "s3-read", "policyDocument": "{\"Version\":\"2012-10-17\",\"Statement\":[]}" }
  ]
}"#;

const MISSING_ROLENAME: &str = r#"{ "assumeRolePolicyDocument": "{}" }"#;

const MALFORMED_POLICY: &str = r#"{
  "rolename": "cli-test-role",
  "assumeRolePolicyDocument": "{}",
  "policies": [ { "policyName": "broken-doc", "policyDocument": "{\"Version\": " } ]
}"#;

const DUPLICATE_POLICY: &str = r#"{
  "rolename": "cli-test-role",
  "assumeRolePolicyDocument": "{}",
  "policies": [
    { "policyName": "twice", "policyDocument": "{}" },
    { "policyName": "twice", "policyDocument": "{}" }
  ]
}"#;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write config");
    file
}

#[test]
fn help_lists_subcommands() {
    let out = Command::new(env!("CARGO_BIN_EXE_iam-role-reconciler"))
        .arg("--help")
        .output()
        .expect("failed to run --help");
    let s = String::from_utf8_lossy(&out.stdout);
    for subcommand in ["create", "plan", "validate", "read", "delete"] {
        assert!(s.contains(subcommand), "help should list {subcommand}: {s}");
    }
}

#[test]
fn test_validate_valid_config() {
    let file = config_file(VALID_CONFIG);
    let output = Command::new(env!("CARGO_BIN_EXE_iam-role-reconciler"))
        .args(["validate", "--config"])
        .arg(file.path())
        .output()
        .expect("failed to run validate");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary: serde_json::Value =
        serde_json::from_str(&stdout).expect("validate should print JSON");
    assert_eq!(summary["roleName"], "cli-test-role");
    assert_eq!(summary["inlinePolicies"][0], "s3-read");
    assert_eq!(
        summary["managedPolicies"][0],
        "arn:aws:iam::aws:policy/ReadOnlyAccess"
    );
}

#[test]
fn test_validate_missing_rolename() {
    let file = config_file(MISSING_ROLENAME);
    let output = Command::new(env!("CARGO_BIN_EXE_iam-role-reconciler"))
        .args(["validate", "--config"])
        .arg(file.path())
        .output()
        .expect("failed to run validate");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rolename"), "stderr was: {}", stderr);
}

#[test]
fn test_validate_malformed_policy_names_policy() {
    let file = config_file(MALFORMED_POLICY);
    AssertCommand::cargo_bin("iam-role-reconciler")
        .expect("binary should exist")
        .args(["validate", "--config"])
        .arg(file.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("broken-doc"));
}

#[test]
fn test_validate_duplicate_policy_names() {
    let file = config_file(DUPLICATE_POLICY);
    AssertCommand::cargo_bin("iam-role-reconciler")
        .expect("binary should exist")
        .args(["validate", "--config"])
        .arg(file.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("more than once"));
}

#[test]
fn test_create_rejects_invalid_config_before_aws() {
    // Configuration errors exit with 2 without any AWS credentials being needed.
    let file = config_file(MALFORMED_POLICY);
    let output = Command::new(env!("CARGO_BIN_EXE_iam-role-reconciler"))
        .args(["create", "--config"])
        .arg(file.path())
        .env("AWS_ACCESS_KEY_ID", "")
        .output()
        .expect("failed to run create");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"), "stderr was: {}", stderr);
}

#[test]
fn test_plan_missing_config_file() {
    AssertCommand::cargo_bin("iam-role-reconciler")
        .expect("binary should exist")
        .args(["plan", "--config", "/nonexistent/role.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read configuration file"));
}

#[test]
fn test_read_requires_role() {
    AssertCommand::cargo_bin("iam-role-reconciler")
        .expect("binary should exist")
        .arg("read")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--role"));
}
