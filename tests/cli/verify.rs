//! Tests for `envkey verify`, `log`, and `doctor`.

use crate::support::*;

#[test]
fn verify_passes_on_a_clean_document() {
    let t = Test::with_secrets(STANDARD_SECRETS);
    let output = t.verify();
    assert_success(&output);
    assert_stdout_contains(&output, "matches");
}

#[test]
fn verify_detects_and_fixes_drift() {
    let t = Test::with_secrets(&[("API_KEY", "k")]);

    // splice a new member into the roster without re-keying, as a bad
    // merge resolution would
    let bob_pk = t.create_identity("bob");
    let text = t.document_text();
    let spliced = text.replace(
        "environments:\n",
        &format!(
            "  bob:\n    pubkey: {bob_pk}\n    role: member\n    added: 2026-08-02\nenvironments:\n"
        ),
    );
    std::fs::write(t.document_path(), spliced).unwrap();

    let output = t.verify();
    assert_exit_code(&output, 1);
    assert_stdout_contains(&output, "API_KEY");
    assert_stdout_contains(&output, "expected 2");

    let output = t.cmd().args(["verify", "--fix"]).output().unwrap();
    assert_success(&output);

    assert_success(&t.verify());
    // after the repair, bob can decrypt what he was merged into
    let output = t.get_as("bob", "default", "API_KEY");
    assert_success(&output);
    assert_eq!(stdout(&output), "k\n");
}

#[test]
fn log_shows_audit_metadata() {
    let t = Test::with_secrets(&[("API_KEY", "k")]);
    assert_success(&t.set_in("production", "PROD", "p"));

    let output = t.log();
    assert_success(&output);
    assert_stdout_contains(&output, "API_KEY");
    assert_stdout_contains(&output, "PROD");
    assert_stdout_contains(&output, "alice");
    assert_stdout_excludes(&output, "k\n");
}

#[test]
fn ci_may_not_audit() {
    let t = Test::init();
    let ci_pk = t.create_identity("ci-prod");
    assert_success(&t.member_add_role("ci-prod", &ci_pk, "ci", &["production"]));

    let output = t.cmd_as("ci-prod").arg("log").output().unwrap();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "permission denied");

    let output = t.cmd_as("ci-prod").arg("verify").output().unwrap();
    assert_exit_code(&output, 1);
}

#[test]
fn doctor_passes_on_a_healthy_setup() {
    let t = Test::with_secrets(&[("K", "v")]);
    let output = t.doctor();
    assert_success(&output);
    assert_stdout_contains(&output, "all checks passed");
}

#[test]
fn doctor_reports_a_missing_document() {
    let t = Test::new();
    t.create_identity("alice");
    let output = t.doctor();
    assert_exit_code(&output, 1);
    assert_stdout_contains(&output, "✗");
}

#[test]
fn doctor_flags_a_stranger_identity() {
    let t = Test::with_secrets(&[("K", "v")]);
    t.create_identity("stranger");
    let output = t.cmd_as("stranger").arg("doctor").output().unwrap();
    assert_exit_code(&output, 1);
    assert_stdout_contains(&output, "not in the team");
}
