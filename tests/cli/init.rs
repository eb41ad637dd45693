//! Tests for `envkey init`.

use crate::support::*;

#[test]
fn init_creates_document_and_identity() {
    let t = Test::new();

    let output = t.init_cmd("alice");
    assert_success(&output);
    assert_stdout_contains(&output, "alice");

    assert!(t.document_path().exists());
    assert!(t.identity_path("alice").exists());

    let text = t.document_text();
    assert!(text.starts_with("version: 1"));
    assert!(text.contains("  alice:"));
    assert!(text.contains("    role: admin"));
    assert!(text.contains("environments:"));
    assert!(text.contains("  default: {}"));
}

#[test]
fn init_twice_fails_with_document_error() {
    let t = Test::init();

    let output = t.init_cmd("alice");
    assert_exit_code(&output, 3);
    assert_stderr_contains(&output, "already exists");
}

#[test]
fn init_reuses_an_existing_identity() {
    let t = Test::new();
    let pubkey = t.create_identity("alice");

    let output = t.init_cmd("alice");
    assert_success(&output);
    assert_stdout_contains(&output, "using existing identity");
    assert_stdout_contains(&output, &pubkey);
}

#[cfg(unix)]
#[test]
fn identity_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::init();
    let mode = std::fs::metadata(t.identity_path("alice"))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn scenario_init_set_get() {
    let t = Test::init();

    assert_success(&t.set("DATABASE_URL", "postgres://u:p@h/db"));

    let output = t.get("DATABASE_URL");
    assert_success(&output);
    assert_eq!(stdout(&output), "postgres://u:p@h/db\n");

    // one env, one entry, one admin
    let text = t.document_text();
    assert_eq!(text.matches("    role:").count(), 1);
    assert_eq!(text.matches("      set_by:").count(), 1);
    assert!(text.contains("    DATABASE_URL:"));
}
