//! Exit-code contract tests.

use crate::support::*;

#[test]
fn usage_errors_exit_64() {
    let t = Test::new();
    let output = t.cmd().arg("frobnicate").output().unwrap();
    assert_exit_code(&output, 64);

    let output = t.cmd().arg("set").output().unwrap();
    assert_exit_code(&output, 64);
}

#[test]
fn help_and_version_exit_0() {
    use predicates::prelude::*;

    let t = Test::new();
    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Secrets without servers"));
    t.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("envkey"));
}

#[test]
fn missing_document_exits_3() {
    let t = Test::new();
    t.create_identity("alice");
    let output = t.get("ANY");
    assert_exit_code(&output, 3);
    assert_stderr_contains(&output, "envkey init");
}

#[test]
fn missing_identity_exits_4() {
    let t = Test::init();
    let output = t.get_as("ghost", "default", "ANY");
    assert_exit_code(&output, 4);
    assert_stderr_contains(&output, "no identity found");
}

#[test]
fn malformed_identity_exits_4() {
    let t = Test::init();
    std::fs::write(t.identity_path("broken"), "not a key\n").unwrap();
    let output = t.get_as("broken", "default", "ANY");
    assert_exit_code(&output, 4);
}

#[test]
fn tampered_ciphertext_exits_2() {
    let t = Test::with_secrets(&[("API_KEY", "k")]);

    // flip the ciphertext body while keeping valid base64
    let text = t.document_text();
    let tampered = text.replace("value: |-", "value: |-\n        AAAA");
    std::fs::write(t.document_path(), tampered).unwrap();

    let output = t.get("API_KEY");
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "corrupt");
}

#[test]
fn unsupported_version_exits_3() {
    let t = Test::init();
    let text = t.document_text().replace("version: 1", "version: 9");
    std::fs::write(t.document_path(), text).unwrap();

    let output = t.ls();
    assert_exit_code(&output, 3);
    assert_stderr_contains(&output, "unsupported version");
}

#[cfg(unix)]
#[test]
fn strict_mode_promotes_loose_permissions_to_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::with_secrets(&[("K", "v")]);
    std::fs::set_permissions(
        t.identity_path("alice"),
        std::fs::Permissions::from_mode(0o644),
    )
    .unwrap();

    // default: warning only, the read succeeds
    assert_success(&t.get("K"));

    // strict: fatal with the identity exit code
    let output = t.cmd().args(["--strict", "get", "K"]).output().unwrap();
    assert_exit_code(&output, 4);
    assert_stderr_contains(&output, "chmod 600");
}

#[test]
fn envkey_file_overrides_the_document_path() {
    let t = Test::init();
    assert_success(&t.set("K", "v"));

    let moved = t.dir.path().join("elsewhere.yaml");
    std::fs::rename(t.document_path(), &moved).unwrap();

    let output = t
        .cmd()
        .env("ENVKEY_FILE", &moved)
        .args(["get", "K"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "v\n");
}
