//! Tests for `envkey member` and the re-keying protocol.

use crate::support::*;

#[test]
fn scenario_two_party_share() {
    let t = Test::init();
    let bob_pk = t.create_identity("bob");

    assert_success(&t.member_add("bob", &bob_pk));
    assert_success(&t.set("API_KEY", "k-123"));

    let output = t.get_as("bob", "default", "API_KEY");
    assert_success(&output);
    assert_eq!(stdout(&output), "k-123\n");
}

#[test]
fn adding_a_member_rekeys_existing_secrets() {
    // secret set before bob joins must be readable by bob afterwards
    let t = Test::with_secrets(&[("EARLY", "before-bob")]);
    let bob_pk = t.create_identity("bob");

    assert_success(&t.member_add("bob", &bob_pk));

    let output = t.get_as("bob", "default", "EARLY");
    assert_success(&output);
    assert_eq!(stdout(&output), "before-bob\n");
}

#[test]
fn scenario_member_removal_rekeys() {
    let t = Test::init();
    let bob_pk = t.create_identity("bob");
    assert_success(&t.member_add("bob", &bob_pk));
    assert_success(&t.set("API_KEY", "k-123"));

    let before = t.document_text();
    let output = t.member_rm("bob");
    assert_success(&output);
    assert_stdout_contains(&output, "rotate --all");

    // every ciphertext in default was replaced
    let after = t.document_text();
    assert_ne!(before, after);
    assert!(!after.contains("  bob:"));

    // bob, with his retained identity and the new document, is locked out
    // cryptographically: exit 2, not a policy error
    let output = t.get_as("bob", "default", "API_KEY");
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "not a recipient");

    // alice still reads the same plaintext
    let output = t.get("API_KEY");
    assert_success(&output);
    assert_eq!(stdout(&output), "k-123\n");
}

#[test]
fn scenario_ci_environment_isolation() {
    let t = Test::init();
    let ci_pk = t.create_identity("ci-prod");

    assert_success(&t.member_add_role("ci-prod", &ci_pk, "ci", &["production"]));
    assert_success(&t.set_in("production", "DATABASE_URL", "prod-url"));
    assert_success(&t.set("FOO", "default-only"));

    // ci reads its granted environment
    let output = t.get_as("ci-prod", "production", "DATABASE_URL");
    assert_success(&output);
    assert_eq!(stdout(&output), "prod-url\n");

    // the default environment denies ci before any crypto
    let output = t.get_as("ci-prod", "default", "FOO");
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "no access");

    // and the ciphertext itself is not addressed to ci-prod
    let doc = envkey::testkit::read(&t.document_path()).unwrap();
    let entry = &doc.env("default").unwrap()["FOO"];
    let ci = envkey::core::Identity::load(
        &envkey::core::config::IdentitySource::Path(t.identity_path("ci-prod")),
        false,
    )
    .unwrap();
    let err = envkey::testkit::decrypt(&entry.value, ci.as_age()).unwrap_err();
    assert!(err.to_string().contains("not a recipient"));
}

#[test]
fn ci_without_environments_is_rejected() {
    let t = Test::init();
    let ci_pk = t.create_identity("ci");
    let output = t.member_add_role("ci", &ci_pk, "ci", &[]);
    assert_exit_code(&output, 3);
    assert_stderr_contains(&output, "explicit environments");
}

#[test]
fn grant_and_revoke_change_what_ci_can_read() {
    let t = Test::init();
    let ci_pk = t.create_identity("ci-stage");
    assert_success(&t.member_add_role("ci-stage", &ci_pk, "ci", &["staging"]));
    assert_success(&t.set_in("production", "TOKEN", "t-1"));

    assert_exit_code(&t.get_as("ci-stage", "production", "TOKEN"), 1);

    assert_success(&t.member_grant("ci-stage", "production"));
    let output = t.get_as("ci-stage", "production", "TOKEN");
    assert_success(&output);
    assert_eq!(stdout(&output), "t-1\n");

    assert_success(&t.member_revoke("ci-stage", "production"));
    assert_exit_code(&t.get_as("ci-stage", "production", "TOKEN"), 1);
}

#[test]
fn last_admin_is_protected() {
    let t = Test::init();
    let bob_pk = t.create_identity("bob");
    assert_success(&t.member_add("bob", &bob_pk));

    // alice cannot remove herself, and bob (a member) cannot manage the team
    let output = t.member_rm("alice");
    assert_exit_code(&output, 1);

    let output = t
        .cmd_as("bob")
        .args(["member", "rm", "alice", "--yes"])
        .output()
        .unwrap();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "permission denied");
}

#[test]
fn invalid_pubkey_is_rejected() {
    let t = Test::init();
    let output = t.member_add("mallory", INVALID_PUBLIC_KEY);
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "invalid age public key");
}

#[test]
fn duplicate_member_name_is_rejected() {
    let t = Test::init();
    let output = t.member_add("alice", ORPHAN_PUBLIC_KEY);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "already in use");
}

#[test]
fn member_ls_lists_roles_and_entitlements() {
    let t = Test::init();
    let ci_pk = t.create_identity("ci-prod");
    assert_success(&t.member_add_role("ci-prod", &ci_pk, "ci", &["production"]));

    let output = t.member_ls();
    assert_success(&output);
    assert_stdout_contains(&output, "alice");
    assert_stdout_contains(&output, "admin");
    assert_stdout_contains(&output, "all");
    assert_stdout_contains(&output, "ci-prod");
    assert_stdout_contains(&output, "production");
}

#[test]
fn member_update_swaps_keys() {
    let t = Test::init();
    let bob_pk = t.create_identity("bob");
    assert_success(&t.member_add("bob", &bob_pk));
    assert_success(&t.set("K", "v"));

    let bob2_pk = t.create_identity("bob-new");
    let output = t
        .cmd()
        .args(["member", "update", "bob", &bob2_pk])
        .output()
        .unwrap();
    assert_success(&output);

    // the old identity is locked out, the new file reads
    assert_exit_code(&t.get_as("bob", "default", "K"), 2);
    let output = t.get_as("bob-new", "default", "K");
    assert_success(&output);
    assert_eq!(stdout(&output), "v\n");
}
