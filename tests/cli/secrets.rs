//! Tests for `envkey set/get/ls/rm` and document texture.

use crate::support::*;

#[test]
fn set_is_an_upsert() {
    let t = Test::with_secrets(&[("API_KEY", "first")]);

    assert_success(&t.set("API_KEY", "second"));

    let output = t.get("API_KEY");
    assert_success(&output);
    assert_eq!(stdout(&output), "second\n");
}

#[test]
fn invalid_secret_names_are_rejected() {
    let t = Test::init();

    assert_exit_code(&t.set("1BAD", "v"), 3);
    assert_exit_code(&t.set("API-KEY", "v"), 3);
    assert_exit_code(&t.set("has space", "v"), 3);
}

#[test]
fn get_missing_key_fails_with_operation_error() {
    let t = Test::init();
    let output = t.get("NOPE");
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "not found");
}

#[test]
fn rm_removes_and_reports_missing() {
    let t = Test::with_secrets(&[("TMP", "v")]);

    assert_success(&t.rm("TMP"));
    assert_exit_code(&t.get("TMP"), 1);
    assert_exit_code(&t.rm("TMP"), 1);
}

#[test]
fn ls_shows_metadata_but_never_plaintext() {
    let t = Test::with_secrets(STANDARD_SECRETS);

    let output = t.ls();
    assert_success(&output);
    assert_stdout_contains(&output, "DATABASE_URL");
    assert_stdout_contains(&output, "alice");
    for (_, value) in STANDARD_SECRETS {
        assert_stdout_excludes(&output, value);
    }

    let output = t.cmd().args(["ls", "--json"]).output().unwrap();
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(parsed.as_array().unwrap().len(), STANDARD_SECRETS.len());
}

#[test]
fn document_never_contains_plaintext() {
    let t = Test::with_secrets(STANDARD_SECRETS);
    let text = t.document_text();
    for (_, value) in STANDARD_SECRETS {
        assert!(!text.contains(value), "plaintext leaked into the document");
    }
}

#[test]
fn environments_serialize_deterministically() {
    let t = Test::init();
    assert_success(&t.set_in("production", "Z_KEY", "1"));
    assert_success(&t.set_in("production", "A_KEY", "2"));
    assert_success(&t.set("M_KEY", "3"));

    let text = t.document_text();

    // default first, then lexicographic environments; keys sorted within
    let default_pos = text.find("  default:").unwrap();
    let production_pos = text.find("  production:").unwrap();
    assert!(default_pos < production_pos);
    assert!(text.find("    A_KEY:").unwrap() < text.find("    Z_KEY:").unwrap());

    // an unrelated set leaves existing ciphertext lines untouched
    let a_key_block: Vec<&str> = text.lines().skip_while(|l| *l != "    A_KEY:").take(4).collect();
    assert_success(&t.set("ANOTHER", "4"));
    let text_after = t.document_text();
    for line in a_key_block {
        assert!(text_after.contains(line), "unrelated entry was rewritten");
    }
}

#[test]
fn comments_survive_a_write() {
    let t = Test::with_secrets(&[("API_KEY", "v")]);

    let text = t.document_text();
    let commented = text.replace("version: 1", "# reviewed by security 2026-08\nversion: 1");
    std::fs::write(t.document_path(), commented).unwrap();

    assert_success(&t.set("NEW_KEY", "x"));
    let after = t.document_text();
    assert!(after.starts_with("# reviewed by security 2026-08\n"));
}

#[test]
fn file_secrets_roundtrip_as_files() {
    let t = Test::init();
    let source = t.dir.path().join("cert.pem");
    std::fs::write(&source, b"-----BEGIN CERT-----\nbytes\n").unwrap();

    let output = t
        .cmd()
        .args(["set", "TLS_CERT", "--file", source.to_str().unwrap()])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(t.document_text().contains("kind: file"));

    let dest = t.dir.path().join("out.pem");
    let output = t
        .cmd()
        .args(["get", "TLS_CERT", "--file", dest.to_str().unwrap()])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(
        std::fs::read(&dest).unwrap(),
        b"-----BEGIN CERT-----\nbytes\n"
    );
}
