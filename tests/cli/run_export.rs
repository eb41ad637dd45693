//! Tests for `envkey run`, `export`, `import`, and `diff`.

use crate::support::*;

#[cfg(unix)]
#[test]
fn scenario_run_injects_environment() {
    let t = Test::with_secrets(&[("DATABASE_URL", "postgres://u:p@h/db")]);

    let output = t.run_argv(None, &["sh", "-c", "printf %s \"$DATABASE_URL\""]);
    assert_success(&output);
    assert_eq!(stdout(&output), "postgres://u:p@h/db");

    // no file in the project directory contains the plaintext
    for entry in std::fs::read_dir(t.dir.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.is_file() {
            let contents = std::fs::read(&path).unwrap();
            assert!(
                !contents
                    .windows(b"postgres://u:p@h/db".len())
                    .any(|w| w == b"postgres://u:p@h/db"),
                "plaintext found in {}",
                path.display()
            );
        }
    }
}

#[cfg(unix)]
#[test]
fn run_propagates_the_child_exit_status() {
    let t = Test::with_secrets(&[("K", "v")]);
    let output = t.run_argv(None, &["sh", "-c", "exit 7"]);
    assert_exit_code(&output, 7);
}

#[cfg(unix)]
#[test]
fn run_overrides_colliding_parent_vars() {
    let t = Test::with_secrets(&[("COLLIDE", "from-vault")]);
    let output = t
        .cmd()
        .env("COLLIDE", "from-parent")
        .args(["run", "--", "sh", "-c", "printf %s \"$COLLIDE\""])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "from-vault");
}

#[cfg(unix)]
#[test]
fn run_with_file_secret_injects_a_path() {
    let t = Test::init();
    let source = t.dir.path().join("key.pem");
    std::fs::write(&source, b"pem-bytes").unwrap();
    let output = t
        .cmd()
        .args(["set", "TLS_KEY", "--file", source.to_str().unwrap()])
        .output()
        .unwrap();
    assert_success(&output);

    let output = t.run_argv(None, &["sh", "-c", "cat \"$TLS_KEY\""]);
    assert_success(&output);
    assert_eq!(stdout(&output), "pem-bytes");
}

#[test]
fn export_env_format_is_quoted() {
    let t = Test::with_secrets(&[("PASSWORD", "it's secret")]);
    let output = t.export("env");
    assert_success(&output);
    assert_eq!(stdout(&output), "PASSWORD='it'\\''s secret'\n");
}

#[test]
fn export_json_format() {
    let t = Test::with_secrets(&[("A", "1"), ("B", "2")]);
    let output = t.export("json");
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(parsed["A"], "1");
    assert_eq!(parsed["B"], "2");
}

#[test]
fn export_docker_format() {
    let t = Test::with_secrets(&[("URL", "redis://h:6379")]);
    let output = t.export("docker");
    assert_success(&output);
    assert_eq!(stdout(&output), "URL=redis://h:6379\n");
}

#[test]
fn export_k8s_secret_manifest() {
    let t = Test::with_secrets(&[("TOKEN", "t-1")]);
    let output = t.export("k8s-secret");
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("kind: Secret"));
    assert!(out.contains("name: envkey-default"));
    assert!(out.contains("TOKEN: dC0x")); // base64("t-1")
}

#[test]
fn import_encrypts_a_dotenv_file() {
    let t = Test::init();
    let env_path = t.dir.path().join("legacy.env");
    std::fs::write(&env_path, SAMPLE_ENV).unwrap();

    let output = t.import(env_path.to_str().unwrap());
    assert_success(&output);
    assert_stdout_contains(&output, "3");

    assert_eq!(stdout(&t.get("DB_HOST")), "localhost\n");
    assert_eq!(stdout(&t.get("DB_PASS")), "p@ss w0rd\n");
    assert_eq!(stdout(&t.get("QUEUE_URL")), "redis://localhost:6379\n");
}

#[test]
fn diff_reports_sync_state() {
    let t = Test::with_secrets(&[("SAME", "x"), ("CHANGED", "doc-side"), ("ONLY_DOC", "d")]);
    let env_path = t.dir.path().join("local.env");
    std::fs::write(&env_path, "SAME=x\nCHANGED=env-side\nONLY_ENV=e\n").unwrap();

    let output = t.diff(env_path.to_str().unwrap());
    assert_success(&output);
    assert_stdout_contains(&output, "CHANGED");
    assert_stdout_contains(&output, "ONLY_DOC");
    assert_stdout_contains(&output, "ONLY_ENV");
    // values never appear
    assert_stdout_excludes(&output, "doc-side");
    assert_stdout_excludes(&output, "env-side");
}

#[test]
fn diff_in_sync_when_everything_matches() {
    let t = Test::with_secrets(&[("A", "1")]);
    let env_path = t.dir.path().join("local.env");
    std::fs::write(&env_path, "A=1\n").unwrap();

    let output = t.diff(env_path.to_str().unwrap());
    assert_success(&output);
    assert_stdout_contains(&output, "in sync");
}
