//! Injection engine.
//!
//! Decrypts a selected environment and hands the plaintext map to a child
//! process, either by replacing the current process image (Unix, no file
//! secrets) or by spawn-and-wait. Alternatively emits the map in one of the
//! export formats. Plaintexts live in zeroizing buffers until the handoff.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::document::SecretKind;
use crate::core::vault::Vault;
use crate::error::{InjectError, Result};

/// Output format for `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Shell-safe `KEY='value'` lines.
    Env,
    /// A JSON object with string values.
    Json,
    /// `KEY=value` lines for `docker run --env-file`.
    Docker,
    /// A Kubernetes Secret manifest with base64 data.
    K8sSecret,
}

/// Run `argv` with the environment's decrypted secrets injected.
///
/// On Unix the process image is replaced when the environment holds no
/// file secrets, so no parent memory survives the handoff. With file
/// secrets (or off Unix) the child is spawned and awaited; plaintexts are
/// zeroized in the parent once the child exits and the per-run secrets
/// directory is removed.
pub fn run(
    vault: &Vault,
    env: &str,
    argv: &[String],
    secrets_dir: Option<&Path>,
) -> Result<i32> {
    if argv.is_empty() {
        return Err(InjectError::NoCommand.into());
    }

    let pairs = vault.decrypt_env(env)?;
    let has_file_secrets = pairs.iter().any(|(_, p)| p.kind == SecretKind::File);

    #[cfg(unix)]
    if !has_file_secrets {
        use std::os::unix::process::CommandExt;

        let vars = string_vars(pairs)?;
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        for (key, value) in &vars {
            cmd.env(key, value.as_str());
        }

        debug!(env, command = %argv[0], "replacing process image");
        // exec only returns on failure
        let err = cmd.exec();
        return Err(InjectError::ChildSpawn(err).into());
    }

    let _ = has_file_secrets;
    run_spawn(pairs, argv, secrets_dir)
}

/// Spawn-and-wait fallback, also used whenever file secrets are present.
fn run_spawn(
    pairs: Vec<(String, crate::core::vault::Plaintext)>,
    argv: &[String],
    secrets_dir: Option<&Path>,
) -> Result<i32> {
    let mut vars: Vec<(String, Zeroizing<String>)> = Vec::new();
    let mut file_pairs = Vec::new();
    for (key, plaintext) in pairs {
        match plaintext.kind {
            SecretKind::String => vars.push((
                key.clone(),
                utf8_var(&key, plaintext.bytes.as_slice())?,
            )),
            SecretKind::File => file_pairs.push((key, plaintext)),
        }
    }

    // File secrets land in a 0700 per-run directory; the variable carries
    // the path, not the content.
    let mut tempdir = None;
    if !file_pairs.is_empty() {
        let dir: PathBuf = match secrets_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(InjectError::FileSecret)?;
                restrict_dir(dir)?;
                dir.to_path_buf()
            }
            None => {
                let t = tempfile::Builder::new()
                    .prefix(".envkey-run-")
                    .tempdir()
                    .map_err(InjectError::FileSecret)?;
                let path = t.path().to_path_buf();
                tempdir = Some(t);
                path
            }
        };

        for (key, plaintext) in &file_pairs {
            let path = dir.join(key);
            fs::write(&path, plaintext.bytes.as_slice()).map_err(InjectError::FileSecret)?;
            restrict_file(&path)?;
            vars.push((
                key.clone(),
                Zeroizing::new(path.display().to_string()),
            ));
        }
    }

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]);
    for (key, value) in &vars {
        cmd.env(key, value.as_str());
    }

    debug!(command = %argv[0], vars = vars.len(), "spawning child");
    let status = cmd.status().map_err(InjectError::ChildSpawn)?;

    // Best-effort shredding of file secrets before the directory goes away.
    for (key, _) in &file_pairs {
        if let Some(t) = &tempdir {
            let _ = fs::remove_file(t.path().join(key));
        }
    }
    drop(tempdir);

    Ok(status.code().unwrap_or(1))
}

/// Render the environment's decrypted secrets in `format`.
///
/// The returned buffer zeroizes on drop; the caller prints it and lets it
/// fall out of scope.
pub fn export(vault: &Vault, env: &str, format: ExportFormat) -> Result<Zeroizing<String>> {
    let pairs = vault.decrypt_env(env)?;

    let out = match format {
        ExportFormat::Env => {
            let mut out = String::new();
            for (key, plaintext) in &pairs {
                let value = utf8_var(key, plaintext.bytes.as_slice())?;
                out.push_str(key);
                out.push('=');
                out.push_str(&crate::core::envfile::shell_quote(&value));
                out.push('\n');
            }
            out
        }
        ExportFormat::Json => {
            let mut map = BTreeMap::new();
            for (key, plaintext) in &pairs {
                map.insert(
                    key.clone(),
                    utf8_var(key, plaintext.bytes.as_slice())?.to_string(),
                );
            }
            let mut out = serde_json::to_string_pretty(&map)
                .map_err(|e| crate::error::Error::Other(e.to_string()))?;
            out.push('\n');
            out
        }
        ExportFormat::Docker => {
            let mut out = String::new();
            for (key, plaintext) in &pairs {
                let value = utf8_var(key, plaintext.bytes.as_slice())?;
                out.push_str(key);
                out.push('=');
                out.push_str(&value);
                out.push('\n');
            }
            out
        }
        ExportFormat::K8sSecret => k8s_manifest(env, &pairs)?,
    };

    Ok(Zeroizing::new(out))
}

#[derive(Serialize)]
struct K8sSecret {
    #[serde(rename = "apiVersion")]
    api_version: &'static str,
    kind: &'static str,
    metadata: K8sMetadata,
    #[serde(rename = "type")]
    secret_type: &'static str,
    data: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct K8sMetadata {
    name: String,
}

fn k8s_manifest(env: &str, pairs: &[(String, crate::core::vault::Plaintext)]) -> Result<String> {
    let data = pairs
        .iter()
        .map(|(key, plaintext)| (key.clone(), STANDARD.encode(plaintext.bytes.as_slice())))
        .collect();

    let manifest = K8sSecret {
        api_version: "v1",
        kind: "Secret",
        metadata: K8sMetadata {
            name: k8s_name(env),
        },
        secret_type: "Opaque",
        data,
    };

    serde_yaml::to_string(&manifest).map_err(|e| crate::error::Error::Other(e.to_string()))
}

/// RFC 1123 subdomain form of `envkey-<env>`.
fn k8s_name(env: &str) -> String {
    let sanitized: String = env
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '-' })
        .collect();
    format!("envkey-{sanitized}")
}

fn utf8_var(key: &str, bytes: &[u8]) -> Result<Zeroizing<String>> {
    std::str::from_utf8(bytes)
        .map(|s| Zeroizing::new(s.to_string()))
        .map_err(|_| InjectError::NotUtf8(key.to_string()).into())
}

fn string_vars(
    pairs: Vec<(String, crate::core::vault::Plaintext)>,
) -> Result<Vec<(String, Zeroizing<String>)>> {
    pairs
        .into_iter()
        .map(|(key, plaintext)| {
            let value = utf8_var(&key, plaintext.bytes.as_slice())?;
            Ok((key, value))
        })
        .collect()
}

fn restrict_file(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(InjectError::FileSecret)?;
    }
    let _ = path;
    Ok(())
}

fn restrict_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))
            .map_err(InjectError::FileSecret)?;
    }
    let _ = path;
    Ok(())
}
