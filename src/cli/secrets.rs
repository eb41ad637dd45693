//! set / get / ls / rm.

use std::fs;
use std::io::{IsTerminal, Write};
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::document::SecretKind;
use crate::core::policy;
use crate::core::vault::Vault;
use crate::error::{Error, Result};

/// Encrypt and store a secret.
pub fn set(
    config: &Config,
    env: &str,
    key: &str,
    value: Option<String>,
    from_file: Option<&Path>,
) -> Result<()> {
    let mut vault = Vault::open(config)?;

    let (plaintext, kind): (Zeroizing<Vec<u8>>, SecretKind) = match (value, from_file) {
        (_, Some(path)) => (Zeroizing::new(fs::read(path)?), SecretKind::File),
        (Some(value), None) => (Zeroizing::new(value.into_bytes()), SecretKind::String),
        (None, None) => return Err(Error::Other("missing VALUE or --file".to_string())),
    };

    vault.set(env, key, &plaintext, kind)?;

    let recipients = policy::recipient_members(vault.document(), env).len();
    output::success(&format!(
        "encrypted {} for {} recipient{} ({})",
        output::key(key),
        recipients,
        if recipients == 1 { "" } else { "s" },
        env
    ));
    Ok(())
}

/// Decrypt and print (or write) a secret.
pub fn get(config: &Config, env: &str, key: &str, to_file: Option<&Path>) -> Result<()> {
    let vault = Vault::open(config)?;
    let plaintext = vault.get(env, key)?;

    match to_file {
        Some(path) => {
            fs::write(path, plaintext.bytes.as_slice())?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
            }
            output::success(&format!("wrote {} to {}", output::key(key), path.display()));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(plaintext.bytes.as_slice())?;
            if plaintext.kind == SecretKind::String {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// List entries of an environment.
pub fn ls(config: &Config, env: &str, json: bool) -> Result<()> {
    let vault = Vault::open(config)?;
    let entries = vault.ls(env)?;

    if json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|(key, entry)| {
                serde_json::json!({
                    "key": key,
                    "set_by": entry.set_by,
                    "modified": entry.modified,
                    "kind": entry.kind.as_str(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items).map_err(|e| Error::Other(e.to_string()))?);
        return Ok(());
    }

    if entries.is_empty() {
        output::dimmed(&format!("no secrets in '{env}'"));
        return Ok(());
    }

    let key_w = entries
        .iter()
        .map(|(k, _)| k.len())
        .max()
        .unwrap_or(0)
        .max("KEY".len());
    let set_by_w = entries
        .iter()
        .map(|(_, e)| e.set_by.len())
        .max()
        .unwrap_or(0)
        .max("SET_BY".len());

    println!("{:<key_w$}  {:<set_by_w$}  MODIFIED", "KEY", "SET_BY");
    for (key, entry) in entries {
        let marker = if entry.kind == SecretKind::File { " (file)" } else { "" };
        println!(
            "{:<key_w$}  {:<set_by_w$}  {}{}",
            key, entry.set_by, entry.modified, marker
        );
    }
    Ok(())
}

/// Remove a secret, offering to prune an emptied environment.
pub fn rm(config: &Config, env: &str, key: &str, yes: bool) -> Result<()> {
    let mut vault = Vault::open(config)?;
    let outcome = vault.rm(env, key)?;
    output::success(&format!("removed {} from {}", output::key(key), env));

    if outcome.emptied_env {
        let prune = if yes {
            true
        } else if std::io::stdin().is_terminal() {
            dialoguer::Confirm::new()
                .with_prompt(format!("environment '{env}' is now empty; remove it?"))
                .default(false)
                .interact()
                .map_err(|e| Error::Other(e.to_string()))?
        } else {
            false
        };

        if prune {
            vault.prune_env(env)?;
            output::success(&format!("pruned empty environment '{env}'"));
        } else {
            output::hint(&format!("environment '{env}' is now empty and was kept"));
        }
    }
    Ok(())
}
