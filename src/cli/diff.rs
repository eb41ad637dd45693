//! Diff command - compare an environment against a local .env file.

use std::path::Path;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::vault::Vault;
use crate::core::{EnvFile, EntryStatus};
use crate::error::Result;

pub fn execute(config: &Config, env: &str, path: &Path) -> Result<()> {
    let vault = Vault::open(config)?;

    let env_file = if path.exists() {
        EnvFile::load(path)?
    } else {
        EnvFile::default()
    };

    let diff = vault.diff(env, env_file.entries())?;

    if diff.entries().is_empty() {
        output::dimmed(&format!("'{env}' and {} are both empty", path.display()));
        return Ok(());
    }
    if diff.in_sync() {
        output::success(&format!("'{env}' and {} are in sync", path.display()));
        return Ok(());
    }

    for entry in diff.entries() {
        match entry.status {
            EntryStatus::Synced => output::dimmed(&format!("  = {}", entry.key)),
            EntryStatus::Modified => println!("  ~ {}  (values differ)", entry.key),
            EntryStatus::DocumentOnly => println!("  + {}  (document only)", entry.key),
            EntryStatus::EnvOnly => println!("  - {}  ({} only)", entry.key, path.display()),
        }
    }
    Ok(())
}
