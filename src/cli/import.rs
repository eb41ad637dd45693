//! Import command - bulk-encrypt a .env file into an environment.

use std::path::Path;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::vault::Vault;
use crate::core::EnvFile;
use crate::error::Result;

pub fn execute(config: &Config, env: &str, path: &Path) -> Result<()> {
    let mut vault = Vault::open(config)?;
    let env_file = EnvFile::load(path)?;

    if env_file.is_empty() {
        output::dimmed(&format!("nothing to import from {}", path.display()));
        return Ok(());
    }

    let imported = vault.import(env, env_file.entries())?;
    output::success(&format!(
        "imported {} secret{} into '{env}'",
        imported.len(),
        if imported.len() == 1 { "" } else { "s" }
    ));
    output::hint(&format!(
        "keep {} out of version control; the encrypted copy lives in {}",
        path.display(),
        vault.path().display()
    ));
    Ok(())
}
