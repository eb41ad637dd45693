//! Run command.
//!
//! Decrypts the selected environment and hands it to a child process. On
//! Unix without file secrets the process image is replaced, so this
//! function only returns on spawn failure; otherwise the child's exit
//! status is propagated.

use std::path::Path;

use crate::core::config::Config;
use crate::core::inject;
use crate::core::vault::Vault;
use crate::error::Result;

pub fn execute(
    config: &Config,
    env: &str,
    command: &[String],
    secrets_dir: Option<&Path>,
) -> Result<()> {
    let vault = Vault::open(config)?;
    let code = inject::run(&vault, env, command, secrets_dir)?;
    std::process::exit(code);
}
