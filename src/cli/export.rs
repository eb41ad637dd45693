//! Export command - print decrypted secrets to stdout.

use std::io::Write;

use crate::core::config::Config;
use crate::core::inject;
use crate::core::vault::Vault;
use crate::core::ExportFormat;
use crate::error::Result;

pub fn execute(config: &Config, env: &str, format: ExportFormat) -> Result<()> {
    let vault = Vault::open(config)?;
    let rendered = inject::export(&vault, env, format)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    Ok(())
}
