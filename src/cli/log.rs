//! Log command - document-derived audit listing, newest first.

use crate::cli::output;
use crate::core::config::Config;
use crate::core::vault::Vault;
use crate::error::Result;

pub fn execute(config: &Config) -> Result<()> {
    let vault = Vault::open(config)?;
    let records = vault.log()?;

    if records.is_empty() {
        output::dimmed("no secrets yet");
        return Ok(());
    }

    let env_w = records
        .iter()
        .map(|r| r.env.len())
        .max()
        .unwrap_or(0)
        .max("ENVIRONMENT".len());
    let key_w = records
        .iter()
        .map(|r| r.key.len())
        .max()
        .unwrap_or(0)
        .max("KEY".len());
    let set_by_w = records
        .iter()
        .map(|r| r.set_by.len())
        .max()
        .unwrap_or(0)
        .max("SET_BY".len());

    println!(
        "{:<env_w$}  {:<key_w$}  {:<set_by_w$}  MODIFIED",
        "ENVIRONMENT", "KEY", "SET_BY"
    );
    for record in records {
        println!(
            "{:<env_w$}  {:<key_w$}  {:<set_by_w$}  {}",
            record.env, record.key, record.set_by, record.modified
        );
    }
    Ok(())
}
