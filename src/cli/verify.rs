//! Verify command - audit recipient drift, optionally repairing it.

use crate::cli::output;
use crate::core::config::Config;
use crate::core::vault::Vault;
use crate::error::Result;

pub fn execute(config: &Config, fix: bool) -> Result<()> {
    let mut vault = Vault::open(config)?;
    let drifts = vault.verify()?;

    if drifts.is_empty() {
        output::success("every ciphertext matches its derived recipient set");
        return Ok(());
    }

    for drift in &drifts {
        output::fail(&format!(
            "{}/{}: expected {} recipients, ciphertext has {}",
            drift.env, drift.key, drift.expected, drift.actual
        ));
    }

    if fix {
        let count = vault.verify_fix(&drifts)?;
        output::success(&format!(
            "re-keyed {count} entr{}",
            if count == 1 { "y" } else { "ies" }
        ));
        return Ok(());
    }

    output::hint(&format!(
        "repair with {} (admin)",
        output::cmd("envkey verify --fix")
    ));
    Err(drifts[0].to_error())
}
