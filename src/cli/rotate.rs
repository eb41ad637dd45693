//! Rotation command.
//!
//! Three modes: replace a secret's value, generate a fresh random value,
//! or re-encrypt everything with fresh file keys (`--all`).

use zeroize::Zeroizing;

use crate::cli::{output, AlphabetArg};
use crate::core::cipher;
use crate::core::config::Config;
use crate::core::vault::Vault;
use crate::error::{Error, Result};

pub fn execute(
    config: &Config,
    env: &str,
    key: Option<&str>,
    value: Option<String>,
    generate: Option<usize>,
    alphabet: AlphabetArg,
    all: bool,
) -> Result<()> {
    let mut vault = Vault::open(config)?;

    if all {
        let count = vault.rotate_all()?;
        output::success(&format!(
            "re-encrypted {count} entr{} with fresh file keys",
            if count == 1 { "y" } else { "ies" }
        ));
        output::dimmed("  plaintext values are unchanged");
        return Ok(());
    }

    let key = key.ok_or_else(|| Error::Other("missing KEY (or use --all)".to_string()))?;

    if let Some(len) = generate {
        if len == 0 {
            return Err(Error::Other("--generate needs a length > 0".to_string()));
        }
        let generated = cipher::generate_secret(len, alphabet.into());
        vault.rotate_value(env, key, generated.as_bytes())?;
        output::success(&format!(
            "rotated {} to a generated {len}-character value",
            output::key(key)
        ));
        output::hint(&format!(
            "read it with {}",
            output::cmd(&format!("envkey get -e {env} {key}"))
        ));
        return Ok(());
    }

    let value = value.ok_or_else(|| {
        Error::Other("missing VALUE (or use --generate N / --all)".to_string())
    })?;
    let plaintext = Zeroizing::new(value.into_bytes());
    vault.rotate_value(env, key, &plaintext)?;
    output::success(&format!("rotated {}", output::key(key)));
    Ok(())
}
