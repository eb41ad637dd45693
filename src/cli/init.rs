//! Initialize an identity and the secrets document.

use crate::cli::output;
use crate::core::config::{Config, IdentitySource};
use crate::core::identity::Identity;
use crate::core::store;
use crate::core::vault::Vault;
use crate::error::{DocumentError, Result};

/// Generate (or reuse) the identity and create the document with the
/// caller as first admin. `--force` regenerates the identity key.
pub fn execute(config: &Config, force: bool, name: Option<String>) -> Result<()> {
    // Refuse before touching the identity: --force must not shred a key
    // that an existing document still encrypts to.
    let document_path = store::resolve_path(config);
    if document_path.exists() {
        return Err(DocumentError::AlreadyExists(document_path).into());
    }

    let (identity, generated) = ensure_identity(config, force)?;

    let owner = name.unwrap_or_else(whoami::username);
    let vault = Vault::init(config, owner.clone(), identity)?;

    if generated {
        match vault.identity().path() {
            Some(path) => output::success(&format!(
                "generated identity at {}",
                output::key(&path.display().to_string())
            )),
            None => output::success("using identity from environment"),
        }
    } else {
        output::success("using existing identity");
    }
    output::success(&format!(
        "created {} with {} as admin",
        output::key(&vault.path().display().to_string()),
        owner
    ));
    output::kv("public key", vault.identity().public_key());
    println!();
    output::hint(&format!(
        "next: {} to add a secret",
        output::cmd("envkey set KEY VALUE")
    ));

    Ok(())
}

fn ensure_identity(config: &Config, force: bool) -> Result<(Identity, bool)> {
    match &config.identity {
        IdentitySource::Raw(_) => Ok((Identity::load(&config.identity, config.strict)?, false)),
        IdentitySource::Path(path) => {
            if path.is_file() && !force {
                Ok((Identity::load(&config.identity, config.strict)?, false))
            } else {
                Ok((Identity::create(path, force)?, true))
            }
        }
        IdentitySource::Default => {
            let path = Identity::default_path()?;
            if path.is_file() && !force {
                Ok((Identity::load(&config.identity, config.strict)?, false))
            } else {
                Ok((Identity::create(&path, force)?, true))
            }
        }
    }
}
