//! Zero-infrastructure secrets for software teams.
//!
//! envkey keeps secrets encrypted in a single YAML document (`.envkey`)
//! committed to version control. Decryption happens locally with per-user
//! [age](https://age-encryption.org) identities; there is no server, no
//! daemon, and no state beyond the document and each member's key file.
//!
//! # Quick start
//!
//! ```no_run
//! use envkey::core::config::Config;
//! use envkey::core::document::SecretKind;
//! use envkey::core::vault::Vault;
//!
//! let config = Config::default();
//! let mut vault = Vault::open(&config)?;
//! vault.set("default", "DATABASE_URL", b"postgres://localhost/db", SecretKind::String)?;
//! let value = vault.get("default", "DATABASE_URL")?;
//! # Ok::<(), envkey::error::Error>(())
//! ```
//!
//! # Architecture
//!
//! - **`core`**: the library. [`core::vault::Vault`] orchestrates the
//!   document model, derived access policy, and the age cipher under a
//!   re-keying protocol; every write is an atomic replace of the document.
//! - **`cli`**: the `envkey` binary's command surface.
//!
//! # Security model
//!
//! Every ciphertext in an environment is encrypted to that environment's
//! *recipient set*, derived from the team roster on every operation.
//! Membership changes re-encrypt the affected environments with fresh file
//! keys, so a removed identity cannot decrypt anything in the new
//! document. Plaintext only ever lives in zeroize-on-drop buffers owned by
//! the cipher and injection layers; the document model holds ciphertext
//! only.

pub mod cli;
pub mod core;
pub mod error;

pub use core::vault::Vault;
pub use error::{Error, Result};

/// Integration-test support: cipher and document internals.
#[doc(hidden)]
pub mod testkit {
    pub use crate::core::cipher::{decrypt, encrypt, recipient_stanza_count};
    pub use crate::core::store::{read, write};
    pub use crate::core::yaml::{emit, parse};
}
