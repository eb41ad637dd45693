//! Run configuration.
//!
//! The core is parameterized by an explicit [`Config`] built once by the CLI
//! from flags and environment variables. There are no ambient singletons:
//! two `Vault`s opened with different configs are fully independent.

use std::path::PathBuf;

/// Where the caller's identity comes from.
#[derive(Debug, Clone, Default)]
pub enum IdentitySource {
    /// Platform config dir: `<config>/envkey/identity.age`.
    #[default]
    Default,
    /// An explicit file path.
    Path(PathBuf),
    /// Raw `AGE-SECRET-KEY-` material, e.g. from `ENVKEY_IDENTITY` in CI.
    Raw(String),
}

/// Explicit configuration for one command invocation.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Document path override (`--file` / `ENVKEY_FILE`). When unset, the
    /// current directory is probed for `.envkey` then `.envkey.yaml`.
    pub document_path: Option<PathBuf>,

    /// Identity source.
    pub identity: IdentitySource,

    /// Promote identity-permission warnings to fatal errors.
    pub strict: bool,
}

impl Config {
    /// Config with an explicit document path (used by tests and `--file`).
    pub fn with_document(path: impl Into<PathBuf>) -> Self {
        Self {
            document_path: Some(path.into()),
            ..Self::default()
        }
    }
}
