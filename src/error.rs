//! Error types for envkey.
//!
//! Errors are grouped per subsystem and wrapped by a transparent top-level
//! [`Error`]. Every variant maps to one of the documented exit codes via
//! [`Error::exit_code`]: 1 operation, 2 crypto, 3 document, 4 identity.
//! Usage errors (64) are produced by the argument parser in `main`.

use std::path::PathBuf;

use thiserror::Error;

/// Identity loading and creation errors (exit code 4).
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("no identity found at {0}: run `envkey init` first or set ENVKEY_IDENTITY")]
    Missing(PathBuf),

    #[error("identity at {path} is not a valid age secret key: {reason}")]
    Malformed { path: String, reason: String },

    #[error("identity file {path} is readable by others (mode {mode:o}); run: chmod 600 {path}")]
    PermissionsTooOpen { path: String, mode: u32 },

    #[error("identity file already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("could not determine the user config directory")]
    NoConfigDir,

    #[error("failed to read identity file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write identity file: {0}")]
    Write(#[source] std::io::Error),
}

/// Cryptographic operation errors (exit code 2).
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("environment '{0}' has no recipients; cannot encrypt")]
    NoRecipients(String),

    #[error("your identity is not a recipient of this ciphertext")]
    NotARecipient,

    #[error("ciphertext is corrupt: {0}")]
    Corrupt(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("invalid age public key: {0}")]
    InvalidPublicKey(String),

    #[error("io error during crypto operation: {0}")]
    Io(#[from] std::io::Error),
}

/// Document parsing, validation, and persistence errors (exit code 3).
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("no secrets document found at {0}; run `envkey init` first")]
    Missing(PathBuf),

    #[error("secrets document already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("failed to parse secrets document: {0}")]
    Parse(String),

    #[error("document invariant violated: {0}")]
    Invariant(String),

    #[error("failed to read secrets document: {0}")]
    Read(#[source] std::io::Error),

    #[error("atomic write failed; the previous document is intact: {0}")]
    AtomicWrite(#[source] std::io::Error),
}

/// Policy and operation errors (exit code 1).
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("permission denied: role '{role}' may not {op}")]
    Denied { role: String, op: String },

    #[error("permission denied: '{actor}' has no access to environment '{env}'")]
    NotEntitled { actor: String, env: String },

    #[error("secret '{key}' not found in environment '{env}'")]
    NotFound { env: String, key: String },

    #[error("environment '{0}' not found")]
    EnvironmentNotFound(String),

    #[error("your identity ({0}) does not belong to any team member")]
    UnknownMember(String),

    #[error("team member '{0}' not found")]
    MemberNotFound(String),

    #[error("name '{0}' is already in use")]
    NameInUse(String),

    #[error("public key is already registered to '{0}'")]
    PubkeyInUse(String),

    #[error("cannot remove '{0}': the team must keep at least one admin")]
    LastAdmin(String),

    #[error("recipient drift in environment '{env}', key '{key}': expected {expected} recipients, ciphertext has {actual}")]
    RecipientDrift {
        env: String,
        key: String,
        expected: usize,
        actual: usize,
    },
}

/// Child process and export errors (exit code 1).
#[derive(Error, Debug)]
pub enum InjectError {
    #[error("no command specified")]
    NoCommand,

    #[error("failed to spawn child process: {0}")]
    ChildSpawn(#[source] std::io::Error),

    #[error("secret '{0}' is not valid UTF-8; only `export --format k8s-secret` can carry it")]
    NotUtf8(String),

    #[error("failed to write file secret: {0}")]
    FileSecret(#[source] std::io::Error),
}

/// Top-level envkey error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Inject(#[from] InjectError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to the documented process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Policy(_) | Error::Inject(_) | Error::Io(_) | Error::Other(_) => 1,
            Error::Crypto(_) => 2,
            Error::Document(_) => 3,
            Error::Identity(_) => 4,
        }
    }
}

/// Result type alias for envkey operations.
pub type Result<T> = std::result::Result<T, Error>;
