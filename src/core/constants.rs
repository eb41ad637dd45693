//! Shared constants.

/// Default document file name, committed to the repository.
pub const DOCUMENT_FILE: &str = ".envkey";

/// Alternate document file name, recognized when present.
pub const DOCUMENT_FILE_YAML: &str = ".envkey.yaml";

/// Supported document format version.
pub const FORMAT_VERSION: u32 = 1;

/// The environment used when none is selected.
pub const DEFAULT_ENV: &str = "default";

/// Identity file location under the user config dir.
pub const IDENTITY_SUBPATH: &str = "envkey/identity.age";

/// Override for the identity source: a path or raw `AGE-SECRET-KEY-` material.
pub const ENV_IDENTITY: &str = "ENVKEY_IDENTITY";

/// Override for the document path.
pub const ENV_FILE: &str = "ENVKEY_FILE";

/// Default environment selection.
pub const ENV_ENV: &str = "ENVKEY_ENV";

/// Column width for base64 ciphertext wrapping in the document.
pub const CIPHERTEXT_WRAP: usize = 76;
