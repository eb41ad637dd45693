//! Identity store.
//!
//! Loads and persists the user's long-lived age identity. The private key
//! lives in a single file with owner-only permissions, or arrives as raw
//! key material through `ENVKEY_IDENTITY` for CI.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use age::secrecy::ExposeSecret;
use age::x25519;
use tracing::{debug, warn};

use crate::core::config::IdentitySource;
use crate::core::constants;
use crate::core::types::PublicKey;
use crate::error::{IdentityError, Result};

/// A loaded private-key identity.
///
/// Leaves this module only as a short-lived handle passed to the cipher.
pub struct Identity {
    inner: x25519::Identity,
    path: Option<PathBuf>,
}

impl Identity {
    /// Resolve an identity from the configured source.
    ///
    /// Permission problems on the key file are logged as warnings unless
    /// `strict` promotes them to fatal.
    pub fn load(source: &IdentitySource, strict: bool) -> Result<Self> {
        match source {
            IdentitySource::Default => Self::load_file(&Self::default_path()?, strict),
            IdentitySource::Path(path) => Self::load_file(path, strict),
            IdentitySource::Raw(material) => Self::from_raw(material),
        }
    }

    /// Generate a fresh identity and write it to `path` with mode 0600.
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn create(path: &Path, force: bool) -> Result<Self> {
        if path.exists() && !force {
            return Err(IdentityError::AlreadyExists(path.to_path_buf()).into());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(IdentityError::Write)?;
        }

        let inner = x25519::Identity::generate();
        let secret = inner.to_string();

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(IdentityError::Write)?;
        file.write_all(secret.expose_secret().as_bytes())
            .map_err(IdentityError::Write)?;
        file.write_all(b"\n").map_err(IdentityError::Write)?;
        file.flush().map_err(IdentityError::Write)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .map_err(IdentityError::Write)?;
        }

        debug!(path = %path.display(), "identity generated");

        Ok(Self {
            inner,
            path: Some(path.to_path_buf()),
        })
    }

    /// Whether an identity file exists at the source location.
    pub fn exists(source: &IdentitySource) -> bool {
        match source {
            IdentitySource::Default => Self::default_path().map(|p| p.is_file()).unwrap_or(false),
            IdentitySource::Path(path) => path.is_file(),
            IdentitySource::Raw(_) => true,
        }
    }

    /// Default identity path: `<config dir>/envkey/identity.age`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(IdentityError::NoConfigDir)?;
        Ok(base.join(constants::IDENTITY_SUBPATH))
    }

    /// The corresponding public key (bech32 `age1…`).
    pub fn public_key(&self) -> PublicKey {
        self.inner.to_public().to_string()
    }

    /// The inner age identity, for decryption.
    pub fn as_age(&self) -> &x25519::Identity {
        &self.inner
    }

    /// The key file path, when the identity came from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load_file(path: &Path, strict: bool) -> Result<Self> {
        if !path.is_file() {
            return Err(IdentityError::Missing(path.to_path_buf()).into());
        }

        #[cfg(unix)]
        check_permissions(path, strict)?;

        let contents = fs::read_to_string(path).map_err(IdentityError::Read)?;
        let key = contents.trim();
        if key.is_empty() {
            return Err(IdentityError::Malformed {
                path: path.display().to_string(),
                reason: "file is empty".to_string(),
            }
            .into());
        }

        let inner: x25519::Identity =
            key.parse().map_err(|e: &str| IdentityError::Malformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!(path = %path.display(), "identity loaded");

        Ok(Self {
            inner,
            path: Some(path.to_path_buf()),
        })
    }

    fn from_raw(material: &str) -> Result<Self> {
        let inner: x25519::Identity =
            material
                .trim()
                .parse()
                .map_err(|e: &str| IdentityError::Malformed {
                    path: format!("${}", constants::ENV_IDENTITY),
                    reason: e.to_string(),
                })?;

        Ok(Self { inner, path: None })
    }
}

/// Reject or warn about group/other-readable key files.
#[cfg(unix)]
fn check_permissions(path: &Path, strict: bool) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(IdentityError::Read)?;
    let mode = metadata.permissions().mode() & 0o777;

    if mode & 0o077 != 0 {
        let err = IdentityError::PermissionsTooOpen {
            path: path.display().to_string(),
            mode,
        };
        if strict {
            return Err(err.into());
        }
        warn!("{err}");
    }

    Ok(())
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("path", &self.path)
            .field("public_key", &self.public_key())
            .finish()
    }
}
