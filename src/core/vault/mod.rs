//! Vault.
//!
//! The orchestrator for every operation on the secrets document. Each
//! mutating method is a transaction: the in-memory document is changed,
//! validated, and written atomically; on any error the on-disk document is
//! untouched. Policy checks always run before cryptographic work, and all
//! decryptions required by a re-keying complete before anything is written.
//!
//! An identity that is not on the roster can still attempt pure reads:
//! there the cryptography is the enforcement, and a removed member's
//! retained key fails with `NotARecipient` rather than a policy error.

mod team;
mod verify;

pub use team::MemberRemoval;
pub use verify::{AuditRecord, Drift};

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::cipher;
use crate::core::config::Config;
use crate::core::constants::DEFAULT_ENV;
use crate::core::document::{self, Document, Member, SecretEntry, SecretKind};
use crate::core::identity::Identity;
use crate::core::policy::{self, Op};
use crate::core::store;
use crate::error::{CryptoError, DocumentError, PolicyError, Result};

/// A decrypted secret handed to callers.
///
/// The plaintext buffer zeroizes on drop.
pub struct Plaintext {
    pub bytes: Zeroizing<Vec<u8>>,
    pub kind: SecretKind,
}

impl std::fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plaintext")
            .field("bytes", &"[redacted]")
            .field("kind", &self.kind)
            .finish()
    }
}

/// Outcome of [`Vault::rm`].
#[derive(Debug, Clone, Copy)]
pub struct Removal {
    /// The environment is now empty and is not `default`; the caller may
    /// offer to prune it.
    pub emptied_env: bool,
}

/// The primary interface for envkey operations.
#[derive(Debug)]
pub struct Vault {
    doc: Document,
    path: PathBuf,
    identity: Identity,
    /// Roster name matching the loaded identity, when there is one.
    actor: Option<String>,
}

impl Vault {
    /// Open the document and match the caller's identity to the roster.
    ///
    /// An unmatched identity is not an error here: pure reads remain
    /// possible (and fail cryptographically), while every operation that
    /// needs an actor reports `UnknownMember`.
    pub fn open(config: &Config) -> Result<Self> {
        let path = store::resolve_path(config);
        let doc = store::read(&path)?;
        let identity = Identity::load(&config.identity, config.strict)?;

        let actor = doc
            .member_by_pubkey(&identity.public_key())
            .map(|m| m.name.clone());

        debug!(actor = ?actor, path = %path.display(), "vault opened");

        Ok(Self {
            doc,
            path,
            identity,
            actor,
        })
    }

    /// Initialize a new document with the identity's owner as first admin.
    pub fn init(config: &Config, owner: String, identity: Identity) -> Result<Self> {
        let path = store::resolve_path(config);
        if path.exists() {
            return Err(DocumentError::AlreadyExists(path).into());
        }

        let doc = Document::new(owner.clone(), identity.public_key(), document::now_date());
        store::write(&path, &doc)?;

        info!(owner = %owner, path = %path.display(), "document initialized");

        Ok(Self {
            doc,
            path,
            identity,
            actor: Some(owner),
        })
    }

    // --- Accessors ---

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The acting team member; `UnknownMember` when the identity is not on
    /// the roster.
    pub fn actor(&self) -> Result<&Member> {
        self.actor_member()
            .ok_or_else(|| PolicyError::UnknownMember(self.identity.public_key()).into())
    }

    fn actor_member(&self) -> Option<&Member> {
        self.actor.as_deref().and_then(|name| self.doc.member(name))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Environments the actor may read, in document order.
    pub fn accessible_envs(&self) -> Result<Vec<String>> {
        Ok(policy::accessible_envs(&self.doc, self.actor()?)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    // --- Secrets ---

    /// Encrypt and store a secret (upsert).
    ///
    /// Creates the environment implicitly when the actor may write it.
    pub fn set(&mut self, env: &str, key: &str, plaintext: &[u8], kind: SecretKind) -> Result<()> {
        validate_env_name(env)?;
        validate_secret_name(key)?;
        let actor = self.actor()?;
        policy::can_perform(actor, Op::Set, Some(env))?;
        let set_by = actor.name.clone();

        let ciphertext = self.encrypt_for(env, plaintext)?;
        self.doc.upsert(
            env,
            key,
            SecretEntry {
                value: ciphertext,
                set_by,
                modified: document::now_timestamp(),
                kind,
            },
        );
        self.save()?;

        info!(env, key, "secret set");
        Ok(())
    }

    /// Decrypt one secret.
    ///
    /// For a roster member the entitlement check fast-fails first; for an
    /// unknown identity the decryption itself is the enforcement.
    pub fn get(&self, env: &str, key: &str) -> Result<Plaintext> {
        if let Some(actor) = self.actor_member() {
            policy::can_perform(actor, Op::Read, Some(env))?;
        }

        let entry = self.entry(env, key)?;
        let bytes = cipher::decrypt(&entry.value, self.identity.as_age())?;

        Ok(Plaintext {
            bytes,
            kind: entry.kind,
        })
    }

    /// Remove a secret. No cryptographic work.
    pub fn rm(&mut self, env: &str, key: &str) -> Result<Removal> {
        policy::can_perform(self.actor()?, Op::Rm, Some(env))?;

        let entries = self
            .doc
            .environments
            .get_mut(env)
            .ok_or_else(|| PolicyError::EnvironmentNotFound(env.to_string()))?;
        if entries.remove(key).is_none() {
            return Err(PolicyError::NotFound {
                env: env.to_string(),
                key: key.to_string(),
            }
            .into());
        }
        let emptied = entries.is_empty() && env != DEFAULT_ENV;
        self.save()?;

        info!(env, key, "secret removed");
        Ok(Removal {
            emptied_env: emptied,
        })
    }

    /// Entries of an environment the actor may read.
    pub fn ls(&self, env: &str) -> Result<Vec<(&str, &SecretEntry)>> {
        policy::can_perform(self.actor()?, Op::Read, Some(env))?;

        let entries = self
            .doc
            .env(env)
            .ok_or_else(|| PolicyError::EnvironmentNotFound(env.to_string()))?;
        Ok(entries.iter().map(|(k, e)| (k.as_str(), e)).collect())
    }

    /// Decrypt every entry of an environment, for `run`/`export`/`diff`.
    pub fn decrypt_env(&self, env: &str) -> Result<Vec<(String, Plaintext)>> {
        if let Some(actor) = self.actor_member() {
            policy::can_perform(actor, Op::Read, Some(env))?;
        }

        let entries = self
            .doc
            .env(env)
            .ok_or_else(|| PolicyError::EnvironmentNotFound(env.to_string()))?;

        let mut pairs = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let bytes = cipher::decrypt(&entry.value, self.identity.as_age())?;
            pairs.push((
                key.clone(),
                Plaintext {
                    bytes,
                    kind: entry.kind,
                },
            ));
        }
        Ok(pairs)
    }

    /// Bulk-encrypt `.env` pairs into an environment as one transaction.
    ///
    /// Returns the imported keys.
    pub fn import(&mut self, env: &str, pairs: &[(String, String)]) -> Result<Vec<String>> {
        validate_env_name(env)?;
        let actor = self.actor()?;
        policy::can_perform(actor, Op::Set, Some(env))?;
        let set_by = actor.name.clone();
        for (key, _) in pairs {
            validate_secret_name(key)?;
        }

        let mut imported = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let ciphertext = self.encrypt_for(env, value.as_bytes())?;
            self.doc.upsert(
                env,
                key,
                SecretEntry {
                    value: ciphertext,
                    set_by: set_by.clone(),
                    modified: document::now_timestamp(),
                    kind: SecretKind::String,
                },
            );
            imported.push(key.clone());
        }
        self.save()?;

        info!(env, count = imported.len(), "imported");
        Ok(imported)
    }

    /// Compare an environment's decrypted values against `.env` pairs.
    ///
    /// File-valued secrets are skipped; `.env` files carry strings only.
    pub fn diff(&self, env: &str, env_pairs: &[(String, String)]) -> Result<crate::core::Diff> {
        policy::can_perform(self.actor()?, Op::Audit, None)?;

        let document_pairs: Vec<(String, String)> = self
            .decrypt_env(env)?
            .into_iter()
            .filter(|(_, p)| p.kind == SecretKind::String)
            .filter_map(|(key, p)| {
                String::from_utf8(p.bytes.to_vec())
                    .ok()
                    .map(|value| (key, value))
            })
            .collect();

        Ok(crate::core::Diff::compute(&document_pairs, env_pairs))
    }

    /// Drop an emptied environment. Admin only; `default` is kept.
    pub fn prune_env(&mut self, env: &str) -> Result<()> {
        policy::can_perform(self.actor()?, Op::ManageTeam, None)?;
        if env == DEFAULT_ENV {
            return Err(DocumentError::Invariant(
                "the default environment cannot be pruned".to_string(),
            )
            .into());
        }
        match self.doc.env(env) {
            None => return Err(PolicyError::EnvironmentNotFound(env.to_string()).into()),
            Some(entries) if !entries.is_empty() => {
                return Err(DocumentError::Invariant(format!(
                    "environment '{env}' still has entries"
                ))
                .into())
            }
            Some(_) => {}
        }
        self.doc.environments.remove(env);
        self.save()?;

        info!(env, "environment pruned");
        Ok(())
    }

    // --- Rotation ---

    /// Replace a secret's plaintext. Admin only.
    pub fn rotate_value(&mut self, env: &str, key: &str, plaintext: &[u8]) -> Result<()> {
        let actor = self.actor()?;
        policy::can_perform(actor, Op::Rotate, Some(env))?;
        let set_by = actor.name.clone();
        let kind = self.entry(env, key)?.kind;

        let ciphertext = self.encrypt_for(env, plaintext)?;
        self.doc.upsert(
            env,
            key,
            SecretEntry {
                value: ciphertext,
                set_by,
                modified: document::now_timestamp(),
                kind,
            },
        );
        self.save()?;

        info!(env, key, "secret rotated");
        Ok(())
    }

    /// Re-encrypt every entry the actor can reach with fresh file keys,
    /// leaving plaintexts unchanged. Returns the number of entries
    /// rewritten.
    pub fn rotate_all(&mut self) -> Result<usize> {
        policy::can_perform(self.actor()?, Op::Rotate, None)?;

        let envs = self.accessible_envs()?;
        let count = self.rekey_envs(&envs)?;
        self.save()?;

        info!(entries = count, "encryption rotated");
        Ok(count)
    }

    // --- Internals ---

    fn entry(&self, env: &str, key: &str) -> Result<&SecretEntry> {
        self.doc
            .env(env)
            .ok_or_else(|| PolicyError::EnvironmentNotFound(env.to_string()))?
            .get(key)
            .ok_or_else(|| {
                PolicyError::NotFound {
                    env: env.to_string(),
                    key: key.to_string(),
                }
                .into()
            })
    }

    fn encrypt_for(&self, env: &str, plaintext: &[u8]) -> Result<String> {
        let recipients = policy::recipients(&self.doc, env)?;
        if recipients.is_empty() {
            return Err(CryptoError::NoRecipients(env.to_string()).into());
        }
        cipher::encrypt(plaintext, &recipients)
    }

    /// Decrypt-then-re-encrypt every entry of `envs` to the current
    /// recipient sets. All decryptions complete before the document is
    /// touched; the caller saves once afterwards.
    pub(crate) fn rekey_envs(&mut self, envs: &[String]) -> Result<usize> {
        struct Staged {
            env: String,
            key: String,
            plaintext: Zeroizing<Vec<u8>>,
            set_by: String,
            kind: SecretKind,
        }

        let mut staged = Vec::new();
        for env in envs {
            let Some(entries) = self.doc.env(env) else {
                continue;
            };
            if !entries.is_empty() && policy::recipients(&self.doc, env)?.is_empty() {
                return Err(CryptoError::NoRecipients(env.clone()).into());
            }
            for (key, entry) in entries {
                staged.push(Staged {
                    env: env.clone(),
                    key: key.clone(),
                    plaintext: cipher::decrypt(&entry.value, self.identity.as_age())?,
                    set_by: entry.set_by.clone(),
                    kind: entry.kind,
                });
            }
        }

        let count = staged.len();
        for item in staged {
            let recipients = policy::recipients(&self.doc, &item.env)?;
            let ciphertext = cipher::encrypt(&item.plaintext, &recipients)?;
            self.doc.upsert(
                &item.env,
                &item.key,
                SecretEntry {
                    value: ciphertext,
                    set_by: item.set_by,
                    modified: document::now_timestamp(),
                    kind: item.kind,
                },
            );
        }

        debug!(environments = envs.len(), entries = count, "re-keyed");
        Ok(count)
    }

    pub(crate) fn save(&self) -> Result<()> {
        store::write(&self.path, &self.doc)
    }
}

fn validate_secret_name(key: &str) -> Result<()> {
    if document::is_valid_secret_name(key) {
        Ok(())
    } else {
        Err(DocumentError::Invariant(format!(
            "invalid secret name '{key}': use [A-Za-z_][A-Za-z0-9_]*"
        ))
        .into())
    }
}

fn validate_env_name(env: &str) -> Result<()> {
    if document::is_valid_env_name(env) {
        Ok(())
    } else {
        Err(DocumentError::Invariant(format!(
            "invalid environment name '{env}': use [A-Za-z0-9_.-]+"
        ))
        .into())
    }
}
