//! Document model.
//!
//! In-memory representation of the secrets document: team roster,
//! environments, and their encrypted entries. The model holds ciphertexts
//! only — plaintext never enters this module. Serialization lives in
//! [`crate::core::yaml`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::cipher;
use crate::core::constants::{DEFAULT_ENV, FORMAT_VERSION};
use crate::core::types::{Ciphertext, EnvName, MemberName, PublicKey, SecretName};
use crate::core::yaml::Comments;
use crate::error::{DocumentError, Result};

/// A team member's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
    Ci,
    Readonly,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Ci => "ci",
            Role::Readonly => "readonly",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            "ci" => Ok(Role::Ci),
            "readonly" => Ok(Role::Readonly),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a secret holds an inline string or file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretKind {
    #[default]
    String,
    File,
}

impl SecretKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SecretKind::String => "string",
            SecretKind::File => "file",
        }
    }
}

impl FromStr for SecretKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "string" => Ok(SecretKind::String),
            "file" => Ok(SecretKind::File),
            other => Err(format!("unknown secret kind '{other}'")),
        }
    }
}

/// A team member record.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: MemberName,
    pub pubkey: PublicKey,
    pub role: Role,
    /// Calendar date the member was added (YYYY-MM-DD).
    pub added: String,
    /// Explicit environment entitlements. `None` means the role default:
    /// `{default}` for members, nothing for readonly, all for admins;
    /// ci members must carry an explicit set.
    pub environments: Option<BTreeSet<EnvName>>,
}

/// One encrypted secret.
#[derive(Debug, Clone)]
pub struct SecretEntry {
    /// Base64 age ciphertext, unwrapped.
    pub value: Ciphertext,
    /// Member who last chose the plaintext.
    pub set_by: MemberName,
    /// RFC 3339 timestamp of the last write (including re-keying).
    pub modified: String,
    pub kind: SecretKind,
}

/// The secrets document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub version: u32,
    /// Team roster in insertion order (serialization order is preserved).
    pub team: Vec<Member>,
    pub environments: BTreeMap<EnvName, BTreeMap<SecretName, SecretEntry>>,
    pub metadata: BTreeMap<String, String>,
    /// Comments captured on load, re-emitted on save.
    pub(crate) comments: Comments,
}

impl Document {
    /// Fresh document with one admin and an empty default environment.
    pub fn new(owner: MemberName, pubkey: PublicKey, added: String) -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(DEFAULT_ENV.to_string(), BTreeMap::new());

        Self {
            version: FORMAT_VERSION,
            team: vec![Member {
                name: owner,
                pubkey,
                role: Role::Admin,
                added,
                environments: None,
            }],
            environments,
            metadata: BTreeMap::new(),
            comments: Comments::default(),
        }
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.team.iter().find(|m| m.name == name)
    }

    pub fn member_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.team.iter_mut().find(|m| m.name == name)
    }

    /// Look up a member by public key.
    pub fn member_by_pubkey(&self, pubkey: &str) -> Option<&Member> {
        self.team.iter().find(|m| m.pubkey == pubkey)
    }

    /// Entries of an environment, if it exists.
    pub fn env(&self, env: &str) -> Option<&BTreeMap<SecretName, SecretEntry>> {
        self.environments.get(env)
    }

    /// Entries of an environment, creating it when absent.
    pub fn env_mut(&mut self, env: &str) -> &mut BTreeMap<SecretName, SecretEntry> {
        self.environments.entry(env.to_string()).or_default()
    }

    /// Insert or replace an entry, clamping `modified` so timestamps never
    /// move backwards within a secret's lifetime.
    pub fn upsert(&mut self, env: &str, key: &str, mut entry: SecretEntry) {
        if let Some(previous) = self.environments.get(env).and_then(|e| e.get(key)) {
            if previous.modified.as_str() > entry.modified.as_str() {
                entry.modified = previous.modified.clone();
            }
        }
        self.env_mut(env).insert(key.to_string(), entry);
    }

    /// Whether the document carries any member or entry at all.
    pub fn is_empty(&self) -> bool {
        self.team.is_empty() && self.environments.values().all(|e| e.is_empty())
    }

    /// Check the load-time invariants.
    ///
    /// Recipient consistency of ciphertexts (I3) is maintained by
    /// construction and audited by `verify`; everything else is enforced
    /// here on every load and before every save.
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(DocumentError::Invariant(format!(
                "unsupported version {} (supported: {FORMAT_VERSION})",
                self.version
            ))
            .into());
        }

        let mut names = BTreeSet::new();
        let mut pubkeys = BTreeSet::new();
        for member in &self.team {
            if !is_valid_member_name(&member.name) {
                return Err(invariant(format!("invalid member name '{}'", member.name)));
            }
            if !names.insert(member.name.as_str()) {
                return Err(invariant(format!("duplicate member name '{}'", member.name)));
            }
            cipher::parse_recipient(&member.pubkey).map_err(|_| {
                invariant(format!(
                    "member '{}' has an invalid age public key",
                    member.name
                ))
            })?;
            if !pubkeys.insert(member.pubkey.as_str()) {
                return Err(invariant(format!(
                    "public key of '{}' is shared with another member",
                    member.name
                )));
            }
            if member.added.is_empty() {
                return Err(invariant(format!("member '{}' has no added date", member.name)));
            }
            if member.role == Role::Ci
                && !member.environments.as_ref().is_some_and(|e| !e.is_empty())
            {
                return Err(invariant(format!(
                    "ci member '{}' must list explicit environments",
                    member.name
                )));
            }
            if let Some(envs) = &member.environments {
                for env in envs {
                    if !is_valid_env_name(env) {
                        return Err(invariant(format!(
                            "member '{}' grants invalid environment name '{env}'",
                            member.name
                        )));
                    }
                }
            }
        }

        for (env, entries) in &self.environments {
            if !is_valid_env_name(env) {
                return Err(invariant(format!("invalid environment name '{env}'")));
            }
            for (key, entry) in entries {
                if !is_valid_secret_name(key) {
                    return Err(invariant(format!("invalid secret name '{key}' in '{env}'")));
                }
                if entry.set_by.is_empty() {
                    return Err(invariant(format!("'{env}/{key}' has an empty set_by")));
                }
                if DateTime::parse_from_rfc3339(&entry.modified).is_err() {
                    return Err(invariant(format!(
                        "'{env}/{key}' has a malformed modified timestamp"
                    )));
                }
            }
        }

        if !self.is_empty() && !self.team.iter().any(|m| m.role == Role::Admin) {
            return Err(invariant("a non-empty document needs at least one admin"));
        }

        Ok(())
    }
}

fn invariant(msg: impl Into<String>) -> crate::error::Error {
    DocumentError::Invariant(msg.into()).into()
}

/// Secret names match `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_secret_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Environment names match `[A-Za-z0-9_.-]+`.
pub fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Member names share the environment charset.
pub fn is_valid_member_name(name: &str) -> bool {
    is_valid_env_name(name)
}

/// Current UTC timestamp in the document's `modified` format.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current UTC date in the document's `added` format.
pub fn now_date() -> String {
    Utc::now().date_naive().to_string()
}
