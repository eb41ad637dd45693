//! Environment vs `.env` comparison.
//!
//! Compares an environment's decrypted values against a local `.env` file.
//! Only key names and statuses leave this module; values are compared and
//! dropped so callers cannot accidentally print plaintext.

use std::collections::BTreeSet;
use std::collections::HashMap;

/// The sync state of a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Present in both with equal values.
    Synced,
    /// Present in both with different values.
    Modified,
    /// Only in the encrypted document.
    DocumentOnly,
    /// Only in the `.env` file.
    EnvOnly,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Synced => "synced",
            EntryStatus::Modified => "modified",
            EntryStatus::DocumentOnly => "document only",
            EntryStatus::EnvOnly => ".env only",
        }
    }
}

/// One compared key.
#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub key: String,
    pub status: EntryStatus,
}

/// Comparison result, sorted by key.
#[derive(Debug, Default)]
pub struct Diff {
    entries: Vec<DiffEntry>,
}

impl Diff {
    /// Compare decrypted document pairs with `.env` pairs.
    pub fn compute(document: &[(String, String)], env_file: &[(String, String)]) -> Self {
        let doc_map: HashMap<&str, &str> = document
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let env_map: HashMap<&str, &str> = env_file
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let all_keys: BTreeSet<&str> = doc_map.keys().chain(env_map.keys()).copied().collect();

        let entries = all_keys
            .into_iter()
            .map(|key| {
                let status = match (doc_map.get(key), env_map.get(key)) {
                    (Some(d), Some(e)) if d == e => EntryStatus::Synced,
                    (Some(_), Some(_)) => EntryStatus::Modified,
                    (Some(_), None) => EntryStatus::DocumentOnly,
                    (None, _) => EntryStatus::EnvOnly,
                };
                DiffEntry {
                    key: key.to_string(),
                    status,
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Whether every key is present on both sides with equal values.
    pub fn in_sync(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.status == EntryStatus::Synced)
    }
}
