//! Recipient-drift audit.
//!
//! Ciphertext recipients are maintained by construction (every write
//! re-encrypts to the derived recipient set), but a merge or an external
//! edit can leave entries behind. `verify` is the only at-rest enforcement:
//! it decrypts every reachable entry and compares each ciphertext's stanza
//! count with the derived recipient set. Stanzas identify recipients only
//! by ephemeral share, so the count is the strongest check available
//! without holding every team identity.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::core::cipher;
use crate::core::policy::{self, Op};
use crate::error::{CryptoError, Error, PolicyError, Result};

use super::Vault;

/// One drifted entry.
#[derive(Debug, Clone)]
pub struct Drift {
    pub env: String,
    pub key: String,
    pub expected: usize,
    pub actual: usize,
}

impl Drift {
    /// The matching error value, for callers that want to fail hard.
    pub fn to_error(&self) -> Error {
        PolicyError::RecipientDrift {
            env: self.env.clone(),
            key: self.key.clone(),
            expected: self.expected,
            actual: self.actual,
        }
        .into()
    }
}

/// One row of the document-derived audit listing.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub env: String,
    pub key: String,
    pub set_by: String,
    pub modified: String,
}

impl Vault {
    /// Check every reachable entry for recipient drift.
    ///
    /// Read-only; an admin caller covers the whole document. Corrupt
    /// ciphertexts surface unchanged rather than being reported as drift.
    pub fn verify(&self) -> Result<Vec<Drift>> {
        policy::can_perform(self.actor()?, Op::Audit, None)?;

        let mut drifts = Vec::new();
        for env in self.accessible_envs()? {
            let expected = policy::recipient_members(&self.doc, &env).len();
            let Some(entries) = self.doc.env(&env) else {
                continue;
            };

            for (key, entry) in entries {
                let actual = cipher::recipient_stanza_count(&entry.value)?;

                let readable = match cipher::decrypt(&entry.value, self.identity.as_age()) {
                    Ok(_) => true,
                    Err(Error::Crypto(CryptoError::NotARecipient)) => false,
                    Err(other) => return Err(other),
                };

                if actual != expected || !readable {
                    warn!(env = %env, key = %key, expected, actual, "recipient drift");
                    drifts.push(Drift {
                        env: env.clone(),
                        key: key.clone(),
                        expected,
                        actual,
                    });
                }
            }
        }

        Ok(drifts)
    }

    /// Re-key every environment named by `drifts`. Admin only.
    ///
    /// Returns the number of entries rewritten.
    pub fn verify_fix(&mut self, drifts: &[Drift]) -> Result<usize> {
        policy::can_perform(self.actor()?, Op::Rotate, None)?;

        let envs: Vec<String> = drifts
            .iter()
            .map(|d| d.env.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if envs.is_empty() {
            return Ok(0);
        }

        let count = self.rekey_envs(&envs)?;
        self.save()?;

        info!(environments = envs.len(), entries = count, "drift repaired");
        Ok(count)
    }

    /// Audit metadata for every reachable entry, newest first.
    pub fn log(&self) -> Result<Vec<AuditRecord>> {
        policy::can_perform(self.actor()?, Op::Audit, None)?;

        let mut records = Vec::new();
        for env in self.accessible_envs()? {
            let Some(entries) = self.doc.env(&env) else {
                continue;
            };
            for (key, entry) in entries {
                records.push(AuditRecord {
                    env: env.clone(),
                    key: key.clone(),
                    set_by: entry.set_by.clone(),
                    modified: entry.modified.clone(),
                });
            }
        }
        records.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.env.cmp(&b.env))
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(records)
    }
}
