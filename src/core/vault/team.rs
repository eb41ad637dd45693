//! Team membership operations.
//!
//! Every membership change is followed by a re-keying of the affected
//! environments so the recipient stanzas of each ciphertext match the new
//! recipient set. Removal relies on the fresh file key sampled by every
//! encryption: once re-keyed, the removed identity cannot decrypt the new
//! document, only retained copies of the old one.

use std::collections::BTreeSet;

use tracing::info;

use crate::core::cipher;
use crate::core::document::{self, Member, Role};
use crate::core::policy::{self, Op};
use crate::core::types::EnvName;
use crate::error::{DocumentError, PolicyError, Result};

use super::Vault;

/// What a [`Vault::member_rm`] actually did, for caller messaging.
#[derive(Debug)]
pub struct MemberRemoval {
    pub name: String,
    /// Environments whose ciphertexts were replaced.
    pub rekeyed_envs: Vec<EnvName>,
}

impl Vault {
    /// The team roster.
    pub fn members(&self) -> &[Member] {
        &self.doc.team
    }

    /// Add a team member and re-key every environment they can now read.
    pub fn member_add(
        &mut self,
        name: &str,
        pubkey: &str,
        role: Role,
        environments: Option<BTreeSet<EnvName>>,
    ) -> Result<()> {
        policy::can_perform(self.actor()?, Op::ManageTeam, None)?;

        if !document::is_valid_member_name(name) {
            return Err(DocumentError::Invariant(format!("invalid member name '{name}'")).into());
        }
        if self.doc.member(name).is_some() {
            return Err(PolicyError::NameInUse(name.to_string()).into());
        }
        cipher::parse_recipient(pubkey)?;
        if let Some(existing) = self.doc.member_by_pubkey(pubkey) {
            return Err(PolicyError::PubkeyInUse(existing.name.clone()).into());
        }
        if role == Role::Ci && !environments.as_ref().is_some_and(|e| !e.is_empty()) {
            return Err(DocumentError::Invariant(
                "ci members need explicit environments (--env)".to_string(),
            )
            .into());
        }

        let member = Member {
            name: name.to_string(),
            pubkey: pubkey.to_string(),
            role,
            added: document::now_date(),
            // admins implicitly carry every environment
            environments: if role == Role::Admin {
                None
            } else {
                environments
            },
        };

        let affected = self.entitled_existing_envs(&member);
        self.doc.team.push(member);
        self.rekey_envs(&affected)?;
        self.save()?;

        info!(name, role = %role, envs = affected.len(), "member added");
        Ok(())
    }

    /// Remove a team member and re-key everything they could read.
    ///
    /// The caller should warn that plaintext previously held by the removed
    /// member stays compromised; `rotate --all` with new values is the
    /// recommended follow-up.
    pub fn member_rm(&mut self, name: &str) -> Result<MemberRemoval> {
        policy::can_perform(self.actor()?, Op::ManageTeam, None)?;

        if name == self.actor()?.name {
            return Err(crate::error::Error::Other(
                "cannot remove yourself; ask another admin (your identity could not be locked out by a re-keying you performed)"
                    .to_string(),
            ));
        }
        let target = self
            .doc
            .member(name)
            .ok_or_else(|| PolicyError::MemberNotFound(name.to_string()))?;
        if target.role == Role::Admin
            && self.doc.team.iter().filter(|m| m.role == Role::Admin).count() == 1
        {
            return Err(PolicyError::LastAdmin(name.to_string()).into());
        }

        let affected = self.entitled_existing_envs(target);
        self.doc.team.retain(|m| m.name != name);
        self.rekey_envs(&affected)?;
        self.save()?;

        info!(name, envs = affected.len(), "member removed");
        Ok(MemberRemoval {
            name: name.to_string(),
            rekeyed_envs: affected,
        })
    }

    /// Entitle a member to an environment and re-key it.
    ///
    /// Returns `false` when the grant was already in place.
    pub fn member_grant(&mut self, name: &str, env: &str) -> Result<bool> {
        policy::can_perform(self.actor()?, Op::ManageTeam, None)?;
        if !document::is_valid_env_name(env) {
            return Err(DocumentError::Invariant(format!("invalid environment name '{env}'")).into());
        }

        let member = self
            .doc
            .member_mut(name)
            .ok_or_else(|| PolicyError::MemberNotFound(name.to_string()))?;
        if member.role == Role::Admin {
            return Err(crate::error::Error::Other(format!(
                "'{name}' is an admin and already has every environment"
            )));
        }

        let mut envs = materialize(member);
        if !envs.insert(env.to_string()) {
            return Ok(false);
        }
        member.environments = Some(envs);

        self.rekey_envs(&[env.to_string()])?;
        self.save()?;

        info!(name, env, "granted");
        Ok(true)
    }

    /// Withdraw an environment from a member and re-key it.
    ///
    /// Returns `false` when the member had no such grant.
    pub fn member_revoke(&mut self, name: &str, env: &str) -> Result<bool> {
        policy::can_perform(self.actor()?, Op::ManageTeam, None)?;

        let member = self
            .doc
            .member_mut(name)
            .ok_or_else(|| PolicyError::MemberNotFound(name.to_string()))?;
        if member.role == Role::Admin {
            return Err(crate::error::Error::Other(format!(
                "'{name}' is an admin; revoke has no effect (demote or remove instead)"
            )));
        }

        let mut envs = materialize(member);
        if !envs.remove(env) {
            return Ok(false);
        }
        if member.role == Role::Ci && envs.is_empty() {
            return Err(DocumentError::Invariant(format!(
                "ci member '{name}' must keep at least one environment; remove the member instead"
            ))
            .into());
        }
        member.environments = Some(envs);

        self.rekey_envs(&[env.to_string()])?;
        self.save()?;

        info!(name, env, "revoked");
        Ok(true)
    }

    /// Replace a member's public key and re-key their environments.
    ///
    /// Admins may update anyone; a member may update their own record while
    /// still holding the old identity (the re-keying decrypts with it).
    pub fn member_update(&mut self, name: &str, new_pubkey: &str) -> Result<()> {
        if name != self.actor()?.name {
            policy::can_perform(self.actor()?, Op::ManageTeam, None)?;
        }

        cipher::parse_recipient(new_pubkey)?;
        if let Some(existing) = self.doc.member_by_pubkey(new_pubkey) {
            if existing.name != name {
                return Err(PolicyError::PubkeyInUse(existing.name.clone()).into());
            }
        }

        let member = self
            .doc
            .member_mut(name)
            .ok_or_else(|| PolicyError::MemberNotFound(name.to_string()))?;
        member.pubkey = new_pubkey.to_string();
        let snapshot = member.clone();

        let affected = self.entitled_existing_envs(&snapshot);
        self.rekey_envs(&affected)?;
        self.save()?;

        info!(name, envs = affected.len(), "public key updated");
        Ok(())
    }

    /// Existing environments this member is entitled to.
    fn entitled_existing_envs(&self, member: &Member) -> Vec<EnvName> {
        self.doc
            .environments
            .keys()
            .filter(|env| policy::is_entitled(member, env))
            .cloned()
            .collect()
    }
}

/// A member's explicit entitlement set, materializing the role default.
fn materialize(member: &Member) -> BTreeSet<EnvName> {
    match &member.environments {
        Some(envs) => envs.clone(),
        None if member.role == Role::Member => {
            std::iter::once(crate::core::constants::DEFAULT_ENV.to_string()).collect()
        }
        None => BTreeSet::new(),
    }
}
