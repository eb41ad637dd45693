//! Access policy.
//!
//! Pure functions over a [`Document`]. The recipient set of an environment
//! is derived from the roster on every call, never stored, so it cannot
//! drift from the team metadata. Logical checks here always run before any
//! cryptographic work; the same entitlement predicate drives both, so a
//! member that may read an environment is exactly a member that can
//! decrypt it.

use age::x25519;

use crate::core::cipher;
use crate::core::constants::DEFAULT_ENV;
use crate::core::document::{Document, Member, Role};
use crate::error::{PolicyError, Result};

/// An operation subject to the role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read,
    Set,
    Rm,
    Rotate,
    ManageTeam,
    Audit,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Read => "read secrets",
            Op::Set => "set secrets",
            Op::Rm => "remove secrets",
            Op::Rotate => "rotate secrets",
            Op::ManageTeam => "manage the team",
            Op::Audit => "audit the document",
        }
    }
}

/// Whether `member` is entitled to environment `env`.
///
/// Admins see every environment. Everyone else needs the environment in
/// their explicit `environments` set, except role `member`, whose absent
/// set defaults to `{default}`. A ci or readonly member with no explicit
/// grant has no access at all.
pub fn is_entitled(member: &Member, env: &str) -> bool {
    match member.role {
        Role::Admin => true,
        _ => match &member.environments {
            Some(envs) => envs.contains(env),
            None => member.role == Role::Member && env == DEFAULT_ENV,
        },
    }
}

/// The members whose keys must be recipients of every ciphertext in `env`.
pub fn recipient_members<'a>(doc: &'a Document, env: &str) -> Vec<&'a Member> {
    doc.team.iter().filter(|m| is_entitled(m, env)).collect()
}

/// Parsed recipient keys for `env`, in roster order.
pub fn recipients(doc: &Document, env: &str) -> Result<Vec<x25519::Recipient>> {
    recipient_members(doc, env)
        .iter()
        .map(|m| cipher::parse_recipient(&m.pubkey))
        .collect()
}

/// Environments of the document the member may read, in document order.
pub fn accessible_envs<'a>(doc: &'a Document, member: &Member) -> Vec<&'a str> {
    doc.environments
        .keys()
        .filter(|env| is_entitled(member, env))
        .map(String::as_str)
        .collect()
}

/// Fast-fail policy check, before any cryptographic work.
///
/// `env` scopes the check for environment-addressed operations; `None`
/// checks the role column alone (verify, log, team management).
pub fn can_perform(actor: &Member, op: Op, env: Option<&str>) -> Result<()> {
    let denied = |op: Op| -> crate::error::Error {
        PolicyError::Denied {
            role: actor.role.to_string(),
            op: op.as_str().to_string(),
        }
        .into()
    };

    let role_allows = match op {
        Op::Read => true,
        Op::Set | Op::Rm => matches!(actor.role, Role::Admin | Role::Member),
        Op::Rotate | Op::ManageTeam => actor.role == Role::Admin,
        Op::Audit => actor.role != Role::Ci,
    };
    if !role_allows {
        return Err(denied(op));
    }

    if let Some(env) = env {
        if !is_entitled(actor, env) {
            return Err(PolicyError::NotEntitled {
                actor: actor.name.clone(),
                env: env.to_string(),
            }
            .into());
        }
    }

    Ok(())
}
