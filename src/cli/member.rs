//! Team management commands.

use std::collections::BTreeSet;
use std::io::IsTerminal;

use crate::cli::{output, MemberAction};
use crate::core::config::Config;
use crate::core::document::Role;
use crate::core::vault::Vault;
use crate::error::{Error, Result};

pub fn execute(config: &Config, action: MemberAction) -> Result<()> {
    match action {
        MemberAction::Add {
            name,
            key,
            role,
            environments,
        } => add(config, &name, &key, role.into(), environments),
        MemberAction::Rm { name, yes } => rm(config, &name, yes),
        MemberAction::Grant { name, env } => grant(config, &name, &env),
        MemberAction::Revoke { name, env } => revoke(config, &name, &env),
        MemberAction::Update { name, key } => update(config, &name, &key),
        MemberAction::Ls { json } => ls(config, json),
    }
}

fn add(config: &Config, name: &str, key: &str, role: Role, environments: Vec<String>) -> Result<()> {
    let mut vault = Vault::open(config)?;

    let environments: Option<BTreeSet<String>> = if environments.is_empty() {
        None
    } else {
        Some(environments.into_iter().collect())
    };
    vault.member_add(name, key, role, environments)?;

    output::success(&format!("added {} ({})", output::key(name), role));
    output::dimmed("  existing secrets were re-encrypted for the new recipient set");
    Ok(())
}

fn rm(config: &Config, name: &str, yes: bool) -> Result<()> {
    let mut vault = Vault::open(config)?;

    if !yes && std::io::stdin().is_terminal() {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("remove '{name}' and re-key their environments?"))
            .default(false)
            .interact()
            .map_err(|e| Error::Other(e.to_string()))?;
        if !confirmed {
            output::dimmed("aborted");
            return Ok(());
        }
    }

    let removal = vault.member_rm(name)?;

    output::success(&format!(
        "removed {} and re-keyed {} environment{}",
        output::key(name),
        removal.rekeyed_envs.len(),
        if removal.rekeyed_envs.len() == 1 { "" } else { "s" },
    ));
    output::warn(&format!(
        "plaintext '{name}' already saw remains compromised; rotate the values themselves:"
    ));
    output::hint(&output::cmd("envkey rotate --all"));
    Ok(())
}

fn grant(config: &Config, name: &str, env: &str) -> Result<()> {
    let mut vault = Vault::open(config)?;
    if vault.member_grant(name, env)? {
        output::success(&format!("granted {} access to '{env}'", output::key(name)));
    } else {
        output::dimmed(&format!("'{name}' already has access to '{env}'"));
    }
    Ok(())
}

fn revoke(config: &Config, name: &str, env: &str) -> Result<()> {
    let mut vault = Vault::open(config)?;
    if vault.member_revoke(name, env)? {
        output::success(&format!("revoked '{env}' from {}", output::key(name)));
        output::dimmed(&format!("  '{env}' was re-keyed with a fresh file key"));
    } else {
        output::dimmed(&format!("'{name}' had no access to '{env}'"));
    }
    Ok(())
}

fn update(config: &Config, name: &str, key: &str) -> Result<()> {
    let mut vault = Vault::open(config)?;
    vault.member_update(name, key)?;
    output::success(&format!(
        "updated public key of {} and re-keyed their environments",
        output::key(name)
    ));
    Ok(())
}

fn ls(config: &Config, json: bool) -> Result<()> {
    let vault = Vault::open(config)?;
    let members = vault.members();

    if json {
        let items: Vec<serde_json::Value> = members
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "pubkey": m.pubkey,
                    "role": m.role.as_str(),
                    "added": m.added,
                    "environments": m.environments,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&items).map_err(|e| Error::Other(e.to_string()))?
        );
        return Ok(());
    }

    let name_w = members
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    println!("{:<name_w$}  {:<8}  {:<10}  ENVIRONMENTS", "NAME", "ROLE", "ADDED");
    for member in members {
        let envs = match (&member.role, &member.environments) {
            (Role::Admin, _) => "all".to_string(),
            (_, Some(envs)) => envs.iter().cloned().collect::<Vec<_>>().join(","),
            (Role::Member, None) => "default".to_string(),
            (_, None) => "-".to_string(),
        };
        println!(
            "{:<name_w$}  {:<8}  {:<10}  {}",
            member.name,
            member.role.as_str(),
            member.added,
            envs
        );
    }
    Ok(())
}
