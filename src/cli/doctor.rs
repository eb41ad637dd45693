//! Doctor command - diagnose the document, identity, and access setup.

use std::path::Path;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::identity::Identity;
use crate::core::policy;
use crate::core::store;
use crate::core::vault::Vault;
use crate::error::{Error, PolicyError, Result};

pub fn execute(config: &Config) -> Result<()> {
    let mut problems = 0usize;

    // Document
    let path = store::resolve_path(config);
    let doc = match store::read(&path) {
        Ok(doc) => {
            output::success(&format!(
                "document {} parses and satisfies invariants ({} member{}, {} environment{})",
                output::key(&path.display().to_string()),
                doc.team.len(),
                if doc.team.len() == 1 { "" } else { "s" },
                doc.environments.len(),
                if doc.environments.len() == 1 { "" } else { "s" },
            ));
            Some(doc)
        }
        Err(e) => {
            output::fail(&format!("document: {e}"));
            problems += 1;
            None
        }
    };

    // Identity
    let identity = match Identity::load(&config.identity, config.strict) {
        Ok(identity) => {
            match identity.path() {
                Some(p) => output::success(&format!(
                    "identity loads from {}",
                    output::key(&p.display().to_string())
                )),
                None => output::success("identity loads from the environment"),
            }
            Some(identity)
        }
        Err(e) => {
            output::fail(&format!("identity: {e}"));
            problems += 1;
            None
        }
    };

    // Membership and per-environment access
    if let (Some(doc), Some(identity)) = (&doc, &identity) {
        let pubkey = identity.public_key();
        match doc.member_by_pubkey(&pubkey) {
            Some(member) => {
                output::success(&format!(
                    "you are '{}' (role {})",
                    member.name, member.role
                ));

                match Vault::open(config) {
                    Ok(vault) => {
                        for env in vault.accessible_envs().unwrap_or_default() {
                            match vault.decrypt_env(&env) {
                                Ok(entries) => output::success(&format!(
                                    "'{env}': {} entr{} decrypt",
                                    entries.len(),
                                    if entries.len() == 1 { "y" } else { "ies" }
                                )),
                                Err(e) => {
                                    output::fail(&format!("'{env}': {e}"));
                                    problems += 1;
                                }
                            }
                        }

                        match vault.verify() {
                            Ok(drifts) if drifts.is_empty() => {
                                output::success("no recipient drift")
                            }
                            Ok(drifts) => {
                                output::fail(&format!(
                                    "{} drifted entr{}; run {}",
                                    drifts.len(),
                                    if drifts.len() == 1 { "y" } else { "ies" },
                                    output::cmd("envkey verify --fix")
                                ));
                                problems += 1;
                            }
                            Err(Error::Policy(PolicyError::Denied { .. })) => {
                                output::dimmed("  drift audit skipped (role may not audit)")
                            }
                            Err(e) => {
                                output::fail(&format!("drift audit: {e}"));
                                problems += 1;
                            }
                        }
                    }
                    Err(e) => {
                        output::fail(&format!("open: {e}"));
                        problems += 1;
                    }
                }

                let orphans: Vec<&str> = doc
                    .environments
                    .keys()
                    .filter(|env| policy::recipient_members(doc, env).is_empty())
                    .map(String::as_str)
                    .collect();
                for env in orphans {
                    output::warn(&format!("'{env}' has no recipients; a set there will fail"));
                }
            }
            None => {
                output::fail(&format!("your public key {pubkey} is not in the team"));
                problems += 1;
            }
        }
    }

    // Hygiene: decrypted .env files should stay out of version control
    if Path::new(".env").exists() && !gitignore_covers_env() {
        output::warn(&format!(
            ".env exists but is not in .gitignore; add it or use {}",
            output::cmd("envkey run")
        ));
    }

    if problems == 0 {
        println!();
        output::success("all checks passed");
        Ok(())
    } else {
        Err(Error::Other(format!(
            "doctor found {problems} problem{}",
            if problems == 1 { "" } else { "s" }
        )))
    }
}

fn gitignore_covers_env() -> bool {
    std::fs::read_to_string(".gitignore")
        .map(|contents| {
            contents
                .lines()
                .any(|line| matches!(line.trim(), ".env" | ".env*" | "*.env" | ".env.*"))
        })
        .unwrap_or(false)
}
