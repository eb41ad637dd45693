//! Document serialization.
//!
//! Reading goes through `serde_yaml` so quoting and scalar edge cases are
//! handled by a real YAML parser; writing is a hand-rolled emitter so the
//! output is canonical and diff-stable: `default` environment first, secret
//! names in lexicographic order, team in insertion order, ciphertexts
//! wrapped at 76 columns. Full-line comments are captured with the schema
//! anchor they precede and re-emitted in place.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

use serde_yaml::Value;

use crate::core::constants::{CIPHERTEXT_WRAP, DEFAULT_ENV};
use crate::core::document::{Document, Member, Role, SecretEntry, SecretKind};
use crate::error::{DocumentError, Result};

/// Comments captured on load, keyed by the anchor path they precede
/// (`version`, `team.alice`, `environments.default.API_KEY`, ...).
#[derive(Debug, Clone, Default)]
pub(crate) struct Comments {
    blocks: HashMap<String, Vec<String>>,
    tail: Vec<String>,
}

impl Comments {
    fn attach(&mut self, anchor: String, pending: &mut Vec<String>) {
        if !pending.is_empty() {
            self.blocks
                .entry(anchor)
                .or_default()
                .append(pending);
        }
    }

    fn get(&self, anchor: &str) -> &[String] {
        self.blocks.get(anchor).map(Vec::as_slice).unwrap_or(&[])
    }
}

// --- Parsing ---

/// Parse a document from YAML text.
pub fn parse(text: &str) -> Result<Document> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|e| DocumentError::Parse(e.to_string()))?;

    let root = as_mapping(&value, "document root")?;

    let mut version = None;
    let mut team = Vec::new();
    let mut environments = BTreeMap::new();
    let mut metadata = BTreeMap::new();

    for (key, val) in root {
        match str_key(key)? {
            "version" => {
                version = Some(
                    val.as_u64()
                        .ok_or_else(|| parse_err("version must be an integer"))?
                        as u32,
                );
            }
            "team" => team = parse_team(val)?,
            "environments" => environments = parse_environments(val)?,
            "metadata" => metadata = parse_metadata(val)?,
            other => return Err(parse_err(format!("unknown top-level key '{other}'"))),
        }
    }

    Ok(Document {
        version: version.ok_or_else(|| parse_err("missing 'version'"))?,
        team,
        environments,
        metadata,
        comments: scan_comments(text),
    })
}

fn parse_team(value: &Value) -> Result<Vec<Member>> {
    let mapping = as_mapping(value, "team")?;
    let mut team = Vec::with_capacity(mapping.len());

    for (name, val) in mapping {
        let name = str_key(name)?.to_string();
        let fields = as_mapping(val, &format!("team member '{name}'"))?;

        let mut pubkey = None;
        let mut role = None;
        let mut added = None;
        let mut environments = None;

        for (field, v) in fields {
            match str_key(field)? {
                "pubkey" => pubkey = Some(str_value(v, &name, "pubkey")?.to_string()),
                "role" => {
                    role = Some(
                        str_value(v, &name, "role")?
                            .parse::<Role>()
                            .map_err(parse_err)?,
                    )
                }
                "added" => added = Some(str_value(v, &name, "added")?.to_string()),
                "environments" => {
                    let seq = v.as_sequence().ok_or_else(|| {
                        parse_err(format!("'{name}.environments' must be a list"))
                    })?;
                    let mut set = BTreeSet::new();
                    for item in seq {
                        set.insert(str_value(item, &name, "environments")?.to_string());
                    }
                    environments = Some(set);
                }
                other => {
                    return Err(parse_err(format!("unknown field '{other}' on member '{name}'")))
                }
            }
        }

        team.push(Member {
            pubkey: pubkey.ok_or_else(|| parse_err(format!("member '{name}' missing pubkey")))?,
            role: role.ok_or_else(|| parse_err(format!("member '{name}' missing role")))?,
            added: added.ok_or_else(|| parse_err(format!("member '{name}' missing added")))?,
            environments,
            name,
        });
    }

    Ok(team)
}

fn parse_environments(
    value: &Value,
) -> Result<BTreeMap<String, BTreeMap<String, SecretEntry>>> {
    let mapping = as_mapping(value, "environments")?;
    let mut environments = BTreeMap::new();

    for (env, entries) in mapping {
        let env = str_key(env)?.to_string();
        let entries_map = as_mapping(entries, &format!("environment '{env}'"))?;
        let mut parsed = BTreeMap::new();

        for (key, val) in entries_map {
            let key = str_key(key)?.to_string();
            let fields = as_mapping(val, &format!("entry '{env}/{key}'"))?;

            let mut entry_value = None;
            let mut set_by = None;
            let mut modified = None;
            let mut kind = SecretKind::String;

            for (field, v) in fields {
                match str_key(field)? {
                    // The ciphertext is stored as a wrapped block scalar;
                    // whitespace is stripped before base64 decoding.
                    "value" => {
                        entry_value = Some(
                            str_value(v, &key, "value")?
                                .split_whitespace()
                                .collect::<String>(),
                        )
                    }
                    "set_by" => set_by = Some(str_value(v, &key, "set_by")?.to_string()),
                    "modified" => modified = Some(str_value(v, &key, "modified")?.to_string()),
                    "kind" => {
                        kind = str_value(v, &key, "kind")?
                            .parse::<SecretKind>()
                            .map_err(parse_err)?
                    }
                    other => {
                        return Err(parse_err(format!(
                            "unknown field '{other}' on entry '{env}/{key}'"
                        )))
                    }
                }
            }

            parsed.insert(
                key.clone(),
                SecretEntry {
                    value: entry_value
                        .ok_or_else(|| parse_err(format!("entry '{env}/{key}' missing value")))?,
                    set_by: set_by
                        .ok_or_else(|| parse_err(format!("entry '{env}/{key}' missing set_by")))?,
                    modified: modified.ok_or_else(|| {
                        parse_err(format!("entry '{env}/{key}' missing modified"))
                    })?,
                    kind,
                },
            );
        }

        environments.insert(env, parsed);
    }

    Ok(environments)
}

fn parse_metadata(value: &Value) -> Result<BTreeMap<String, String>> {
    let mapping = as_mapping(value, "metadata")?;
    let mut metadata = BTreeMap::new();
    for (key, val) in mapping {
        let key = str_key(key)?.to_string();
        metadata.insert(
            key.clone(),
            val.as_str()
                .ok_or_else(|| parse_err(format!("metadata '{key}' must be a string")))?
                .to_string(),
        );
    }
    Ok(metadata)
}

fn as_mapping<'a>(value: &'a Value, what: &str) -> Result<&'a serde_yaml::Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| parse_err(format!("{what} must be a mapping")))
}

fn str_key(value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| parse_err("mapping keys must be strings"))
}

fn str_value<'a>(value: &'a Value, owner: &str, field: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| parse_err(format!("'{owner}.{field}' must be a string")))
}

fn parse_err(msg: impl Into<String>) -> crate::error::Error {
    DocumentError::Parse(msg.into()).into()
}

// --- Comment scanning ---

/// Collect full-line comments, keyed by the anchor line that follows them.
fn scan_comments(text: &str) -> Comments {
    let mut comments = Comments::default();
    let mut pending: Vec<String> = Vec::new();
    let mut section = "";
    let mut current_env = String::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            pending.push(trimmed.to_string());
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        let indent = line.len() - trimmed.len();
        let Some(key) = line_key(trimmed) else {
            continue;
        };

        match indent {
            0 => {
                if matches!(key, "version" | "team" | "environments" | "metadata") {
                    section = match key {
                        "team" => "team",
                        "environments" => "environments",
                        "metadata" => "metadata",
                        _ => "",
                    };
                    current_env.clear();
                    comments.attach(key.to_string(), &mut pending);
                }
            }
            2 => match section {
                "team" => comments.attach(format!("team.{key}"), &mut pending),
                "environments" => {
                    current_env = key.to_string();
                    comments.attach(format!("environments.{key}"), &mut pending);
                }
                "metadata" => comments.attach(format!("metadata.{key}"), &mut pending),
                _ => {}
            },
            4 if section == "environments" && !current_env.is_empty() => {
                comments.attach(format!("environments.{current_env}.{key}"), &mut pending);
            }
            _ => {}
        }
    }

    comments.tail = pending;
    comments
}

/// The key of a `key:` or `key: value` line, unquoted; `None` for
/// sequence items and scalar continuation lines.
fn line_key(trimmed: &str) -> Option<&str> {
    if trimmed.starts_with('-') {
        return None;
    }
    let key = if let Some((key, _)) = trimmed.split_once(": ") {
        key
    } else {
        trimmed.strip_suffix(':')?
    };
    Some(key.trim_matches(|c| c == '"' || c == '\''))
}

// --- Emitting ---

/// Serialize a document to canonical YAML.
pub fn emit(doc: &Document) -> String {
    let mut out = String::new();
    let c = &doc.comments;

    emit_comments(&mut out, c.get("version"), 0);
    let _ = writeln!(out, "version: {}", doc.version);

    emit_comments(&mut out, c.get("team"), 0);
    if doc.team.is_empty() {
        out.push_str("team: {}\n");
    } else {
        out.push_str("team:\n");
        for member in &doc.team {
            emit_comments(&mut out, c.get(&format!("team.{}", member.name)), 2);
            let _ = writeln!(out, "  {}:", member.name);
            let _ = writeln!(out, "    pubkey: {}", member.pubkey);
            let _ = writeln!(out, "    role: {}", member.role);
            let _ = writeln!(out, "    added: {}", member.added);
            if let Some(envs) = &member.environments {
                if envs.is_empty() {
                    out.push_str("    environments: []\n");
                } else {
                    out.push_str("    environments:\n");
                    for env in envs {
                        let _ = writeln!(out, "      - {env}");
                    }
                }
            }
        }
    }

    emit_comments(&mut out, c.get("environments"), 0);
    if doc.environments.is_empty() {
        out.push_str("environments: {}\n");
    } else {
        out.push_str("environments:\n");
        for env in ordered_envs(doc) {
            let entries = &doc.environments[env];
            emit_comments(&mut out, c.get(&format!("environments.{env}")), 2);
            if entries.is_empty() {
                let _ = writeln!(out, "  {env}: {{}}");
                continue;
            }
            let _ = writeln!(out, "  {env}:");
            for (key, entry) in entries {
                emit_comments(&mut out, c.get(&format!("environments.{env}.{key}")), 4);
                let _ = writeln!(out, "    {key}:");
                out.push_str("      value: |-\n");
                for chunk in wrap(&entry.value, CIPHERTEXT_WRAP) {
                    let _ = writeln!(out, "        {chunk}");
                }
                let _ = writeln!(out, "      set_by: {}", entry.set_by);
                let _ = writeln!(out, "      modified: {}", entry.modified);
                if entry.kind == SecretKind::File {
                    out.push_str("      kind: file\n");
                }
            }
        }
    }

    if !doc.metadata.is_empty() {
        emit_comments(&mut out, c.get("metadata"), 0);
        out.push_str("metadata:\n");
        for (key, value) in &doc.metadata {
            emit_comments(&mut out, c.get(&format!("metadata.{key}")), 2);
            let _ = writeln!(out, "  {key}: {}", scalar(value));
        }
    }

    for line in &c.tail {
        let _ = writeln!(out, "{line}");
    }

    out
}

/// `default` first, then the rest lexicographically.
fn ordered_envs(doc: &Document) -> Vec<&String> {
    let mut envs: Vec<&String> = doc.environments.keys().collect();
    envs.sort_by(|a, b| {
        let a_default = a.as_str() == DEFAULT_ENV;
        let b_default = b.as_str() == DEFAULT_ENV;
        b_default.cmp(&a_default).then_with(|| a.cmp(b))
    });
    envs
}

fn emit_comments(out: &mut String, lines: &[String], indent: usize) {
    for line in lines {
        let _ = writeln!(out, "{:indent$}{line}", "");
    }
}

fn wrap(s: &str, width: usize) -> impl Iterator<Item = &str> {
    s.as_bytes()
        .chunks(width)
        // base64 is ASCII, so byte chunks are char-safe
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
}

/// Quote a metadata scalar only when the plain form would be ambiguous.
fn scalar(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '@' | '-' | '+'))
        && !matches!(value, "true" | "false" | "null" | "~")
        && value.parse::<f64>().is_err();
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}
