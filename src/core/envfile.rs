//! `.env` file parsing and emission.
//!
//! Used by `import`, `export --format env`, and `diff`. Parsing skips
//! comments and blank lines and strips optional quotes; emission is
//! shell-safe: every value is single-quoted with `'` escaped, so the output
//! can be `source`d or handed to tooling that splits on the first `=`.

use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Parsed `.env` content.
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    entries: Vec<(String, String)>,
}

impl EnvFile {
    /// Parse a `.env` file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&contents))
    }

    /// Parse `.env` text.
    pub fn parse(contents: &str) -> Self {
        let mut entries = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = unquote(value.trim()).to_string();
                entries.push((key, value));
            }
        }
        Self { entries }
    }

    /// Build from decrypted pairs.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { entries: pairs }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Escape a value for single-quoted shell output.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

impl fmt::Display for EnvFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key}={}", shell_quote(value))?;
        }
        Ok(())
    }
}
