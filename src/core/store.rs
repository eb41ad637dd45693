//! Document persistence.
//!
//! The document is read fully into memory and written back atomically:
//! serialize to a sibling temp file, fsync, rename over the original. A
//! crash at any point leaves the previous document intact. No lock file is
//! used; concurrent writers are arbitrated by the enclosing version-control
//! merge.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::config::Config;
use crate::core::constants::{DOCUMENT_FILE, DOCUMENT_FILE_YAML};
use crate::core::document::Document;
use crate::core::yaml;
use crate::error::{DocumentError, Result};

/// Resolve the document path: explicit override, else `.envkey` /
/// `.envkey.yaml` in the current directory (`.envkey` for new documents).
pub fn resolve_path(config: &Config) -> PathBuf {
    if let Some(path) = &config.document_path {
        return path.clone();
    }
    let default = PathBuf::from(DOCUMENT_FILE);
    if default.exists() {
        return default;
    }
    let yaml = PathBuf::from(DOCUMENT_FILE_YAML);
    if yaml.exists() {
        return yaml;
    }
    default
}

/// Load and validate the document at `path`.
pub fn read(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(DocumentError::Missing(path.to_path_buf()).into());
    }
    let text = fs::read_to_string(path).map_err(DocumentError::Read)?;
    let doc = yaml::parse(&text)?;
    doc.validate()?;
    Ok(doc)
}

/// Validate and atomically write the document to `path`.
pub fn write(path: &Path, doc: &Document) -> Result<()> {
    doc.validate()?;
    let text = yaml::emit(doc);

    let temp = write_temp(path, &text)?;
    temp.persist(path)
        .map_err(|e| DocumentError::AtomicWrite(e.error))?;
    sync_parent_dir(path);

    debug!(path = %path.display(), bytes = text.len(), "document written");
    Ok(())
}

/// Write and fsync the serialized document to a sibling temp file.
///
/// Kept separate from the rename so tests can simulate a crash between the
/// two steps.
fn write_temp(path: &Path, text: &str) -> Result<NamedTempFile> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut temp = NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
        .map_err(DocumentError::AtomicWrite)?;
    temp.write_all(text.as_bytes())
        .map_err(DocumentError::AtomicWrite)?;
    temp.as_file()
        .sync_all()
        .map_err(DocumentError::AtomicWrite)?;
    Ok(temp)
}

/// Make the rename durable. Best effort: a failed directory fsync cannot
/// roll back an already-renamed file.
fn sync_parent_dir(path: &Path) {
    #[cfg(unix)]
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(handle) = File::open(dir) {
            let _ = handle.sync_all();
        }
    }
}
