//! Store - Persistence of the compatibility document
//!
//! The whole document is read at startup and rewritten on every save. Writes
//! go to a sibling temp file which is synced and then renamed over the
//! target, so readers never see a half-written file even if two processes
//! save at the same moment.
//!
//! Output is pretty-printed with a 4-space indent and sorted keys so that
//! diffs between saves stay small.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::document::{Document, DocumentError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid document {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// File-backed document store
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, recovering from a missing or unreadable file
    ///
    /// A missing file yields a fresh document. A malformed one is logged,
    /// copied to `<file>.bak` and replaced by a fresh document; the original
    /// stays on disk until the next save.
    pub fn load(&self) -> Document {
        match self.load_strict() {
            Ok(doc) => doc,
            Err(StoreError::NotFound(path)) => {
                debug!(path = %path.display(), "No document yet, starting empty");
                Document::new()
            }
            Err(e) => {
                let backup = self.backup_path();
                match fs::copy(&self.path, &backup) {
                    Ok(_) => warn!(
                        error = %e,
                        backup = %backup.display(),
                        "Could not load document, starting with an empty one"
                    ),
                    Err(copy_err) => warn!(
                        error = %e,
                        backup_error = %copy_err,
                        "Could not load document or back it up, starting with an empty one"
                    ),
                }
                Document::new()
            }
        }
    }

    /// Where `load` copies a document it could not read
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "document.json".into());
        name.push(".bak");
        self.path.with_file_name(name)
    }

    /// Load the document, failing on any problem
    pub fn load_strict(&self) -> Result<Document, StoreError> {
        read_document(&self.path)
    }

    /// Stamp today's date and write the full document
    pub fn save(&self, doc: &mut Document) -> Result<(), StoreError> {
        doc.touch(chrono::Local::now().date_naive());
        write_document(&self.path, doc)
    }

    /// Write the full document as-is, without touching `lastUpdate`
    pub fn write(&self, doc: &Document) -> Result<(), StoreError> {
        write_document(&self.path, doc)
    }
}

/// Read and validate a document file
pub fn read_document(path: &Path) -> Result<Document, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let doc = Document::from_value(value).map_err(|source| StoreError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), drugs = doc.drug_count(), "Loaded document");
    Ok(doc)
}

/// Serialize with sorted keys and a 4-space indent
pub fn to_pretty_json(doc: &Document) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.to_value()?.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write atomically using temp file + rename
fn write_document(path: &Path, doc: &Document) -> Result<(), StoreError> {
    let io_err = |p: &Path| {
        let p = p.to_path_buf();
        move |source: io::Error| StoreError::Io { path: p, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let temp_path = temp_path_for(path);
    let content = to_pretty_json(doc).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut file = File::create(&temp_path).map_err(io_err(&temp_path))?;
    file.write_all(content.as_bytes()).map_err(io_err(&temp_path))?;
    file.sync_all().map_err(io_err(&temp_path))?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        });
    }

    debug!(path = %path.display(), drugs = doc.drug_count(), "Saved document");
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "document.json".into());
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
