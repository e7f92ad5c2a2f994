//! JSON file backend

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{Ledger, LedgerBackend, StoreError, StoreResult};

/// Ledger stored as one pretty-printed UTF-8 JSON file
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl LedgerBackend for JsonFileBackend {
    fn load(&self) -> StoreResult<Option<Ledger>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No ledger file yet");
            return Ok(None);
        }

        // Invalid UTF-8 surfaces as a parse error, not an IO error
        let bytes = std::fs::read(&self.path)?;
        let ledger = serde_json::from_slice::<Ledger>(&bytes)
            .map_err(|e| StoreError::CorruptStore(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(ledger))
    }

    fn save(&self, ledger: &Ledger) -> StoreResult<()> {
        let mut bytes = serde_json::to_vec_pretty(ledger)?;
        bytes.push(b'\n');

        let parent = self.parent_dir();
        std::fs::create_dir_all(parent)?;

        // Temp file in the same directory so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Ledger saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse ledger JSON. Missing top-level maps default to empty.
pub fn parse_ledger(content: &str) -> Result<Ledger, serde_json::Error> {
    serde_json::from_str(content)
}
