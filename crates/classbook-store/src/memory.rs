//! In-memory backend (for testing)

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{Ledger, LedgerBackend, StoreError, StoreResult, parse_ledger};

/// Keeps the serialized ledger in memory.
///
/// Clones share the same storage, so a test can keep a handle after handing
/// one to a [`crate::LedgerStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    contents: Rc<RefCell<Option<String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw stored content, which need not be valid
    pub fn with_contents(content: impl Into<String>) -> Self {
        let backend = Self::new();
        *backend.contents.borrow_mut() = Some(content.into());
        backend
    }

    /// Make subsequent saves fail with an IO error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Raw stored content
    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl LedgerBackend for MemoryBackend {
    fn load(&self) -> StoreResult<Option<Ledger>> {
        match self.contents.borrow().as_deref() {
            None => Ok(None),
            Some(content) => parse_ledger(content)
                .map(Some)
                .map_err(|e| StoreError::CorruptStore(e.to_string())),
        }
    }

    fn save(&self, ledger: &Ledger) -> StoreResult<()> {
        if self.fail_writes.get() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "writes disabled",
            )));
        }
        *self.contents.borrow_mut() = Some(serde_json::to_string_pretty(ledger)?);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
