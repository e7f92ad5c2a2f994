//! Persistence layer for classbook
//!
//! Provides:
//! - The ledger model (subjects, sessions, attendance, grades, documents)
//! - Normalization of loaded ledgers
//! - JSON file and in-memory backends
//! - [`LedgerStore`], which persists after every mutation

mod json;
mod memory;
mod model;
mod store;
mod traits;

pub use json::*;
pub use memory::*;
pub use model::*;
pub use store::*;
pub use traits::*;

use classbook_util::{DocumentId, InvalidDateFormat, SessionId, SubjectName};
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Corrupt ledger: {0}")]
    CorruptStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    InvalidDateFormat(#[from] InvalidDateFormat),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document {document} was already reviewed ({status})")]
    InvalidTransition {
        document: DocumentId,
        status: DocumentStatus,
    },

    #[error("Session already exists: {0}")]
    DuplicateSession(SessionId),

    #[error("Name cannot be empty")]
    EmptyName,
}

impl StoreError {
    pub fn subject_not_found(subject: &SubjectName) -> Self {
        Self::NotFound(format!("subject '{}'", subject))
    }

    pub fn session_not_found(subject: &SubjectName, session: &SessionId) -> Self {
        Self::NotFound(format!("session '{}' of subject '{}'", session, subject))
    }

    /// Whether the process cannot sensibly continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::CorruptStore(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
