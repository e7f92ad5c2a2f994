//! Error types for classbook-core

use classbook_store::StoreError;
use classbook_util::UserId;
use thiserror::Error;

/// Operator input that could not be understood. The shell reprompts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid grade format: {0}")]
    InvalidGradeFormat(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unknown student: {0}")]
    UnknownStudent(UserId),
}

impl CoreError {
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Whether the shell should stop instead of reporting and carrying on
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::Store(e) if e.is_fatal())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
