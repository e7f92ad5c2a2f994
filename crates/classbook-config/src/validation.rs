//! Configuration validation

use crate::schema::{RawConfig, RawUser};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("User '{login}': {message}")]
    UserError { login: String, message: String },

    #[error("Duplicate login: {0}")]
    DuplicateLogin(String),

    #[error("No users configured")]
    NoUsers,

    #[error("Ledger config error: {0}")]
    LedgerError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.users.is_empty() {
        errors.push(ValidationError::NoUsers);
    }

    // Check for duplicate logins
    let mut seen = HashSet::new();
    for user in &config.users {
        if !seen.insert(&user.login) {
            errors.push(ValidationError::DuplicateLogin(user.login.clone()));
        }
    }

    for user in &config.users {
        errors.extend(validate_user(user));
    }

    if let Some(path) = &config.ledger.path
        && path.as_os_str().is_empty()
    {
        errors.push(ValidationError::LedgerError(
            "path cannot be empty".into(),
        ));
    }

    errors
}

fn validate_user(user: &RawUser) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if user.login.trim().is_empty() {
        errors.push(ValidationError::UserError {
            login: user.login.clone(),
            message: "login cannot be empty".into(),
        });
    } else if user.login.trim() != user.login {
        errors.push(ValidationError::UserError {
            login: user.login.clone(),
            message: "login cannot have surrounding whitespace".into(),
        });
    }

    if user.password.is_empty() {
        errors.push(ValidationError::UserError {
            login: user.login.clone(),
            message: "password cannot be empty".into(),
        });
    }

    errors
}
