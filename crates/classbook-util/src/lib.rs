//! Shared utilities for classbook
//!
//! This crate provides:
//! - ID types (SubjectName, SessionId, UserId, DocumentId)
//! - Session timestamp parsing and formatting
//! - Default paths for the config file and the ledger

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
