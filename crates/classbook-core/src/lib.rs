//! Core of classbook
//!
//! Sits between the interaction shell and the ledger store:
//! - Authentication against the static user directory
//! - Role checks for every mutation
//! - Parsing of menu choices, grades and review decisions
//! - Read-only views the shell renders

mod classbook;
mod error;
mod selection;
mod views;

pub use classbook::*;
pub use error::*;
pub use selection::*;
pub use views::*;
