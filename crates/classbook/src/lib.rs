//! Interaction shell for classbook
//!
//! The shell is generic over its input and output so it can run against a
//! terminal or against scripted input in tests.

mod password;
mod shell;

pub use shell::*;
