//! Validated configuration: ledger location and the static user directory

use crate::schema::{RawConfig, RawRole, RawUser};
use classbook_util::{UserId, default_ledger_path};
use std::fmt;
use std::path::{Path, PathBuf};

/// Validated configuration ready for use by the application
#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the ledger file
    pub ledger_path: PathBuf,

    /// Users allowed to log in
    pub directory: UserDirectory,
}

impl Config {
    /// Convert from raw config (after validation).
    ///
    /// A relative ledger path is resolved against `base_dir` when given.
    pub fn from_raw(raw: RawConfig, base_dir: Option<&Path>) -> Self {
        let ledger_path = match raw.ledger.path {
            Some(path) if path.is_relative() => match base_dir {
                Some(base) => base.join(path),
                None => path,
            },
            Some(path) => path,
            None => default_ledger_path(),
        };

        Self {
            ledger_path,
            directory: UserDirectory::from_raw(raw.users),
        }
    }
}

/// Role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    /// Whether this role may create subjects and sessions while navigating
    pub fn can_add(&self) -> bool {
        matches!(self, Role::Teacher)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

impl From<RawRole> for Role {
    fn from(raw: RawRole) -> Self {
        match raw {
            RawRole::Teacher => Role::Teacher,
            RawRole::Student => Role::Student,
        }
    }
}

/// A configured user
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub role: Role,
    password: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, password: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            password: password.into(),
        }
    }
}

/// Static login directory, in configuration order
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    fn from_raw(raw: Vec<RawUser>) -> Self {
        Self::new(
            raw.into_iter()
                .map(|u| User::new(u.login, u.password, u.role.into()))
                .collect(),
        )
    }

    /// Check a login/password pair. Plaintext comparison.
    pub fn authenticate(&self, login: &str, password: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.id.as_str() == login && u.password == password)
    }

    pub fn get(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// All student ids, in configuration order
    pub fn students(&self) -> Vec<UserId> {
        self.users
            .iter()
            .filter(|u| u.role == Role::Student)
            .map(|u| u.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
