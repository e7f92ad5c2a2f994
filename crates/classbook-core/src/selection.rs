//! Menu choices and small input parsers
//!
//! Lists are shown 1-based with `0` meaning "back". When adding is allowed,
//! one extra item after the list creates a new entry.

use classbook_store::ReviewDecision;

use crate::InputError;

/// What the operator typed at a list prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Back,
    /// Zero-based index into the list
    Pick(usize),
    AddNew,
}

/// Result of a choose-or-create exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    Selected(T),
    CreatedNew(T),
    Cancelled,
}

impl<T> Selection<T> {
    /// The chosen value, whether it existed before or not
    pub fn into_option(self) -> Option<T> {
        match self {
            Selection::Selected(value) | Selection::CreatedNew(value) => Some(value),
            Selection::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Selection::Cancelled)
    }
}

/// Parse a list prompt answer for a list of `len` items
pub fn parse_choice(input: &str, len: usize, allow_add: bool) -> Result<MenuChoice, InputError> {
    let input = input.trim();
    let number: usize = input
        .parse()
        .map_err(|_| InputError::InvalidSelection(input.to_string()))?;

    match number {
        0 => Ok(MenuChoice::Back),
        n if n <= len => Ok(MenuChoice::Pick(n - 1)),
        n if allow_add && n == len + 1 => Ok(MenuChoice::AddNew),
        _ => Err(InputError::InvalidSelection(input.to_string())),
    }
}

/// Parse a grade entry. Empty input clears the grade.
pub fn parse_grade(input: &str) -> Result<Option<i64>, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse()
        .map(Some)
        .map_err(|_| InputError::InvalidGradeFormat(input.to_string()))
}

/// `a` approves, `r` rejects, anything else skips
pub fn parse_review(input: &str) -> Option<ReviewDecision> {
    match input.trim() {
        "a" | "A" => Some(ReviewDecision::Approve),
        "r" | "R" => Some(ReviewDecision::Reject),
        _ => None,
    }
}
