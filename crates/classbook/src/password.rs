//! Password entry without echo
//!
//! Only used when stdin is a terminal. Scripted input goes through the
//! shell's ordinary line reader instead.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// What a single key press does to a password being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyOutcome {
    Continue,
    Submit,
    Abort,
}

pub(crate) fn apply_key(buffer: &mut String, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Continue;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
    {
        return KeyOutcome::Abort;
    }
    match key.code {
        KeyCode::Enter => KeyOutcome::Submit,
        KeyCode::Backspace => {
            buffer.pop();
            KeyOutcome::Continue
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Read a password from the terminal with echo off.
///
/// Returns `None` if the user aborts with Ctrl+C or Ctrl+D.
pub(crate) fn read_masked_password() -> Result<Option<String>> {
    let _raw = RawModeGuard::enable()?;
    let mut buffer = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match apply_key(&mut buffer, key) {
            KeyOutcome::Continue => {}
            KeyOutcome::Submit => return Ok(Some(buffer)),
            KeyOutcome::Abort => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_keys(keys: &[KeyEvent]) -> (String, KeyOutcome) {
        let mut buffer = String::new();
        let mut outcome = KeyOutcome::Continue;
        for key in keys {
            outcome = apply_key(&mut buffer, *key);
            if outcome != KeyOutcome::Continue {
                break;
            }
        }
        (buffer, outcome)
    }

    #[test]
    fn enter_submits_typed_characters() {
        let (buffer, outcome) = type_keys(&[
            press(KeyCode::Char('2')),
            press(KeyCode::Char('2')),
            press(KeyCode::Char('2')),
            press(KeyCode::Enter),
        ]);
        assert_eq!(outcome, KeyOutcome::Submit);
        assert_eq!(buffer, "222");
    }

    #[test]
    fn backspace_removes_last_character() {
        let (buffer, _) = type_keys(&[
            press(KeyCode::Char('a')),
            press(KeyCode::Char('b')),
            press(KeyCode::Backspace),
            press(KeyCode::Backspace),
            press(KeyCode::Backspace),
            press(KeyCode::Char('c')),
            press(KeyCode::Enter),
        ]);
        assert_eq!(buffer, "c");
    }

    #[test]
    fn ctrl_c_aborts() {
        let (_, outcome) = type_keys(&[
            press(KeyCode::Char('x')),
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            press(KeyCode::Enter),
        ]);
        assert_eq!(outcome, KeyOutcome::Abort);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut buffer = String::new();
        let release = KeyEvent::new_with_kind(
            KeyCode::Char('z'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(apply_key(&mut buffer, release), KeyOutcome::Continue);
        assert!(buffer.is_empty());
    }
}
