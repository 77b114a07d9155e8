#![forbid(unsafe_code)]

//! Keyboard navigation over the visible rows.
//!
//! [`navigate`] is a pure function of the current highlight, the row count,
//! whether the dropdown is open, and the key. The highlight is an
//! `Option<usize>`: `None` means no row is highlighted.
//!
//! # Invariants
//!
//! 1. A returned index is always `< len`.
//! 2. No wraparound: `Down` on the last row and `Up` with nothing
//!    highlighted leave the highlight where it is.
//! 3. Every key, Escape included, is ignored while closed or while there
//!    are no rows.
//! 4. Key releases are ignored.

use lookup_core::event::{KeyCode, KeyEvent};

/// What a key does to the dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavOutcome {
    /// The highlight moved (possibly to nothing).
    Moved(Option<usize>),
    /// Commit the row at this index.
    Commit(usize),
    /// Close the dropdown and clear the highlight.
    Close,
    /// Nothing happens.
    Ignored,
}

/// Compute the effect of `key`.
pub fn navigate(current: Option<usize>, len: usize, is_open: bool, key: &KeyEvent) -> NavOutcome {
    if !is_open || len == 0 || !key.is_press() {
        return NavOutcome::Ignored;
    }
    let current = current.filter(|&i| i < len);
    let last = len - 1;

    match key.code {
        KeyCode::Down => NavOutcome::Moved(Some(current.map_or(0, |i| (i + 1).min(last)))),
        KeyCode::Up => NavOutcome::Moved(current.and_then(|i| i.checked_sub(1))),
        KeyCode::Home => NavOutcome::Moved(Some(0)),
        KeyCode::End => NavOutcome::Moved(Some(last)),
        KeyCode::Escape => NavOutcome::Close,
        KeyCode::Enter => match current {
            Some(i) => NavOutcome::Commit(i),
            None => NavOutcome::Ignored,
        },
        _ => NavOutcome::Ignored,
    }
}
