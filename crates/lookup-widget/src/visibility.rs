#![forbid(unsafe_code)]

//! Dropdown visibility state machine.
//!
//! ```text
//!            query >= min && enabled
//!   Closed ───────────────────────────▶ Open
//!     ▲                                   │
//!     └─── query < min | dismiss | select | disabled
//! ```
//!
//! There is no terminal state; the widget can reopen indefinitely.

/// Whether the dropdown is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Dropdown hidden.
    #[default]
    Closed,
    /// Dropdown shown.
    Open,
}

/// Something that may change visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityEvent {
    /// The query text changed (or opening is being re-evaluated, e.g. on
    /// focus gain).
    QueryChanged,
    /// Escape, outside click, or focus loss.
    Dismissed,
    /// A result was committed.
    Selected,
    /// The disabled flag changed to the contained value.
    DisabledChanged(bool),
}

/// Inputs the transition depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityInputs {
    /// Current query length in graphemes.
    pub query_len: usize,
    /// Minimum length before the dropdown may open.
    pub min_query_length: usize,
    /// Whether the widget is disabled.
    pub disabled: bool,
}

impl VisibilityInputs {
    /// Whether the query and disabled flag allow the dropdown to be open.
    #[inline]
    pub const fn allows_open(&self) -> bool {
        !self.disabled && self.query_len >= self.min_query_length
    }
}

impl Visibility {
    /// Whether the dropdown is shown.
    #[inline]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Next state after `event`.
    #[must_use]
    pub fn transition(self, event: VisibilityEvent, inputs: VisibilityInputs) -> Self {
        match event {
            VisibilityEvent::Dismissed
            | VisibilityEvent::Selected
            | VisibilityEvent::DisabledChanged(true) => Self::Closed,
            VisibilityEvent::QueryChanged | VisibilityEvent::DisabledChanged(false) => {
                if inputs.allows_open() {
                    Self::Open
                } else {
                    Self::Closed
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(query_len: usize) -> VisibilityInputs {
        VisibilityInputs {
            query_len,
            min_query_length: 3,
            disabled: false,
        }
    }

    #[test]
    fn starts_closed() {
        assert_eq!(Visibility::default(), Visibility::Closed);
    }

    #[test]
    fn opens_at_threshold() {
        let v = Visibility::Closed;
        assert_eq!(
            v.transition(VisibilityEvent::QueryChanged, inputs(2)),
            Visibility::Closed
        );
        assert_eq!(
            v.transition(VisibilityEvent::QueryChanged, inputs(3)),
            Visibility::Open
        );
    }

    #[test]
    fn closes_below_threshold() {
        assert_eq!(
            Visibility::Open.transition(VisibilityEvent::QueryChanged, inputs(2)),
            Visibility::Closed
        );
    }

    #[test]
    fn dismiss_and_select_close() {
        for event in [VisibilityEvent::Dismissed, VisibilityEvent::Selected] {
            assert_eq!(
                Visibility::Open.transition(event, inputs(10)),
                Visibility::Closed
            );
        }
    }

    #[test]
    fn disabled_forces_closed() {
        let disabled = VisibilityInputs {
            disabled: true,
            ..inputs(10)
        };
        assert_eq!(
            Visibility::Open.transition(VisibilityEvent::DisabledChanged(true), disabled),
            Visibility::Closed
        );
        assert_eq!(
            Visibility::Closed.transition(VisibilityEvent::QueryChanged, disabled),
            Visibility::Closed
        );
    }

    #[test]
    fn reenable_reevaluates() {
        assert_eq!(
            Visibility::Closed.transition(VisibilityEvent::DisabledChanged(false), inputs(5)),
            Visibility::Open
        );
        assert_eq!(
            Visibility::Closed.transition(VisibilityEvent::DisabledChanged(false), inputs(1)),
            Visibility::Closed
        );
    }

    #[test]
    fn zero_threshold_opens_on_empty_query() {
        let zero = VisibilityInputs {
            query_len: 0,
            min_query_length: 0,
            disabled: false,
        };
        assert_eq!(
            Visibility::Closed.transition(VisibilityEvent::QueryChanged, zero),
            Visibility::Open
        );
    }
}
