#![forbid(unsafe_code)]

//! Lookup public facade crate.
//!
//! Re-exports the widget, its configuration, and (with the default
//! `runtime` feature) the threaded driver, plus a prelude for day-to-day
//! use.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use lookup_core::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind,
    PasteEvent,
};
pub use lookup_core::geometry::Rect;

// --- Widget re-exports -----------------------------------------------------

pub use lookup_widget::{
    Candidate, ConfigError, FetchError, FetchErrorKind, FetchTicket, LookupAction, LookupConfig,
    LookupItem, LookupOptions, LookupWidget, PointerHub, ResultSet, Snapshot,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use lookup_runtime::{Fetcher, LookupDriver};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for lookup hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One or more configuration values were rejected.
    Config(Vec<ConfigError>),
    /// A fetch failed.
    Fetch(FetchError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(errors) => {
                f.write_str("invalid lookup configuration: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            Self::Fetch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(errors) if errors.len() == 1 => Some(&errors[0]),
            Self::Config(_) => None,
            Self::Fetch(err) => Some(err),
        }
    }
}

impl From<Vec<ConfigError>> for Error {
    fn from(errors: Vec<ConfigError>) -> Self {
        Self::Config(errors)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(vec![err])
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

/// Standard result type for lookup APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Build a widget from `LOOKUP_*` environment variables.
///
/// Unparseable variables and invalid values are both reported.
pub fn widget_from_env<R: LookupItem>() -> Result<LookupWidget<R>> {
    let parsed = LookupOptions::from_env();
    if !parsed.errors.is_empty() {
        return Err(Error::Config(parsed.errors));
    }
    Ok(LookupWidget::from_options(&parsed.options)?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Candidate, Error, Event, FetchError, KeyCode, KeyEvent, LookupAction, LookupConfig,
        LookupItem, LookupOptions, LookupWidget, PointerHub, Rect, Result, Snapshot,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{Fetcher, LookupDriver};

    pub use crate::{core, widget};
    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use lookup_core as core;
#[cfg(feature = "runtime")]
pub use lookup_runtime as runtime;
pub use lookup_widget as widget;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_join_in_display() {
        let options = LookupOptions {
            min_query_length: -2,
            cache_capacity: 0,
            ..LookupOptions::default()
        };
        let err: Error = LookupWidget::<Candidate>::from_options(&options)
            .unwrap_err()
            .into();
        let text = err.to_string();
        assert!(text.starts_with("invalid lookup configuration: "), "{text}");
        assert!(text.contains("min_query_length"), "{text}");
        assert!(text.contains("; "), "{text}");
    }

    #[test]
    fn fetch_error_is_the_source() {
        let err = Error::from(FetchError::rejected("down"));
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "fetch rejected: down");
    }

    #[test]
    fn prelude_covers_a_basic_host() {
        use crate::prelude::*;

        let mut widget: LookupWidget<Candidate> = LookupWidget::new(LookupConfig::default());
        let ticket = widget.on_query_edit("acm").expect("fetch");
        widget.on_fetch_complete(ticket, Ok(vec![Candidate::new("7", "Acme Corp")]));
        assert_eq!(widget.snapshot().labels(), vec!["Acme Corp"]);
    }
}
