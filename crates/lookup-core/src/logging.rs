#![forbid(unsafe_code)]

//! Diagnostics macros shared by the lookup crates.
//!
//! `lookup_core::debug!` and friends forward to `tracing` when the
//! `tracing` feature is on. When it is off they accept the same arguments
//! and compile to nothing, and `debug_span!` yields a `NoopSpan`.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, warn};

#[cfg(not(feature = "tracing"))]
mod disabled {
    #[macro_export]
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! warn {
        ($($tt:tt)*) => {};
    }

    /// Expands to a [`NoopSpan`](crate::logging::NoopSpan).
    #[macro_export]
    macro_rules! debug_span {
        ($($tt:tt)*) => {
            $crate::logging::NoopSpan
        };
    }
}

/// Span placeholder used when diagnostics are compiled out.
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Clone, Copy)]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Same shape as `tracing::Span::entered`, so call sites do not change.
    #[must_use]
    pub fn entered(self) -> NoopGuard {
        NoopGuard
    }
}

#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoopGuard;
