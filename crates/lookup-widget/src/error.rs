#![forbid(unsafe_code)]

//! Error types.
//!
//! Fetch failures are absorbed by the sequencer and turned into widget state;
//! they never propagate out of [`crate::LookupWidget`]. Configuration errors
//! are returned eagerly from [`crate::LookupOptions::validate`].

use std::fmt;

/// Why a fetch did not produce a usable result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The host fetch function returned an error.
    Rejected,
    /// The fetch returned data that breaks the result contract
    /// (duplicate identifiers).
    ContractViolation,
    /// The fetch worker panicked.
    Panicked,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rejected => "rejected",
            Self::ContractViolation => "contract violation",
            Self::Panicked => "panicked",
        };
        f.write_str(name)
    }
}

/// A failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    /// The host fetch rejected with `message`.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Rejected,
            message: message.into(),
        }
    }

    /// Wrap any displayable host error as a rejection.
    pub fn from_display(err: impl fmt::Display) -> Self {
        Self::rejected(err.to_string())
    }

    /// The returned results violate the result contract.
    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::ContractViolation,
            message: message.into(),
        }
    }

    /// The fetch worker panicked with `message`.
    pub fn panicked(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Panicked,
            message: message.into(),
        }
    }

    /// Error classification.
    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    /// Human-readable detail from the source.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch {}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

impl From<ResultSetError> for FetchError {
    fn from(err: ResultSetError) -> Self {
        Self::contract_violation(err.to_string())
    }
}

/// A result list that cannot be displayed as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSetError {
    /// Two results share an identifier.
    DuplicateId {
        /// Debug rendering of the repeated identifier.
        id: String,
        /// Index of the first occurrence.
        first: usize,
        /// Index of the repeat.
        second: usize,
    },
}

impl fmt::Display for ResultSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id, first, second } => {
                write!(f, "duplicate result id {id} at rows {first} and {second}")
            }
        }
    }
}

impl std::error::Error for ResultSetError {}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Option name.
    pub field: &'static str,
    /// Offending value as given.
    pub value: String,
    /// What was expected.
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(
        field: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_includes_kind() {
        let err = FetchError::rejected("503 from upstream");
        assert_eq!(err.kind(), FetchErrorKind::Rejected);
        assert_eq!(err.to_string(), "fetch rejected: 503 from upstream");
    }

    #[test]
    fn duplicate_id_becomes_contract_violation() {
        let err: FetchError = ResultSetError::DuplicateId {
            id: "\"7\"".into(),
            first: 0,
            second: 2,
        }
        .into();
        assert_eq!(err.kind(), FetchErrorKind::ContractViolation);
        assert!(err.message().contains("rows 0 and 2"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::new("min_query_length", "-1", "must be >= 0");
        assert_eq!(err.to_string(), "min_query_length=-1 (must be >= 0)");
    }
}
