#![forbid(unsafe_code)]

//! Widget configuration.
//!
//! [`LookupOptions`] is the host-facing record: it can be built in code,
//! read from the environment, or (with the `serde` feature) deserialized
//! from a config file. [`LookupOptions::validate`] turns it into a
//! [`LookupConfig`], rejecting invalid values up front instead of letting
//! the widget misbehave later.
//!
//! # Environment Variables
//!
//! | Variable | Option |
//! |----------|--------|
//! | `LOOKUP_MIN_QUERY_LENGTH` | `min_query_length` |
//! | `LOOKUP_DISABLED` | `disabled` (`1/0/true/false/yes/no/on/off`) |
//! | `LOOKUP_INITIAL_VALUE` | `initial_value` |
//! | `LOOKUP_EMPTY_MESSAGE` | `empty_state_message` |
//! | `LOOKUP_ERROR_MESSAGE` | `error_message` |
//! | `LOOKUP_CACHE_CAPACITY` | `cache_capacity` |

use std::env;

use crate::error::ConfigError;

/// Default minimum query length before fetching.
pub const DEFAULT_MIN_QUERY_LENGTH: usize = 3;
/// Default number of cached queries.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
/// Default message for a settled, empty result set.
pub const DEFAULT_EMPTY_MESSAGE: &str = "No results";
/// Default message for a failed fetch.
pub const DEFAULT_ERROR_MESSAGE: &str = "Could not load results";

const ENV_MIN_QUERY_LENGTH: &str = "LOOKUP_MIN_QUERY_LENGTH";
const ENV_DISABLED: &str = "LOOKUP_DISABLED";
const ENV_INITIAL_VALUE: &str = "LOOKUP_INITIAL_VALUE";
const ENV_EMPTY_MESSAGE: &str = "LOOKUP_EMPTY_MESSAGE";
const ENV_ERROR_MESSAGE: &str = "LOOKUP_ERROR_MESSAGE";
const ENV_CACHE_CAPACITY: &str = "LOOKUP_CACHE_CAPACITY";

/// Unvalidated widget options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LookupOptions {
    /// Minimum query length (in graphemes) before the dropdown opens and
    /// a fetch is issued. Must be `>= 0`.
    pub min_query_length: i64,
    /// Suppress all opening and fetching.
    pub disabled: bool,
    /// Query text at mount.
    pub initial_value: String,
    /// Shown when a fetch settles with zero results.
    pub empty_state_message: String,
    /// Shown when a fetch fails.
    pub error_message: String,
    /// Number of queries kept in the result cache. Must be `> 0`.
    pub cache_capacity: usize,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            min_query_length: DEFAULT_MIN_QUERY_LENGTH as i64,
            disabled: false,
            initial_value: String::new(),
            empty_state_message: DEFAULT_EMPTY_MESSAGE.to_owned(),
            error_message: DEFAULT_ERROR_MESSAGE.to_owned(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Options parsed from the environment, with any parse diagnostics.
#[derive(Debug, Clone)]
pub struct OptionsParse {
    /// Parsed options; unparsable variables keep their defaults.
    pub options: LookupOptions,
    /// One entry per variable that failed to parse.
    pub errors: Vec<ConfigError>,
}

impl LookupOptions {
    /// Read options from `LOOKUP_*` environment variables.
    #[must_use]
    pub fn from_env() -> OptionsParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Read options through `get`, which maps a variable name to its value.
    pub fn from_env_with<F>(mut get: F) -> OptionsParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut options = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_MIN_QUERY_LENGTH) {
            match value.trim().parse::<i64>() {
                Ok(parsed) => options.min_query_length = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "min_query_length",
                    value,
                    "expected integer",
                )),
            }
        }

        if let Some(value) = get(ENV_DISABLED) {
            match parse_bool(&value) {
                Some(parsed) => options.disabled = parsed,
                None => errors.push(ConfigError::new(
                    "disabled",
                    value,
                    "expected bool (1/0/true/false)",
                )),
            }
        }

        if let Some(value) = get(ENV_INITIAL_VALUE) {
            options.initial_value = value;
        }
        if let Some(value) = get(ENV_EMPTY_MESSAGE) {
            options.empty_state_message = value;
        }
        if let Some(value) = get(ENV_ERROR_MESSAGE) {
            options.error_message = value;
        }

        if let Some(value) = get(ENV_CACHE_CAPACITY) {
            match value.trim().parse::<usize>() {
                Ok(parsed) => options.cache_capacity = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "cache_capacity",
                    value,
                    "expected positive integer",
                )),
            }
        }

        OptionsParse { options, errors }
    }

    /// Check every constraint, returning all violations at once.
    pub fn validate(&self) -> Result<LookupConfig, Vec<ConfigError>> {
        let mut errors = Vec::new();

        let min_query_length = match usize::try_from(self.min_query_length) {
            Ok(len) => len,
            Err(_) => {
                errors.push(ConfigError::new(
                    "min_query_length",
                    self.min_query_length.to_string(),
                    "must be >= 0",
                ));
                0
            }
        };
        if self.cache_capacity == 0 {
            errors.push(ConfigError::new("cache_capacity", "0", "must be > 0"));
        }

        if !errors.is_empty() {
            #[cfg(feature = "tracing")]
            for error in &errors {
                lookup_core::warn!(%error, "lookup configuration rejected");
            }
            return Err(errors);
        }

        Ok(LookupConfig {
            min_query_length,
            disabled: self.disabled,
            initial_value: self.initial_value.clone(),
            empty_state_message: self.empty_state_message.clone(),
            error_message: self.error_message.clone(),
            cache_capacity: self.cache_capacity,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validated widget configuration.
///
/// Built from [`LookupOptions::validate`] or [`LookupConfig::default`] plus
/// the builders below, none of which can express an invalid value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    min_query_length: usize,
    disabled: bool,
    initial_value: String,
    empty_state_message: String,
    error_message: String,
    cache_capacity: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
            disabled: false,
            initial_value: String::new(),
            empty_state_message: DEFAULT_EMPTY_MESSAGE.to_owned(),
            error_message: DEFAULT_ERROR_MESSAGE.to_owned(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl LookupConfig {
    /// Set the minimum query length (builder).
    #[must_use]
    pub fn with_min_query_length(mut self, len: usize) -> Self {
        self.min_query_length = len;
        self
    }

    /// Set the disabled flag (builder).
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set the initial query (builder).
    #[must_use]
    pub fn with_initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = value.into();
        self
    }

    /// Set the empty-state message (builder).
    #[must_use]
    pub fn with_empty_state_message(mut self, message: impl Into<String>) -> Self {
        self.empty_state_message = message.into();
        self
    }

    /// Set the error message (builder).
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Set the cache capacity (builder). Zero is raised to one.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// Minimum query length before fetching.
    pub fn min_query_length(&self) -> usize {
        self.min_query_length
    }

    /// Whether the widget starts disabled.
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Query text at mount.
    pub fn initial_value(&self) -> &str {
        &self.initial_value
    }

    /// Empty-state message.
    pub fn empty_state_message(&self) -> &str {
        &self.empty_state_message
    }

    /// Error message.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Result cache capacity.
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}
