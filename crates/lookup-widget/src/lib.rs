#![forbid(unsafe_code)]

//! Typeahead lookup state: query sequencing, result caching, visibility,
//! keyboard navigation, and outside-press dismissal.
//!
//! The crate is host-agnostic. [`LookupWidget`] hands out [`FetchTicket`]s
//! instead of running fetches, and exposes its state as a [`Snapshot`] for
//! whatever renderer the host uses.

pub mod cache;
pub mod config;
pub mod dismissal;
pub mod error;
pub mod item;
pub mod navigator;
pub mod sequencer;
pub mod snapshot;
pub mod visibility;
pub mod widget;

pub use cache::{CacheEntry, CacheStats, EntryStatus, ResultCache};
pub use config::{LookupConfig, LookupOptions, OptionsParse};
pub use dismissal::{DismissalWatcher, PointerHub};
pub use error::{ConfigError, FetchError, FetchErrorKind, ResultSetError};
pub use item::{Candidate, LookupItem, ResultSet, ResultSetId};
pub use navigator::{NavOutcome, navigate};
pub use sequencer::{Completion, FetchTicket, Issue, QuerySequencer, SequencerStats};
pub use snapshot::{ObserverId, Snapshot};
pub use visibility::{Visibility, VisibilityEvent, VisibilityInputs};
pub use widget::{LookupAction, LookupWidget};
