#![forbid(unsafe_code)]

//! The lookup widget orchestrator.
//!
//! [`LookupWidget`] owns the query text and navigation state and composes the
//! sequencer, visibility controller, navigator, and dismissal watcher into
//! the public contract. It never runs a fetch itself: operations that need
//! one return a [`FetchTicket`], and the host reports the outcome through
//! [`LookupWidget::on_fetch_complete`] on a later turn of its event loop.
//!
//! # Usage
//!
//! ```ignore
//! let mut widget = LookupWidget::new(LookupConfig::default())
//!     .with_on_select(|company: &Company| println!("picked {}", company.name));
//!
//! if let Some(ticket) = widget.on_query_edit("acm") {
//!     spawn_fetch(ticket); // later: widget.on_fetch_complete(ticket, outcome)
//! }
//! let snapshot = widget.snapshot();
//! ```
//!
//! # Invariants
//!
//! 1. `active_index` is `None` or `< results.len()`.
//! 2. `active_index` resets whenever the visible result set or visibility
//!    changes.
//! 3. Only the outcome of the most recently issued fetch reaches the
//!    snapshot.
//! 4. While disabled the dropdown is closed and nothing is fetched.

use std::fmt;

use lookup_core::event::{Event, KeyCode, KeyEvent, Modifiers};
use lookup_core::geometry::Rect;
use unicode_segmentation::UnicodeSegmentation;

use crate::cache::{CacheEntry, CacheStats, EntryStatus};
use crate::config::{LookupConfig, LookupOptions};
use crate::dismissal::{DismissalWatcher, PointerHub};
use crate::error::{ConfigError, FetchError};
use crate::item::{LookupItem, ResultSet, ResultSetId};
use crate::navigator::{NavOutcome, navigate};
use crate::sequencer::{Completion, FetchTicket, Issue, QuerySequencer, SequencerStats};
use crate::snapshot::{ObserverId, Observers, Snapshot};
use crate::visibility::{Visibility, VisibilityEvent, VisibilityInputs};

/// Something the host must act on after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupAction<Id> {
    /// Run this fetch and report back with [`LookupWidget::on_fetch_complete`].
    Fetch(FetchTicket),
    /// A result was committed (the selection callback has already run).
    Committed(Id),
    /// The dropdown was dismissed.
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewStatus {
    Idle,
    Loading,
    Ready,
    Failed(FetchError),
}

#[derive(PartialEq, Eq)]
struct Fingerprint {
    query: String,
    visibility: Visibility,
    active: Option<usize>,
    status: ViewStatus,
    results: ResultSetId,
}

type SelectFn<R> = Box<dyn FnMut(&R)>;

/// Typeahead lookup state machine.
pub struct LookupWidget<R: LookupItem> {
    config: LookupConfig,
    query: String,
    visibility: Visibility,
    active: Option<usize>,
    sequencer: QuerySequencer<R>,
    status: ViewStatus,
    results: ResultSet<R>,
    in_flight: Option<FetchTicket>,
    on_select: Option<SelectFn<R>>,
    observers: Observers<R>,
    watcher: Option<DismissalWatcher>,
    revision: u64,
}

impl<R: LookupItem> LookupWidget<R> {
    /// Create a widget seeded with the configured initial value.
    ///
    /// The widget starts closed unless `min_query_length` is 0 and it is
    /// enabled, in which case it starts open with no rows. Nothing is fetched
    /// here: the host gets the first ticket from [`open`](Self::open) or the
    /// first edit.
    pub fn new(config: LookupConfig) -> Self {
        let visibility = if config.min_query_length() == 0 && !config.disabled() {
            Visibility::Open
        } else {
            Visibility::Closed
        };
        Self {
            query: config.initial_value().to_owned(),
            sequencer: QuerySequencer::new(config.cache_capacity()),
            config,
            visibility,
            active: None,
            status: ViewStatus::Idle,
            results: ResultSet::empty(),
            in_flight: None,
            on_select: None,
            observers: Observers::new(),
            watcher: None,
            revision: 0,
        }
    }

    /// Validate `options` and create a widget.
    pub fn from_options(options: &LookupOptions) -> Result<Self, Vec<ConfigError>> {
        Ok(Self::new(options.validate()?))
    }

    /// Set the selection callback (builder).
    #[must_use]
    pub fn with_on_select(mut self, on_select: impl FnMut(&R) + 'static) -> Self {
        self.set_on_select(on_select);
        self
    }

    /// Set the selection callback.
    pub fn set_on_select(&mut self, on_select: impl FnMut(&R) + 'static) {
        self.on_select = Some(Box::new(on_select));
    }

    // --- Accessors ---

    /// Current query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether the dropdown is shown.
    pub fn is_open(&self) -> bool {
        self.visibility.is_open()
    }

    /// Highlighted row.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Whether the widget is disabled.
    pub fn is_disabled(&self) -> bool {
        self.config.disabled()
    }

    /// Whether a fetch for the current query is outstanding.
    pub fn is_loading(&self) -> bool {
        self.status == ViewStatus::Loading
    }

    /// Failure of the latest fetch for the current query.
    pub fn last_error(&self) -> Option<&FetchError> {
        match &self.status {
            ViewStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Ticket of the outstanding fetch, if any.
    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    /// Active configuration.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Sequencer counters.
    pub fn sequencer_stats(&self) -> SequencerStats {
        self.sequencer.stats()
    }

    /// Result cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.sequencer.cache_stats()
    }

    /// Snapshot revision; increases on every visible change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Query edits and fetch completion ---

    /// The query text changed.
    ///
    /// Opens the dropdown and returns a ticket when the query reaches the
    /// minimum length and no cached result exists. Below the minimum the
    /// dropdown closes, results clear, and outstanding fetches go stale.
    pub fn on_query_edit(&mut self, text: impl Into<String>) -> Option<FetchTicket> {
        let text = text.into();
        let _span = lookup_core::debug_span!("lookup_query_edit", len = text.len()).entered();
        let before = self.fingerprint();
        self.query = text;
        let ticket = self.evaluate(VisibilityEvent::QueryChanged);
        self.finish(before);
        ticket
    }

    /// Deliver the outcome of a fetch.
    ///
    /// Returns `true` if the outcome was applied, `false` if it was stale.
    pub fn on_fetch_complete(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<Vec<R>, FetchError>,
    ) -> bool {
        let before = self.fingerprint();
        let applied = match self.sequencer.complete(ticket, outcome) {
            Completion::Accepted { query, entry } if query == self.query => {
                self.in_flight = None;
                self.apply_entry(entry);
                true
            }
            Completion::Accepted { .. } => {
                lookup_core::debug!(
                    current = self.query.as_str(),
                    "lookup result cached for a query no longer shown"
                );
                false
            }
            Completion::Stale { .. } => false,
        };
        self.finish(before);
        applied
    }

    /// Refetch the current query after a failure.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if !matches!(self.status, ViewStatus::Failed(_)) {
            return None;
        }
        let before = self.fingerprint();
        self.sequencer.invalidate(&self.query);
        self.active = None;
        let ticket = self.request();
        self.finish(before);
        ticket
    }

    // --- Visibility ---

    /// Re-evaluate opening (e.g. on focus gain) without changing the query.
    ///
    /// An open dropdown that has never fetched issues its first fetch here.
    pub fn open(&mut self) -> Option<FetchTicket> {
        if self.visibility.is_open() && self.status != ViewStatus::Idle {
            return None;
        }
        let before = self.fingerprint();
        let ticket = self.evaluate(VisibilityEvent::QueryChanged);
        self.finish(before);
        ticket
    }

    /// Close the dropdown. Returns whether it was open.
    pub fn dismiss(&mut self) -> bool {
        if !self.visibility.is_open() {
            return false;
        }
        let before = self.fingerprint();
        self.visibility = self
            .visibility
            .transition(VisibilityEvent::Dismissed, self.inputs());
        self.active = None;
        lookup_core::debug!(query = self.query.as_str(), "lookup dismissed");
        self.finish(before);
        true
    }

    /// Enable or disable the widget.
    ///
    /// Disabling closes the dropdown and makes outstanding fetches stale.
    /// Re-enabling evaluates opening against the current query.
    pub fn set_disabled(&mut self, disabled: bool) -> Option<FetchTicket> {
        if disabled == self.config.disabled() {
            return None;
        }
        let before = self.fingerprint();
        self.config.set_disabled(disabled);
        let ticket = self.evaluate(VisibilityEvent::DisabledChanged(disabled));
        self.finish(before);
        ticket
    }

    // --- Selection ---

    /// Route a key from the input.
    pub fn on_key_event(&mut self, key: KeyEvent) -> Option<LookupAction<R::Id>> {
        let outcome = navigate(
            self.active,
            self.results.len(),
            self.visibility.is_open(),
            &key,
        );
        match outcome {
            NavOutcome::Ignored => None,
            NavOutcome::Moved(index) => {
                let before = self.fingerprint();
                self.active = index;
                self.finish(before);
                None
            }
            NavOutcome::Commit(index) => self.commit_index(index).map(LookupAction::Committed),
            NavOutcome::Close => self.dismiss().then_some(LookupAction::Dismissed),
        }
    }

    /// A rendered row was clicked. Returns the committed id.
    pub fn on_result_click(&mut self, index: usize) -> Option<R::Id> {
        if !self.visibility.is_open() {
            return None;
        }
        self.commit_index(index)
    }

    /// The pointer moved over a rendered row. Returns whether the highlight
    /// changed.
    pub fn on_result_hover(&mut self, index: usize) -> bool {
        if !self.visibility.is_open() || index >= self.results.len() || self.active == Some(index)
        {
            return false;
        }
        let before = self.fingerprint();
        self.active = Some(index);
        self.finish(before);
        true
    }

    /// Commit `result`: notify the host, write its label into the query,
    /// and close the dropdown.
    pub fn commit_selection(&mut self, result: &R) {
        let _span = lookup_core::debug_span!("lookup_commit").entered();
        let before = self.fingerprint();
        lookup_core::debug!(id = ?result.id(), label = result.label(), "lookup selection committed");

        if let Some(on_select) = self.on_select.as_mut() {
            on_select(result);
        }
        self.query = result.label().to_owned();
        self.visibility = self
            .visibility
            .transition(VisibilityEvent::Selected, self.inputs());
        self.active = None;
        if self.in_flight.take().is_some() {
            self.sequencer.cancel();
            self.status = ViewStatus::Idle;
        }
        self.finish(before);
    }

    fn commit_index(&mut self, index: usize) -> Option<R::Id> {
        let results = self.results.clone();
        let result = results.get(index)?;
        self.commit_selection(result);
        Some(result.id())
    }

    // --- Host events ---

    /// Route a canonical input event.
    ///
    /// Characters, backspace, Ctrl+U and paste edit the query; navigation
    /// keys go to [`Self::on_key_event`]; pointer presses are checked
    /// against the mounted bounds; focus loss dismisses and focus gain
    /// re-evaluates opening.
    pub fn handle_event(&mut self, event: &Event) -> Option<LookupAction<R::Id>> {
        match event {
            Event::Key(key) if key.is_press() => self.handle_key(*key),
            Event::Key(_) => None,
            Event::Mouse(mouse) if mouse.is_down() => self
                .on_pointer_down(mouse.x, mouse.y)
                .then_some(LookupAction::Dismissed),
            Event::Mouse(_) => None,
            Event::Paste(paste) => {
                let mut query = self.query.clone();
                query.extend(paste.text.chars().filter(|c| !c.is_control()));
                self.on_query_edit(query).map(LookupAction::Fetch)
            }
            Event::Focus(true) => self.open().map(LookupAction::Fetch),
            Event::Focus(false) => self.dismiss().then_some(LookupAction::Dismissed),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<LookupAction<R::Id>> {
        let chord = Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER;
        match key.code {
            KeyCode::Char('u') if key.ctrl() => {
                self.on_query_edit(String::new()).map(LookupAction::Fetch)
            }
            KeyCode::Char(c) if !key.modifiers.intersects(chord) => {
                let mut query = self.query.clone();
                query.push(c);
                self.on_query_edit(query).map(LookupAction::Fetch)
            }
            KeyCode::Backspace => {
                let (cut, _) = self.query.grapheme_indices(true).next_back()?;
                let query = self.query[..cut].to_owned();
                self.on_query_edit(query).map(LookupAction::Fetch)
            }
            _ => self.on_key_event(key),
        }
    }

    // --- Dismissal ---

    /// Register the widget's bounding region with `hub`.
    ///
    /// Replaces any previous registration. The registration is released on
    /// [`Self::unmount`] or when the widget is dropped.
    pub fn mount(&mut self, hub: &PointerHub, bounds: Rect) {
        self.watcher = Some(hub.register(bounds));
    }

    /// Release the pointer registration and close the dropdown.
    pub fn unmount(&mut self) {
        self.watcher = None;
        self.dismiss();
    }

    /// Whether the widget holds a pointer registration.
    pub fn is_mounted(&self) -> bool {
        self.watcher.is_some()
    }

    /// Update the registered bounding region.
    pub fn set_bounds(&mut self, bounds: Rect) {
        if let Some(watcher) = &self.watcher {
            watcher.set_bounds(bounds);
        }
    }

    /// A pointer press at `(x, y)`. Dismisses if it is outside the mounted
    /// bounds; returns whether it did.
    pub fn on_pointer_down(&mut self, x: u16, y: u16) -> bool {
        let Some(watcher) = &self.watcher else {
            return false;
        };
        // The hub may have recorded the same press.
        watcher.take_dismissal();
        watcher.is_outside(x, y) && self.dismiss()
    }

    /// Apply an outside press recorded by the hub since the last call.
    pub fn sync_dismissal(&mut self) -> bool {
        let pending = self
            .watcher
            .as_ref()
            .is_some_and(DismissalWatcher::take_dismissal);
        pending && self.dismiss()
    }

    // --- Snapshots ---

    /// Current render snapshot.
    pub fn snapshot(&self) -> Snapshot<R> {
        let is_open = self.visibility.is_open();
        let (has_error, error_message) = match &self.status {
            ViewStatus::Failed(_) => (true, Some(self.config.error_message().to_owned())),
            _ => (false, None),
        };
        let empty_message = (self.status == ViewStatus::Ready && self.results.is_empty())
            .then(|| self.config.empty_state_message().to_owned());
        Snapshot {
            query: self.query.clone(),
            is_open,
            is_loading: self.status == ViewStatus::Loading,
            results: self.results.clone(),
            active_index: self.active,
            empty_message,
            has_error,
            error_message,
            revision: self.revision,
        }
    }

    /// Call `observer` with a fresh snapshot after every visible change.
    pub fn subscribe(&mut self, observer: impl FnMut(&Snapshot<R>) + 'static) -> ObserverId {
        self.observers.add(Box::new(observer))
    }

    /// Stop notifying `id`. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // --- Internals ---

    fn inputs(&self) -> VisibilityInputs {
        VisibilityInputs {
            query_len: self.query.graphemes(true).count(),
            min_query_length: self.config.min_query_length(),
            disabled: self.config.disabled(),
        }
    }

    fn evaluate(&mut self, event: VisibilityEvent) -> Option<FetchTicket> {
        let inputs = self.inputs();
        let was_open = self.visibility.is_open();
        self.visibility = self.visibility.transition(event, inputs);
        self.active = None;
        if !was_open
            && self.visibility.is_open()
            && let Some(watcher) = &self.watcher
        {
            // Presses recorded while closed belong to no dropdown.
            watcher.take_dismissal();
        }
        if inputs.allows_open() {
            self.request()
        } else {
            self.abandon();
            None
        }
    }

    fn request(&mut self) -> Option<FetchTicket> {
        // The outstanding fetch already answers this query.
        if self
            .in_flight
            .as_ref()
            .is_some_and(|ticket| ticket.query() == self.query)
        {
            return None;
        }
        match self.sequencer.issue(&self.query) {
            Issue::Cached(entry) => {
                self.in_flight = None;
                self.apply_entry(entry);
                None
            }
            Issue::Fetch(ticket) => {
                self.in_flight = Some(ticket.clone());
                self.status = ViewStatus::Loading;
                self.results = ResultSet::empty();
                Some(ticket)
            }
        }
    }

    fn abandon(&mut self) {
        if self.in_flight.take().is_some() {
            self.sequencer.cancel();
        }
        self.status = ViewStatus::Idle;
        self.results = ResultSet::empty();
        self.active = None;
    }

    fn apply_entry(&mut self, entry: CacheEntry<R>) {
        self.active = None;
        match entry.status {
            EntryStatus::Ready => {
                self.status = ViewStatus::Ready;
                self.results = entry.results;
            }
            EntryStatus::Failed => {
                let error = entry
                    .error
                    .unwrap_or_else(|| FetchError::rejected("fetch failed"));
                self.status = ViewStatus::Failed(error);
                self.results = ResultSet::empty();
            }
            EntryStatus::Pending => {
                self.status = ViewStatus::Loading;
                self.results = ResultSet::empty();
            }
        }
    }

    fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            query: self.query.clone(),
            visibility: self.visibility,
            active: self.active,
            status: self.status.clone(),
            results: self.results.id(),
        }
    }

    fn finish(&mut self, before: Fingerprint) {
        if self.fingerprint() == before {
            return;
        }
        self.revision += 1;
        if !self.observers.is_empty() {
            let snapshot = self.snapshot();
            self.observers.notify(&snapshot);
        }
    }
}

impl<R: LookupItem> fmt::Debug for LookupWidget<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupWidget")
            .field("query", &self.query)
            .field("visibility", &self.visibility)
            .field("active", &self.active)
            .field("status", &self.status)
            .field("results", &self.results.len())
            .field("in_flight", &self.in_flight)
            .field("mounted", &self.watcher.is_some())
            .field("revision", &self.revision)
            .finish()
    }
}
