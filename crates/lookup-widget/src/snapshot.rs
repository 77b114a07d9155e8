#![forbid(unsafe_code)]

//! Render snapshots and snapshot observers.
//!
//! A [`Snapshot`] is everything a rendering surface needs to draw the widget.
//! It is rebuilt from the widget's component states on demand; there is no
//! other channel from the widget to the surface.

use std::fmt;

use crate::item::{LookupItem, ResultSet};

/// Read-only projection of widget state.
pub struct Snapshot<R> {
    /// Current query text.
    pub query: String,
    /// Whether the dropdown is shown.
    pub is_open: bool,
    /// Whether a fetch for the current query is in flight.
    pub is_loading: bool,
    /// Rows to display.
    pub results: ResultSet<R>,
    /// Highlighted row, if any.
    pub active_index: Option<usize>,
    /// Message for a settled, empty result set.
    pub empty_message: Option<String>,
    /// Whether the latest fetch for the query failed.
    pub has_error: bool,
    /// Message to show when `has_error` is set.
    pub error_message: Option<String>,
    /// Increases every time any other field changes.
    pub revision: u64,
}

impl<R> Snapshot<R> {
    /// The highlighted result.
    pub fn active_result(&self) -> Option<&R> {
        self.active_index.and_then(|i| self.results.get(i))
    }

    /// Call `renderer(result, is_active)` for every row, in order.
    ///
    /// Returns nothing while the dropdown is closed.
    pub fn render_rows<T>(&self, mut renderer: impl FnMut(&R, bool) -> T) -> Vec<T> {
        if !self.is_open {
            return Vec::new();
        }
        self.results
            .iter()
            .enumerate()
            .map(|(i, result)| renderer(result, self.active_index == Some(i)))
            .collect()
    }
}

impl<R: LookupItem> Snapshot<R> {
    /// Labels of the visible rows.
    pub fn labels(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.label()).collect()
    }
}

impl<R> Clone for Snapshot<R> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            is_open: self.is_open,
            is_loading: self.is_loading,
            results: self.results.clone(),
            active_index: self.active_index,
            empty_message: self.empty_message.clone(),
            has_error: self.has_error,
            error_message: self.error_message.clone(),
            revision: self.revision,
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Snapshot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("query", &self.query)
            .field("is_open", &self.is_open)
            .field("is_loading", &self.is_loading)
            .field("results", &self.results)
            .field("active_index", &self.active_index)
            .field("empty_message", &self.empty_message)
            .field("has_error", &self.has_error)
            .field("error_message", &self.error_message)
            .field("revision", &self.revision)
            .finish()
    }
}

/// Handle returned by [`crate::LookupWidget::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ObserverFn<R> = Box<dyn FnMut(&Snapshot<R>)>;

/// Registered snapshot observers.
pub(crate) struct Observers<R> {
    next_id: u64,
    entries: Vec<(ObserverId, ObserverFn<R>)>,
}

impl<R> Observers<R> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, observer: ObserverFn<R>) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn notify(&mut self, snapshot: &Snapshot<R>) {
        for (_, observer) in &mut self.entries {
            observer(snapshot);
        }
    }
}
