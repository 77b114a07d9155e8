#![forbid(unsafe_code)]

//! Event-loop glue between a [`LookupWidget`] and a [`FetchRunner`].
//!
//! The driver forwards host events to the widget, starts a worker for every
//! ticket the widget hands out, and applies finished outcomes when the host
//! calls [`LookupDriver::pump`]. Stale outcomes are discarded by the widget.

use std::time::{Duration, Instant};

use lookup_core::event::{Event, KeyEvent};
use lookup_widget::{FetchTicket, LookupAction, LookupItem, LookupWidget, Snapshot};

use crate::fetcher::Fetcher;
use crate::runner::{FetchCompletion, FetchRunner};

/// A lookup widget with its own fetch workers.
#[derive(Debug)]
pub struct LookupDriver<R: LookupItem> {
    widget: LookupWidget<R>,
    runner: FetchRunner<R>,
}

impl<R: LookupItem + Send + 'static> LookupDriver<R> {
    /// Drive `widget`, running fetches through `fetcher`.
    pub fn new(widget: LookupWidget<R>, fetcher: impl Fetcher<R>) -> Self {
        Self {
            widget,
            runner: FetchRunner::new(fetcher),
        }
    }

    /// The driven widget.
    pub fn widget(&self) -> &LookupWidget<R> {
        &self.widget
    }

    /// Mutable access for operations the driver does not wrap (mounting,
    /// subscribing, hover). Tickets returned by those calls must be passed to
    /// [`Self::submit`].
    pub fn widget_mut(&mut self) -> &mut LookupWidget<R> {
        &mut self.widget
    }

    /// Current render snapshot.
    pub fn snapshot(&self) -> Snapshot<R> {
        self.widget.snapshot()
    }

    /// Fetches started but not yet applied or discarded.
    pub fn in_flight(&self) -> usize {
        self.runner.in_flight()
    }

    /// Start a worker for `ticket`.
    pub fn submit(&mut self, ticket: FetchTicket) {
        self.runner.spawn(ticket);
    }

    /// Replace the query text.
    pub fn edit(&mut self, text: impl Into<String>) {
        if let Some(ticket) = self.widget.on_query_edit(text) {
            self.submit(ticket);
        }
    }

    /// Route a key event.
    pub fn key(&mut self, key: KeyEvent) -> Option<LookupAction<R::Id>> {
        self.event(&Event::Key(key))
    }

    /// Route any host event. Fetch actions are started before returning.
    pub fn event(&mut self, event: &Event) -> Option<LookupAction<R::Id>> {
        let action = self.widget.handle_event(event);
        if let Some(LookupAction::Fetch(ticket)) = &action {
            self.submit(ticket.clone());
        }
        action
    }

    /// Enable or disable the widget.
    pub fn set_disabled(&mut self, disabled: bool) {
        if let Some(ticket) = self.widget.set_disabled(disabled) {
            self.submit(ticket);
        }
    }

    /// Refetch after a failure.
    pub fn retry(&mut self) -> bool {
        match self.widget.retry() {
            Some(ticket) => {
                self.submit(ticket);
                true
            }
            None => false,
        }
    }

    /// Apply every finished fetch. Returns how many were applied (stale
    /// outcomes are discarded and not counted). Never blocks.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        for completion in self.runner.drain() {
            applied += usize::from(self.apply(completion));
        }
        applied
    }

    /// Wait up to `timeout` for outstanding fetches, applying each as it
    /// lands. Returns how many were applied.
    pub fn pump_blocking(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = self.pump();
        while self.runner.in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(
                    in_flight = self.runner.in_flight(),
                    "lookup pump timed out with fetches outstanding"
                );
                break;
            }
            let Some(completion) = self.runner.recv_timeout(remaining) else {
                break;
            };
            applied += usize::from(self.apply(completion));
        }
        applied
    }

    fn apply(&mut self, completion: FetchCompletion<R>) -> bool {
        let FetchCompletion { ticket, outcome } = completion;
        self.widget.on_fetch_complete(ticket, outcome)
    }
}
