#![forbid(unsafe_code)]

//! Threaded fetch execution.
//!
//! Each ticket runs on its own named worker thread. The outcome is sent back
//! over an `mpsc` channel and collected by the owning (UI) thread, which
//! applies it to the widget. Workers never touch widget state.
//!
//! Every spawned ticket produces exactly one [`FetchCompletion`]: a panic in
//! the fetcher becomes a [`FetchErrorKind::Panicked`] failure and a failure
//! to spawn the thread becomes a rejection.
//!

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use lookup_widget::{FetchError, FetchErrorKind, FetchTicket};

use crate::fetcher::Fetcher;

const WORKER_NAME: &str = "lookup-fetch";

/// Outcome of one ticket.
#[derive(Debug)]
pub struct FetchCompletion<R> {
    /// The ticket that was run.
    pub ticket: FetchTicket,
    /// What the fetcher returned.
    pub outcome: Result<Vec<R>, FetchError>,
}

/// Runs fetches on worker threads and queues their outcomes.
pub struct FetchRunner<R> {
    fetcher: Arc<dyn Fetcher<R>>,
    sender: mpsc::Sender<FetchCompletion<R>>,
    receiver: mpsc::Receiver<FetchCompletion<R>>,
    in_flight: usize,
    spawned: u64,
}

impl<R: Send + 'static> FetchRunner<R> {
    /// Create a runner around `fetcher`.
    pub fn new(fetcher: impl Fetcher<R>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            fetcher: Arc::new(fetcher),
            sender,
            receiver,
            in_flight: 0,
            spawned: 0,
        }
    }

    /// Start a worker for `ticket`.
    pub fn spawn(&mut self, ticket: FetchTicket) {
        self.in_flight += 1;
        self.spawned += 1;
        tracing::debug!(
            query = ticket.query(),
            seq = ticket.seq(),
            in_flight = self.in_flight,
            "lookup fetch spawned"
        );

        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();
        let worker_ticket = ticket.clone();
        let spawned = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || {
                let ticket = worker_ticket;
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    fetcher.fetch(ticket.query())
                }))
                .unwrap_or_else(|payload| Err(FetchError::panicked(panic_message(&*payload))));
                // The receiver is gone only when the runner was dropped.
                let _ = sender.send(FetchCompletion { ticket, outcome });
            });

        if let Err(err) = spawned {
            tracing::error!(error = %err, "lookup fetch worker failed to start");
            let _ = self.sender.send(FetchCompletion {
                ticket,
                outcome: Err(FetchError::rejected(format!("worker failed to start: {err}"))),
            });
        }
    }

    /// Take one finished completion without blocking.
    pub fn try_recv(&mut self) -> Option<FetchCompletion<R>> {
        let completion = self.receiver.try_recv().ok()?;
        Some(self.settle(completion))
    }

    /// Wait up to `timeout` for the next completion.
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<FetchCompletion<R>> {
        if self.in_flight == 0 {
            return self.try_recv();
        }
        let completion = self.receiver.recv_timeout(timeout).ok()?;
        Some(self.settle(completion))
    }

    /// Take every finished completion, in arrival order.
    pub fn drain(&mut self) -> Vec<FetchCompletion<R>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Workers started but not yet collected.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Total workers started.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    fn settle(&mut self, completion: FetchCompletion<R>) -> FetchCompletion<R> {
        self.in_flight = self.in_flight.saturating_sub(1);
        match &completion.outcome {
            Err(err) if err.kind() == FetchErrorKind::Panicked => tracing::error!(
                query = completion.ticket.query(),
                seq = completion.ticket.seq(),
                error = %err,
                "lookup fetch worker panicked"
            ),
            Err(err) => tracing::debug!(
                query = completion.ticket.query(),
                seq = completion.ticket.seq(),
                error = %err,
                "lookup fetch returned an error"
            ),
            Ok(items) => tracing::trace!(
                query = completion.ticket.query(),
                seq = completion.ticket.seq(),
                rows = items.len(),
                "lookup fetch completed"
            ),
        }
        completion
    }
}

impl<R> fmt::Debug for FetchRunner<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRunner")
            .field("in_flight", &self.in_flight)
            .field("spawned", &self.spawned)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use lookup_widget::{Issue, LookupItem, QuerySequencer};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Word(String);

    impl LookupItem for Word {
        type Id = String;

        fn id(&self) -> String {
            self.0.clone()
        }

        fn label(&self) -> &str {
            &self.0
        }
    }

    fn ticket(sequencer: &mut QuerySequencer<Word>, query: &str) -> FetchTicket {
        match sequencer.issue(query) {
            Issue::Fetch(ticket) => ticket,
            Issue::Cached(_) => panic!("unexpected cache hit for {query}"),
        }
    }

    #[test]
    fn completion_carries_ticket_and_results() {
        let mut sequencer = QuerySequencer::new(8);
        let mut runner =
            FetchRunner::new(|q: &str| Ok::<_, FetchError>(vec![Word(q.to_uppercase())]));

        runner.spawn(ticket(&mut sequencer, "abc"));
        assert_eq!(runner.in_flight(), 1);

        let done = runner.recv_timeout(Duration::from_secs(5)).expect("completion");
        assert_eq!(done.ticket.query(), "abc");
        assert_eq!(done.outcome, Ok(vec![Word("ABC".into())]));
        assert_eq!(runner.in_flight(), 0);
    }

    #[test]
    fn panics_become_errors() {
        let mut sequencer = QuerySequencer::new(8);
        let mut runner = FetchRunner::<Word>::new(|q: &str| -> Result<Vec<Word>, FetchError> {
            panic!("backend exploded on {q}")
        });

        runner.spawn(ticket(&mut sequencer, "abc"));
        let done = runner.recv_timeout(Duration::from_secs(5)).expect("completion");
        let err = done.outcome.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Panicked);
        assert_eq!(err.message(), "backend exploded on abc");
    }

    #[test]
    fn idle_runner_does_not_block() {
        let mut runner = FetchRunner::<Word>::new(|_: &str| Ok::<_, FetchError>(Vec::new()));
        assert!(runner.recv_timeout(Duration::from_secs(60)).is_none());
        assert!(runner.drain().is_empty());
    }

    #[test]
    fn drain_collects_everything_finished() {
        let mut sequencer = QuerySequencer::new(8);
        let mut runner = FetchRunner::new(|q: &str| Ok::<_, FetchError>(vec![Word(q.into())]));
        runner.spawn(ticket(&mut sequencer, "abc"));
        runner.spawn(ticket(&mut sequencer, "abd"));
        assert_eq!(runner.spawned(), 2);

        let mut seen = Vec::new();
        while runner.in_flight() > 0 {
            let done = runner.recv_timeout(Duration::from_secs(5)).expect("completion");
            seen.push(done.ticket.query().to_owned());
            seen.extend(runner.drain().into_iter().map(|c| c.ticket.query().to_owned()));
        }
        seen.sort();
        assert_eq!(seen, vec!["abc", "abd"]);
    }
}
