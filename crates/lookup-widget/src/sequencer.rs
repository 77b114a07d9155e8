#![forbid(unsafe_code)]

//! Query sequencing and race resolution.
//!
//! Every issued query is tagged with a sequence number from a monotonically
//! increasing counter. When a fetch completes, its sequence number is compared
//! with the latest one issued; anything older is discarded without touching
//! the cache. This gives "last request wins" regardless of the order in which
//! the network delivers responses.
//!
//! There is no hard cancellation. [`QuerySequencer::cancel`] advances the
//! counter so every in-flight fetch becomes stale on arrival.
//!
//! # Atomicity
//!
//! [`QuerySequencer::complete`] performs the staleness check and the cache
//! write in one synchronous call. Callers deliver completions on the UI loop,
//! so no other issue can interleave between the two.

use crate::cache::{CacheEntry, CacheStats, EntryStatus, ResultCache};
use crate::error::FetchError;
use crate::item::{LookupItem, ResultSet};

/// Handle for one issued fetch.
///
/// The host runs the fetch for [`FetchTicket::query`] and hands the ticket
/// back with the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    seq: u64,
    query: String,
}

impl FetchTicket {
    /// Sequence number assigned at issue time.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Query text to fetch.
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Result of [`QuerySequencer::issue`].
#[derive(Debug)]
pub enum Issue<R> {
    /// A ready entry was cached; no fetch needed.
    Cached(CacheEntry<R>),
    /// The host must run this fetch.
    Fetch(FetchTicket),
}

/// Result of [`QuerySequencer::complete`].
#[derive(Debug)]
pub enum Completion<R> {
    /// The outcome belongs to the latest issued query and was cached.
    Accepted {
        /// Query the outcome belongs to.
        query: String,
        /// Settled cache entry.
        entry: CacheEntry<R>,
    },
    /// A newer query was issued in the meantime; the outcome was dropped.
    Stale {
        /// Sequence number of the dropped fetch.
        seq: u64,
        /// Latest issued sequence number.
        latest: u64,
    },
}

/// Sequencer counters, for tuning debounce and cache sizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequencerStats {
    /// Queries issued (cache hits included).
    pub issued: u64,
    /// Issues answered from the cache.
    pub cache_hits: u64,
    /// Fetches handed to the host.
    pub fetches: u64,
    /// Completions applied.
    pub accepted: u64,
    /// Completions dropped as stale.
    pub stale_discarded: u64,
    /// Accepted completions that failed.
    pub failed: u64,
}

/// Issues fetches and decides which completions are still relevant.
///
/// Owns the [`ResultCache`] exclusively.
#[derive(Debug)]
pub struct QuerySequencer<R> {
    cache: ResultCache<R>,
    latest: u64,
    stats: SequencerStats,
}

impl<R: LookupItem> QuerySequencer<R> {
    /// Create a sequencer whose cache holds `cache_capacity` queries.
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: ResultCache::new(cache_capacity),
            latest: 0,
            stats: SequencerStats::default(),
        }
    }

    /// Issue `query`.
    ///
    /// Always advances the counter, so any fetch still in flight becomes
    /// stale. A ready cache entry short-circuits; otherwise a pending entry
    /// is recorded and a ticket returned.
    pub fn issue(&mut self, query: &str) -> Issue<R> {
        self.latest += 1;
        let seq = self.latest;
        self.stats.issued += 1;

        if let Some(entry) = self.cache.get(query)
            && entry.status == EntryStatus::Ready
        {
            self.stats.cache_hits += 1;
            lookup_core::trace!(query, seq, "lookup cache hit");
            return Issue::Cached(entry.clone());
        }

        self.cache.put(query, CacheEntry::pending(seq));
        self.stats.fetches += 1;
        lookup_core::debug!(query, seq, "lookup fetch issued");
        Issue::Fetch(FetchTicket {
            seq,
            query: query.to_owned(),
        })
    }

    /// Report the outcome of a fetch.
    ///
    /// Stale outcomes are dropped. Accepted outcomes are validated (unique
    /// ids), cached as `Ready` or `Failed`, and returned.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<Vec<R>, FetchError>,
    ) -> Completion<R> {
        if ticket.seq != self.latest {
            self.stats.stale_discarded += 1;
            lookup_core::debug!(
                query = ticket.query.as_str(),
                seq = ticket.seq,
                latest = self.latest,
                "lookup stale result discarded"
            );
            return Completion::Stale {
                seq: ticket.seq,
                latest: self.latest,
            };
        }

        let entry = match outcome.and_then(|items| ResultSet::new(items).map_err(FetchError::from))
        {
            Ok(results) => CacheEntry::ready(results, ticket.seq),
            Err(error) => {
                self.stats.failed += 1;
                lookup_core::warn!(
                    query = ticket.query.as_str(),
                    seq = ticket.seq,
                    error = %error,
                    "lookup fetch failed"
                );
                CacheEntry::failed(error, ticket.seq)
            }
        };
        self.stats.accepted += 1;
        self.cache.put(&ticket.query, entry.clone());
        Completion::Accepted {
            query: ticket.query,
            entry,
        }
    }

    /// Make every in-flight fetch stale.
    pub fn cancel(&mut self) {
        self.latest += 1;
        lookup_core::trace!(latest = self.latest, "lookup in-flight fetches cancelled");
    }

    /// Drop the cached entry for `query` so the next issue refetches.
    pub fn invalidate(&mut self, query: &str) -> bool {
        self.cache.invalidate(query)
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
    }

    /// Latest issued sequence number.
    pub fn latest_seq(&self) -> u64 {
        self.latest
    }

    /// Whether `ticket` would still be accepted.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.seq == self.latest
    }

    /// Read-only view of the cache.
    pub fn cache(&self) -> &ResultCache<R> {
        &self.cache
    }

    /// Cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Sequencer statistics.
    pub fn stats(&self) -> SequencerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use crate::item::Candidate;

    fn items(labels: &[&str]) -> Vec<Candidate> {
        labels
            .iter()
            .map(|l| Candidate::new(l.to_lowercase(), *l))
            .collect()
    }

    fn ticket(issue: Issue<Candidate>) -> FetchTicket {
        match issue {
            Issue::Fetch(t) => t,
            Issue::Cached(_) => panic!("expected a fetch"),
        }
    }

    #[test]
    fn sequence_numbers_increase() {
        let mut seq = QuerySequencer::<Candidate>::new(8);
        let a = ticket(seq.issue("ab"));
        let b = ticket(seq.issue("abc"));
        assert!(b.seq() > a.seq());
        assert_eq!(seq.latest_seq(), b.seq());
    }

    #[test]
    fn later_query_wins_when_earlier_completes_last() {
        let mut seq = QuerySequencer::new(8);
        let ab = ticket(seq.issue("ab"));
        let abc = ticket(seq.issue("abc"));

        let fast = seq.complete(abc, Ok(items(&["Y"])));
        assert!(matches!(fast, Completion::Accepted { ref query, .. } if query == "abc"));

        let slow = seq.complete(ab.clone(), Ok(items(&["X"])));
        assert!(matches!(slow, Completion::Stale { seq: s, .. } if s == ab.seq()));

        // Stale result was never written.
        assert_eq!(
            seq.cache().peek("ab").map(|e| e.status),
            Some(EntryStatus::Pending)
        );
        assert_eq!(seq.stats().stale_discarded, 1);
    }

    #[test]
    fn ready_entry_short_circuits() {
        let mut seq = QuerySequencer::new(8);
        let t = ticket(seq.issue("acme"));
        seq.complete(t, Ok(items(&["Acme Corp"])));

        match seq.issue("acme") {
            Issue::Cached(entry) => {
                assert_eq!(entry.status, EntryStatus::Ready);
                assert_eq!(entry.results.len(), 1);
            }
            Issue::Fetch(_) => panic!("second issue must hit the cache"),
        }
        let stats = seq.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.issued, 2);
    }

    #[test]
    fn cache_hit_still_makes_in_flight_stale() {
        let mut seq = QuerySequencer::new(8);
        let t = ticket(seq.issue("acme"));
        seq.complete(t, Ok(items(&["Acme Corp"])));

        let slow = ticket(seq.issue("acmex"));
        assert!(matches!(seq.issue("acme"), Issue::Cached(_)));
        assert!(matches!(
            seq.complete(slow, Ok(items(&["Nope"]))),
            Completion::Stale { .. }
        ));
    }

    #[test]
    fn failed_fetch_recorded_and_refetched() {
        let mut seq = QuerySequencer::<Candidate>::new(8);
        let t = ticket(seq.issue("acme"));
        match seq.complete(t, Err(FetchError::rejected("timeout"))) {
            Completion::Accepted { entry, .. } => {
                assert_eq!(entry.status, EntryStatus::Failed);
                assert!(entry.results.is_empty());
                assert_eq!(entry.error.unwrap().kind(), FetchErrorKind::Rejected);
            }
            Completion::Stale { .. } => panic!("latest fetch must be accepted"),
        }
        // Failed entries do not short-circuit.
        assert!(matches!(seq.issue("acme"), Issue::Fetch(_)));
        assert_eq!(seq.stats().failed, 1);
    }

    #[test]
    fn duplicate_ids_become_failed_entry() {
        let mut seq = QuerySequencer::new(8);
        let t = ticket(seq.issue("dup"));
        let dupes = vec![Candidate::new("1", "A"), Candidate::new("1", "B")];
        match seq.complete(t, Ok(dupes)) {
            Completion::Accepted { entry, .. } => {
                assert_eq!(entry.status, EntryStatus::Failed);
                assert_eq!(
                    entry.error.map(|e| e.kind()),
                    Some(FetchErrorKind::ContractViolation)
                );
            }
            Completion::Stale { .. } => panic!("expected acceptance"),
        }
    }

    #[test]
    fn cancel_makes_outstanding_stale() {
        let mut seq = QuerySequencer::new(8);
        let t = ticket(seq.issue("abc"));
        assert!(seq.is_current(&t));
        seq.cancel();
        assert!(!seq.is_current(&t));
        assert!(matches!(
            seq.complete(t, Ok(items(&["X"]))),
            Completion::Stale { .. }
        ));
    }

    #[test]
    fn invalidate_forces_refetch() {
        let mut seq = QuerySequencer::new(8);
        let t = ticket(seq.issue("abc"));
        seq.complete(t, Ok(items(&["X"])));
        assert!(seq.invalidate("abc"));
        assert!(matches!(seq.issue("abc"), Issue::Fetch(_)));
    }
}
