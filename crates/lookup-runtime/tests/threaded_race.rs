//! Threaded race tests: real worker threads finishing in arbitrary order.
//!
//! Set `RUST_LOG=lookup_runtime=debug` to see worker activity.

use std::thread;
use std::time::Duration;

use lookup_runtime::LookupDriver;
use lookup_widget::{Candidate, FetchError, LookupConfig, LookupWidget};
use proptest::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fetcher whose latency is encoded in the query's last character.
fn delayed(query: &str) -> Result<Vec<Candidate>, FetchError> {
    let delay = query
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0);
    thread::sleep(Duration::from_millis(u64::from(delay) * 5));
    Ok(vec![Candidate::new(query, query)])
}

#[test]
fn slow_first_query_is_discarded() {
    init_logging();
    let widget = LookupWidget::new(LookupConfig::default().with_min_query_length(2));
    let mut driver = LookupDriver::new(widget, |q: &str| {
        let (delay, label) = if q == "ab" { (200, "X") } else { (50, "Y") };
        thread::sleep(Duration::from_millis(delay));
        Ok::<_, FetchError>(vec![Candidate::new(label, label)])
    });

    driver.edit("ab");
    driver.edit("abc");
    driver.pump_blocking(Duration::from_secs(5));

    let snap = driver.snapshot();
    assert_eq!(snap.query, "abc");
    assert_eq!(snap.labels(), vec!["Y"]);
    assert_eq!(driver.in_flight(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn last_query_wins_with_random_latency(
        queries in prop::collection::vec("[a-b]{3}[0-9]", 1..6)
    ) {
        init_logging();
        let mut driver = LookupDriver::new(LookupWidget::new(LookupConfig::default()), delayed);
        for q in &queries {
            driver.edit(q.clone());
            // Let some workers overtake others.
            driver.pump();
        }
        driver.pump_blocking(Duration::from_secs(5));

        let last = queries.last().unwrap();
        let snap = driver.snapshot();
        prop_assert_eq!(snap.query.as_str(), last.as_str());
        prop_assert!(!snap.is_loading);
        prop_assert_eq!(snap.labels(), vec![last.as_str()]);
    }
}
