#![forbid(unsafe_code)]

//! The host's search function.

use lookup_widget::FetchError;

/// Runs a search for a query.
///
/// Implementations are called from worker threads, one call per ticket.
/// Any `Fn(&str) -> Result<Vec<R>, FetchError>` closure qualifies.
pub trait Fetcher<R>: Send + Sync + 'static {
    /// Search for `query`.
    fn fetch(&self, query: &str) -> Result<Vec<R>, FetchError>;
}

impl<R, F> Fetcher<R> for F
where
    F: Fn(&str) -> Result<Vec<R>, FetchError> + Send + Sync + 'static,
{
    fn fetch(&self, query: &str) -> Result<Vec<R>, FetchError> {
        self(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<&'static str>);

    impl Fetcher<String> for Fixed {
        fn fetch(&self, query: &str) -> Result<Vec<String>, FetchError> {
            Ok(self
                .0
                .iter()
                .filter(|s| s.starts_with(query))
                .map(|s| (*s).to_owned())
                .collect())
        }
    }

    #[test]
    fn closures_are_fetchers() {
        let fetcher = |q: &str| Ok::<_, FetchError>(vec![q.len()]);
        assert_eq!(Fetcher::fetch(&fetcher, "abc"), Ok(vec![3]));
    }

    #[test]
    fn structs_are_fetchers() {
        let fetcher = Fixed(vec!["acme", "acorn", "globex"]);
        assert_eq!(fetcher.fetch("ac").unwrap(), vec!["acme", "acorn"]);
    }
}
