#![forbid(unsafe_code)]

//! Result items and immutable result sets.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ResultSetError;

/// Minimal capability set every lookup result must provide.
///
/// Everything else on the host's record is opaque to the widget.
pub trait LookupItem {
    /// Identifier, unique within one result set.
    type Id: Eq + Hash + Clone + fmt::Debug;

    /// This result's identifier.
    fn id(&self) -> Self::Id;

    /// Text shown in the dropdown and written into the query on commit.
    fn label(&self) -> &str;
}

/// A plain id/label result with an optional secondary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Unique identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Optional secondary text (e.g. a category or address).
    pub detail: Option<String>,
}

impl Candidate {
    /// Create a new candidate.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            detail: None,
        }
    }

    /// Set detail text (builder).
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl LookupItem for Candidate {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Identity of a [`ResultSet`].
///
/// Every non-empty set gets a fresh id when built, so two sets compare equal
/// by id only if one is a clone of the other. All empty sets share
/// [`ResultSetId::EMPTY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultSetId(u64);

impl ResultSetId {
    /// Identity shared by every empty set.
    pub const EMPTY: Self = Self(0);

    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An immutable, cheaply clonable list of results.
pub struct ResultSet<R> {
    id: ResultSetId,
    items: Arc<[R]>,
}

impl<R> ResultSet<R> {
    /// The empty set.
    pub fn empty() -> Self {
        Self {
            id: ResultSetId::EMPTY,
            items: Arc::from(Vec::new()),
        }
    }

    /// Identity of this set.
    pub fn id(&self) -> ResultSetId {
        self.id
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no results.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Result at `index`.
    pub fn get(&self, index: usize) -> Option<&R> {
        self.items.get(index)
    }

    /// Results in fetch order.
    pub fn as_slice(&self) -> &[R] {
        &self.items
    }

    /// Iterate results in fetch order.
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.items.iter()
    }
}

impl<R: LookupItem> ResultSet<R> {
    /// Build a set, rejecting duplicate identifiers.
    pub fn new(items: Vec<R>) -> Result<Self, ResultSetError> {
        if items.is_empty() {
            return Ok(Self::empty());
        }
        let mut seen: HashMap<R::Id, usize> = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(first) = seen.insert(item.id(), index) {
                return Err(ResultSetError::DuplicateId {
                    id: format!("{:?}", item.id()),
                    first,
                    second: index,
                });
            }
        }
        Ok(Self {
            id: ResultSetId::next(),
            items: Arc::from(items),
        })
    }

    /// Position of the result with `id`.
    pub fn position(&self, id: &R::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == *id)
    }
}

impl<R> Clone for ResultSet<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            items: Arc::clone(&self.items),
        }
    }
}

impl<R> Default for ResultSet<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: fmt::Debug> fmt::Debug for ResultSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("id", &self.id)
            .field("items", &&*self.items)
            .finish()
    }
}

impl<'a, R> IntoIterator for &'a ResultSet<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Vec<Candidate> {
        vec![
            Candidate::new("7", "Acme Corp"),
            Candidate::new("8", "Acme Labs").with_detail("Berlin"),
        ]
    }

    #[test]
    fn new_set_has_fresh_identity() {
        let a = ResultSet::new(acme()).unwrap();
        let b = ResultSet::new(acme()).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn empty_sets_share_identity() {
        let a = ResultSet::<Candidate>::new(Vec::new()).unwrap();
        assert_eq!(a.id(), ResultSetId::EMPTY);
        assert_eq!(ResultSet::<Candidate>::empty().id(), a.id());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let items = vec![
            Candidate::new("1", "One"),
            Candidate::new("2", "Two"),
            Candidate::new("1", "Uno"),
        ];
        let err = ResultSet::new(items).unwrap_err();
        assert_eq!(
            err,
            ResultSetError::DuplicateId {
                id: "\"1\"".into(),
                first: 0,
                second: 2,
            }
        );
    }

    #[test]
    fn lookup_by_id() {
        let set = ResultSet::new(acme()).unwrap();
        assert_eq!(set.position(&"8".to_string()), Some(1));
        assert_eq!(set.get(1).map(|c| c.label()), Some("Acme Labs"));
        assert_eq!(set.iter().count(), 2);
    }
}
