//! Recovered records and the first-seen deduplication set.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// An entity recovered from a search endpoint.
///
/// Two records with the same key are the same entity; the first one
/// observed is kept.
pub trait Record: Send + 'static {
    /// Stable unique key (account id, resource identifier, ...).
    fn key(&self) -> &str;
}

/// Outcome of offering a record to a [`DedupSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The key was unseen; the record is now retained
    New,
    /// The key was already present; the offered record was dropped
    Duplicate,
}

/// Mapping from unique key to the first record seen with that key.
///
/// Entries are never overwritten or removed, so the set only grows.
#[derive(Debug)]
pub struct DedupSet<R> {
    records: HashMap<String, R>,
}

impl<R: Record> DedupSet<R> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Offer a record. Later duplicates never replace the retained copy.
    pub fn insert(&mut self, record: R) -> Insertion {
        match self.records.entry(record.key().to_owned()) {
            Entry::Occupied(_) => Insertion::Duplicate,
            Entry::Vacant(slot) => {
                slot.insert(record);
                Insertion::New
            }
        }
    }

    /// Whether a key has been seen.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Retained record for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&R> {
        self.records.get(key)
    }

    /// Number of unique records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been retained yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Merge another set in, keeping records already present here.
    ///
    /// Returns the number of records that were new to this set.
    pub fn absorb(&mut self, other: DedupSet<R>) -> usize {
        let mut added = 0;
        for record in other.into_sorted() {
            if self.insert(record) == Insertion::New {
                added += 1;
            }
        }
        added
    }

    /// Consume the set, returning records ordered by key.
    #[must_use]
    pub fn into_sorted(self) -> Vec<R> {
        let mut entries: Vec<(String, R)> = self.records.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, record)| record).collect()
    }
}

impl<R: Record> Default for DedupSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> FromIterator<R> for DedupSet<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Member {
        id: &'static str,
        origin: &'static str,
    }

    impl Record for Member {
        fn key(&self) -> &str {
            self.id
        }
    }

    #[test]
    fn test_first_seen_wins() {
        let mut set = DedupSet::new();
        assert_eq!(
            set.insert(Member {
                id: "a",
                origin: "root"
            }),
            Insertion::New
        );
        assert_eq!(
            set.insert(Member {
                id: "a",
                origin: "child"
            }),
            Insertion::Duplicate
        );

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").map(|e| e.origin), Some("root"));
    }

    #[test]
    fn test_into_sorted_orders_by_key() {
        let mut set = DedupSet::new();
        for id in ["c", "a", "b"] {
            set.insert(Member { id, origin: "x" });
        }
        let ids: Vec<_> = set.into_sorted().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_absorb_keeps_existing() {
        let mut global = DedupSet::new();
        global.insert(Member {
            id: "a",
            origin: "desk-1",
        });

        let mut desk = DedupSet::new();
        desk.insert(Member {
            id: "a",
            origin: "desk-2",
        });
        desk.insert(Member {
            id: "b",
            origin: "desk-2",
        });

        assert_eq!(global.absorb(desk), 1);
        assert_eq!(global.len(), 2);
        assert_eq!(global.get("a").map(|e| e.origin), Some("desk-1"));
        assert!(global.contains("b"));
    }
}
