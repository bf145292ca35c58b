//! Units of work flowing through the engine.

use crate::error::ScanError;

/// One search to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTask {
    /// Free-text query sent to the endpoint
    pub query: String,
    /// Number of branching steps that produced this query
    pub depth: u32,
}

impl SearchTask {
    /// The seed task: an empty query at depth 0.
    #[must_use]
    pub fn root() -> Self {
        Self::custom(String::new())
    }

    /// A seed task with a caller-supplied query.
    #[must_use]
    pub fn custom(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            depth: 0,
        }
    }

    /// Child task narrowing this one by one character.
    #[must_use]
    pub fn child(&self, c: char) -> Self {
        let mut query = String::with_capacity(self.query.len() + c.len_utf8());
        query.push_str(&self.query);
        query.push(c);
        Self {
            query,
            depth: self.depth + 1,
        }
    }

    /// Query as shown in progress output.
    #[must_use]
    pub fn display_query(&self) -> &str {
        if self.query.is_empty() {
            "(empty)"
        } else {
            &self.query
        }
    }
}

/// One page of matches returned by an endpoint.
#[derive(Debug)]
pub struct SearchPage<R> {
    /// Records in the page
    pub items: Vec<R>,
    /// Total matches reported by the server, when the endpoint reports one
    pub total_count: Option<u64>,
}

impl<R> SearchPage<R> {
    /// Page from an endpoint that reports a total.
    #[must_use]
    pub fn counted(items: Vec<R>, total_count: u64) -> Self {
        Self {
            items,
            total_count: Some(total_count),
        }
    }

    /// Page from an endpoint that reports no total.
    #[must_use]
    pub fn uncounted(items: Vec<R>) -> Self {
        Self {
            items,
            total_count: None,
        }
    }
}

/// Outcome of executing exactly one [`SearchTask`].
#[derive(Debug)]
pub struct SearchResult<R> {
    /// The task that produced this result
    pub task: SearchTask,
    /// The page, or why the search failed
    pub outcome: Result<SearchPage<R>, ScanError>,
}

/// How an endpoint signals that more matches exist than were returned.
///
/// The two endpoint kinds behave differently and are never unified: one
/// reports an authoritative total, the other silently caps its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationPolicy {
    /// Truncated when fewer items came back than the reported total
    TotalCount,
    /// Truncated when the page is full and it contributed a new record
    PageCeiling(usize),
}

impl TruncationPolicy {
    /// Whether a page implies hidden matches.
    #[must_use]
    pub fn is_truncated(self, returned: usize, total_count: Option<u64>, new_records: usize) -> bool {
        match self {
            Self::TotalCount => total_count.is_some_and(|total| (returned as u64) < total),
            Self::PageCeiling(ceiling) => returned >= ceiling && new_records > 0,
        }
    }
}
