use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Failure to obtain either payload. Aborts the whole run; nothing downstream
/// executes on partial data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("received 304 from {url} without a cached body")]
    NotModifiedWithoutCache { url: String },

    #[error("invalid json from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A recoverable problem found while normalizing one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Issue {
    /// A field was present but not numeric.
    Coercion { field: &'static str },
    /// A team id or element type had no match.
    LookupMiss { kind: LookupKind },
    /// The record was not an object or had no display name; it was dropped.
    MalformedRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LookupKind {
    Team,
    Position,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::Coercion { field } => write!(f, "non-numeric {field}"),
            Issue::LookupMiss { kind: LookupKind::Team } => f.write_str("unknown team id"),
            Issue::LookupMiss {
                kind: LookupKind::Position,
            } => f.write_str("unknown element type"),
            Issue::MalformedRecord => f.write_str("malformed player record"),
        }
    }
}

/// Tally of recovered issues for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub records_seen: usize,
    pub records_kept: usize,
    pub issues: BTreeMap<Issue, usize>,
}

impl NormalizeReport {
    pub fn record(&mut self, issue: Issue) {
        *self.issues.entry(issue).or_insert(0) += 1;
    }

    pub fn count(&self, issue: Issue) -> usize {
        self.issues.get(&issue).copied().unwrap_or(0)
    }

    pub fn skipped(&self) -> usize {
        self.count(Issue::MalformedRecord)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.issues.is_empty() {
            return format!("{} players, no issues", self.records_kept);
        }
        let parts = self
            .issues
            .iter()
            .map(|(issue, n)| format!("{issue} x{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} players ({parts})", self.records_kept)
    }
}
