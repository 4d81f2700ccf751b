//! Search/social interest metrics consumed by the trending job.
//!
//! Rows are written by the API layer on card views and by the social
//! ingestion task; this crate only needs the kind discriminator and
//! windowed counts.

/// Discriminator for the `search_metrics.kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Search,
    Social,
}

impl MetricKind {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Search => "search",
            MetricKind::Social => "social",
        }
    }
}
