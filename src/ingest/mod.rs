/// Feed ingestion: the incident source seam and its HTTP implementation.
pub mod feed;
pub mod fixtures;

use crate::model::FeedError;
use feed::RawIncident;

/// Anything that can produce a batch of raw incident records.
///
/// The production implementation is `feed::FeedClient`; tests inject scripted
/// sources so cycles run without a network.
pub trait IncidentSource {
    /// Human-readable origin for log lines.
    fn origin(&self) -> &str;

    /// Fetches the current raw incident records. A failure here aborts the
    /// calling cycle; it never aborts the scheduling loop.
    fn fetch_incidents(&self) -> Result<Vec<RawIncident>, FeedError>;
}
