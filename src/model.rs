/// Core data types for the VIC Emergency monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// It performs no I/O: types, the severity ordering over origin status codes,
/// and the feed error enum.
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Feed constants
// ---------------------------------------------------------------------------

/// Timestamp format of the feed's `lastUpdateDateTime` field,
/// e.g. "25/12/2023 14:30:00".
pub const FEED_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

// ---------------------------------------------------------------------------
// Incident types
// ---------------------------------------------------------------------------

/// One emergency incident as observed in a single poll of the feed.
///
/// Built by `snapshot::build_snapshot` from a raw feed record, enriched with
/// a postcode by the geocoder, then serialized as-is into the state file.
/// `update_time` stays naive because the feed reports local wall-clock time
/// with no offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    #[serde(default)]
    pub incident_id: u64,
    #[serde(default)]
    pub postcode: String, // 4-digit Victorian postcode, empty if unresolved
    #[serde(default)]
    pub incident_status: String, // display status text, e.g. "Responding"
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub origin_status: String, // raw status code, e.g. "GOING"
    #[serde(default)]
    pub location_name: String,
    #[serde(default = "epoch_naive")]
    pub update_time: NaiveDateTime,
    #[serde(default)]
    pub municipality: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

fn epoch_naive() -> NaiveDateTime {
    DateTime::UNIX_EPOCH.naive_utc()
}

/// The complete set of incidents observed in one poll cycle.
///
/// Keyed by `incident_id` in a `BTreeMap`, so iteration (and therefore every
/// diff and every report) is id-ascending and deterministic. Built fresh each
/// cycle; treated as immutable once handed to the tracker and state store.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub polled_at: DateTime<Utc>,
    pub incidents: BTreeMap<u64, IncidentRecord>,
}

impl Snapshot {
    pub fn new(polled_at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            polled_at,
            incidents: BTreeMap::new(),
        }
    }

    /// Zero incidents, epoch timestamp. What `state::load` hands back when no
    /// prior state exists.
    pub fn empty() -> Snapshot {
        Snapshot::new(DateTime::UNIX_EPOCH)
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Severity ordering
// ---------------------------------------------------------------------------

/// Severity rank derived from an incident's raw origin status code.
///
/// Lower rank is more severe. RESPONDING and GOING share rank 1: both mean
/// crews are actively engaged. Unrecognized codes map to `Unknown`, which has
/// no rank and never drives an upgrade, downgrade, or resolved classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityLevel {
    Responding, // RESPONDING / GOING, rank 1
    Contained,  // rank 2
    Controlled, // rank 3
    Safe,       // rank 4
    Unknown,    // unrecognized origin status, incomparable
}

impl SeverityLevel {
    /// Classify a raw origin status code. Case-insensitive, surrounding
    /// whitespace ignored.
    pub fn from_origin_status(origin_status: &str) -> SeverityLevel {
        match origin_status.trim().to_ascii_uppercase().as_str() {
            "RESPONDING" | "GOING" => SeverityLevel::Responding,
            "CONTAINED" => SeverityLevel::Contained,
            "CONTROLLED" => SeverityLevel::Controlled,
            "SAFE" => SeverityLevel::Safe,
            _ => SeverityLevel::Unknown,
        }
    }

    /// Numeric rank, 1 (most severe) through 4 (safe); `None` for `Unknown`.
    pub fn rank(self) -> Option<u8> {
        match self {
            SeverityLevel::Responding => Some(1),
            SeverityLevel::Contained => Some(2),
            SeverityLevel::Controlled => Some(3),
            SeverityLevel::Safe => Some(4),
            SeverityLevel::Unknown => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Change types
// ---------------------------------------------------------------------------

/// Classification of one incident's transition between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    New,
    Upgrade,
    Downgrade,
    Resolved,
    Unchanged,
}

impl ChangeKind {
    /// Label used in the report's Change column and the webhook payload.
    /// Empty for `Unchanged`.
    pub fn label(self) -> &'static str {
        match self {
            ChangeKind::New => "NEW",
            ChangeKind::Upgrade => "UPGRADE",
            ChangeKind::Downgrade => "DOWNGRADE",
            ChangeKind::Resolved => "RESOLVED",
            ChangeKind::Unchanged => "",
        }
    }
}

/// One incident's classified transition, produced by `tracker::diff`.
///
/// Carries the full current record so reporters and alerters need no second
/// lookup. Never persisted; only snapshots are.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub incident_id: u64,
    pub kind: ChangeKind,
    pub previous_origin_status: Option<String>,
    pub current_origin_status: String,
    pub incident: IncidentRecord,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or parsing the incident feed.
#[derive(Debug, PartialEq)]
pub enum FeedError {
    /// Non-2xx HTTP response from the feed endpoint.
    HttpError(u16),
    /// The request itself failed (DNS, connect, timeout).
    RequestError(String),
    /// The response body could not be deserialized.
    ParseError(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::HttpError(code) => write!(f, "HTTP error: {}", code),
            FeedError::RequestError(msg) => write!(f, "Request error: {}", msg),
            FeedError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}
