/// Snapshot builder: raw feed records → canonical `Snapshot`.
///
/// This is the validation boundary. Everything downstream (tracker, state
/// store, reporter) assumes well-formed records, so the rules live here:
///   - no positive `incidentNo` → rejected (identity is the diff key);
///   - coordinates at the feed's (0, 0) no-position sentinel → rejected,
///     matching the original deployment's Victoria filter;
///   - duplicate ids → deduplicated, keeping the most recent `update_time`;
///   - unparseable `lastUpdateDateTime` → falls back to the poll timestamp.
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::ingest::feed::RawIncident;
use crate::model::{IncidentRecord, Snapshot, FEED_TIME_FORMAT};

/// A built snapshot plus counts of what the builder had to discard. The
/// orchestrator logs the counts; tests assert on them.
#[derive(Debug)]
pub struct BuildOutcome {
    pub snapshot: Snapshot,
    pub skipped_missing_id: usize,
    pub skipped_no_position: usize,
    pub deduplicated: usize,
}

/// Normalizes raw feed records into a snapshot keyed by incident id.
pub fn build_snapshot(records: Vec<RawIncident>, polled_at: DateTime<Utc>) -> BuildOutcome {
    let mut snapshot = Snapshot::new(polled_at);
    let mut skipped_missing_id = 0;
    let mut skipped_no_position = 0;
    let mut deduplicated = 0;

    for raw in records {
        let incident_id = match raw.incident_no {
            Some(id) if id > 0 => id,
            _ => {
                skipped_missing_id += 1;
                continue;
            }
        };

        let latitude = raw.latitude.unwrap_or(0.0);
        let longitude = raw.longitude.unwrap_or(0.0);
        if latitude == 0.0 || longitude == 0.0 {
            skipped_no_position += 1;
            continue;
        }

        let record = IncidentRecord {
            incident_id,
            postcode: String::new(),
            incident_status: raw.incident_status.unwrap_or_default(),
            category: raw.category2.unwrap_or_default(),
            origin_status: raw.origin_status.unwrap_or_default(),
            location_name: location_name(raw.incident_location, raw.name),
            update_time: parse_update_time(raw.last_update_date_time.as_deref(), polled_at),
            municipality: raw.municipality.unwrap_or_default(),
            latitude,
            longitude,
        };

        match snapshot.incidents.get(&incident_id) {
            Some(existing) if existing.update_time >= record.update_time => {
                deduplicated += 1;
            }
            Some(_) => {
                deduplicated += 1;
                snapshot.incidents.insert(incident_id, record);
            }
            None => {
                snapshot.incidents.insert(incident_id, record);
            }
        }
    }

    BuildOutcome {
        snapshot,
        skipped_missing_id,
        skipped_no_position,
        deduplicated,
    }
}

/// The feed's `incidentLocation` is usually the better description; `name`
/// is the fallback when it is missing or blank.
fn location_name(location: Option<String>, name: Option<String>) -> String {
    match location {
        Some(l) if !l.trim().is_empty() => l,
        _ => name.unwrap_or_default(),
    }
}

/// Parses the feed's `DD/MM/YYYY HH:MM:SS` timestamp, falling back to the
/// poll time when missing or malformed.
fn parse_update_time(raw: Option<&str>, polled_at: DateTime<Utc>) -> NaiveDateTime {
    raw.and_then(|s| NaiveDateTime::parse_from_str(s.trim(), FEED_TIME_FORMAT).ok())
        .unwrap_or_else(|| polled_at.naive_utc())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
