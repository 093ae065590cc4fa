/// Snapshot persistence between poll cycles.
///
/// The previous snapshot lives in a single JSON file with a loosely versioned
/// envelope:
///
/// ```json
/// { "version": 1, "last_poll": "…", "incidents": { "1001": { … } } }
/// ```
///
/// `save` writes to a `.tmp` sibling, flushes, fsyncs, then renames over the
/// target, so a process killed mid-write leaves the previously committed file
/// intact. `load` of a missing file is an empty snapshot; a corrupt file is an
/// error the orchestrator logs and degrades to empty. All record fields carry
/// serde defaults, so files written by older versions load with blanks rather
/// than failing.
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{IncidentRecord, Snapshot};

/// Envelope schema version written by this build.
const STATE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Persisted envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default = "current_version")]
    version: u32,
    #[serde(default = "epoch_utc")]
    last_poll: DateTime<Utc>,
    #[serde(default)]
    incidents: BTreeMap<u64, IncidentRecord>,
}

fn current_version() -> u32 {
    STATE_VERSION
}

fn epoch_utc() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Loads the previously persisted snapshot.
///
/// A missing file is the normal first-run case and yields an empty snapshot.
/// Unreadable or unparseable content is an error; the caller decides whether
/// to degrade (the orchestrator logs it and proceeds as if no prior state
/// existed, which makes every current incident classify as NEW on that run).
pub fn load(path: &Path) -> Result<Snapshot, StateError> {
    if !path.exists() {
        return Ok(Snapshot::empty());
    }

    let text = fs::read_to_string(path)?;
    let persisted: PersistedState = serde_json::from_str(&text)?;

    Ok(Snapshot {
        polled_at: persisted.last_poll,
        incidents: persisted.incidents,
    })
}

/// Durably writes `snapshot` to `path` via temp-file-then-rename.
///
/// The rename is the commit point: a crash before it leaves the old state
/// untouched, a crash after it leaves the new state fully visible. Nothing
/// in between is ever observable through `load`.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<(), StateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let persisted = PersistedState {
        version: STATE_VERSION,
        last_poll: snapshot.polled_at,
        incidents: snapshot.incidents.clone(),
    };
    let body = serde_json::to_string_pretty(&persisted)?;

    let temp_path = temp_sibling(path);
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(body.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Temp file next to the target so the rename stays on one filesystem.
fn temp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "state.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StateError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Io(e) => write!(f, "state file I/O error: {}", e),
            StateError::Json(e) => write!(f, "state file JSON error: {}", e),
        }
    }
}

impl std::error::Error for StateError {}

impl From<std::io::Error> for StateError {
    fn from(e: std::io::Error) -> StateError {
        StateError::Io(e)
    }
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> StateError {
        StateError::Json(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
