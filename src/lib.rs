/// vicmon_service: VIC Emergency incident monitoring service.
///
/// # Module structure
///
/// ```text
/// vicmon_service
/// ├── model       — shared data types (IncidentRecord, Snapshot, ChangeRecord, …)
/// ├── config      — layered settings (defaults → vicmon.toml → environment)
/// ├── logging     — leveled console/file logger with failure classification
/// ├── localities  — Victorian locality registry (name → postcode, coordinates)
/// ├── geocode     — postcode resolution cascade over the registry + Nominatim
/// ├── ingest
/// │   ├── feed     — VIC Emergency incident JSON: HTTP client + tolerant parsing
/// │   └── fixtures — representative feed payloads for tests
/// ├── snapshot    — raw feed records → canonical deduplicated Snapshot
/// ├── tracker     — snapshot diffing and change classification
/// ├── state       — snapshot persistence with atomic replace
/// ├── report      — table/JSON/CSV rendering of a cycle's results
/// ├── alert
/// │   └── webhook — JSON change notifications POSTed to a configured URL
/// ├── schedule    — interval loop with a stop handle
/// └── monitor     — the orchestrator driving one poll cycle end to end
/// ```
pub mod alert;
pub mod config;
pub mod geocode;
pub mod ingest;
pub mod localities;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod report;
pub mod schedule;
pub mod snapshot;
pub mod state;
pub mod tracker;
