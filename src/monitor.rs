/// The monitor orchestrator: one poll cycle end to end.
///
/// A cycle is strictly sequential: load prior state, fetch, build the
/// snapshot, geocode, diff, persist, then report and alert. Failure handling
/// follows the severity of the step:
///   - fetch/parse failure aborts the cycle (persisted state untouched);
///   - geocode failures leave the postcode empty;
///   - a corrupt state file degrades to "no prior state";
///   - a save failure is logged and the cycle still reports — the next cycle
///     just re-diffs against stale state;
///   - alert delivery failures are logged, never propagated.
use chrono::Utc;

use crate::alert::webhook::WebhookNotifier;
use crate::alert::Notifier;
use crate::config::Config;
use crate::geocode::PostcodeResolver;
use crate::ingest::IncidentSource;
use crate::logging::{self, Subsystem};
use crate::model::{ChangeRecord, FeedError, IncidentRecord, Snapshot};
use crate::report::{self, OutputFormat};
use crate::{snapshot, state, tracker};

/// Everything one cycle produced. `records` is the full per-incident diff
/// (unchanged included); `changes` is the non-NONE subset handed to alerters.
#[derive(Debug)]
pub struct CycleOutcome {
    pub snapshot: Snapshot,
    pub records: Vec<ChangeRecord>,
    pub changes: Vec<ChangeRecord>,
    pub dropped: Vec<IncidentRecord>,
    pub state_saved: bool,
}

pub struct Monitor {
    config: Config,
    source: Box<dyn IncidentSource>,
    resolver: PostcodeResolver,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Monitor {
    /// Builds a monitor with the production collaborators implied by the
    /// config: a geocoder (online or registry-only) and a webhook notifier
    /// when a URL is configured. The incident source is always injected, so
    /// tests can script the feed.
    pub fn new(config: Config, source: Box<dyn IncidentSource>) -> Monitor {
        let resolver = PostcodeResolver::new(config.geocode_online, config.request_timeout_secs);

        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(url) = config.webhook_url.clone() {
            match WebhookNotifier::new(url.clone(), &config) {
                Ok(notifier) => notifiers.push(Box::new(notifier)),
                Err(e) => logging::warn(
                    Subsystem::Webhook,
                    None,
                    &format!("cannot build webhook notifier for {}: {}", url, e),
                ),
            }
        }

        Monitor {
            config,
            source,
            resolver,
            notifiers,
        }
    }

    pub fn push_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Runs one cycle without reporting or alerting: load → fetch → build →
    /// geocode → diff → persist.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome, FeedError> {
        let prior = match state::load(&self.config.state_file) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                logging::warn(
                    Subsystem::State,
                    None,
                    &format!("cannot load prior state, treating as first run: {}", e),
                );
                Snapshot::empty()
            }
        };

        let raw = self.source.fetch_incidents()?;
        logging::info(
            Subsystem::Feed,
            None,
            &format!("retrieved {} raw records from {}", raw.len(), self.source.origin()),
        );

        let built = snapshot::build_snapshot(raw, Utc::now());
        if built.skipped_missing_id > 0 {
            logging::warn(
                Subsystem::Feed,
                None,
                &format!("skipped {} records without an incident number", built.skipped_missing_id),
            );
        }
        if built.skipped_no_position > 0 {
            logging::debug(
                Subsystem::Feed,
                None,
                &format!("skipped {} records with no position", built.skipped_no_position),
            );
        }
        let mut current = built.snapshot;

        for record in current.incidents.values_mut() {
            if !record.postcode.is_empty() {
                continue;
            }
            match self.resolver.resolve(record) {
                Some(postcode) => record.postcode = postcode,
                None => logging::debug(
                    Subsystem::Geocode,
                    Some(&record.incident_id.to_string()),
                    &format!("no postcode for '{}'", record.location_name),
                ),
            }
        }

        let records = tracker::diff(&prior, &current);
        let changes = tracker::changes_only(&records);
        let dropped = tracker::dropped_incidents(&prior, &current);
        for incident in &dropped {
            logging::warn(
                Subsystem::System,
                Some(&incident.incident_id.to_string()),
                &format!(
                    "incident vanished from feed (last status {})",
                    if incident.origin_status.is_empty() {
                        "unknown"
                    } else {
                        incident.origin_status.as_str()
                    }
                ),
            );
        }

        let state_saved = match state::save(&self.config.state_file, &current) {
            Ok(()) => true,
            Err(e) => {
                logging::error(
                    Subsystem::State,
                    None,
                    &format!("cannot persist snapshot, next cycle will re-diff stale state: {}", e),
                );
                false
            }
        };

        logging::log_cycle_summary(current.len(), changes.len(), dropped.len());

        Ok(CycleOutcome {
            snapshot: current,
            records,
            changes,
            dropped,
            state_saved,
        })
    }

    /// Runs one cycle and hands the results to the reporter (stdout) and
    /// every configured notifier.
    pub fn run_once(&mut self, changes_only: bool) -> Result<CycleOutcome, FeedError> {
        let outcome = self.run_cycle()?;

        let rows = if changes_only {
            &outcome.changes
        } else {
            &outcome.records
        };

        if changes_only && rows.is_empty() {
            println!("No status changes detected since last check.");
        } else {
            println!("{}", report::render(self.config.output_format, rows));
            if self.config.output_format == OutputFormat::Table {
                println!();
                println!(
                    "{}",
                    report::render_summary(outcome.snapshot.len(), &outcome.changes, outcome.dropped.len())
                );
            }
        }

        if !outcome.changes.is_empty() {
            for notifier in &self.notifiers {
                if let Err(e) = notifier.notify(&outcome.changes) {
                    logging::log_webhook_failure(notifier.target(), &*e);
                }
            }
        }

        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::feed::RawIncident;
    use crate::model::ChangeKind;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;

    /// Source that serves a fixed batch, or a feed error.
    struct ScriptedSource {
        batches: Mutex<Vec<Result<Vec<RawIncident>, FeedError>>>,
    }

    impl ScriptedSource {
        fn new(batches: Vec<Result<Vec<RawIncident>, FeedError>>) -> ScriptedSource {
            ScriptedSource {
                batches: Mutex::new(batches),
            }
        }
    }

    impl IncidentSource for ScriptedSource {
        fn origin(&self) -> &str {
            "scripted"
        }

        fn fetch_incidents(&self) -> Result<Vec<RawIncident>, FeedError> {
            self.batches.lock().unwrap().remove(0)
        }
    }

    fn raw(id: u64, origin_status: &str) -> RawIncident {
        RawIncident {
            incident_no: Some(id),
            origin_status: Some(origin_status.to_string()),
            incident_status: Some("Responding".to_string()),
            category2: Some("Bush Fire".to_string()),
            incident_location: Some("BURWOOD HWY, FERNTREE GULLY".to_string()),
            latitude: Some(-37.8866),
            longitude: Some(145.2950),
            last_update_date_time: Some("02/11/2024 14:30:00".to_string()),
            ..RawIncident::default()
        }
    }

    fn test_config(dir: &tempfile::TempDir) -> Config {
        Config {
            state_file: dir.path().join("state.json"),
            geocode_online: false,
            webhook_url: None,
            ..Config::default()
        }
    }

    fn monitor_with(
        dir: &tempfile::TempDir,
        batches: Vec<Result<Vec<RawIncident>, FeedError>>,
    ) -> Monitor {
        Monitor::new(test_config(dir), Box::new(ScriptedSource::new(batches)))
    }

    #[test]
    fn test_first_cycle_classifies_everything_new_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = monitor_with(&dir, vec![Ok(vec![raw(1001, "CONTAINED")])]);

        let outcome = monitor.run_cycle().expect("cycle should succeed");
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].kind, ChangeKind::New);
        assert!(outcome.state_saved);
        assert!(dir.path().join("state.json").exists());
    }

    #[test]
    fn test_second_cycle_diffs_against_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = monitor_with(
            &dir,
            vec![
                Ok(vec![raw(1001, "CONTAINED")]),
                Ok(vec![raw(1001, "GOING"), raw(2002, "GOING")]),
            ],
        );

        monitor.run_cycle().unwrap();
        let outcome = monitor.run_cycle().unwrap();

        let kinds: Vec<(u64, ChangeKind)> =
            outcome.changes.iter().map(|c| (c.incident_id, c.kind)).collect();
        assert_eq!(
            kinds,
            vec![(1001, ChangeKind::Upgrade), (2002, ChangeKind::New)]
        );
    }

    #[test]
    fn test_fetch_failure_aborts_cycle_and_preserves_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = monitor_with(
            &dir,
            vec![
                Ok(vec![raw(1001, "GOING")]),
                Err(FeedError::HttpError(503)),
                Ok(vec![raw(1001, "SAFE")]),
            ],
        );

        monitor.run_cycle().unwrap();
        let err = monitor.run_cycle().expect_err("feed outage should abort the cycle");
        assert_eq!(err, FeedError::HttpError(503));

        // The failed cycle must not have touched state: the third cycle still
        // diffs GOING → SAFE.
        let outcome = monitor.run_cycle().unwrap();
        assert_eq!(outcome.changes[0].kind, ChangeKind::Resolved);
    }

    #[test]
    fn test_cycle_geocodes_incidents_offline() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = monitor_with(&dir, vec![Ok(vec![raw(1001, "GOING")])]);

        let outcome = monitor.run_cycle().unwrap();
        assert_eq!(outcome.snapshot.incidents[&1001].postcode, "3156");
    }

    /// Records whether it was invoked. `Rc<RefCell<…>>` keeps the test's view
    /// of the call log after the notifier moves into the monitor.
    struct RecordingNotifier {
        calls: Rc<RefCell<Vec<usize>>>,
    }

    impl Notifier for RecordingNotifier {
        fn target(&self) -> &str {
            "recording"
        }

        fn notify(&self, changes: &[ChangeRecord]) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.borrow_mut().push(changes.len());
            Ok(())
        }
    }

    #[test]
    fn test_notifier_skipped_when_nothing_changed() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = monitor_with(
            &dir,
            vec![
                Ok(vec![raw(1001, "GOING")]),
                Ok(vec![raw(1001, "GOING")]),
            ],
        );
        let calls = Rc::new(RefCell::new(Vec::new()));
        monitor.push_notifier(Box::new(RecordingNotifier {
            calls: Rc::clone(&calls),
        }));

        monitor.run_once(false).unwrap(); // first cycle: NEW, notified
        monitor.run_once(false).unwrap(); // second cycle: all NONE, skipped

        assert_eq!(*calls.borrow(), vec![1]);
    }

    #[test]
    fn test_failing_notifier_does_not_fail_the_cycle() {
        struct FailingNotifier;
        impl Notifier for FailingNotifier {
            fn target(&self) -> &str {
                "https://hooks.example.com/down"
            }
            fn notify(&self, _: &[ChangeRecord]) -> Result<(), Box<dyn std::error::Error>> {
                Err("HTTP error: 502".into())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut monitor = monitor_with(&dir, vec![Ok(vec![raw(1001, "GOING")])]);
        monitor.push_notifier(Box::new(FailingNotifier));

        let outcome = monitor.run_once(false).expect("delivery failure is not fatal");
        assert_eq!(outcome.changes.len(), 1);
    }

    #[test]
    fn test_corrupt_state_degrades_to_first_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(dir.path().join("state.json"), "not json at all").unwrap();

        let mut monitor = monitor_with(&dir, vec![Ok(vec![raw(1001, "GOING")])]);
        let outcome = monitor.run_cycle().expect("corrupt state is not fatal");
        assert_eq!(outcome.changes[0].kind, ChangeKind::New);
    }
}
