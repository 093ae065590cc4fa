/// Change alerting.
pub mod webhook;

use crate::model::ChangeRecord;

/// A delivery channel for status changes.
///
/// The orchestrator invokes every configured notifier once per cycle that
/// produced at least one non-NONE change. Delivery failures are logged by the
/// orchestrator and never fail the cycle.
pub trait Notifier {
    /// Where this notifier delivers to, for log lines.
    fn target(&self) -> &str;

    /// Delivers the given changes. `changes` is never empty and never
    /// contains unchanged records.
    fn notify(&self, changes: &[ChangeRecord]) -> Result<(), Box<dyn std::error::Error>>;
}
