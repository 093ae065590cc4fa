/// Status change detection between two snapshots.
///
/// The classification rules, in the order they apply to an incident present
/// in both snapshots:
///   1. Either side's origin status unrecognized → NONE. Unknown is
///      incomparable, so a feed typo can never fabricate an escalation or a
///      resolution.
///   2. Current is SAFE and previous was not → RESOLVED, regardless of how
///      many severity levels were skipped.
///   3. Lower rank than before (more severe) → UPGRADE.
///   4. Higher rank than before → DOWNGRADE.
///   5. Same rank → NONE.
///
/// Every function here is a pure function of its inputs. Output order is
/// always `incident_id` ascending, which falls out of the snapshot's
/// `BTreeMap` iteration.
use crate::model::{ChangeKind, ChangeRecord, IncidentRecord, SeverityLevel, Snapshot};

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

/// Compares `current` against `previous` and returns one `ChangeRecord` per
/// current incident, in `incident_id` order. Unchanged incidents are included
/// with `ChangeKind::Unchanged`; callers that only want movement filter with
/// `changes_only`.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<ChangeRecord> {
    current
        .incidents
        .values()
        .map(|incident| {
            let prior = previous.incidents.get(&incident.incident_id);
            let kind = classify(prior, incident);
            ChangeRecord {
                incident_id: incident.incident_id,
                kind,
                previous_origin_status: prior.map(|p| p.origin_status.clone()),
                current_origin_status: incident.origin_status.clone(),
                incident: incident.clone(),
            }
        })
        .collect()
}

/// Incidents present in `previous` but absent from `current`, id-ascending.
///
/// Vanishing from the feed is a distinct signal from RESOLVED (the feed never
/// told us the incident was safe), so these are surfaced separately rather
/// than classified as a change.
pub fn dropped_incidents(previous: &Snapshot, current: &Snapshot) -> Vec<IncidentRecord> {
    previous
        .incidents
        .values()
        .filter(|incident| !current.incidents.contains_key(&incident.incident_id))
        .cloned()
        .collect()
}

/// Filters a diff down to the records that represent actual movement.
pub fn changes_only(records: &[ChangeRecord]) -> Vec<ChangeRecord> {
    records
        .iter()
        .filter(|r| r.kind != ChangeKind::Unchanged)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn classify(previous: Option<&IncidentRecord>, current: &IncidentRecord) -> ChangeKind {
    let previous = match previous {
        None => return ChangeKind::New,
        Some(p) => p,
    };

    let prev_level = SeverityLevel::from_origin_status(&previous.origin_status);
    let cur_level = SeverityLevel::from_origin_status(&current.origin_status);

    // Unknown on either side short-circuits everything, including the
    // RESOLVED rule: "garbage → SAFE" is not a resolution we can trust.
    let (prev_rank, cur_rank) = match (prev_level.rank(), cur_level.rank()) {
        (Some(p), Some(c)) => (p, c),
        _ => return ChangeKind::Unchanged,
    };

    if cur_level == SeverityLevel::Safe && prev_level != SeverityLevel::Safe {
        return ChangeKind::Resolved;
    }

    if cur_rank < prev_rank {
        ChangeKind::Upgrade
    } else if cur_rank > prev_rank {
        ChangeKind::Downgrade
    } else {
        ChangeKind::Unchanged
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn incident(id: u64, origin_status: &str) -> IncidentRecord {
        IncidentRecord {
            incident_id: id,
            postcode: String::new(),
            incident_status: "Responding".to_string(),
            category: "Fire".to_string(),
            origin_status: origin_status.to_string(),
            location_name: format!("LOCATION {}", id),
            update_time: Utc
                .with_ymd_and_hms(2024, 11, 2, 14, 30, 0)
                .unwrap()
                .naive_utc(),
            municipality: String::new(),
            latitude: -37.8,
            longitude: 145.0,
        }
    }

    fn snapshot_of(incidents: Vec<IncidentRecord>) -> Snapshot {
        let mut snapshot = Snapshot::new(Utc.with_ymd_and_hms(2024, 11, 2, 15, 0, 0).unwrap());
        for i in incidents {
            snapshot.incidents.insert(i.incident_id, i);
        }
        snapshot
    }

    fn kinds(records: &[ChangeRecord]) -> Vec<(u64, ChangeKind)> {
        records.iter().map(|r| (r.incident_id, r.kind)).collect()
    }

    // --- NEW ----------------------------------------------------------------

    #[test]
    fn test_incident_absent_from_previous_is_new() {
        let previous = Snapshot::empty();
        let current = snapshot_of(vec![incident(1001, "GOING")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::New)]);
        assert_eq!(records[0].previous_origin_status, None);
        assert_eq!(records[0].current_origin_status, "GOING");
    }

    // --- UPGRADE / DOWNGRADE ------------------------------------------------

    #[test]
    fn test_contained_to_going_is_upgrade() {
        let previous = snapshot_of(vec![incident(1001, "CONTAINED")]);
        let current = snapshot_of(vec![incident(1001, "GOING")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Upgrade)]);
        assert_eq!(records[0].previous_origin_status.as_deref(), Some("CONTAINED"));
    }

    #[test]
    fn test_going_to_contained_is_downgrade() {
        let previous = snapshot_of(vec![incident(1001, "GOING")]);
        let current = snapshot_of(vec![incident(1001, "CONTAINED")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Downgrade)]);
    }

    #[test]
    fn test_contained_to_controlled_is_downgrade() {
        let previous = snapshot_of(vec![incident(1001, "CONTAINED")]);
        let current = snapshot_of(vec![incident(1001, "CONTROLLED")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Downgrade)]);
    }

    #[test]
    fn test_responding_and_going_share_a_rank() {
        // Both mean crews engaged; flipping between them is not a change.
        let previous = snapshot_of(vec![incident(1001, "RESPONDING")]);
        let current = snapshot_of(vec![incident(1001, "GOING")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Unchanged)]);
    }

    // --- RESOLVED -----------------------------------------------------------

    #[test]
    fn test_going_to_safe_is_resolved_not_downgrade() {
        // SAFE is terminal: the level jump from 1 to 4 would read as a
        // DOWNGRADE numerically, but resolution takes priority.
        let previous = snapshot_of(vec![incident(3003, "GOING")]);
        let current = snapshot_of(vec![incident(3003, "SAFE")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(3003, ChangeKind::Resolved)]);
    }

    #[test]
    fn test_controlled_to_safe_is_resolved() {
        let previous = snapshot_of(vec![incident(1001, "CONTROLLED")]);
        let current = snapshot_of(vec![incident(1001, "SAFE")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Resolved)]);
    }

    #[test]
    fn test_safe_to_safe_is_unchanged() {
        let previous = snapshot_of(vec![incident(1001, "SAFE")]);
        let current = snapshot_of(vec![incident(1001, "SAFE")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Unchanged)]);
    }

    // --- Unknown severity ---------------------------------------------------

    #[test]
    fn test_unknown_current_status_is_unchanged() {
        let previous = snapshot_of(vec![incident(1001, "GOING")]);
        let current = snapshot_of(vec![incident(1001, "ESCALATING")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Unchanged)]);
    }

    #[test]
    fn test_unknown_previous_status_never_reads_as_resolved() {
        // The RESOLVED rule must not fire when the prior status is garbage.
        let previous = snapshot_of(vec![incident(1001, "???")]);
        let current = snapshot_of(vec![incident(1001, "SAFE")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Unchanged)]);
    }

    #[test]
    fn test_unknown_on_both_sides_is_unchanged() {
        let previous = snapshot_of(vec![incident(1001, "PATROLLED")]);
        let current = snapshot_of(vec![incident(1001, "MONITORING")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Unchanged)]);
    }

    #[test]
    fn test_empty_status_is_unknown() {
        let previous = snapshot_of(vec![incident(1001, "")]);
        let current = snapshot_of(vec![incident(1001, "GOING")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Unchanged)]);
    }

    #[test]
    fn test_status_matching_is_case_insensitive() {
        let previous = snapshot_of(vec![incident(1001, "contained")]);
        let current = snapshot_of(vec![incident(1001, "Going")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Upgrade)]);
    }

    // --- Ordering and determinism -------------------------------------------

    #[test]
    fn test_mixed_diff_is_ordered_by_incident_id() {
        // The §8 end-to-end scenario: 1001 escalates, 2002 appears.
        let previous = snapshot_of(vec![incident(1001, "CONTAINED")]);
        let current = snapshot_of(vec![incident(2002, "GOING"), incident(1001, "GOING")]);

        let records = diff(&previous, &current);
        assert_eq!(
            kinds(&records),
            vec![(1001, ChangeKind::Upgrade), (2002, ChangeKind::New)]
        );
    }

    #[test]
    fn test_diff_is_deterministic() {
        let previous = snapshot_of(vec![incident(5, "GOING"), incident(9, "CONTAINED")]);
        let current = snapshot_of(vec![
            incident(5, "SAFE"),
            incident(9, "GOING"),
            incident(12, "CONTROLLED"),
        ]);

        let first = diff(&previous, &current);
        let second = diff(&previous, &current);
        assert_eq!(first, second);
    }

    #[test]
    fn test_identical_snapshots_yield_single_unchanged_record() {
        // The documented convention: one record per current incident, NONE
        // included. Reporting filters, the tracker does not.
        let previous = snapshot_of(vec![incident(1001, "CONTROLLED")]);
        let current = previous.clone();

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Unchanged)]);
    }

    #[test]
    fn test_empty_previous_marks_everything_new() {
        let previous = Snapshot::empty();
        let current = snapshot_of(vec![
            incident(3, "SAFE"),
            incident(1, "GOING"),
            incident(2, "CONTAINED"),
        ]);

        let records = diff(&previous, &current);
        assert_eq!(
            kinds(&records),
            vec![
                (1, ChangeKind::New),
                (2, ChangeKind::New),
                (3, ChangeKind::New),
            ]
        );
    }

    // --- Dropped ------------------------------------------------------------

    #[test]
    fn test_dropped_incidents_are_not_change_records() {
        let previous = snapshot_of(vec![incident(1001, "GOING"), incident(2002, "CONTAINED")]);
        let current = snapshot_of(vec![incident(1001, "GOING")]);

        let records = diff(&previous, &current);
        assert_eq!(kinds(&records), vec![(1001, ChangeKind::Unchanged)]);

        let dropped = dropped_incidents(&previous, &current);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].incident_id, 2002);
    }

    #[test]
    fn test_dropped_is_empty_when_all_incidents_persist() {
        let previous = snapshot_of(vec![incident(1001, "GOING")]);
        let current = snapshot_of(vec![incident(1001, "SAFE"), incident(2002, "GOING")]);

        assert!(dropped_incidents(&previous, &current).is_empty());
    }

    // --- changes_only -------------------------------------------------------

    #[test]
    fn test_changes_only_strips_unchanged_records() {
        let previous = snapshot_of(vec![incident(1, "GOING"), incident(2, "CONTAINED")]);
        let current = snapshot_of(vec![
            incident(1, "GOING"),
            incident(2, "GOING"),
            incident(3, "GOING"),
        ]);

        let records = diff(&previous, &current);
        let filtered = changes_only(&records);
        assert_eq!(
            kinds(&filtered),
            vec![(2, ChangeKind::Upgrade), (3, ChangeKind::New)]
        );
    }
}
