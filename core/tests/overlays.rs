//! Overlay resolver: transfer/role-change precedence and the
//! creation-timestamp tie-break for overlapping ranges.

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{
    model::{Collaborator, RoleChange, ShiftPattern, TemporaryTransfer},
    overlay::{effective_assignment, CellSource},
    overrides,
    snapshot::RosterSnapshot,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

fn fixture() -> RosterSnapshot {
    let mut snapshot = RosterSnapshot::default();
    snapshot.collaborators.push(Collaborator {
        collaborator_id: "ana".into(),
        name:            "Ana Quispe".into(),
        job_title:       "Cajero".into(),
        location:        "CENTRO".into(),
    });
    snapshot.patterns.insert(
        "Cajero".into(),
        ShiftPattern {
            job_title: "Cajero".into(),
            cycle: vec!["M8".into(), "T8".into(), "N8".into(), "LIB".into(), "LIB".into()],
            rest_code: "LIB".into(),
            anchor: d(2026, 8, 1),
        },
    );
    snapshot.patterns.insert(
        "Supervisor".into(),
        ShiftPattern {
            job_title: "Supervisor".into(),
            cycle: vec!["S1".into(), "S2".into(), "LIB".into()],
            rest_code: "LIB".into(),
            anchor: d(2026, 8, 1),
        },
    );
    snapshot
}

fn ana(snapshot: &RosterSnapshot) -> &Collaborator {
    &snapshot.collaborators[0]
}

fn transfer(id: &str, location: &str, from: NaiveDate, to: NaiveDate, secs: i64) -> TemporaryTransfer {
    TemporaryTransfer {
        transfer_id:     id.into(),
        collaborator_id: "ana".into(),
        location:        location.into(),
        starts_on:       from,
        ends_on:         to,
        created_at:      at(secs),
    }
}

/// A standalone transfer changes location only; job title and pattern
/// cycle stay with the base job title.
#[test]
fn transfer_overrides_location_only() {
    let mut snapshot = fixture();
    snapshot
        .transfers
        .push(transfer("t1", "NORTE", d(2026, 8, 10), d(2026, 8, 12), 100));

    let a = effective_assignment(&snapshot, ana(&snapshot), d(2026, 8, 10)).unwrap();
    assert_eq!(a.job_title, "Cajero");
    assert_eq!(a.location, "NORTE");
    assert_eq!(a.source, CellSource::Transfer);
    // Day offset 9, 9 mod 5 = 4 -> rest day, still Cajero's cycle.
    assert_eq!(a.shift_code, "LIB");
}

/// A role change containing the same day beats a transfer for both
/// fields, and switches the governing cycle.
#[test]
fn role_change_beats_transfer() {
    let mut snapshot = fixture();
    snapshot
        .transfers
        .push(transfer("t1", "SUR", d(2026, 8, 10), d(2026, 8, 14), 100));
    snapshot.role_changes.push(RoleChange {
        role_change_id:  "r1".into(),
        collaborator_id: "ana".into(),
        job_title:       "Supervisor".into(),
        location:        "NORTE".into(),
        starts_on:       d(2026, 8, 11),
        ends_on:         d(2026, 8, 13),
        created_at:      at(50),
    });

    let a = effective_assignment(&snapshot, ana(&snapshot), d(2026, 8, 11)).unwrap();
    assert_eq!(a.job_title, "Supervisor");
    assert_eq!(a.location, "NORTE");
    assert_eq!(a.source, CellSource::RoleChange);
    // Supervisor cycle: offset 10, 10 mod 3 = 1 -> "S2".
    assert_eq!(a.shift_code, "S2");

    // Day after the role change ends, the transfer applies again.
    let a = effective_assignment(&snapshot, ana(&snapshot), d(2026, 8, 14)).unwrap();
    assert_eq!(a.job_title, "Cajero");
    assert_eq!(a.location, "SUR");
    assert_eq!(a.source, CellSource::Transfer);
}

/// Without overlays in range, the base assignment stands.
#[test]
fn base_assignment_outside_overlay_ranges() {
    let mut snapshot = fixture();
    snapshot
        .transfers
        .push(transfer("t1", "NORTE", d(2026, 8, 10), d(2026, 8, 12), 100));

    let a = effective_assignment(&snapshot, ana(&snapshot), d(2026, 8, 20)).unwrap();
    assert_eq!(a.job_title, "Cajero");
    assert_eq!(a.location, "CENTRO");
    assert_eq!(a.source, CellSource::Pattern);
}

/// Overlapping transfers are a data-entry conflict: the most recently
/// created wins, and resolution must not fail.
#[test]
fn overlapping_transfers_later_creation_wins() {
    let mut snapshot = fixture();
    snapshot
        .transfers
        .push(transfer("t1", "NORTE", d(2026, 8, 10), d(2026, 8, 20), 100));
    snapshot
        .transfers
        .push(transfer("t2", "SUR", d(2026, 8, 15), d(2026, 8, 18), 200));

    let a = effective_assignment(&snapshot, ana(&snapshot), d(2026, 8, 16)).unwrap();
    assert_eq!(a.location, "SUR", "later-created transfer must win");

    // Outside t2's range only t1 applies.
    let a = effective_assignment(&snapshot, ana(&snapshot), d(2026, 8, 19)).unwrap();
    assert_eq!(a.location, "NORTE");
}

/// Same tie-break for role changes, independent of insertion order.
#[test]
fn overlapping_role_changes_later_creation_wins() {
    let mut snapshot = fixture();
    // Inserted newest-first on purpose: creation time must decide,
    // not storage order.
    snapshot.role_changes.push(RoleChange {
        role_change_id:  "r2".into(),
        collaborator_id: "ana".into(),
        job_title:       "Supervisor".into(),
        location:        "SUR".into(),
        starts_on:       d(2026, 8, 10),
        ends_on:         d(2026, 8, 15),
        created_at:      at(900),
    });
    snapshot.role_changes.push(RoleChange {
        role_change_id:  "r1".into(),
        collaborator_id: "ana".into(),
        job_title:       "Supervisor".into(),
        location:        "NORTE".into(),
        starts_on:       d(2026, 8, 10),
        ends_on:         d(2026, 8, 15),
        created_at:      at(100),
    });

    let a = effective_assignment(&snapshot, ana(&snapshot), d(2026, 8, 12)).unwrap();
    assert_eq!(a.location, "SUR", "later-created role change must win");
}

/// Snapshot overlay lookups filter by collaborator id, including ids
/// borrowed from short-lived strings.
#[test]
fn overlay_lookups_filter_by_collaborator() {
    let mut snapshot = fixture();
    snapshot
        .transfers
        .push(transfer("t1", "NORTE", d(2026, 8, 10), d(2026, 8, 12), 100));
    let mut other = transfer("t2", "SUR", d(2026, 8, 10), d(2026, 8, 12), 100);
    other.collaborator_id = "zoe".into();
    snapshot.transfers.push(other);
    snapshot.role_changes.push(RoleChange {
        role_change_id:  "r1".into(),
        collaborator_id: "zoe".into(),
        job_title:       "Supervisor".into(),
        location:        "NORTE".into(),
        starts_on:       d(2026, 8, 10),
        ends_on:         d(2026, 8, 12),
        created_at:      at(100),
    });

    let id = String::from("ana");
    assert_eq!(snapshot.transfers_for(&id).count(), 1);
    assert_eq!(snapshot.role_changes_for(&id).count(), 0);
    assert_eq!(snapshot.role_changes_for("zoe").count(), 1);
}

/// A manual override replaces the shift code unconditionally but
/// leaves the effective job title and location alone.
#[test]
fn override_always_wins() {
    let mut snapshot = fixture();
    snapshot
        .transfers
        .push(transfer("t1", "NORTE", d(2026, 8, 10), d(2026, 8, 12), 100));
    snapshot
        .overrides
        .insert(("ana".into(), d(2026, 8, 10)), "VAC".into());

    let cell = overrides::resolve_cell(&snapshot, ana(&snapshot), d(2026, 8, 10)).unwrap();
    assert_eq!(cell.shift_code, "VAC", "override must win over overlay result");
    assert_eq!(cell.source, CellSource::Override);
    assert_eq!(cell.location, "NORTE", "override must not touch location");
    assert_eq!(cell.job_title, "Cajero");
}
