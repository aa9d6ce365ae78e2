//! Lock/approval lifecycle against a real (in-memory) store.

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{
    approval,
    error::RosterError,
    model::{
        Collaborator, Conditioning, ManualOverride, ScheduleScope, ShiftPattern,
        TemporaryTransfer,
    },
    store::RosterStore,
};
use std::collections::BTreeMap;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

fn store() -> RosterStore {
    let store = RosterStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn scope(location: &str, job_title: &str) -> ScheduleScope {
    ScheduleScope {
        location:  location.into(),
        job_title: job_title.into(),
        period_id: "2026-08".into(),
    }
}

fn sample_override() -> ManualOverride {
    ManualOverride {
        collaborator_id: "e-ana".into(),
        day:             d(2026, 8, 5),
        shift_code:      "VAC".into(),
    }
}

#[test]
fn confirm_freezes_scope_mutations() {
    let store = store();
    let sc = scope("CENTRO", "Cajero");

    // Draft: everything is writable.
    approval::put_override(&store, &sc, &sample_override()).unwrap();

    let saved = approval::confirm(&store, &sc, "supervisor.daniela", at(100)).unwrap();
    assert_eq!(store.find_saved_schedule(&sc).unwrap(), Some(saved.clone()));

    let err = approval::put_override(&store, &sc, &sample_override()).unwrap_err();
    assert!(matches!(err, RosterError::Locked { .. }));

    let err = approval::set_conditioning(&store, &sc, &Conditioning::Automatic).unwrap_err();
    assert!(matches!(err, RosterError::Locked { .. }));

    let err = approval::clear_override(&store, &sc, "e-ana", d(2026, 8, 5)).unwrap_err();
    assert!(matches!(err, RosterError::Locked { .. }));

    // The pre-approval override is still there, untouched.
    assert_eq!(store.all_overrides().unwrap().len(), 1);
}

#[test]
fn second_confirm_loses_the_race() {
    let store = store();
    let sc = scope("CENTRO", "Cajero");

    approval::confirm(&store, &sc, "supervisor.daniela", at(100)).unwrap();
    let err = approval::confirm(&store, &sc, "supervisor.marco", at(101)).unwrap_err();
    assert!(
        matches!(err, RosterError::Locked { ref location, .. } if location == "CENTRO"),
        "second confirm for the same scope must fail"
    );

    // Still exactly one approval, the first one.
    let saved = store.find_saved_schedule(&sc).unwrap().unwrap();
    assert_eq!(saved.approved_by, "supervisor.daniela");
}

#[test]
fn locks_are_per_scope() {
    let store = store();
    approval::confirm(&store, &scope("CENTRO", "Cajero"), "daniela", at(100)).unwrap();

    // Sibling scopes stay independent.
    approval::confirm(&store, &scope("CENTRO", "Supervisor"), "daniela", at(101)).unwrap();
    approval::confirm(&store, &scope("NORTE", "Cajero"), "daniela", at(102)).unwrap();
    approval::put_override(&store, &scope("SUR", "Cajero"), &sample_override()).unwrap();
}

#[test]
fn revert_reopens_the_scope() {
    let store = store();
    let sc = scope("CENTRO", "Cajero");

    let saved = approval::confirm(&store, &sc, "daniela", at(100)).unwrap();
    approval::revert(&store, &saved.schedule_id).unwrap();

    assert_eq!(store.find_saved_schedule(&sc).unwrap(), None);
    approval::put_override(&store, &sc, &sample_override()).unwrap();
    // And the scope can be confirmed again after editing.
    approval::confirm(&store, &sc, "daniela", at(200)).unwrap();
}

#[test]
fn revert_unknown_schedule_fails() {
    let store = store();
    let err = approval::revert(&store, "no-such-id").unwrap_err();
    assert!(
        matches!(err, RosterError::ScheduleNotFound { ref schedule_id } if schedule_id == "no-such-id")
    );
}

/// Transfers are collaborator-scoped, not schedule-scoped: they insert
/// fine while a grid they touch is approved.
#[test]
fn transfers_bypass_the_lock() {
    let store = store();
    approval::confirm(&store, &scope("CENTRO", "Cajero"), "daniela", at(100)).unwrap();

    store
        .insert_transfer(&TemporaryTransfer {
            transfer_id:     "t-1".into(),
            collaborator_id: "e-ana".into(),
            location:        "NORTE".into(),
            starts_on:       d(2026, 8, 10),
            ends_on:         d(2026, 8, 12),
            created_at:      at(150),
        })
        .unwrap();
    assert_eq!(store.all_transfers().unwrap().len(), 1);
}

/// A corrupt approval row is a database error, never an unlocked
/// scope: the guard must refuse the write instead of admitting it.
#[test]
fn corrupt_approval_row_does_not_unlock() {
    let uri = "file:corrupt_approval_row?mode=memory&cache=shared";
    let store = RosterStore::open(uri).unwrap();
    store.migrate().unwrap();

    let raw = rusqlite::Connection::open_with_flags(
        uri,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_URI,
    )
    .unwrap();
    raw.execute(
        "INSERT INTO saved_schedule (schedule_id, period_id, location, job_title,
                                     approved_by, approved_at)
         VALUES ('sched-1', '2026-08', 'CENTRO', 'Cajero', 'daniela', 'not-a-timestamp')",
        [],
    )
    .unwrap();

    let sc = scope("CENTRO", "Cajero");
    let err = store.find_saved_schedule(&sc).unwrap_err();
    assert!(
        matches!(err, RosterError::Database(_)),
        "corrupt row must surface as a database error"
    );
    let err = store.get_saved_schedule("sched-1").unwrap_err();
    assert!(matches!(err, RosterError::Database(_)));

    let err = approval::put_override(&store, &sc, &sample_override()).unwrap_err();
    assert!(
        matches!(err, RosterError::Database(_)),
        "guarded write must propagate the error, not treat the scope as unlocked"
    );
    assert_eq!(store.all_overrides().unwrap().len(), 0);
}

/// Everything written through the store comes back through
/// `load_snapshot` with the same values.
#[test]
fn snapshot_round_trips_the_store() {
    let store = store();
    store
        .insert_collaborator(&Collaborator {
            collaborator_id: "e-ana".into(),
            name:            "Ana".into(),
            job_title:       "Cajero".into(),
            location:        "CENTRO".into(),
        })
        .unwrap();
    store
        .insert_shift_pattern(&ShiftPattern {
            job_title: "Cajero".into(),
            cycle:     vec!["M8".into(), "LIB".into()],
            rest_code: "LIB".into(),
            anchor:    d(2026, 8, 1),
        })
        .unwrap();
    let mut quotas = BTreeMap::new();
    quotas.insert("M8".to_string(), 2u32);
    store
        .put_conditioning("CENTRO", "Cajero", &Conditioning::Manual { quotas: quotas.clone() })
        .unwrap();
    store.upsert_override(&sample_override()).unwrap();
    let saved = approval::confirm(&store, &scope("CENTRO", "Cajero"), "daniela", at(100)).unwrap();

    let snapshot = store.load_snapshot().unwrap();
    assert_eq!(snapshot.collaborators.len(), 1);
    assert_eq!(
        snapshot.pattern_for("Cajero").unwrap().cycle,
        vec!["M8".to_string(), "LIB".to_string()]
    );
    assert_eq!(
        snapshot.conditioning_for("CENTRO", "Cajero"),
        &Conditioning::Manual { quotas }
    );
    assert_eq!(
        snapshot.override_for("e-ana", d(2026, 8, 5)),
        Some(&"VAC".to_string())
    );
    assert_eq!(snapshot.saved, vec![saved]);
}
