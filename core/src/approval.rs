//! Lock/approval state machine: DRAFT -> APPROVED -> DRAFT per scope.
//!
//! The presence of a SavedSchedule row *is* the APPROVED state; there
//! is no separate status column to drift out of sync. Confirm is a
//! compare-and-swap against the scope's UNIQUE key, so two concurrent
//! confirms cannot both win.
//!
//! Scope-level mutations (conditioning, overrides) go through the
//! guarded entry points here and fail with `Locked` while APPROVED.
//! Transfers and role changes are collaborator-scoped and stay
//! unguarded: creating one while a grid it touches is APPROVED applies
//! silently on the next resolution.

use crate::{
    error::{RosterError, RosterResult},
    model::{Conditioning, ManualOverride, SavedSchedule, ScheduleScope},
    store::RosterStore,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Confirm a scope: DRAFT -> APPROVED.
///
/// Staffing warnings (under-resourced, incomplete configuration) are
/// advisory and never block a confirm. An already-approved scope fails
/// with `Locked`; revert it first.
pub fn confirm(
    store: &RosterStore,
    scope: &ScheduleScope,
    approver: &str,
    approved_at: DateTime<Utc>,
) -> RosterResult<SavedSchedule> {
    let saved = SavedSchedule {
        schedule_id: Uuid::new_v4().to_string(),
        period_id:   scope.period_id.clone(),
        location:    scope.location.clone(),
        job_title:   scope.job_title.clone(),
        approved_by: approver.to_string(),
        approved_at,
    };
    store.insert_saved_schedule(&saved)?;
    log::debug!(
        "schedule {} approved by {approver} for {}/{} period {}",
        saved.schedule_id,
        scope.location,
        scope.job_title,
        scope.period_id
    );
    Ok(saved)
}

/// Revert a scope: APPROVED -> DRAFT. Deletes only the approval
/// record; overrides, transfers, and role changes are untouched.
pub fn revert(store: &RosterStore, schedule_id: &str) -> RosterResult<()> {
    if !store.delete_saved_schedule(schedule_id)? {
        return Err(RosterError::ScheduleNotFound {
            schedule_id: schedule_id.to_string(),
        });
    }
    log::debug!("schedule {schedule_id} reverted to draft");
    Ok(())
}

/// Guarded conditioning write for a scope.
pub fn set_conditioning(
    store: &RosterStore,
    scope: &ScheduleScope,
    conditioning: &Conditioning,
) -> RosterResult<()> {
    ensure_unlocked(store, scope)?;
    store.put_conditioning(&scope.location, &scope.job_title, conditioning)
}

/// Guarded single-cell override write for a scope.
pub fn put_override(
    store: &RosterStore,
    scope: &ScheduleScope,
    override_: &ManualOverride,
) -> RosterResult<()> {
    ensure_unlocked(store, scope)?;
    store.upsert_override(override_)
}

/// Guarded single-cell override removal for a scope.
pub fn clear_override(
    store: &RosterStore,
    scope: &ScheduleScope,
    collaborator_id: &str,
    day: NaiveDate,
) -> RosterResult<bool> {
    ensure_unlocked(store, scope)?;
    store.delete_override(collaborator_id, day)
}

fn ensure_unlocked(store: &RosterStore, scope: &ScheduleScope) -> RosterResult<()> {
    match store.find_saved_schedule(scope)? {
        Some(_) => Err(RosterError::Locked {
            location:  scope.location.clone(),
            job_title: scope.job_title.clone(),
            period:    scope.period_id.clone(),
        }),
        None => Ok(()),
    }
}
