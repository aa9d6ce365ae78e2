//! Overlay resolver — applies temporary transfers and role changes to
//! a collaborator's base assignment for one day.
//!
//! Precedence, per day:
//!   1. A RoleChange containing the day overrides job title AND
//!      location (and switches the governing pattern cycle).
//!   2. Otherwise a TemporaryTransfer containing the day overrides
//!      location only.
//!   3. Otherwise the base assignment stands.
//!
//! Overlapping same-kind overlays are a data-entry conflict, not an
//! error: the one with the later creation timestamp wins, by explicit
//! last-match iteration — never by storage insertion order. Each
//! conflict is logged once for audit.

use crate::{
    error::RosterResult,
    model::Collaborator,
    pattern,
    snapshot::RosterSnapshot,
    types::{JobTitleId, LocationId, ShiftCode},
};
use chrono::NaiveDate;
use serde::Serialize;

/// Where a resolved cell value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSource {
    Pattern,
    Transfer,
    RoleChange,
    Override,
}

/// Effective (job title, location, shift code) for one collaborator
/// and day, pre-manual-override.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveAssignment {
    pub job_title:  JobTitleId,
    pub location:   LocationId,
    pub shift_code: ShiftCode,
    pub source:     CellSource,
}

/// Effective (job title, location) only — total, needs no pattern.
///
/// Split out so grid membership can be decided for collaborators whose
/// own job title has no configured pattern at all.
pub fn effective_position(
    snapshot: &RosterSnapshot,
    collaborator: &Collaborator,
    date: NaiveDate,
) -> (JobTitleId, LocationId, CellSource) {
    // Last-created role change containing the day wins outright.
    let mut role_hits = 0usize;
    let mut role_winner = None;
    for rc in snapshot.role_changes_for(&collaborator.collaborator_id) {
        if !rc.contains(date) {
            continue;
        }
        role_hits += 1;
        match role_winner {
            Some(prev) if later_wins(prev, rc) => role_winner = Some(rc),
            None => role_winner = Some(rc),
            _ => {}
        }
    }
    if role_hits > 1 {
        log::warn!(
            "{role_hits} overlapping role changes for {} on {date}; most recently created wins",
            collaborator.collaborator_id
        );
    }
    if let Some(rc) = role_winner {
        return (rc.job_title.clone(), rc.location.clone(), CellSource::RoleChange);
    }

    let mut transfer_hits = 0usize;
    let mut transfer_winner = None;
    for t in snapshot.transfers_for(&collaborator.collaborator_id) {
        if !t.contains(date) {
            continue;
        }
        transfer_hits += 1;
        match transfer_winner {
            Some(prev) if transfer_later_wins(prev, t) => transfer_winner = Some(t),
            None => transfer_winner = Some(t),
            _ => {}
        }
    }
    if transfer_hits > 1 {
        log::warn!(
            "{transfer_hits} overlapping transfers for {} on {date}; most recently created wins",
            collaborator.collaborator_id
        );
    }
    if let Some(t) = transfer_winner {
        // A standalone transfer changes location only.
        return (
            collaborator.job_title.clone(),
            t.location.clone(),
            CellSource::Transfer,
        );
    }

    (
        collaborator.job_title.clone(),
        collaborator.location.clone(),
        CellSource::Pattern,
    )
}

/// Assignment for an already-resolved position: shift code from the
/// effective job title's pattern cycle. Callers that already hold an
/// `effective_position` result use this directly, so each overlay
/// conflict is resolved (and logged) once per cell.
pub fn assignment_at(
    snapshot: &RosterSnapshot,
    position: (JobTitleId, LocationId, CellSource),
    date: NaiveDate,
) -> RosterResult<EffectiveAssignment> {
    let (job_title, location, source) = position;
    let pattern = snapshot.pattern_for(&job_title)?;
    let shift_code = pattern::shift_code_for(pattern, date)?.clone();
    Ok(EffectiveAssignment {
        job_title,
        location,
        shift_code,
        source,
    })
}

/// Full overlay resolution: position plus the shift code from the
/// *effective* job title's pattern cycle.
pub fn effective_assignment(
    snapshot: &RosterSnapshot,
    collaborator: &Collaborator,
    date: NaiveDate,
) -> RosterResult<EffectiveAssignment> {
    let position = effective_position(snapshot, collaborator, date);
    assignment_at(snapshot, position, date)
}

fn later_wins(prev: &crate::model::RoleChange, cand: &crate::model::RoleChange) -> bool {
    (cand.created_at, &cand.role_change_id) > (prev.created_at, &prev.role_change_id)
}

fn transfer_later_wins(
    prev: &crate::model::TemporaryTransfer,
    cand: &crate::model::TemporaryTransfer,
) -> bool {
    (cand.created_at, &cand.transfer_id) > (prev.created_at, &prev.transfer_id)
}
