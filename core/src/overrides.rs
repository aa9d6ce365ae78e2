//! Manual override layer — the last word on a cell's shift code.
//!
//! An override replaces the overlay-resolved shift code
//! unconditionally. It never touches the effective job title or
//! location, and its code is deliberately unvalidated so schedulers
//! can place ad-hoc codes ("VAC") outside any pattern vocabulary.

use crate::{
    overlay::{CellSource, EffectiveAssignment},
    snapshot::RosterSnapshot,
    types::{JobTitleId, LocationId, ShiftCode},
};
use chrono::NaiveDate;
use serde::Serialize;

/// A fully resolved cell: overlay result with any override applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCell {
    pub job_title:  JobTitleId,
    pub location:   LocationId,
    pub shift_code: ShiftCode,
    pub source:     CellSource,
}

/// Apply an override, if one exists, on top of the overlay result.
pub fn apply(assignment: EffectiveAssignment, override_code: Option<&ShiftCode>) -> ResolvedCell {
    match override_code {
        Some(code) => ResolvedCell {
            job_title:  assignment.job_title,
            location:   assignment.location,
            shift_code: code.clone(),
            source:     CellSource::Override,
        },
        None => ResolvedCell {
            job_title:  assignment.job_title,
            location:   assignment.location,
            shift_code: assignment.shift_code,
            source:     assignment.source,
        },
    }
}

/// Convenience: overlay resolution and override application for one
/// collaborator/day, looked up from the snapshot.
pub fn resolve_cell(
    snapshot: &RosterSnapshot,
    collaborator: &crate::model::Collaborator,
    date: NaiveDate,
) -> crate::error::RosterResult<ResolvedCell> {
    let assignment = crate::overlay::effective_assignment(snapshot, collaborator, date)?;
    let override_code = snapshot.override_for(&collaborator.collaborator_id, date);
    Ok(apply(assignment, override_code))
}
