//! Point-in-time snapshot of every collection the resolvers read.
//!
//! RULE: resolution is a pure function of one snapshot plus the
//! requested range. The assembler never re-reads storage mid-build, so
//! a single grid is internally consistent even while another user
//! mutates the underlying store.
//!
//! Tests construct fixture snapshots directly; production code loads
//! one via `RosterStore::load_snapshot`.

use crate::{
    error::{RosterError, RosterResult},
    model::{
        Collaborator, Conditioning, RoleChange, SavedSchedule, ScheduleScope, ShiftPattern,
        TemporaryTransfer, WorkShift,
    },
    types::{CollaboratorId, JobTitleId, LocationId, ShiftCode},
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterSnapshot {
    pub collaborators: Vec<Collaborator>,
    pub patterns:      BTreeMap<JobTitleId, ShiftPattern>,
    pub work_shifts:   BTreeMap<(JobTitleId, ShiftCode), WorkShift>,
    pub conditioning:  BTreeMap<(LocationId, JobTitleId), Conditioning>,
    pub transfers:     Vec<TemporaryTransfer>,
    pub role_changes:  Vec<RoleChange>,
    pub overrides:     BTreeMap<(CollaboratorId, NaiveDate), ShiftCode>,
    pub saved:         Vec<SavedSchedule>,
}

impl RosterSnapshot {
    /// The pattern governing a job title. Missing or empty cycles are
    /// equally unusable — callers surface "schedule not configured".
    pub fn pattern_for(&self, job_title: &str) -> RosterResult<&ShiftPattern> {
        self.patterns
            .get(job_title)
            .filter(|p| !p.cycle.is_empty())
            .ok_or_else(|| RosterError::InvalidPattern {
                job_title: job_title.to_string(),
            })
    }

    pub fn work_shift(&self, job_title: &str, code: &str) -> Option<&WorkShift> {
        self.work_shifts
            .get(&(job_title.to_string(), code.to_string()))
    }

    /// Conditioning for a scope; unset pairs behave as automatic.
    pub fn conditioning_for(&self, location: &str, job_title: &str) -> &Conditioning {
        self.conditioning
            .get(&(location.to_string(), job_title.to_string()))
            .unwrap_or(&Conditioning::Automatic)
    }

    pub fn override_for(&self, collaborator_id: &str, date: NaiveDate) -> Option<&ShiftCode> {
        self.overrides.get(&(collaborator_id.to_string(), date))
    }

    pub fn saved_for(&self, scope: &ScheduleScope) -> Option<&SavedSchedule> {
        self.saved.iter().find(|s| {
            s.period_id == scope.period_id
                && s.location == scope.location
                && s.job_title == scope.job_title
        })
    }

    pub fn transfers_for<'a>(
        &'a self,
        collaborator_id: &'a str,
    ) -> impl Iterator<Item = &'a TemporaryTransfer> + 'a {
        self.transfers
            .iter()
            .filter(move |t| t.collaborator_id == collaborator_id)
    }

    pub fn role_changes_for<'a>(
        &'a self,
        collaborator_id: &'a str,
    ) -> impl Iterator<Item = &'a RoleChange> + 'a {
        self.role_changes
            .iter()
            .filter(move |r| r.collaborator_id == collaborator_id)
    }
}
