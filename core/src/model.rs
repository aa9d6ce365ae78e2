//! Engine entities — the snapshot collections the resolvers read.
//!
//! Every entity is owned by the storage layer; the engine never holds
//! persistent state of its own. All day ranges are inclusive at both
//! ends and day-granular.

use crate::types::{CollaboratorId, JobTitleId, LocationId, PeriodId, ShiftCode};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collaborator {
    pub collaborator_id: CollaboratorId,
    pub name:            String,
    pub job_title:       JobTitleId,
    pub location:        LocationId,
}

/// A job title's cyclic shift-code sequence.
///
/// Position in cycle for a date d is `days_since_anchor(d) mod len`,
/// floor-mod, so dates before the anchor cycle correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShiftPattern {
    pub job_title: JobTitleId,
    pub cycle:     Vec<ShiftCode>,
    /// The designated rest code (e.g. "LIB"). Needs no WorkShift.
    pub rest_code: ShiftCode,
    pub anchor:    NaiveDate,
}

/// Wall-clock times for one (job title, shift code) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkShift {
    pub job_title: JobTitleId,
    pub code:      ShiftCode,
    pub starts_at: NaiveTime,
    pub ends_at:   NaiveTime,
}

/// Staffing targets for a (location, job title) pair.
///
/// Modeled as a tagged variant so every consumer handles both modes
/// exhaustively — there is no boolean-plus-nullable-quotas state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Conditioning {
    /// Targets derived from the pattern's natural distribution.
    Automatic,
    /// Explicit per-code daily quotas, non-negative by construction.
    Manual { quotas: BTreeMap<ShiftCode, u32> },
}

/// A time-bounded location overlay. Overrides location only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemporaryTransfer {
    pub transfer_id:     String,
    pub collaborator_id: CollaboratorId,
    pub location:        LocationId,
    pub starts_on:       NaiveDate,
    pub ends_on:         NaiveDate,
    pub created_at:      DateTime<Utc>,
}

impl TemporaryTransfer {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.starts_on <= date && date <= self.ends_on
    }
}

/// A time-bounded role overlay. Overrides job title *and* location,
/// and switches which pattern cycle governs the overlapping days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleChange {
    pub role_change_id:  String,
    pub collaborator_id: CollaboratorId,
    pub job_title:       JobTitleId,
    pub location:        LocationId,
    pub starts_on:       NaiveDate,
    pub ends_on:         NaiveDate,
    pub created_at:      DateTime<Utc>,
}

impl RoleChange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.starts_on <= date && date <= self.ends_on
    }
}

/// An explicit single-cell override. Always wins for its cell; the
/// code is not validated against any pattern so ad-hoc codes ("VAC")
/// are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualOverride {
    pub collaborator_id: CollaboratorId,
    pub day:             NaiveDate,
    pub shift_code:      ShiftCode,
}

/// The approval record freezing one scope. Its presence *is* the lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedSchedule {
    pub schedule_id: String,
    pub period_id:   PeriodId,
    pub location:    LocationId,
    pub job_title:   JobTitleId,
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
}

/// The (location, job title, period) triple every grid and every
/// approval operates on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleScope {
    pub location:  LocationId,
    pub job_title: JobTitleId,
    pub period_id: PeriodId,
}

/// Inclusive day range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub starts_on: NaiveDate,
    pub ends_on:   NaiveDate,
}

impl DateRange {
    pub fn new(starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        Self { starts_on, ends_on }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.starts_on <= date && date <= self.ends_on
    }

    /// All days in order, both ends included. Empty when inverted.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.ends_on;
        std::iter::successors(Some(self.starts_on), move |d| {
            d.checked_add_days(Days::new(1)).filter(|next| *next <= end)
        })
        .filter(move |d| *d <= end)
    }
}
