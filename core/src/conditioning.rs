//! Conditioning evaluator — staffing targets per shift per day for a
//! (location, job title) scope.
//!
//! Automatic mode reports the pattern's natural distribution: every
//! collaborator whose effective job title matches the scope is on the
//! same cycle position that day, so the day is either all on one code
//! or all at rest. It describes, it never constrains.
//!
//! Manual mode returns the stored quotas and derives:
//!   rest slots            = max(0, headcount - sum(quotas))
//!   recommended headcount = ceil(sum(quotas) * 1.4)
//! The under-resourced flag is advisory; nothing downstream enforces
//! it.

use crate::{
    error::RosterResult,
    model::{Conditioning, DateRange},
    overlay, pattern,
    snapshot::RosterSnapshot,
    types::ShiftCode,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Targets and derived counts for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTargets {
    pub date:       NaiveDate,
    /// Collaborators whose effective assignment is in scope this day.
    pub headcount:  u32,
    pub targets:    BTreeMap<ShiftCode, u32>,
    pub rest_slots: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditioningReport {
    pub days: Vec<DayTargets>,
    /// ceil(sum(quotas) * 1.4); zero in automatic mode. The 1.4 margin
    /// covers a 2-2-1-2 rest rotation on top of the quota floor.
    pub recommended_headcount: u32,
    pub under_resourced:       bool,
}

/// Evaluate targets for every day of the range.
pub fn targets_for(
    snapshot: &RosterSnapshot,
    location: &str,
    job_title: &str,
    range: &DateRange,
) -> RosterResult<ConditioningReport> {
    let headcounts: Vec<(NaiveDate, u32)> = range
        .days()
        .map(|date| (date, in_scope_count(snapshot, location, job_title, date)))
        .collect();
    evaluate(snapshot, location, job_title, &headcounts)
}

/// Evaluate targets from precomputed per-day effective headcounts.
///
/// The assembler tallies membership while building cells and reuses it
/// here, so overlays are resolved once per collaborator per day.
pub fn evaluate(
    snapshot: &RosterSnapshot,
    location: &str,
    job_title: &str,
    headcounts: &[(NaiveDate, u32)],
) -> RosterResult<ConditioningReport> {
    let mode = snapshot.conditioning_for(location, job_title);
    let mut days = Vec::with_capacity(headcounts.len());

    for &(date, headcount) in headcounts {
        let day = match mode {
            Conditioning::Automatic => {
                let pattern = snapshot.pattern_for(job_title)?;
                let code = pattern::shift_code_for(pattern, date)?;
                let mut targets: BTreeMap<ShiftCode, u32> = BTreeMap::new();
                let mut rest_slots = 0u32;
                if code == &pattern.rest_code {
                    rest_slots = headcount;
                } else if headcount > 0 {
                    targets.insert(code.clone(), headcount);
                }
                DayTargets {
                    date,
                    headcount,
                    targets,
                    rest_slots,
                }
            }
            Conditioning::Manual { quotas } => {
                let quota_sum: u32 = quotas.values().sum();
                DayTargets {
                    date,
                    headcount,
                    targets: quotas.clone(),
                    rest_slots: headcount.saturating_sub(quota_sum),
                }
            }
        };
        days.push(day);
    }

    let (recommended_headcount, under_resourced) = match mode {
        Conditioning::Automatic => (0, false),
        Conditioning::Manual { quotas } => {
            let quota_sum: u32 = quotas.values().sum();
            let recommended = (quota_sum * 14).div_ceil(10);
            // Compared against the tightest day of the range.
            let min_headcount = days.iter().map(|d| d.headcount).min().unwrap_or(0);
            (recommended, !days.is_empty() && recommended > min_headcount)
        }
    };

    Ok(ConditioningReport {
        days,
        recommended_headcount,
        under_resourced,
    })
}

/// Collaborators whose effective (location, job title) matches the
/// scope on `date` — pulled in by overlays, not only by base
/// assignment.
fn in_scope_count(
    snapshot: &RosterSnapshot,
    location: &str,
    job_title: &str,
    date: NaiveDate,
) -> u32 {
    snapshot
        .collaborators
        .iter()
        .filter(|c| {
            let (job, loc, _) = overlay::effective_position(snapshot, c, date);
            job == job_title && loc == location
        })
        .count() as u32
}
