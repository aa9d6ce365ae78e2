//! Roster assembler — the full day-by-collaborator grid for one
//! (location, job title, period) scope.
//!
//! Membership is decided per day by *effective* assignment: a
//! collaborator transferred into the scope for a day appears for that
//! day, one transferred out disappears. Layering per cell:
//!
//!   pattern cycle -> overlays (role change > transfer) -> override
//!
//! RULE: two builds from the same snapshot yield identical grids.
//! Ordered maps only, rows sorted by collaborator id, and the only
//! clock involved is the requested date range.

use crate::{
    conditioning::{self, ConditioningReport},
    error::RosterResult,
    model::{DateRange, SavedSchedule, ScheduleScope},
    overlay::{self, CellSource},
    overrides,
    snapshot::RosterSnapshot,
    types::{CollaboratorId, ShiftCode},
};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// One resolved cell. Times are `None` for rest days, for ad-hoc
/// override codes, and for pattern codes whose WorkShift is not yet
/// configured (the latter also appear in `GridSummary::missing_work_shifts`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub shift_code: ShiftCode,
    pub source:     CellSource,
    pub starts_at:  Option<NaiveTime>,
    pub ends_at:    Option<NaiveTime>,
}

/// One collaborator's cells, aligned with `ScheduleGrid::days`.
/// `None` marks days the collaborator is not in this scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub collaborator_id: CollaboratorId,
    pub name:            String,
    pub cells:           Vec<Option<GridCell>>,
}

/// Actual headcount per code vs conditioning target, for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date:    NaiveDate,
    pub actual:  BTreeMap<ShiftCode, u32>,
    pub targets: BTreeMap<ShiftCode, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSummary {
    pub days: Vec<DaySummary>,
    /// Non-rest pattern codes with no configured WorkShift. Non-fatal:
    /// their cells render with placeholder times.
    pub missing_work_shifts: Vec<ShiftCode>,
    pub recommended_headcount: u32,
    pub under_resourced:       bool,
    /// True when every non-rest code of the scope's pattern has a
    /// WorkShift.
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleGrid {
    pub scope: ScheduleScope,
    pub range: DateRange,
    pub days:  Vec<NaiveDate>,
    pub rows:  Vec<GridRow>,
    pub summary: GridSummary,
    /// The approval record when the scope is APPROVED, else `None`.
    pub lock: Option<SavedSchedule>,
}

impl ScheduleGrid {
    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }
}

/// Assemble the grid for a scope over a date range.
pub fn build_grid(
    snapshot: &RosterSnapshot,
    scope: &ScheduleScope,
    range: &DateRange,
) -> RosterResult<ScheduleGrid> {
    // The scope's own pattern must be usable before anything resolves.
    let pattern = snapshot.pattern_for(&scope.job_title)?;

    let days: Vec<NaiveDate> = range.days().collect();
    let mut cells_by_collaborator: BTreeMap<CollaboratorId, Vec<Option<GridCell>>> =
        BTreeMap::new();
    let mut names: BTreeMap<CollaboratorId, String> = BTreeMap::new();
    let mut headcounts: Vec<u32> = vec![0; days.len()];

    for collaborator in &snapshot.collaborators {
        let mut cells: Vec<Option<GridCell>> = Vec::with_capacity(days.len());
        let mut any = false;
        for (idx, &date) in days.iter().enumerate() {
            // One overlay resolution per cell: the position decides
            // membership and feeds the assignment and headcount tally.
            let position = overlay::effective_position(snapshot, collaborator, date);
            if position.0 != scope.job_title || position.1 != scope.location {
                cells.push(None);
                continue;
            }
            headcounts[idx] += 1;
            let assignment = overlay::assignment_at(snapshot, position, date)?;
            let override_code = snapshot.override_for(&collaborator.collaborator_id, date);
            let resolved = overrides::apply(assignment, override_code);
            let times = if resolved.shift_code == pattern.rest_code {
                None
            } else {
                snapshot
                    .work_shift(&resolved.job_title, &resolved.shift_code)
                    .map(|ws| (ws.starts_at, ws.ends_at))
            };
            cells.push(Some(GridCell {
                shift_code: resolved.shift_code,
                source:     resolved.source,
                starts_at:  times.map(|t| t.0),
                ends_at:    times.map(|t| t.1),
            }));
            any = true;
        }
        if any {
            names.insert(
                collaborator.collaborator_id.clone(),
                collaborator.name.clone(),
            );
            cells_by_collaborator.insert(collaborator.collaborator_id.clone(), cells);
        }
    }

    let rows: Vec<GridRow> = cells_by_collaborator
        .into_iter()
        .map(|(collaborator_id, cells)| GridRow {
            name: names.remove(&collaborator_id).unwrap_or_default(),
            collaborator_id,
            cells,
        })
        .collect();

    // Reuse the tallied membership instead of re-resolving overlays.
    let day_headcounts: Vec<(NaiveDate, u32)> =
        days.iter().copied().zip(headcounts).collect();
    let report =
        conditioning::evaluate(snapshot, &scope.location, &scope.job_title, &day_headcounts)?;
    let summary = summarize(pattern, snapshot, &days, &rows, &report);

    Ok(ScheduleGrid {
        scope: scope.clone(),
        range: *range,
        days,
        rows,
        summary,
        lock: snapshot.saved_for(scope).cloned(),
    })
}

fn summarize(
    pattern: &crate::model::ShiftPattern,
    snapshot: &RosterSnapshot,
    days: &[NaiveDate],
    rows: &[GridRow],
    report: &ConditioningReport,
) -> GridSummary {
    // Actual headcount per code per day, override codes included.
    let mut day_summaries = Vec::with_capacity(days.len());
    for (idx, &date) in days.iter().enumerate() {
        let mut actual: BTreeMap<ShiftCode, u32> = BTreeMap::new();
        for row in rows {
            if let Some(Some(cell)) = row.cells.get(idx) {
                *actual.entry(cell.shift_code.clone()).or_insert(0) += 1;
            }
        }
        let targets = report
            .days
            .get(idx)
            .map(|d| d.targets.clone())
            .unwrap_or_default();
        day_summaries.push(DaySummary {
            date,
            actual,
            targets,
        });
    }

    // Every non-rest code of the cycle needs a WorkShift before the
    // scope counts as completely configured.
    let mut missing_work_shifts: Vec<ShiftCode> = Vec::new();
    for code in &pattern.cycle {
        if code == &pattern.rest_code || missing_work_shifts.contains(code) {
            continue;
        }
        if snapshot.work_shift(&pattern.job_title, code).is_none() {
            missing_work_shifts.push(code.clone());
        }
    }
    missing_work_shifts.sort();
    missing_work_shifts.dedup();

    GridSummary {
        days: day_summaries,
        complete: missing_work_shifts.is_empty(),
        missing_work_shifts,
        recommended_headcount: report.recommended_headcount,
        under_resourced: report.under_resourced,
    }
}
