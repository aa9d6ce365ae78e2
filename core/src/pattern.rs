//! Pattern cycle resolver — shift code for any date, pure and total
//! over the calendar.
//!
//! RULE: position in cycle is floor-mod of the signed day offset from
//! the anchor. Truncating mod would mis-cycle every date before the
//! anchor.

use crate::{
    error::{RosterError, RosterResult},
    model::ShiftPattern,
    types::ShiftCode,
};
use chrono::NaiveDate;

/// Cycle position for a date. Fails on an empty cycle.
pub fn cycle_position(pattern: &ShiftPattern, date: NaiveDate) -> RosterResult<usize> {
    let len = pattern.cycle.len() as i64;
    if len == 0 {
        return Err(RosterError::InvalidPattern {
            job_title: pattern.job_title.clone(),
        });
    }
    let offset = date.signed_duration_since(pattern.anchor).num_days();
    Ok(offset.rem_euclid(len) as usize)
}

/// The shift code governing `date` under this pattern.
pub fn shift_code_for(pattern: &ShiftPattern, date: NaiveDate) -> RosterResult<&ShiftCode> {
    let pos = cycle_position(pattern, date)?;
    Ok(&pattern.cycle[pos])
}

/// Whether `date` resolves to the pattern's rest code.
pub fn is_rest_day(pattern: &ShiftPattern, date: NaiveDate) -> RosterResult<bool> {
    Ok(shift_code_for(pattern, date)? == &pattern.rest_code)
}
