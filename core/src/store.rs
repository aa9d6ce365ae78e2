//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Resolvers read a `RosterSnapshot` loaded here — they never execute
//! SQL. Each write below is a single atomic document write; the only
//! cross-row guarantee is the saved_schedule UNIQUE scope key.

use crate::{
    error::{RosterError, RosterResult},
    model::{
        Collaborator, Conditioning, ManualOverride, RoleChange, SavedSchedule, ScheduleScope,
        ShiftPattern, TemporaryTransfer, WorkShift,
    },
    snapshot::RosterSnapshot,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

pub struct RosterStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl RosterStore {
    pub fn open(path: &str) -> RosterResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RosterResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new isolated database.
    pub fn reopen(&self) -> RosterResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> RosterResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_roster.sql"))?;
        Ok(())
    }

    // ── Collaborator ───────────────────────────────────────────

    pub fn insert_collaborator(&self, c: &Collaborator) -> RosterResult<()> {
        self.conn.execute(
            "INSERT INTO collaborator (collaborator_id, name, job_title, location)
             VALUES (?1, ?2, ?3, ?4)",
            params![&c.collaborator_id, &c.name, &c.job_title, &c.location],
        )?;
        Ok(())
    }

    pub fn all_collaborators(&self) -> RosterResult<Vec<Collaborator>> {
        let mut stmt = self.conn.prepare(
            "SELECT collaborator_id, name, job_title, location
             FROM collaborator ORDER BY collaborator_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Collaborator {
                collaborator_id: row.get(0)?,
                name:            row.get(1)?,
                job_title:       row.get(2)?,
                location:        row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Shift patterns and work shifts ─────────────────────────

    pub fn insert_shift_pattern(&self, p: &ShiftPattern) -> RosterResult<()> {
        let cycle = serde_json::to_string(&p.cycle)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO shift_pattern (job_title, cycle, rest_code, anchor)
             VALUES (?1, ?2, ?3, ?4)",
            params![&p.job_title, cycle, &p.rest_code, p.anchor.to_string()],
        )?;
        Ok(())
    }

    pub fn all_shift_patterns(&self) -> RosterResult<Vec<ShiftPattern>> {
        let mut stmt = self.conn.prepare(
            "SELECT job_title, cycle, rest_code, anchor
             FROM shift_pattern ORDER BY job_title ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let raw_cycle: String = row.get(1)?;
            let cycle = serde_json::from_str(&raw_cycle)
                .map_err(|e| conversion_err(1, e))?;
            Ok(ShiftPattern {
                job_title: row.get(0)?,
                cycle,
                rest_code: row.get(2)?,
                anchor: date_col(row, 3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_work_shift(&self, ws: &WorkShift) -> RosterResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO work_shift (job_title, code, starts_at, ends_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &ws.job_title,
                &ws.code,
                ws.starts_at.to_string(),
                ws.ends_at.to_string()
            ],
        )?;
        Ok(())
    }

    pub fn all_work_shifts(&self) -> RosterResult<Vec<WorkShift>> {
        let mut stmt = self.conn.prepare(
            "SELECT job_title, code, starts_at, ends_at
             FROM work_shift ORDER BY job_title, code ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WorkShift {
                job_title: row.get(0)?,
                code:      row.get(1)?,
                starts_at: time_col(row, 2)?,
                ends_at:   time_col(row, 3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Conditioning ───────────────────────────────────────────

    /// Raw write, no lock check — `approval::set_conditioning` is the
    /// guarded entry point.
    pub fn put_conditioning(
        &self,
        location: &str,
        job_title: &str,
        conditioning: &Conditioning,
    ) -> RosterResult<()> {
        let (mode, quotas) = match conditioning {
            Conditioning::Automatic => ("automatic", None),
            Conditioning::Manual { quotas } => {
                ("manual", Some(serde_json::to_string(quotas)?))
            }
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO conditioning (location, job_title, mode, quotas)
             VALUES (?1, ?2, ?3, ?4)",
            params![location, job_title, mode, quotas],
        )?;
        Ok(())
    }

    pub fn all_conditioning(
        &self,
    ) -> RosterResult<Vec<(String, String, Conditioning)>> {
        let mut stmt = self.conn.prepare(
            "SELECT location, job_title, mode, quotas
             FROM conditioning ORDER BY location, job_title ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let mode: String = row.get(2)?;
            let conditioning = match mode.as_str() {
                "manual" => {
                    let raw: String = row.get(3)?;
                    let quotas: BTreeMap<String, u32> =
                        serde_json::from_str(&raw).map_err(|e| conversion_err(3, e))?;
                    Conditioning::Manual { quotas }
                }
                _ => Conditioning::Automatic,
            };
            Ok((row.get(0)?, row.get(1)?, conditioning))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Overlays ───────────────────────────────────────────────

    pub fn insert_transfer(&self, t: &TemporaryTransfer) -> RosterResult<()> {
        self.conn.execute(
            "INSERT INTO transfer (transfer_id, collaborator_id, location,
                                   starts_on, ends_on, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &t.transfer_id,
                &t.collaborator_id,
                &t.location,
                t.starts_on.to_string(),
                t.ends_on.to_string(),
                t.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn all_transfers(&self) -> RosterResult<Vec<TemporaryTransfer>> {
        let mut stmt = self.conn.prepare(
            "SELECT transfer_id, collaborator_id, location, starts_on, ends_on, created_at
             FROM transfer ORDER BY created_at, transfer_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TemporaryTransfer {
                transfer_id:     row.get(0)?,
                collaborator_id: row.get(1)?,
                location:        row.get(2)?,
                starts_on:       date_col(row, 3)?,
                ends_on:         date_col(row, 4)?,
                created_at:      datetime_col(row, 5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_role_change(&self, rc: &RoleChange) -> RosterResult<()> {
        self.conn.execute(
            "INSERT INTO role_change (role_change_id, collaborator_id, job_title,
                                      location, starts_on, ends_on, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &rc.role_change_id,
                &rc.collaborator_id,
                &rc.job_title,
                &rc.location,
                rc.starts_on.to_string(),
                rc.ends_on.to_string(),
                rc.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn all_role_changes(&self) -> RosterResult<Vec<RoleChange>> {
        let mut stmt = self.conn.prepare(
            "SELECT role_change_id, collaborator_id, job_title, location,
                    starts_on, ends_on, created_at
             FROM role_change ORDER BY created_at, role_change_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RoleChange {
                role_change_id:  row.get(0)?,
                collaborator_id: row.get(1)?,
                job_title:       row.get(2)?,
                location:        row.get(3)?,
                starts_on:       date_col(row, 4)?,
                ends_on:         date_col(row, 5)?,
                created_at:      datetime_col(row, 6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Manual overrides ───────────────────────────────────────

    /// Raw upsert, no lock check — see `approval::put_override`.
    pub fn upsert_override(&self, o: &ManualOverride) -> RosterResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO manual_override (collaborator_id, day, shift_code)
             VALUES (?1, ?2, ?3)",
            params![&o.collaborator_id, o.day.to_string(), &o.shift_code],
        )?;
        Ok(())
    }

    /// Raw delete, no lock check — see `approval::clear_override`.
    pub fn delete_override(&self, collaborator_id: &str, day: NaiveDate) -> RosterResult<bool> {
        let n = self.conn.execute(
            "DELETE FROM manual_override WHERE collaborator_id = ?1 AND day = ?2",
            params![collaborator_id, day.to_string()],
        )?;
        Ok(n > 0)
    }

    pub fn all_overrides(&self) -> RosterResult<Vec<ManualOverride>> {
        let mut stmt = self.conn.prepare(
            "SELECT collaborator_id, day, shift_code
             FROM manual_override ORDER BY collaborator_id, day ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ManualOverride {
                collaborator_id: row.get(0)?,
                day:             date_col(row, 1)?,
                shift_code:      row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Saved schedules ────────────────────────────────────────

    /// Compare-and-swap confirm: the UNIQUE scope key makes the second
    /// of two concurrent confirms fail with `Locked` instead of
    /// silently overwriting the first approval.
    pub fn insert_saved_schedule(&self, s: &SavedSchedule) -> RosterResult<()> {
        let result = self.conn.execute(
            "INSERT INTO saved_schedule (schedule_id, period_id, location, job_title,
                                         approved_by, approved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &s.schedule_id,
                &s.period_id,
                &s.location,
                &s.job_title,
                &s.approved_by,
                s.approved_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(RosterError::Locked {
                    location:  s.location.clone(),
                    job_title: s.job_title.clone(),
                    period:    s.period_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_saved_schedule(
        &self,
        scope: &ScheduleScope,
    ) -> RosterResult<Option<SavedSchedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT schedule_id, period_id, location, job_title, approved_by, approved_at
             FROM saved_schedule
             WHERE period_id = ?1 AND location = ?2 AND job_title = ?3",
        )?;
        // optional() maps only the no-rows case to None; a corrupt row
        // must surface as an error, not read as unlocked.
        let result = stmt
            .query_row(
                params![&scope.period_id, &scope.location, &scope.job_title],
                saved_schedule_mapper,
            )
            .optional()?;
        Ok(result)
    }

    pub fn get_saved_schedule(&self, schedule_id: &str) -> RosterResult<Option<SavedSchedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT schedule_id, period_id, location, job_title, approved_by, approved_at
             FROM saved_schedule WHERE schedule_id = ?1",
        )?;
        let result = stmt
            .query_row(params![schedule_id], saved_schedule_mapper)
            .optional()?;
        Ok(result)
    }

    pub fn delete_saved_schedule(&self, schedule_id: &str) -> RosterResult<bool> {
        let n = self.conn.execute(
            "DELETE FROM saved_schedule WHERE schedule_id = ?1",
            params![schedule_id],
        )?;
        Ok(n > 0)
    }

    pub fn all_saved_schedules(&self) -> RosterResult<Vec<SavedSchedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT schedule_id, period_id, location, job_title, approved_by, approved_at
             FROM saved_schedule ORDER BY schedule_id ASC",
        )?;
        let rows = stmt.query_map([], saved_schedule_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Snapshot ───────────────────────────────────────────────

    /// Read every collection as one point-in-time snapshot for the
    /// resolvers. No re-reads happen after this returns.
    pub fn load_snapshot(&self) -> RosterResult<RosterSnapshot> {
        let patterns = self
            .all_shift_patterns()?
            .into_iter()
            .map(|p| (p.job_title.clone(), p))
            .collect();
        let work_shifts = self
            .all_work_shifts()?
            .into_iter()
            .map(|ws| ((ws.job_title.clone(), ws.code.clone()), ws))
            .collect();
        let conditioning = self
            .all_conditioning()?
            .into_iter()
            .map(|(loc, job, c)| ((loc, job), c))
            .collect();
        let overrides = self
            .all_overrides()?
            .into_iter()
            .map(|o| ((o.collaborator_id, o.day), o.shift_code))
            .collect();

        Ok(RosterSnapshot {
            collaborators: self.all_collaborators()?,
            patterns,
            work_shifts,
            conditioning,
            transfers: self.all_transfers()?,
            role_changes: self.all_role_changes()?,
            overrides,
            saved: self.all_saved_schedules()?,
        })
    }
}

// ── Column helpers ─────────────────────────────────────────────

fn saved_schedule_mapper(row: &Row<'_>) -> rusqlite::Result<SavedSchedule> {
    Ok(SavedSchedule {
        schedule_id: row.get(0)?,
        period_id:   row.get(1)?,
        location:    row.get(2)?,
        job_title:   row.get(3)?,
        approved_by: row.get(4)?,
        approved_at: datetime_col(row, 5)?,
    })
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

fn datetime_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}
