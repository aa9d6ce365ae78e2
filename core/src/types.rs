//! Shared primitive types used across the entire engine.

/// A stable, unique identifier for a collaborator.
pub type CollaboratorId = String;

/// A job title ("Cajero", "Supervisor", ...). Owns a shift pattern.
pub type JobTitleId = String;

/// A physical location / branch identifier.
pub type LocationId = String;

/// A scheduling period identifier (e.g. "2026-08").
pub type PeriodId = String;

/// A short shift token ("M8", "T8", "N8", "LIB", ad-hoc "VAC", ...).
pub type ShiftCode = String;
