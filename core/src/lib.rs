//! roster-core — the shift-roster resolution engine.
//!
//! For every collaborator, every day of a scheduling period, and every
//! (location, job title) scope, the engine determines the *effective*
//! shift assignment by composing, in order:
//!
//!   1. the job title's cyclic base pattern        (`pattern`)
//!   2. time-bounded overlays: transfers and
//!      role changes, role change wins             (`overlay`)
//!   3. explicit single-cell manual overrides      (`overrides`)
//!
//! and assembles the full day-by-collaborator grid plus staffing
//! summary (`assembler`), advised by declared or derived staffing
//! targets (`conditioning`) and frozen by the approval state machine
//! (`approval`).
//!
//! RULES:
//!   - Resolution is a pure function of one `RosterSnapshot` plus the
//!     requested range. Same snapshot, same grid, byte for byte.
//!   - Only `store` talks to the database.
//!   - Overlapping overlays are resolved by creation time and logged,
//!     never rejected.

pub mod approval;
pub mod assembler;
pub mod conditioning;
pub mod dataset;
pub mod error;
pub mod model;
pub mod overlay;
pub mod overrides;
pub mod pattern;
pub mod snapshot;
pub mod store;
pub mod types;
