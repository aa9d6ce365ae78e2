//! JSON roster datasets — fixture/seed files for the runner and for
//! integration setups.
//!
//! A dataset is the full set of engine inputs in one file. It exists
//! for seeding a store, not as a storage format of its own.

use crate::{
    error::RosterResult,
    model::{
        Collaborator, Conditioning, ManualOverride, RoleChange, ShiftPattern, TemporaryTransfer,
        WorkShift,
    },
    store::RosterStore,
    types::{JobTitleId, LocationId},
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ConditioningEntry {
    pub location:  LocationId,
    pub job_title: JobTitleId,
    #[serde(flatten)]
    pub conditioning: Conditioning,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterDataset {
    pub collaborators: Vec<Collaborator>,
    pub shift_patterns: Vec<ShiftPattern>,
    #[serde(default)]
    pub work_shifts: Vec<WorkShift>,
    #[serde(default)]
    pub conditioning: Vec<ConditioningEntry>,
    #[serde(default)]
    pub transfers: Vec<TemporaryTransfer>,
    #[serde(default)]
    pub role_changes: Vec<RoleChange>,
    #[serde(default)]
    pub overrides: Vec<ManualOverride>,
}

impl RosterDataset {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let dataset: RosterDataset = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Malformed dataset {path}: {e}"))?;
        Ok(dataset)
    }

    /// Populate a migrated store with this dataset's entities.
    pub fn seed(&self, store: &RosterStore) -> RosterResult<()> {
        for c in &self.collaborators {
            store.insert_collaborator(c)?;
        }
        for p in &self.shift_patterns {
            store.insert_shift_pattern(p)?;
        }
        for ws in &self.work_shifts {
            store.insert_work_shift(ws)?;
        }
        for entry in &self.conditioning {
            store.put_conditioning(&entry.location, &entry.job_title, &entry.conditioning)?;
        }
        for t in &self.transfers {
            store.insert_transfer(t)?;
        }
        for rc in &self.role_changes {
            store.insert_role_change(rc)?;
        }
        for o in &self.overrides {
            store.upsert_override(o)?;
        }
        log::debug!(
            "seeded {} collaborators, {} patterns, {} overlays",
            self.collaborators.len(),
            self.shift_patterns.len(),
            self.transfers.len() + self.role_changes.len()
        );
        Ok(())
    }
}
