//! The state -> action-value policy store and its persisted artifact.
//!
//! The store is mutated only by the trainer. The serving path receives
//! an immutable snapshot loaded once at startup and only ever reads it,
//! so concurrent requests need no locking.
//!
//! Lookup of an unseen state is NOT an error: it returns the all-zero
//! row, and the stable argmax then yields REJECT. That conservative
//! default is part of the public contract, not an accident of the
//! underlying container.

use crate::discretize::BinConfig;
use crate::error::{EngineError, EngineResult};
use crate::features::PD_SIGNAL;
use crate::types::{Action, NUM_ACTIONS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const POLICY_SCHEMA_VERSION: u32 = 1;

/// A discretized policy state: (pd bucket, anomaly bucket,
/// consolidated-score bucket). Equality and hashing are structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RlState(pub [u8; 3]);

/// One estimated value per action, in action-index order.
pub type ActionValueRow = [f64; NUM_ACTIONS];

pub const ZERO_ROW: ActionValueRow = [0.0; NUM_ACTIONS];

/// Index of the maximum value; ties break toward the lowest index.
pub fn stable_argmax(row: &ActionValueRow) -> usize {
    let mut best = 0;
    for (i, value) in row.iter().enumerate().skip(1) {
        if *value > row[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    table: HashMap<RlState, ActionValueRow>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct states touched by training.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Action values for `state`; the zero row when the state is unseen.
    pub fn row(&self, state: &RlState) -> ActionValueRow {
        self.table.get(state).copied().unwrap_or(ZERO_ROW)
    }

    /// Greedy action for `state` under stable-argmax semantics.
    pub fn best_action(&self, state: &RlState) -> Action {
        let row = self.row(state);
        // stable_argmax is bounded by NUM_ACTIONS, so the index is valid.
        Action::from_index(stable_argmax(&row)).unwrap_or(Action::Reject)
    }

    /// Maximum action value for `state` (the Bellman bootstrap target).
    pub fn max_value(&self, state: &RlState) -> f64 {
        let row = self.row(state);
        row[stable_argmax(&row)]
    }

    /// Mutable row access, inserting the zero row for new states.
    /// Trainer-only: the serving path never mutates the store.
    pub(crate) fn row_mut(&mut self, state: RlState) -> &mut ActionValueRow {
        self.table.entry(state).or_insert(ZERO_ROW)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RlState, &ActionValueRow)> {
        self.table.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub state: RlState,
    pub q: ActionValueRow,
}

/// The versioned policy snapshot exchanged between trainer and server.
/// Entries are sorted by state so identical stores serialize to
/// byte-identical artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyArtifact {
    pub schema_version: u32,
    pub trained_at: String,
    pub seed: u64,
    pub episodes: u32,
    pub bins: BinConfig,
    /// Ordered names of the signals the state is built from, used when
    /// explaining the recommendation stage.
    pub state_features: Vec<String>,
    pub entries: Vec<PolicyEntry>,
}

impl PolicyArtifact {
    pub fn from_store(store: &PolicyStore, bins: BinConfig, seed: u64, episodes: u32) -> Self {
        let mut entries: Vec<PolicyEntry> = store
            .iter()
            .map(|(state, q)| PolicyEntry {
                state: *state,
                q: *q,
            })
            .collect();
        entries.sort_by_key(|e| e.state);

        Self {
            schema_version: POLICY_SCHEMA_VERSION,
            trained_at: chrono::Utc::now().to_rfc3339(),
            seed,
            episodes,
            bins,
            state_features: vec![
                PD_SIGNAL.to_string(),
                "anomaly".to_string(),
                "HybridCreditScore".to_string(),
            ],
            entries,
        }
    }

    /// Rebuild the in-memory store from the snapshot.
    pub fn to_store(&self) -> PolicyStore {
        let mut store = PolicyStore::new();
        for entry in &self.entries {
            *store.row_mut(entry.state) = entry.q;
        }
        store
    }

    /// Write atomically: temp file in the target directory, then rename.
    /// A crash mid-write never leaves a truncated artifact behind.
    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        log::info!(
            "policy artifact saved: {} states -> {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Artifact(format!("cannot read {}: {e}", path.display()))
        })?;
        let artifact: PolicyArtifact = serde_json::from_str(&content)
            .map_err(|e| EngineError::Artifact(format!("cannot parse {}: {e}", path.display())))?;
        artifact.validate()?;
        log::info!(
            "policy artifact loaded: {} states, trained {} episodes (seed {})",
            artifact.entries.len(),
            artifact.episodes,
            artifact.seed
        );
        Ok(artifact)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.schema_version != POLICY_SCHEMA_VERSION {
            return Err(EngineError::Artifact(format!(
                "unsupported policy schema version {} (expected {})",
                self.schema_version, POLICY_SCHEMA_VERSION
            )));
        }
        if self.state_features.len() != 3 {
            return Err(EngineError::Artifact(format!(
                "expected 3 state features, got {}",
                self.state_features.len()
            )));
        }
        Ok(())
    }
}
