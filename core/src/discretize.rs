//! Continuous-signal discretization into bounded integer buckets.
//!
//! Buckets follow the left-closed, right-open rule: a value equal to a
//! bin edge falls into the bucket above. Bin edges are fixed
//! configuration shipped with the policy artifact, never learned.

use crate::policy::RlState;
use serde::{Deserialize, Serialize};

/// Bucket index for `value` against sorted, ascending `edges`:
/// the number of edges at or below the value. `edges.len()` edges yield
/// `edges.len() + 1` possible buckets.
pub fn digitize(value: f64, edges: &[f64]) -> usize {
    edges.iter().filter(|edge| value >= **edge).count()
}

/// Bin-edge configuration for the three policy state axes.
/// Keys match the persisted artifact: "pd", "anom", "cs".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinConfig {
    pub pd: Vec<f64>,
    pub anom: Vec<f64>,
    pub cs: Vec<f64>,
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            pd: vec![0.2, 0.4, 0.6, 0.8],
            anom: vec![0.3, 0.6, 0.8],
            cs: vec![400.0, 500.0, 600.0, 700.0],
        }
    }
}

impl BinConfig {
    /// Discretize the three continuous signals into a policy state.
    /// Two inputs landing in the same bins on every axis map to the
    /// identical state — this is the policy's generalization mechanism.
    pub fn build_state(&self, pd: f64, anom: f64, cs: f64) -> RlState {
        RlState([
            digitize(pd, &self.pd) as u8,
            digitize(anom, &self.anom) as u8,
            digitize(cs, &self.cs) as u8,
        ])
    }
}
