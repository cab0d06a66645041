//! The five-stage decision pipeline.
//!
//! Stage order is fixed: PD -> Anomaly -> RiskLabel -> HybridScore ->
//! RL_Recommendation. Later stages consume earlier stages' outputs
//! (risk sees PD and the anomaly flag; the recommendation state folds
//! in PD, the normalized anomaly measure and the hybrid score), so no
//! stage may run out of order.
//!
//! The engine is stateless across requests and only reads the shared
//! models and the policy snapshot, so concurrent requests need no
//! locking. Attribution is best-effort per stage; headline values are
//! not.

use crate::attribution::{self, DEFAULT_TOP_K};
use crate::bundle::ModelBundle;
use crate::discretize::BinConfig;
use crate::error::{EngineError, EngineResult};
use crate::features::{ANOMALY_FLAG, CreditRequest, FeatureVector, PD_SIGNAL};
use crate::policy::{PolicyArtifact, PolicyStore};
use crate::types::{Action, RiskLabel};
use serde::{Deserialize, Serialize};

/// Anomaly scores below this cutoff raise the anomaly flag.
pub const ANOMALY_FLAG_CUTOFF: f64 = -0.05;

/// Representative background states for the recommendation stage's
/// sampling attribution: (pd, normalized anomaly, consolidated score).
fn rl_backgrounds() -> Vec<Vec<f64>> {
    vec![
        vec![0.1, 0.1, 600.0],
        vec![0.5, 0.5, 400.0],
        vec![0.1, 0.8, 400.0],
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdStage {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_factors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyStage {
    pub score: f64,
    /// 1 = anomaly detected, 0 = normal (score < -0.05).
    #[serde(rename = "anomalyFlag")]
    pub anomaly_flag: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_factors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskStage {
    pub label: RiskLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drivers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridStage {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationStage {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationales: Option<Vec<String>>,
}

/// The complete decision, serialized under exactly five top-level keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    #[serde(rename = "PD")]
    pub pd: PdStage,
    #[serde(rename = "Anomaly")]
    pub anomaly: AnomalyStage,
    #[serde(rename = "RiskLabel")]
    pub risk_label: RiskStage,
    #[serde(rename = "HybridScore")]
    pub hybrid_score: HybridStage,
    #[serde(rename = "RL_Recommendation")]
    pub recommendation: RecommendationStage,
}

pub struct DecisionEngine {
    bundle: ModelBundle,
    policy: PolicyStore,
    bins: BinConfig,
    state_features: Vec<String>,
}

impl DecisionEngine {
    /// Assemble the engine from its injected collaborators. After this
    /// point everything is read-only.
    pub fn new(bundle: ModelBundle, artifact: PolicyArtifact) -> Self {
        let policy = artifact.to_store();
        Self {
            bundle,
            policy,
            bins: artifact.bins,
            state_features: artifact.state_features,
        }
    }

    /// Run all five stages for one request.
    pub fn decide(&self, request: &CreditRequest) -> EngineResult<DecisionResponse> {
        request.validate()?;
        let explain = request.explain;
        let fv = request.to_features();

        // 1. Default probability.
        let pd_raw = self.bundle.pd.score(&fv)?;
        let pd = PdStage {
            value: round_to(pd_raw, 4),
            top_factors: self.explain_scorer(&self.bundle.pd, &fv, explain),
        };

        // 2. Anomaly score and derived flag. Downstream stages only see
        // the flag, never the raw score.
        let anomaly_score = self.bundle.anomaly.score(&fv)?;
        let anomaly_flag = anomaly_score < ANOMALY_FLAG_CUTOFF;
        let anomaly = AnomalyStage {
            score: round_to(anomaly_score, 4),
            anomaly_flag: anomaly_flag as u8,
            top_factors: self.explain_scorer(&self.bundle.anomaly, &fv, explain),
        };

        // 3. Risk label over the augmented feature set.
        let fv_risk = fv
            .clone()
            .with(PD_SIGNAL, pd_raw)
            .with(ANOMALY_FLAG, anomaly_flag as u8 as f64);
        let class = self.bundle.risk.classify(&fv_risk)?;
        let label = RiskLabel::from_index(class).ok_or_else(|| {
            EngineError::Artifact(format!("risk model produced unknown class {class}"))
        })?;
        let drivers = if explain {
            match self.bundle.risk.contributions_for(&fv_risk, class) {
                Ok(values) => Some(attribution::rank(
                    &values,
                    &self.bundle.risk.features,
                    DEFAULT_TOP_K,
                )),
                Err(e) => {
                    log::warn!("attribution failed for stage RiskLabel: {e}");
                    None
                }
            }
        } else {
            None
        };
        let risk_label = RiskStage { label, drivers };

        // 4. Consolidated score, from the original features only.
        let hybrid_raw = self.bundle.hybrid.score(&fv)?;
        let hybrid_score = HybridStage {
            value: round_to(hybrid_raw, 1),
            factors: self.explain_scorer(&self.bundle.hybrid, &fv, explain),
        };

        // 5. Recommendation. Unseen states read the zero row and fall
        // back to REJECT through the stable argmax — by contract, not
        // by accident.
        let anomaly_norm = (1.0 - (anomaly_score + 0.5)).clamp(0.0, 1.0);
        let state = self.bins.build_state(pd_raw, anomaly_norm, hybrid_raw);
        let action = self.policy.best_action(&state);
        let rationales = if explain {
            let q_max = |x: &[f64]| {
                let s = self.bins.build_state(x[0], x[1], x[2]);
                self.policy.max_value(&s)
            };
            let rl_input = [pd_raw, anomaly_norm, hybrid_raw];
            let values = attribution::sampling_attribution(q_max, &rl_input, &rl_backgrounds());
            Some(attribution::rank(&values, &self.state_features, DEFAULT_TOP_K))
        } else {
            None
        };
        let recommendation = RecommendationStage { action, rationales };

        log::debug!(
            "decision: pd={:.4} anomaly={:.4} flag={} label={} hybrid={:.1} state={:?} action={}",
            pd_raw,
            anomaly_score,
            anomaly_flag as u8,
            label.name(),
            hybrid_raw,
            state.0,
            action.name()
        );

        Ok(DecisionResponse {
            pd,
            anomaly,
            risk_label,
            hybrid_score,
            recommendation,
        })
    }

    /// Best-effort attribution for a continuous scorer: failures log a
    /// warning and omit the list without touching the headline value.
    fn explain_scorer(
        &self,
        scorer: &crate::scorer::Scorer,
        fv: &FeatureVector,
        explain: bool,
    ) -> Option<Vec<String>> {
        if !explain {
            return None;
        }
        match scorer.contributions(fv) {
            Ok(values) => Some(attribution::rank(&values, &scorer.features, DEFAULT_TOP_K)),
            Err(e) => {
                log::warn!("attribution failed for scorer '{}': {e}", scorer.name);
                None
            }
        }
    }
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
