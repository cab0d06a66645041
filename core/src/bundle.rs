//! The model artifact bundle consumed by the decision pipeline.
//!
//! An explicitly constructed, dependency-injected set of scorers — no
//! global instance. Loading is all-or-nothing and happens once at
//! process start; any failure is fatal before traffic is accepted.
//!
//! Fitting the four supervised models happens elsewhere; this crate
//! only consumes their exported parameters. The built-in demo bundle
//! carries hand-specified parameters of the same shapes so the runner
//! and the test suite work without external files.

use crate::features::{
    ANOMALY_FLAG, AVG_MONTHLY_BALANCE, AVG_MONTHLY_INCOME, BASE_FEATURES, BOUNCE_COUNT, EMI_RATIO,
    EXPENSE_RATIO, INCOME_CV, PD_SIGNAL,
};
use crate::scorer::{
    Classifier, DecisionTree, LogisticModel, ModelKind, Scorer, StandardScaler, TreeEnsemble,
    TreeNode,
};
use crate::types::RiskLabel;
use anyhow::Context;
use std::path::Path;

const PD_MODEL_FILE: &str = "pd_model.json";
const ANOMALY_MODEL_FILE: &str = "anomaly_model.json";
const RISK_MODEL_FILE: &str = "risk_model.json";
const HYBRID_MODEL_FILE: &str = "hybrid_model.json";

pub struct ModelBundle {
    /// Logistic default-probability model (standardized inputs).
    pub pd: Scorer,
    /// Isolation-style anomaly scorer; its output is a decision-function
    /// score where more negative means more anomalous.
    pub anomaly: Scorer,
    /// Three-way risk classifier over the augmented feature set.
    pub risk: Classifier,
    /// Consolidated-score regressor over the original features only.
    pub hybrid: Scorer,
}

impl ModelBundle {
    /// Load every model artifact from `dir`. All-or-nothing.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let pd: Scorer = read_json(&dir.join(PD_MODEL_FILE))?;
        log::info!("pd model loaded ({} features)", pd.features.len());

        let anomaly: Scorer = read_json(&dir.join(ANOMALY_MODEL_FILE))?;
        log::info!("anomaly model loaded ({} features)", anomaly.features.len());

        let risk: Classifier = read_json(&dir.join(RISK_MODEL_FILE))?;
        log::info!(
            "risk model loaded ({} features, {} labels)",
            risk.features.len(),
            risk.labels.len()
        );

        let hybrid: Scorer = read_json(&dir.join(HYBRID_MODEL_FILE))?;
        log::info!("hybrid model loaded ({} features)", hybrid.features.len());

        let bundle = Self {
            pd,
            anomaly,
            risk,
            hybrid,
        };
        bundle.check()?;
        Ok(bundle)
    }

    /// Export the bundle as loadable artifacts (one JSON file per model).
    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
        write_json(&dir.join(PD_MODEL_FILE), &self.pd)?;
        write_json(&dir.join(ANOMALY_MODEL_FILE), &self.anomaly)?;
        write_json(&dir.join(RISK_MODEL_FILE), &self.risk)?;
        write_json(&dir.join(HYBRID_MODEL_FILE), &self.hybrid)?;
        log::info!("model bundle exported to {}", dir.display());
        Ok(())
    }

    /// Structural sanity checks on freshly loaded artifacts.
    fn check(&self) -> anyhow::Result<()> {
        if let ModelKind::Logistic(m) = &self.pd.model {
            anyhow::ensure!(
                m.weights.len() == self.pd.features.len(),
                "pd model: {} weights for {} features",
                m.weights.len(),
                self.pd.features.len()
            );
        }
        for scorer in [&self.pd, &self.anomaly, &self.hybrid] {
            if let Some(scaler) = &scorer.scaler {
                anyhow::ensure!(
                    scaler.mean.len() == scorer.features.len()
                        && scaler.scale.len() == scorer.features.len(),
                    "scorer '{}': scaler shape does not match feature count",
                    scorer.name
                );
            }
        }
        anyhow::ensure!(
            self.risk.per_class.len() == self.risk.labels.len(),
            "risk model: {} ensembles for {} labels",
            self.risk.per_class.len(),
            self.risk.labels.len()
        );
        Ok(())
    }

    /// Hand-specified demo parameters mirroring the production artifact
    /// shapes. Used by tests and the runner's --demo mode.
    pub fn demo() -> Self {
        Self {
            pd: demo_pd_model(),
            anomaly: demo_anomaly_model(),
            risk: demo_risk_model(),
            hybrid: demo_hybrid_model(),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))
}

// ── Demo parameters ──────────────────────────────────────────────────────────

/// Depth-1 tree: `below` when `x[feature] <= threshold`, else `above`.
/// The root carries the midpoint as its expected value for path
/// attribution.
fn stump(feature: usize, threshold: f64, below: f64, above: f64) -> DecisionTree {
    DecisionTree {
        nodes: vec![
            TreeNode {
                feature: feature as i32,
                threshold,
                left: 1,
                right: 2,
                value: (below + above) / 2.0,
            },
            leaf(below),
            leaf(above),
        ],
    }
}

fn leaf(value: f64) -> TreeNode {
    TreeNode {
        feature: -1,
        threshold: 0.0,
        left: 0,
        right: 0,
        value,
    }
}

fn base_feature_names() -> Vec<String> {
    BASE_FEATURES.iter().map(|f| f.to_string()).collect()
}

fn demo_pd_model() -> Scorer {
    Scorer {
        name: "pd".into(),
        features: base_feature_names(),
        scaler: Some(StandardScaler {
            mean: vec![60_000.0, 0.25, 0.45, 0.30, 30_000.0, 2.0, 36.0],
            scale: vec![40_000.0, 0.15, 0.20, 0.18, 25_000.0, 2.5, 24.0],
        }),
        model: ModelKind::Logistic(LogisticModel {
            weights: vec![-0.8, 0.6, 1.1, 1.3, -0.7, 1.5, -0.4],
            intercept: -2.0,
        }),
    }
}

fn demo_anomaly_model() -> Scorer {
    // Anomaly subset excludes account age, matching the fitted model.
    let features: Vec<String> = [
        AVG_MONTHLY_INCOME,
        INCOME_CV,
        EXPENSE_RATIO,
        EMI_RATIO,
        AVG_MONTHLY_BALANCE,
        BOUNCE_COUNT,
    ]
    .iter()
    .map(|f| f.to_string())
    .collect();

    Scorer {
        name: "anomaly".into(),
        features,
        scaler: Some(StandardScaler {
            mean: vec![60_000.0, 0.25, 0.45, 0.30, 30_000.0, 2.0],
            scale: vec![40_000.0, 0.15, 0.20, 0.18, 25_000.0, 2.5],
        }),
        model: ModelKind::Trees(TreeEnsemble {
            base: 0.0,
            trees: vec![
                stump(5, 0.5, 0.04, -0.08),  // bounce count z-score
                stump(2, 1.0, 0.03, -0.05),  // expense ratio z-score
                stump(3, 1.0, 0.02, -0.05),  // emi ratio z-score
                stump(4, -1.2, -0.04, 0.02), // low balance is anomalous
                stump(1, 1.0, 0.02, -0.04),  // income volatility z-score
            ],
        }),
    }
}

fn demo_risk_model() -> Classifier {
    // Augmented feature set: the seven originals plus the injected PD
    // value (index 7) and anomaly flag (index 8).
    let mut features = base_feature_names();
    features.push(PD_SIGNAL.to_string());
    features.push(ANOMALY_FLAG.to_string());

    let low = TreeEnsemble {
        base: 0.0,
        trees: vec![
            stump(7, 0.15, 2.0, -1.0), // low PD dominates
            stump(5, 1.0, 0.5, -0.5),
            stump(8, 0.5, 0.5, -1.0),
        ],
    };

    // MEDIUM peaks in the PD mid-band: a two-level split on PD.
    let medium = TreeEnsemble {
        base: 0.0,
        trees: vec![
            DecisionTree {
                nodes: vec![
                    TreeNode {
                        feature: 7,
                        threshold: 0.15,
                        left: 1,
                        right: 2,
                        value: 0.2,
                    },
                    leaf(-0.5),
                    TreeNode {
                        feature: 7,
                        threshold: 0.5,
                        left: 3,
                        right: 4,
                        value: 0.5,
                    },
                    leaf(1.5),
                    leaf(-0.5),
                ],
            },
            stump(2, 0.6, 0.0, 0.4),
        ],
    };

    let high = TreeEnsemble {
        base: 0.0,
        trees: vec![
            stump(7, 0.5, -1.0, 2.0),
            stump(8, 0.5, 0.0, 0.8),
            stump(5, 3.0, 0.0, 0.6),
        ],
    };

    Classifier {
        name: "risk".into(),
        features,
        labels: RiskLabel::ALL.iter().map(|l| l.name().to_string()).collect(),
        per_class: vec![low, medium, high],
    }
}

fn demo_hybrid_model() -> Scorer {
    Scorer {
        name: "hybrid".into(),
        features: base_feature_names(),
        scaler: None,
        model: ModelKind::Trees(TreeEnsemble {
            base: 600.0,
            trees: vec![
                stump(0, 60_000.0, -40.0, 35.0),
                stump(2, 0.30, 25.0, -30.0),
                stump(3, 0.25, 20.0, -25.0),
                stump(5, 1.0, 15.0, -35.0),
                stump(4, 30_000.0, -20.0, 18.0),
                stump(6, 24.0, -10.0, 8.0),
                stump(1, 0.20, 10.0, -12.0),
            ],
        }),
    }
}
