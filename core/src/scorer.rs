//! Uniform scoring interface over the pre-trained model artifacts.
//!
//! Each scorer declares the feature order it was fit on and is
//! responsible for reordering/subsetting the incoming feature vector; a
//! missing feature is a data-contract error, fatal to the request.
//!
//! Attribution is a per-model-kind capability fixed at construction
//! time: linear models explain through their weights, tree ensembles
//! through path attribution. The pipeline never branches on model type
//! at call time.

use crate::error::{EngineError, EngineResult};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Per-feature standardization: `z = (x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (x - m) / s
            })
            .collect()
    }
}

/// Logistic regression over standardized inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn predict_proba(&self, z: &[f64]) -> f64 {
        let logit: f64 = self
            .weights
            .iter()
            .zip(z.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-logit).exp())
    }

    /// Linear attribution on the logit scale: each standardized input
    /// contributes its weighted deviation from the (zero-mean) background.
    pub fn contributions(&self, z: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(z.iter())
            .map(|(w, x)| w * x)
            .collect()
    }
}

/// One node of an array-encoded binary decision tree.
/// `feature == -1` marks a leaf. Every node carries the expected output
/// for samples reaching it; internal-node values feed path attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature: i32,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk to a leaf: `x[feature] <= threshold` goes left.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.feature < 0 {
                return node.value;
            }
            let value = x.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
        }
    }

    /// Path attribution: each split credits its feature with the
    /// child-minus-parent expected-value delta along the decision path.
    /// The deltas sum to `leaf - root` exactly.
    pub fn accumulate_contributions(&self, x: &[f64], out: &mut [f64]) {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.feature < 0 {
                return;
            }
            let feature = node.feature as usize;
            let value = x.get(feature).copied().unwrap_or(0.0);
            let child = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if feature < out.len() {
                out[feature] += self.nodes[child].value - node.value;
            }
            idx = child;
        }
    }
}

/// Additive ensemble: `base + Σ tree outputs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub base: f64,
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.base + self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    pub fn contributions(&self, x: &[f64], n_features: usize) -> Vec<f64> {
        let mut out = vec![0.0; n_features];
        for tree in &self.trees {
            tree.accumulate_contributions(x, &mut out);
        }
        out
    }
}

/// The model body behind a scorer, tagged in the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    Logistic(LogisticModel),
    Trees(TreeEnsemble),
}

/// A continuous scorer: probability (logistic) or raw score / decision
/// function (tree ensemble).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scorer {
    pub name: String,
    /// Declared feature order; the input is projected onto this.
    pub features: Vec<String>,
    pub scaler: Option<StandardScaler>,
    pub model: ModelKind,
}

impl Scorer {
    /// Project the feature vector onto the declared order.
    fn project(&self, fv: &FeatureVector) -> EngineResult<Vec<f64>> {
        self.features
            .iter()
            .map(|name| {
                fv.get(name).ok_or_else(|| EngineError::MissingFeature {
                    scorer: self.name.clone(),
                    feature: name.clone(),
                })
            })
            .collect()
    }

    fn inputs(&self, fv: &FeatureVector) -> EngineResult<Vec<f64>> {
        let raw = self.project(fv)?;
        Ok(match &self.scaler {
            Some(scaler) => scaler.transform(&raw),
            None => raw,
        })
    }

    pub fn score(&self, fv: &FeatureVector) -> EngineResult<f64> {
        let x = self.inputs(fv)?;
        Ok(match &self.model {
            ModelKind::Logistic(m) => m.predict_proba(&x),
            ModelKind::Trees(m) => m.predict(&x),
        })
    }

    /// Signed per-feature contributions, aligned with `self.features`.
    pub fn contributions(&self, fv: &FeatureVector) -> EngineResult<Vec<f64>> {
        let x = self.inputs(fv)?;
        Ok(match &self.model {
            ModelKind::Logistic(m) => m.contributions(&x),
            ModelKind::Trees(m) => m.contributions(&x, self.features.len()),
        })
    }
}

/// One-vs-rest tree classifier: one ensemble per ordered label, the
/// predicted label is the stable argmax of the ensemble scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classifier {
    pub name: String,
    pub features: Vec<String>,
    pub labels: Vec<String>,
    pub per_class: Vec<TreeEnsemble>,
}

impl Classifier {
    fn project(&self, fv: &FeatureVector) -> EngineResult<Vec<f64>> {
        self.features
            .iter()
            .map(|name| {
                fv.get(name).ok_or_else(|| EngineError::MissingFeature {
                    scorer: self.name.clone(),
                    feature: name.clone(),
                })
            })
            .collect()
    }

    /// Predicted class index; ties break toward the lowest index.
    pub fn classify(&self, fv: &FeatureVector) -> EngineResult<usize> {
        let x = self.project(fv)?;
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, ensemble) in self.per_class.iter().enumerate() {
            let score = ensemble.predict(&x);
            if score > best_score {
                best = i;
                best_score = score;
            }
        }
        Ok(best)
    }

    /// Drivers of the predicted class: path attribution through that
    /// class's ensemble only.
    pub fn contributions_for(&self, fv: &FeatureVector, class: usize) -> EngineResult<Vec<f64>> {
        let x = self.project(fv)?;
        let ensemble = self.per_class.get(class).ok_or_else(|| {
            EngineError::Artifact(format!(
                "classifier '{}' has no ensemble for class {class}",
                self.name
            ))
        })?;
        Ok(ensemble.contributions(&x, self.features.len()))
    }
}
