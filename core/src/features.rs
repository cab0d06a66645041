//! Customer feature vectors and request validation.
//!
//! Field names follow the upstream bank-statement analysis schema
//! (camelCase on the wire). Validation runs before any model is touched;
//! an out-of-range field never reaches the pipeline.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

// Technical feature names, shared with the model artifacts.
pub const AVG_MONTHLY_INCOME: &str = "avgMonthlyIncome";
pub const INCOME_CV: &str = "incomeCV";
pub const EXPENSE_RATIO: &str = "expenseRatio";
pub const EMI_RATIO: &str = "emiRatio";
pub const AVG_MONTHLY_BALANCE: &str = "avgMonthlyBalance";
pub const BOUNCE_COUNT: &str = "bounceCount";
pub const ACCOUNT_AGE_MONTHS: &str = "accountAgeMonths";

// Synthetic features injected between stages.
pub const PD_SIGNAL: &str = "PD";
pub const ANOMALY_FLAG: &str = "anomalyFlag";

/// The base request features, in canonical order.
pub const BASE_FEATURES: [&str; 7] = [
    AVG_MONTHLY_INCOME,
    INCOME_CV,
    EXPENSE_RATIO,
    EMI_RATIO,
    AVG_MONTHLY_BALANCE,
    BOUNCE_COUNT,
    ACCOUNT_AGE_MONTHS,
];

fn default_explain() -> bool {
    true
}

/// A validated decision request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRequest {
    #[serde(rename = "avgMonthlyIncome")]
    pub avg_monthly_income: f64,
    #[serde(rename = "incomeCV")]
    pub income_cv: f64,
    #[serde(rename = "expenseRatio")]
    pub expense_ratio: f64,
    #[serde(rename = "emiRatio")]
    pub emi_ratio: f64,
    #[serde(rename = "avgMonthlyBalance")]
    pub avg_monthly_balance: f64,
    #[serde(rename = "bounceCount")]
    pub bounce_count: u32,
    #[serde(rename = "accountAgeMonths")]
    pub account_age_months: u32,
    /// When false, no attribution is computed anywhere in the pipeline.
    #[serde(default = "default_explain")]
    pub explain: bool,
}

impl CreditRequest {
    /// Range-check every field. Failures are client-input errors and
    /// never reach the model stages.
    pub fn validate(&self) -> EngineResult<()> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> EngineError {
            EngineError::InvalidRequest {
                field,
                reason: reason.into(),
            }
        }

        if !(self.avg_monthly_income > 0.0) || !self.avg_monthly_income.is_finite() {
            return Err(invalid(
                AVG_MONTHLY_INCOME,
                format!("must be > 0, got {}", self.avg_monthly_income),
            ));
        }
        if !(self.income_cv >= 0.0) || !self.income_cv.is_finite() {
            return Err(invalid(
                INCOME_CV,
                format!("must be >= 0, got {}", self.income_cv),
            ));
        }
        if !(0.0..=1.0).contains(&self.expense_ratio) {
            return Err(invalid(
                EXPENSE_RATIO,
                format!("must be in [0, 1], got {}", self.expense_ratio),
            ));
        }
        if !(0.0..=1.0).contains(&self.emi_ratio) {
            return Err(invalid(
                EMI_RATIO,
                format!("must be in [0, 1], got {}", self.emi_ratio),
            ));
        }
        if !(self.avg_monthly_balance >= 0.0) || !self.avg_monthly_balance.is_finite() {
            return Err(invalid(
                AVG_MONTHLY_BALANCE,
                format!("must be >= 0, got {}", self.avg_monthly_balance),
            ));
        }
        // bounce_count and account_age_months are unsigned by type.
        Ok(())
    }

    /// Build the ordered feature vector the scorers consume.
    pub fn to_features(&self) -> FeatureVector {
        let mut fv = FeatureVector::new();
        fv.set(AVG_MONTHLY_INCOME, self.avg_monthly_income);
        fv.set(INCOME_CV, self.income_cv);
        fv.set(EXPENSE_RATIO, self.expense_ratio);
        fv.set(EMI_RATIO, self.emi_ratio);
        fv.set(AVG_MONTHLY_BALANCE, self.avg_monthly_balance);
        fv.set(BOUNCE_COUNT, self.bounce_count as f64);
        fv.set(ACCOUNT_AGE_MONTHS, self.account_age_months as f64);
        fv
    }
}

/// An ordered name -> value mapping, immutable per decision request.
/// Stage augmentation (PD, anomalyFlag for the risk stage) produces a
/// new vector rather than mutating the original.
#[derive(Debug, Clone, Default)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a feature, preserving first-insertion order.
    pub fn set(&mut self, name: &str, value: f64) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Builder-style variant of [`set`](Self::set) for stage augmentation.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }
}
