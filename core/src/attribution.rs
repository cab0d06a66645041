//! Ranking per-feature contributions into business-readable factors.
//!
//! Scorers produce raw signed contribution vectors aligned with their
//! declared feature order; this module turns those into the short,
//! formatted factor lists that appear in the decision response. It also
//! hosts the model-agnostic sampling attribution used for the policy
//! stage, where no closed-form contribution exists.

/// Default number of factors surfaced per stage.
pub const DEFAULT_TOP_K: usize = 3;

/// Translate a technical feature name into its business-readable label.
/// Unknown names pass through unchanged.
pub fn display_name(name: &str) -> &str {
    match name {
        "avgMonthlyIncome" => "Monthly Income Level",
        "incomeCV" => "Income Volatility",
        "expenseRatio" => "Monthly Expense Burden",
        "emiRatio" => "Existing Debt Commitments (EMI)",
        "avgMonthlyBalance" => "Liquidity Reserve",
        "bounceCount" => "Historical Payment Bounces",
        "accountAgeMonths" => "Banking Relationship Age",
        "PD" => "Probability of Default Signal",
        "anomalyFlag" => "Unusual Transaction Behavior",
        "anomaly" => "Anomaly Signal Intensity",
        "HybridCreditScore" => "Consolidated Credit Score",
        other => other,
    }
}

/// Top-k contributors by descending absolute magnitude, formatted as
/// `"{display_name} ({value:+.3})"`. Ties keep original feature order
/// (stable sort). Returns `min(k, values.len())` entries.
pub fn rank(values: &[f64], names: &[String], k: usize) -> Vec<String> {
    debug_assert_eq!(values.len(), names.len());

    let mut order: Vec<usize> = (0..values.len().min(names.len())).collect();
    order.sort_by(|a, b| values[*b].abs().total_cmp(&values[*a].abs()));
    order.truncate(k);

    order
        .into_iter()
        .map(|i| format!("{} ({:+.3})", display_name(&names[i]), values[i]))
        .collect()
}

/// Model-agnostic local sampling attribution for an opaque scalar
/// function: each input's contribution is the average effect of
/// splicing its value into a fixed set of representative background
/// points. Deterministic — the backgrounds are configuration, not
/// samples drawn at call time.
pub fn sampling_attribution<F>(f: F, input: &[f64], backgrounds: &[Vec<f64>]) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut contributions = vec![0.0; input.len()];
    if backgrounds.is_empty() {
        return contributions;
    }

    for background in backgrounds {
        let base = f(background);
        for (i, value) in input.iter().enumerate() {
            let mut spliced = background.clone();
            spliced[i] = *value;
            contributions[i] += f(&spliced) - base;
        }
    }

    let n = backgrounds.len() as f64;
    for c in &mut contributions {
        *c /= n;
    }
    contributions
}
