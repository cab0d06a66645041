//! Trainer behavior: reward shaping, hyperparameter fail-fast, and
//! simulated-data properties.

use credit_core::error::EngineError;
use credit_core::rng::{RngStream, TrainerRng};
use credit_core::trainer::{
    consolidated_score_proxy, generate_records, reward, train, TrainerConfig,
};
use credit_core::types::Action;

#[test]
fn reward_reject_high_pd_is_smart_rejection() {
    assert_eq!(reward(Action::Reject, 0.7, false), 20.0);
}

#[test]
fn reward_reject_low_pd_is_missed_opportunity() {
    assert_eq!(reward(Action::Reject, 0.3, false), -20.0);
}

#[test]
fn reward_approved_default_scales_with_pd() {
    assert_eq!(reward(Action::ApproveHigh, 0.9, true), -290.0);
    assert_eq!(reward(Action::ApproveLow, 0.7, true), -270.0);
}

#[test]
fn reward_successful_approvals_pay_by_tier() {
    assert_eq!(reward(Action::ApproveLow, 0.1, false), 40.0);
    assert_eq!(reward(Action::ApproveMedium, 0.1, false), 70.0);
    assert_eq!(reward(Action::ApproveHigh, 0.1, false), 100.0);
}

#[test]
fn zero_episodes_fails_before_any_simulation() {
    let config = TrainerConfig {
        episodes: 0,
        ..TrainerConfig::default()
    };
    match train(&config) {
        Err(EngineError::InvalidHyperparameter(msg)) => {
            assert!(msg.contains("episodes"), "unexpected message: {msg}")
        }
        other => panic!("expected InvalidHyperparameter, got {other:?}"),
    }
}

#[test]
fn zero_records_fails_before_any_simulation() {
    let config = TrainerConfig {
        records: 0,
        ..TrainerConfig::default()
    };
    assert!(matches!(
        train(&config),
        Err(EngineError::InvalidHyperparameter(_))
    ));
}

#[test]
fn bad_alpha_is_rejected() {
    let config = TrainerConfig {
        alpha: 0.0,
        ..TrainerConfig::default()
    };
    assert!(matches!(
        train(&config),
        Err(EngineError::InvalidHyperparameter(_))
    ));
}

#[test]
fn simulated_records_stay_in_declared_ranges() {
    let mut rng = TrainerRng::new(123, RngStream::Simulation);
    let records = generate_records(&mut rng, 2_000);
    assert_eq!(records.len(), 2_000);

    for record in &records {
        assert!((0.0..1.0).contains(&record.pd));
        assert!((0.0..1.0).contains(&record.anomaly));
        assert!((0.0..1.0).contains(&record.emi_ratio));
        assert!((2_000.0..80_000.0).contains(&record.avg_balance));
        assert!((10_000.0..100_000.0).contains(&record.avg_income));
        // Defaults only happen above the PD cutoff.
        if record.defaulted {
            assert!(record.pd > 0.65, "default at pd={}", record.pd);
        }
    }

    // The biased coin should produce some defaults in 2000 draws.
    assert!(records.iter().any(|r| r.defaulted));
}

#[test]
fn consolidated_score_proxy_spans_the_score_range() {
    let mut rng = TrainerRng::new(7, RngStream::Simulation);
    for record in generate_records(&mut rng, 500) {
        let score = consolidated_score_proxy(&record);
        assert!(
            (300.0..=900.0).contains(&score),
            "proxy score out of range: {score}"
        );
    }
}

#[test]
fn training_populates_states_and_learns_to_reject_risky_applicants() {
    let config = TrainerConfig {
        episodes: 60,
        records: 600,
        seed: 99,
        ..TrainerConfig::default()
    };
    let artifact = train(&config).expect("training");
    assert!(!artifact.entries.is_empty(), "no states explored");

    let store = artifact.to_store();
    // High-PD states (top pd bucket) should prefer rejection once the
    // default penalties have propagated.
    let risky: Vec<_> = artifact
        .entries
        .iter()
        .filter(|e| e.state.0[0] == 4)
        .collect();
    assert!(!risky.is_empty(), "no high-pd states explored");
    let reject_count = risky
        .iter()
        .filter(|e| store.best_action(&e.state) == Action::Reject)
        .count();
    assert!(
        reject_count * 2 > risky.len(),
        "expected mostly REJECT in the top pd bucket: {reject_count}/{}",
        risky.len()
    );
}
