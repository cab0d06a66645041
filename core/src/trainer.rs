//! Offline Q-learning trainer for the recommendation policy.
//!
//! Runs as a separate batch job, never on the request path. It owns an
//! exclusive mutable PolicyStore during training and publishes an
//! immutable artifact snapshot for the serving path afterward.
//!
//! The simulation is static within an episode: the next state is defined
//! to be the current state, which collapses the one-step Bellman update
//! into a self-consistent fixed-point iteration rather than a genuine
//! multi-step control problem. Intentional simplification — downstream
//! numeric expectations depend on it, so it is preserved as-is.

use crate::discretize::BinConfig;
use crate::error::{EngineError, EngineResult};
use crate::policy::{PolicyArtifact, PolicyStore, RlState};
use crate::rng::{RngStream, TrainerRng};
use crate::types::{Action, NUM_ACTIONS};
use serde::{Deserialize, Serialize};

// Simulated record value ranges (uniform draws).
const BALANCE_LO: u64 = 2_000;
const BALANCE_HI: u64 = 80_000;
const INCOME_LO: u64 = 10_000;
const INCOME_HI: u64 = 100_000;

/// Default probability above which a simulated applicant may default,
/// and the chance that they then actually do.
const DEFAULT_PD_CUTOFF: f64 = 0.65;
const DEFAULT_CHANCE: f64 = 0.7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub episodes: u32,
    pub records: usize,
    pub seed: u64,
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Initial exploration rate.
    pub epsilon: f64,
    /// Geometric decay applied to epsilon after each episode.
    pub epsilon_decay: f64,
    /// Exploration floor — never fully vanishes.
    pub min_epsilon: f64,
    pub bins: BinConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            records: 3_000,
            seed: 42,
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.5,
            epsilon_decay: 0.995,
            min_epsilon: 0.05,
            bins: BinConfig::default(),
        }
    }
}

impl TrainerConfig {
    /// Fail fast on malformed hyperparameters, before any simulation.
    pub fn validate(&self) -> EngineResult<()> {
        if self.episodes == 0 {
            return Err(EngineError::InvalidHyperparameter(
                "episodes must be > 0".into(),
            ));
        }
        if self.records == 0 {
            return Err(EngineError::InvalidHyperparameter(
                "records must be > 0".into(),
            ));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(EngineError::InvalidHyperparameter(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(EngineError::InvalidHyperparameter(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon)
            || !(0.0..=1.0).contains(&self.epsilon_decay)
            || !(0.0..=1.0).contains(&self.min_epsilon)
        {
            return Err(EngineError::InvalidHyperparameter(
                "epsilon, epsilon_decay and min_epsilon must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// A synthetic training record. Generated per run, never persisted.
#[derive(Debug, Clone)]
pub struct SimulatedRecord {
    pub pd: f64,
    pub anomaly: f64,
    pub emi_ratio: f64,
    pub avg_balance: f64,
    pub avg_income: f64,
    pub defaulted: bool,
}

/// Draw `n` synthetic applicant records. Default is a biased coin flip
/// conditioned on high PD.
pub fn generate_records(rng: &mut TrainerRng, n: usize) -> Vec<SimulatedRecord> {
    (0..n)
        .map(|_| {
            let pd = rng.next_f64();
            let anomaly = rng.next_f64();
            let emi_ratio = rng.next_f64();
            let avg_balance = rng.next_u64_in_range(BALANCE_LO, BALANCE_HI) as f64;
            let avg_income = rng.next_u64_in_range(INCOME_LO, INCOME_HI) as f64;
            let defaulted = pd > DEFAULT_PD_CUTOFF && rng.chance(DEFAULT_CHANCE);
            SimulatedRecord {
                pd,
                anomaly,
                emi_ratio,
                avg_balance,
                avg_income,
                defaulted,
            }
        })
        .collect()
}

/// Reward shaping: correct rejections and profitable approvals pay,
/// approved defaults are punished in proportion to PD.
pub fn reward(action: Action, pd: f64, defaulted: bool) -> f64 {
    if action == Action::Reject {
        return if pd > 0.6 { 20.0 } else { -20.0 };
    }
    if defaulted {
        return -200.0 - pd * 100.0;
    }
    match action {
        Action::ApproveLow => 40.0,
        Action::ApproveMedium => 70.0,
        Action::ApproveHigh => 100.0,
        Action::Reject => 0.0,
    }
}

/// Map a simulated record into the consolidated-score range so training
/// states live in the same three-axis space the serving path builds
/// states in. Income and balance headroom stand in for the fitted
/// hybrid model, which never sees simulated records.
pub fn consolidated_score_proxy(record: &SimulatedRecord) -> f64 {
    let income_frac =
        ((record.avg_income - INCOME_LO as f64) / (INCOME_HI - INCOME_LO) as f64).clamp(0.0, 1.0);
    let balance_frac = ((record.avg_balance - BALANCE_LO as f64)
        / (BALANCE_HI - BALANCE_LO) as f64)
        .clamp(0.0, 1.0);
    let emi_headroom = (1.0 - record.emi_ratio).clamp(0.0, 1.0);
    300.0 + 600.0 * (0.4 * income_frac + 0.4 * balance_frac + 0.2 * emi_headroom)
}

fn record_state(bins: &BinConfig, record: &SimulatedRecord) -> RlState {
    bins.build_state(record.pd, record.anomaly, consolidated_score_proxy(record))
}

/// Fisher-Yates shuffle on the trainer RNG.
fn shuffle(rng: &mut TrainerRng, records: &mut [SimulatedRecord]) {
    for i in (1..records.len()).rev() {
        let j = rng.next_usize_below(i + 1);
        records.swap(i, j);
    }
}

/// Run the full training schedule and return the policy artifact.
///
/// Deterministic: the same (seed, episodes, records) always produces
/// bit-identical action values. Single-threaded by design — later
/// records revisit and overwrite states touched earlier in the same
/// episode, so the update order is part of the result.
pub fn train(config: &TrainerConfig) -> EngineResult<PolicyArtifact> {
    config.validate()?;

    let mut sim_rng = TrainerRng::new(config.seed, RngStream::Simulation);
    let mut explore_rng = TrainerRng::new(config.seed, RngStream::Exploration);

    let mut records = generate_records(&mut sim_rng, config.records);
    let mut store = PolicyStore::new();
    let mut epsilon = config.epsilon;

    log::info!(
        "training start: {} episodes over {} records (seed {})",
        config.episodes,
        records.len(),
        config.seed
    );

    for episode in 0..config.episodes {
        shuffle(&mut explore_rng, &mut records);

        for record in &records {
            let state = record_state(&config.bins, record);

            // Epsilon-greedy: explore uniformly, otherwise exploit.
            let action = if explore_rng.chance(epsilon) {
                Action::from_index(explore_rng.next_usize_below(NUM_ACTIONS))
                    .unwrap_or(Action::Reject)
            } else {
                store.best_action(&state)
            };

            let r = reward(action, record.pd, record.defaulted);

            // One-step Bellman update with next_state == state.
            let next_max = store.max_value(&state);
            let row = store.row_mut(state);
            let old = row[action.index()];
            row[action.index()] = old + config.alpha * (r + config.gamma * next_max - old);
        }

        epsilon = (epsilon * config.epsilon_decay).max(config.min_epsilon);

        if (episode + 1) % 100 == 0 {
            log::info!(
                "episode {}/{}: epsilon={:.3} states={}",
                episode + 1,
                config.episodes,
                epsilon,
                store.len()
            );
        }
    }

    log::info!("training done: {} states explored", store.len());
    Ok(PolicyArtifact::from_store(
        &store,
        config.bins.clone(),
        config.seed,
        config.episodes,
    ))
}
