//! credit-core — five-stage credit decision pipeline with a Q-learning
//! recommendation head.
//!
//! Inference path: [`pipeline::DecisionEngine`] composes the four
//! pre-trained scorers and the trained policy into one decision per
//! request. Training path: [`trainer::train`] runs offline and produces
//! the policy artifact the engine loads at startup.

pub mod attribution;
pub mod bundle;
pub mod discretize;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod policy;
pub mod rng;
pub mod scorer;
pub mod trainer;
pub mod types;
