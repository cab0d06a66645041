use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid request field '{field}': {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    #[error("Scorer '{scorer}' requires feature '{feature}' which is absent from the input")]
    MissingFeature { scorer: String, feature: String },

    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
