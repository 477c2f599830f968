use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Artifact serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Malformed frame data: {0}")]
    MalformedFrame(String),

    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error(
        "Class \"{label}\" has {available} samples, not enough for a {requested}-sample holdout"
    )]
    InsufficientSamples {
        label: String,
        available: usize,
        requested: usize,
    },

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

pub type Result<T> = std::result::Result<T, Error>;
