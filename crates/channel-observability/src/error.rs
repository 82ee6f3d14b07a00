use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown link id: {0}")]
    UnknownLink(String),
}

pub type Result<T> = std::result::Result<T, ObservabilityError>;
