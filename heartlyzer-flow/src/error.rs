use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Required field missing from answers: {0}")]
    MissingField(String),

    #[error("Invalid answer for field {field}: {value:?}")]
    InvalidAnswer { field: String, value: String },

    #[error("History index out of bounds: {0}")]
    HistoryIndexOutOfBounds(usize),

    #[error("An analysis is already in progress")]
    Busy,

    #[error("Prediction service rejected the request: {0}")]
    Remote(String),

    #[error("Prediction service unreachable: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
