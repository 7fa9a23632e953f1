use thiserror::Error;

#[derive(Error, Debug)]
pub enum AkiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid input at row {row}: {message}")]
    InvalidInput { row: usize, message: String },

    #[error("Parameter validation error: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Random number generation error")]
    Random,
}

pub type AkiResult<T> = Result<T, AkiError>;
