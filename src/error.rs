use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Input has no header row")]
    EmptyInput,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Keyword rules for category '{category}' could not be compiled: {source}")]
    InvalidKeyword {
        category: String,
        #[source]
        source: regex::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
