use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input error: {message}")]
    Input { message: String },

    #[error("Classifier request failed: {0}")]
    Classifier(#[from] reqwest::Error),

    #[error("Classification failed: {message}")]
    Classification { message: String },

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfig { field: String },
}

impl BatchError {
    pub fn input(message: impl Into<String>) -> Self {
        BatchError::Input {
            message: message.into(),
        }
    }

    pub fn classification(message: impl Into<String>) -> Self {
        BatchError::Classification {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
