use thiserror::Error;

impl From<serde_json::Error> for EvidenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for EvidenceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(format!("Evidence log I/O error: {}", err))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvidenceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Weak secret: {length} characters (minimum {minimum} required)")]
    WeakSecret { length: usize, minimum: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Integrity check refused: {0}")]
    Integrity(String),
}

impl EvidenceError {
    pub fn weak_secret(length: usize) -> Self {
        Self::WeakSecret {
            length,
            minimum: crate::secret::MIN_SECRET_LENGTH,
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::InvalidInput(format!("{} must not be empty", field))
    }

    /// True for errors caused by the caller's request rather than the
    /// server's configuration or storage.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidMetadata(_))
    }
}
