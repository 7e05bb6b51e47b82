use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetaError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to persist attribute '{key}': {message}")]
    Persistence { key: String, message: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MetaError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} not found: {id}"))
    }

    /// Errors that abort a request before anything is mutated.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Configuration(_) | Self::AccessDenied(_)
        )
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::ConstraintViolation(message) => message
                .to_lowercase()
                .contains("unique constraint violation"),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MetaError>;

impl From<serde_json::Error> for MetaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
