use serde::Serialize;

/// Failure raised anywhere between payload normalization and the last
/// scored combination.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("invalid `{field}`: {message}")]
    Validation { field: String, message: String },
    #[error("prediction failed: {0}")]
    Inference(String),
    #[error("{requested} combinations exceed the limit of {limit}")]
    TooManyCombinations { requested: usize, limit: usize },
    #[error("enumeration cancelled after {scored} of {total} combinations")]
    Cancelled { scored: usize, total: usize },
}

impl PredictionError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            PredictionError::Validation { .. } => ErrorKind::ValidationError,
            PredictionError::Inference(_) => ErrorKind::PredictionError,
            PredictionError::TooManyCombinations { .. } => ErrorKind::TooManyCombinations,
            PredictionError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }
}

/// Stable tag for each failure class, reported next to the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ModelUnavailable,
    ValidationError,
    PredictionError,
    TooManyCombinations,
    Cancelled,
}
