use crate::model_loader::ModelError;

/// Why an input was rejected before reaching the model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The caller passed an empty or whitespace-only text
    #[error("empty input")]
    EmptyInput,
    /// Nothing informational survived normalization. Keeps the original text for diagnostics.
    #[error("unprocessable input (original text: {original:?})")]
    UnprocessableInput { original: String },
}

impl ValidationError {
    /// Short tag identifying the kind of rejection
    pub fn tag(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty input",
            Self::UnprocessableInput { .. } => "unprocessable input",
        }
    }
}

/// Represents the different types of errors that can occur in the toxicity classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The vectorizer or classifier artifact could not be loaded
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
    /// The input was rejected before inference
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),
    /// The vectorizer or classifier failed while running
    #[error("Inference error: {message}")]
    InferenceError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ClassifierError {
    pub fn inference(message: impl Into<String>) -> Self {
        Self::InferenceError {
            message: message.into(),
            source: None,
        }
    }

    pub fn inference_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InferenceError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the validation error when the input was rejected
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::ValidationError(v) => Some(v),
            _ => None,
        }
    }
}

impl From<ort::Error> for ClassifierError {
    fn from(err: ort::Error) -> Self {
        ClassifierError::inference_with("ONNX Runtime call failed", err)
    }
}
