use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::error::{ClassifierError, ValidationError};
use super::model::ToxicityModel;
use super::normalizer::{is_informational, normalize};
use super::tier::ConfidenceTier;
use super::vectorizer::TextVectorizer;

/// Label of the positive ("toxic") class
pub const TOXIC_LABEL: i64 = 1;
/// Label of the negative ("normal") class
pub const NORMAL_LABEL: i64 = 0;

/// Outcome of classifying one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub original_text: String,
    pub cleaned_text: String,
    pub is_toxic: bool,
    pub label: i64,
    /// Probability the model assigned to the predicted label
    pub confidence: f32,
    pub confidence_level: ConfidenceTier,
    pub toxic_probability: f32,
    pub normal_probability: f32,
}

/// Normalize, vectorize, classify, and bucket one text at a time.
///
/// The pipeline owns nothing mutable: both artifacts sit behind `Arc` and are only read,
/// so a single pipeline can be shared across threads.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use toxic_classifier::ModelLoader;
///
/// let pipeline = ModelLoader::from_env().load_pipeline()?;
/// let result = pipeline.predict("Chào bạn, hôm nay thế nào?")?;
/// println!("{} ({:.1}%, {})", result.is_toxic, result.confidence * 100.0, result.confidence_level);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClassificationPipeline {
    vectorizer: Arc<dyn TextVectorizer>,
    model: Arc<dyn ToxicityModel>,
}

impl std::fmt::Debug for ClassificationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationPipeline")
            .field("vectorizer_dimension", &self.vectorizer.dimension())
            .field("model_input_dimension", &self.model.input_dimension())
            .finish()
    }
}

impl ClassificationPipeline {
    /// Pairs a vectorizer with the classifier it was trained alongside
    pub fn new(vectorizer: Arc<dyn TextVectorizer>, model: Arc<dyn ToxicityModel>) -> Self {
        Self { vectorizer, model }
    }

    /// Applies the text normalization the vectorizer was fitted on
    pub fn preprocess(&self, raw_text: &str) -> String {
        normalize(raw_text)
    }

    pub fn vectorize(&self, normalized: &str) -> Result<ndarray::Array1<f32>, ClassifierError> {
        self.vectorizer.transform(normalized)
    }

    /// Classifies one text.
    ///
    /// # Errors
    /// * `ValidationError(EmptyInput)` for empty or whitespace-only text; the model is not called
    /// * `ValidationError(UnprocessableInput)` when nothing informational survives normalization
    /// * `InferenceError` when the vectorizer or classifier fails, or returns a label other than 0/1
    pub fn predict(&self, raw_text: &str) -> Result<PredictionResult, ClassifierError> {
        if raw_text.trim().is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }

        let cleaned_text = self.preprocess(raw_text);
        if !is_informational(&cleaned_text) {
            return Err(ValidationError::UnprocessableInput {
                original: raw_text.to_string(),
            }
            .into());
        }

        let features = self.vectorize(&cleaned_text)?;
        let (label, probabilities) = self.model.predict_with_proba(&features)?;
        debug!("Predicted label {} with probabilities {:?}", label, probabilities);

        let confidence = match label {
            NORMAL_LABEL | TOXIC_LABEL => probabilities[label as usize],
            other => {
                return Err(ClassifierError::inference(format!(
                    "Classifier returned unknown label {}",
                    other
                )))
            }
        };

        Ok(PredictionResult {
            original_text: raw_text.to_string(),
            cleaned_text,
            is_toxic: label == TOXIC_LABEL,
            label,
            confidence,
            confidence_level: Self::bucket_confidence(confidence),
            toxic_probability: probabilities[1],
            normal_probability: probabilities[0],
        })
    }

    /// Maps a confidence value onto its tier
    pub fn bucket_confidence(confidence: f32) -> ConfidenceTier {
        ConfidenceTier::from_confidence(confidence)
    }
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ClassificationPipeline>();
    }
};
