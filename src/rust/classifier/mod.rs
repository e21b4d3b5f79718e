mod error;
mod model;
mod normalizer;
mod pipeline;
mod tier;
pub(crate) mod utils;
mod vectorizer;

pub use error::{ClassifierError, ValidationError};
pub use model::{OnnxClassifier, ToxicityModel};
pub use normalizer::{normalize, normalize_optional};
pub use pipeline::{ClassificationPipeline, PredictionResult, NORMAL_LABEL, TOXIC_LABEL};
pub use tier::ConfidenceTier;
pub use vectorizer::{Analyzer, Norm, TextVectorizer, TfidfArtifact, TfidfVectorizer};
