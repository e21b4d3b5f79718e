#![allow(dead_code)]

use std::sync::Arc;

use ndarray::Array1;
use toxic_classifier::{
    classifier::TfidfArtifact, ClassificationPipeline, ClassifierError, TfidfVectorizer,
    ToxicityModel,
};

pub const VECTORIZER_JSON: &str = r#"{
    "vocabulary": {"ngu": 0, "ngốc": 1, "đồ": 2, "chào": 3, "bạn": 4, "tuyệt": 5, "vời": 6, "đồ ngốc": 7},
    "idf": [2.0, 2.0, 1.5, 1.2, 1.0, 1.8, 1.8, 2.5],
    "ngram_range": [1, 2],
    "sublinear_tf": true
}"#;

pub fn vectorizer() -> TfidfVectorizer {
    let artifact: TfidfArtifact = serde_json::from_str(VECTORIZER_JSON).unwrap();
    TfidfVectorizer::from_artifact(artifact).unwrap()
}

/// Logistic scorer over the test vocabulary standing in for the tree model
pub struct LinearModel {
    weights: Array1<f32>,
    bias: f32,
}

impl LinearModel {
    pub fn new() -> Self {
        Self {
            weights: Array1::from(vec![6.0, 6.0, 1.0, -4.0, -1.0, -4.0, -4.0, 6.0]),
            bias: -0.5,
        }
    }

    fn toxic_probability(&self, features: &Array1<f32>) -> Result<f32, ClassifierError> {
        if features.len() != self.weights.len() {
            return Err(ClassifierError::inference(format!(
                "expected {} features, got {}",
                self.weights.len(),
                features.len()
            )));
        }
        let z = self.weights.dot(features) + self.bias;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl ToxicityModel for LinearModel {
    fn predict(&self, features: &Array1<f32>) -> Result<i64, ClassifierError> {
        Ok(if self.toxic_probability(features)? > 0.5 { 1 } else { 0 })
    }

    fn predict_proba(&self, features: &Array1<f32>) -> Result<[f32; 2], ClassifierError> {
        let p = self.toxic_probability(features)?;
        Ok([1.0 - p, p])
    }

    fn input_dimension(&self) -> Option<usize> {
        Some(self.weights.len())
    }
}

pub fn pipeline() -> ClassificationPipeline {
    ClassificationPipeline::new(Arc::new(vectorizer()), Arc::new(LinearModel::new()))
}
