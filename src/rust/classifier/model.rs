use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2};
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use crate::model_loader::ModelError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A trained binary classifier over vectorized text.
///
/// Class `0` is "normal" and class `1` is "toxic". `predict_proba` returns
/// `[p_normal, p_toxic]`.
pub trait ToxicityModel: Send + Sync {
    /// Predicted class label for one feature vector
    fn predict(&self, features: &Array1<f32>) -> Result<i64, ClassifierError>;

    /// Class probabilities `[p_normal, p_toxic]` for one feature vector
    fn predict_proba(&self, features: &Array1<f32>) -> Result<[f32; 2], ClassifierError>;

    /// Label and probabilities together.
    ///
    /// Backends that produce both from one call should override this. No attempt is
    /// made to reconcile the two; they are returned exactly as the model gives them.
    fn predict_with_proba(&self, features: &Array1<f32>) -> Result<(i64, [f32; 2]), ClassifierError> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }

    /// Number of input features, when the model declares a fixed width
    fn input_dimension(&self) -> Option<usize> {
        None
    }
}

/// ONNX Runtime backed gradient-boosted-tree classifier.
///
/// Expects the layout produced by the usual tree-model converters: one float input of
/// shape `[batch, n_features]`, an int64 `label` output first and a float
/// `probabilities` output of shape `[batch, 2]` second.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    input_dimension: Option<usize>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxClassifier>();
    }
};

impl OnnxClassifier {
    /// Loads and validates an ONNX classifier
    pub fn from_file<P: AsRef<Path>>(path: P, config: &RuntimeConfig) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let session = create_session_builder(config)?.commit_from_file(path)?;
        Self::validate_model(&session)?;
        info!("Classifier model structure validated successfully");

        let input = &session.inputs[0];
        let input_name = input.name.clone();
        let input_dimension = input
            .input_type
            .tensor_dimensions()
            .and_then(|dims| dims.last().copied())
            .filter(|&d| d > 0)
            .map(|d| d as usize);
        info!(
            "Classifier loaded from {:?} (input '{}', width {:?})",
            path, input_name, input_dimension
        );

        Ok(Self {
            session,
            input_name,
            input_dimension,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ModelError> {
        if session.inputs.is_empty() {
            return Err(ModelError::InvalidArtifact(
                "Classifier model must have one input for the feature vector".to_string(),
            ));
        }
        if session.outputs.len() < 2 {
            return Err(ModelError::InvalidArtifact(format!(
                "Classifier model must have label and probability outputs, found {} output(s)",
                session.outputs.len()
            )));
        }
        Ok(())
    }

    fn run(&self, features: &Array1<f32>) -> Result<(i64, [f32; 2]), ClassifierError> {
        if let Some(expected) = self.input_dimension {
            if features.len() != expected {
                return Err(ClassifierError::inference(format!(
                    "Feature vector has {} values but the model expects {}",
                    features.len(),
                    expected
                )));
            }
        }

        let input_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| ClassifierError::inference_with("Failed to create input array", e))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), Tensor::from_array(input_array)?);

        let outputs = self.session.run(input_tensors)?;

        let labels = outputs[0].try_extract_tensor::<i64>()?;
        let label = *labels
            .iter()
            .next()
            .ok_or_else(|| ClassifierError::inference("Model returned no label"))?;

        let probabilities = outputs[1].try_extract_tensor::<f32>()?;
        let values: Vec<f32> = probabilities.iter().copied().collect();
        if values.len() != 2 {
            return Err(ClassifierError::inference(format!(
                "Expected 2 class probabilities, model returned {}",
                values.len()
            )));
        }
        debug!("Model output: label={} probabilities={:?}", label, values);

        Ok((label, [values[0], values[1]]))
    }
}

impl ToxicityModel for OnnxClassifier {
    fn predict(&self, features: &Array1<f32>) -> Result<i64, ClassifierError> {
        self.run(features).map(|(label, _)| label)
    }

    fn predict_proba(&self, features: &Array1<f32>) -> Result<[f32; 2], ClassifierError> {
        self.run(features).map(|(_, proba)| proba)
    }

    fn predict_with_proba(&self, features: &Array1<f32>) -> Result<(i64, [f32; 2]), ClassifierError> {
        self.run(features)
    }

    fn input_dimension(&self) -> Option<usize> {
        self.input_dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let result = OnnxClassifier::from_file("/nonexistent/classifier.onnx", &RuntimeConfig::default());
        assert!(matches!(result, Err(ModelError::NotFound(_))));
    }
}
