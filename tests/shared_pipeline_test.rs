// Runs in its own test binary so the process-wide pipeline starts out empty.

use std::fs;

use toxic_classifier::{shared_pipeline_with, ClassifierError, ModelError, ModelLoader};

#[test]
fn test_failed_load_is_retried() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let loader = ModelLoader::new(dir.path());

    match shared_pipeline_with(&loader) {
        Err(ClassifierError::ModelUnavailable(ModelError::NotFound(_))) => {}
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }

    fs::write(dir.path().join("tfidf_vectorizer.json"), "{ broken")?;
    fs::write(dir.path().join("xgboost_toxic_classifier.onnx"), b"unused")?;

    // a cached failure would still report NotFound
    match shared_pipeline_with(&loader) {
        Err(ClassifierError::ModelUnavailable(ModelError::Format { path, .. })) => {
            assert!(path.ends_with("tfidf_vectorizer.json"));
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
    Ok(())
}
