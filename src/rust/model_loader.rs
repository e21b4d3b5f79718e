use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::classifier::{
    ClassificationPipeline, ClassifierError, OnnxClassifier, TextVectorizer, TfidfVectorizer,
    ToxicityModel,
};
use crate::runtime::RuntimeConfig;

/// Environment variable overriding the models directory
pub const MODELS_DIR_ENV: &str = "TOXIC_CLASSIFIER_MODELS";
pub const DEFAULT_MODELS_DIR: &str = "models";
pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const CLASSIFIER_FILE: &str = "xgboost_toxic_classifier.onnx";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed artifact {path:?}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
    #[error("ONNX Runtime error: {0}")]
    Runtime(#[from] ort::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Optional `manifest.json` pinning the SHA-256 of each artifact
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactManifest {
    pub vectorizer_sha256: Option<String>,
    pub classifier_sha256: Option<String>,
}

/// Locates, verifies, and deserializes the vectorizer and classifier artifacts.
///
/// Loading is not cached here; every call re-reads the files. Use
/// [`shared_pipeline`] for a process-wide instance.
#[derive(Debug, Clone)]
pub struct ModelLoader {
    models_dir: PathBuf,
    runtime_config: RuntimeConfig,
}

impl ModelLoader {
    pub fn new<P: AsRef<Path>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.as_ref().to_path_buf(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Creates a loader for the default models directory
    pub fn from_env() -> Self {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        match env::var(MODELS_DIR_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_MODELS_DIR),
        }
    }

    /// Sets the runtime configuration used for the classifier session
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_vectorizer_path(&self) -> PathBuf {
        self.models_dir.join(VECTORIZER_FILE)
    }

    pub fn get_classifier_path(&self) -> PathBuf {
        self.models_dir.join(CLASSIFIER_FILE)
    }

    pub fn get_manifest_path(&self) -> PathBuf {
        self.models_dir.join(MANIFEST_FILE)
    }

    pub fn is_model_available(&self) -> bool {
        let vectorizer_path = self.get_vectorizer_path();
        let classifier_path = self.get_classifier_path();
        log::info!("Checking if model files are present:");
        log::info!("  Vectorizer path: {:?} (exists: {})", vectorizer_path, vectorizer_path.exists());
        log::info!("  Classifier path: {:?} (exists: {})", classifier_path, classifier_path.exists());
        vectorizer_path.exists() && classifier_path.exists()
    }

    fn file_hash(path: &Path) -> Result<String, ModelError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn verify_file(path: &Path, expected_hash: &str, file_type: &str) -> Result<(), ModelError> {
        log::info!("Verifying {} file: {:?}", file_type, path);
        let actual = Self::file_hash(path)?;
        if !actual.eq_ignore_ascii_case(expected_hash) {
            log::error!("{} hash mismatch: expected {}, got {}", file_type, expected_hash, actual);
            return Err(ModelError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected_hash.to_string(),
                actual,
            });
        }
        log::info!("{} file verified successfully", file_type);
        Ok(())
    }

    /// Reads the manifest if there is one
    pub fn read_manifest(&self) -> Result<Option<ArtifactManifest>, ModelError> {
        let path = self.get_manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let manifest = serde_json::from_str(&contents)
            .map_err(|source| ModelError::Format { path, source })?;
        Ok(Some(manifest))
    }

    /// Checks both artifacts against the manifest. Passes when no manifest exists.
    pub fn verify_artifacts(&self) -> Result<(), ModelError> {
        let Some(manifest) = self.read_manifest()? else {
            log::info!("No manifest found, skipping checksum verification");
            return Ok(());
        };
        if let Some(expected) = &manifest.vectorizer_sha256 {
            Self::verify_file(&self.get_vectorizer_path(), expected, "vectorizer")?;
        }
        if let Some(expected) = &manifest.classifier_sha256 {
            Self::verify_file(&self.get_classifier_path(), expected, "classifier")?;
        }
        Ok(())
    }

    fn load_artifacts(&self) -> Result<(TfidfVectorizer, OnnxClassifier), ModelError> {
        log::info!("Loading model artifacts from {:?}", self.models_dir);
        for path in [self.get_vectorizer_path(), self.get_classifier_path()] {
            if !path.exists() {
                return Err(ModelError::NotFound(path));
            }
        }
        self.verify_artifacts()?;

        let vectorizer = TfidfVectorizer::from_file(self.get_vectorizer_path())?;
        let classifier = OnnxClassifier::from_file(self.get_classifier_path(), &self.runtime_config)?;

        if let Some(width) = classifier.input_dimension() {
            if width != vectorizer.dimension() {
                return Err(ModelError::InvalidArtifact(format!(
                    "Vectorizer produces {} features but the classifier expects {}; \
                     the artifacts come from different training runs",
                    vectorizer.dimension(),
                    width
                )));
            }
        }
        Ok((vectorizer, classifier))
    }

    /// Loads the vectorizer and classifier.
    ///
    /// # Errors
    /// `ClassifierError::ModelUnavailable` when either file is missing, unreadable,
    /// corrupt, fails its manifest checksum, or the pair is structurally incompatible.
    pub fn load(&self) -> Result<(TfidfVectorizer, OnnxClassifier), ClassifierError> {
        self.load_artifacts().map_err(|e| {
            log::error!("Failed to load model artifacts: {}", e);
            ClassifierError::ModelUnavailable(e)
        })
    }

    /// Loads both artifacts and wires them into a pipeline
    pub fn load_pipeline(&self) -> Result<ClassificationPipeline, ClassifierError> {
        let (vectorizer, classifier) = self.load()?;
        let vectorizer: Arc<dyn TextVectorizer> = Arc::new(vectorizer);
        let classifier: Arc<dyn ToxicityModel> = Arc::new(classifier);
        Ok(ClassificationPipeline::new(vectorizer, classifier))
    }
}

static SHARED_PIPELINE: OnceCell<ClassificationPipeline> = OnceCell::new();

/// Process-wide pipeline loaded from the default models directory.
///
/// The artifacts are read at most once per process on success. A failed load is
/// returned to the caller and not remembered, so a later call tries again.
pub fn shared_pipeline() -> Result<&'static ClassificationPipeline, ClassifierError> {
    SHARED_PIPELINE.get_or_try_init(|| ModelLoader::from_env().load_pipeline())
}

/// Like [`shared_pipeline`], but initializing from a specific loader on first use.
/// Later calls return the already loaded pipeline whatever loader they pass.
pub fn shared_pipeline_with(loader: &ModelLoader) -> Result<&'static ClassificationPipeline, ClassifierError> {
    SHARED_PIPELINE.get_or_try_init(|| loader.load_pipeline())
}
