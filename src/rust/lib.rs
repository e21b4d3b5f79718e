//! Toxic comment detection with a pre-trained TF-IDF vectorizer and gradient boosted tree
//! classifier.
//!
//! The model artifacts are produced elsewhere and loaded from a `models/` directory:
//! `tfidf_vectorizer.json` (the fitted vectorizer's vocabulary, idf weights and
//! parameters) and `xgboost_toxic_classifier.onnx` (the classifier converted to ONNX).
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use toxic_classifier::ModelLoader;
//!
//! let pipeline = ModelLoader::new("models").load_pipeline()?;
//! let result = pipeline.predict("Bạn thật tuyệt vời!")?;
//! println!("toxic: {} ({} confidence)", result.is_toxic, result.confidence_level);
//! # Ok(())
//! # }
//! ```
//!
//! # Shared Pipeline
//!
//! Loading reads and parses both artifacts, so long-running callers keep one pipeline for
//! the whole process. [`shared_pipeline`] loads it on first use and hands out a
//! `&'static` reference afterwards:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::thread;
//!
//! let mut handles = vec![];
//! for text in ["xin chào", "đồ ngốc"] {
//!     handles.push(thread::spawn(move || {
//!         let pipeline = toxic_classifier::shared_pipeline().unwrap();
//!         pipeline.predict(text).unwrap()
//!     }));
//! }
//!
//! for handle in handles {
//!     println!("{:?}", handle.join().unwrap());
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod classifier;
pub mod model_loader;
mod runtime;

pub use batch::{process_csv, BatchError, BatchOutcome, BatchRow, BatchSummary, ResultFilter};
pub use classifier::{
    normalize, normalize_optional, ClassificationPipeline, ClassifierError, ConfidenceTier,
    OnnxClassifier, PredictionResult, TextVectorizer, TfidfVectorizer, ToxicityModel,
    ValidationError,
};
pub use model_loader::{shared_pipeline, shared_pipeline_with, ModelError, ModelLoader};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
