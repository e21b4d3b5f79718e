use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::info;
use ndarray::Array1;
use regex::Regex;
use serde::Deserialize;

use super::error::ClassifierError;
use super::utils::{l1_normalize, l2_normalize};
use crate::model_loader::ModelError;

/// Turns normalized text into the numeric feature vector the classifier expects.
///
/// Implementations must be the exact transform paired with the classifier at training
/// time. They are loaded once and only read afterwards, so they must be `Send + Sync`.
pub trait TextVectorizer: Send + Sync {
    /// Transforms one document into a dense feature vector
    fn transform(&self, text: &str) -> Result<Array1<f32>, ClassifierError>;

    /// Number of features produced by [`transform`](Self::transform)
    fn dimension(&self) -> usize;
}

const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    Word,
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

fn default_analyzer() -> Analyzer {
    Analyzer::Word
}

/// On-disk form of a fitted TF-IDF vectorizer, exported from the training environment.
///
/// Field names and defaults follow scikit-learn's `TfidfVectorizer`, so an export only
/// needs the fitted `vocabulary_` and `idf_` plus any non-default parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Option<Vec<f32>>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub binary: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub token_pattern: Option<String>,
    #[serde(default)]
    pub stop_words: Option<Vec<String>>,
    #[serde(default = "default_analyzer")]
    pub analyzer: Analyzer,
}

/// Word-level TF-IDF vectorizer reproducing scikit-learn's transform.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Array1<f32>>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    binary: bool,
    norm: Option<Norm>,
    lowercase: bool,
    token_pattern: Regex,
    stop_words: HashSet<String>,
    dimension: usize,
}

impl TfidfVectorizer {
    /// Loads a vectorizer from its JSON export
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let artifact: TfidfArtifact =
            serde_json::from_str(&contents).map_err(|source| ModelError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        let vectorizer = Self::from_artifact(artifact)?;
        info!(
            "Vectorizer loaded from {:?} ({} features, ngram range {:?})",
            path, vectorizer.dimension, vectorizer.ngram_range
        );
        Ok(vectorizer)
    }

    /// Builds a vectorizer from an already parsed artifact, validating its structure
    pub fn from_artifact(artifact: TfidfArtifact) -> Result<Self, ModelError> {
        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelError::InvalidArtifact(format!(
                "Invalid ngram range ({}, {})",
                min_n, max_n
            )));
        }
        if artifact.vocabulary.is_empty() {
            return Err(ModelError::InvalidArtifact("Vocabulary is empty".into()));
        }

        let dimension = match &artifact.idf {
            Some(idf) => idf.len(),
            None => artifact.vocabulary.values().max().map_or(0, |&m| m + 1),
        };
        if let Some((term, &index)) = artifact.vocabulary.iter().find(|(_, &i)| i >= dimension) {
            return Err(ModelError::InvalidArtifact(format!(
                "Vocabulary term {:?} has index {} but the vectorizer has {} features",
                term, index, dimension
            )));
        }

        let pattern = artifact.token_pattern.as_deref().unwrap_or(DEFAULT_TOKEN_PATTERN);
        let token_pattern = Regex::new(pattern).map_err(|e| {
            ModelError::InvalidArtifact(format!("Invalid token pattern {:?}: {}", pattern, e))
        })?;
        if token_pattern.captures_len() > 2 {
            return Err(ModelError::InvalidArtifact(
                "Token pattern may contain at most one capturing group".into(),
            ));
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf.map(Array1::from),
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            binary: artifact.binary,
            norm: artifact.norm,
            lowercase: artifact.lowercase,
            token_pattern,
            stop_words: artifact.stop_words.unwrap_or_default().into_iter().collect(),
            dimension,
        })
    }

    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        // With one capturing group the group is the token, as in scikit-learn.
        let use_group = self.token_pattern.captures_len() == 2;
        self.token_pattern
            .captures_iter(text)
            .filter_map(|caps| if use_group { caps.get(1) } else { caps.get(0) })
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect()
    }

    fn ngrams(&self, tokens: &[&str]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let mut grams = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            grams.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        grams
    }

    /// Term counts for one document, keyed by feature index
    fn term_counts(&self, text: &str) -> HashMap<usize, f32> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens = self.tokenize(&text);

        let mut counts = HashMap::new();
        for gram in self.ngrams(&tokens) {
            if let Some(&index) = self.vocabulary.get(&gram) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        counts
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn transform(&self, text: &str) -> Result<Array1<f32>, ClassifierError> {
        let mut vector = Array1::<f32>::zeros(self.dimension);

        for (index, count) in self.term_counts(text) {
            let tf = if self.binary {
                1.0
            } else if self.sublinear_tf {
                1.0 + count.ln()
            } else {
                count
            };
            let idf = self.idf.as_ref().map_or(1.0, |idf| idf[index]);
            vector[index] = tf * idf;
        }

        Ok(match self.norm {
            Some(Norm::L2) => l2_normalize(&vector),
            Some(Norm::L1) => l1_normalize(&vector),
            None => vector,
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(json: &str) -> TfidfArtifact {
        serde_json::from_str(json).unwrap()
    }

    fn vectorizer(json: &str) -> TfidfVectorizer {
        TfidfVectorizer::from_artifact(artifact(json)).unwrap()
    }

    #[test]
    fn test_defaults_follow_sklearn() {
        let a = artifact(r#"{"vocabulary": {"ngu": 0}}"#);
        assert_eq!(a.ngram_range, (1, 1));
        assert_eq!(a.norm, Some(Norm::L2));
        assert!(a.lowercase);
        assert!(!a.sublinear_tf);
        assert_eq!(a.analyzer, Analyzer::Word);
    }

    #[test]
    fn test_explicit_null_norm() {
        let a = artifact(r#"{"vocabulary": {"ngu": 0}, "norm": null}"#);
        assert_eq!(a.norm, None);
    }

    #[test]
    fn test_single_char_tokens_are_ignored() {
        let v = vectorizer(r#"{"vocabulary": {"a": 0, "ab": 1}, "norm": null}"#);
        let out = v.transform("a ab a").unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 1.0);
    }

    #[test]
    fn test_counts_and_idf_without_norm() {
        let v = vectorizer(
            r#"{"vocabulary": {"đồ": 0, "ngốc": 1, "bạn": 2},
                "idf": [1.0, 2.0, 3.0], "norm": null}"#,
        );
        let out = v.transform("đồ ngốc ngốc").unwrap();
        assert_eq!(out.to_vec(), vec![1.0, 4.0, 0.0]);
    }

    #[test]
    fn test_sublinear_tf() {
        let v = vectorizer(r#"{"vocabulary": {"xx": 0}, "sublinear_tf": true, "norm": null}"#);
        let out = v.transform("xx xx xx").unwrap();
        assert!((out[0] - (1.0 + 3f32.ln())).abs() < 1e-6);
    }

    #[test]
    fn test_binary_counts() {
        let v = vectorizer(r#"{"vocabulary": {"xx": 0}, "binary": true, "norm": null}"#);
        assert_eq!(v.transform("xx xx").unwrap()[0], 1.0);
    }

    #[test]
    fn test_bigrams() {
        let v = vectorizer(
            r#"{"vocabulary": {"đồ ngốc": 0, "đồ": 1, "ngốc": 2}, "ngram_range": [1, 2], "norm": null}"#,
        );
        assert_eq!(v.transform("đồ ngốc").unwrap().to_vec(), vec![1.0, 1.0, 1.0]);
        // bigram-only range skips unigrams
        let v = vectorizer(
            r#"{"vocabulary": {"đồ ngốc": 0, "đồ": 1}, "ngram_range": [2, 2], "norm": null}"#,
        );
        assert_eq!(v.transform("đồ ngốc").unwrap().to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_stop_words_removed_before_ngrams() {
        let v = vectorizer(
            r#"{"vocabulary": {"rất ngu": 0}, "ngram_range": [2, 2],
                "stop_words": ["là"], "norm": null}"#,
        );
        assert_eq!(v.transform("rất là ngu").unwrap()[0], 1.0);
    }

    #[test]
    fn test_l2_norm_applied() {
        let v = vectorizer(r#"{"vocabulary": {"aa": 0, "bb": 1}}"#);
        let out = v.transform("aa aa aa bb bb bb bb").unwrap();
        assert!((out[0] - 0.6).abs() < 1e-6);
        assert!((out[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_words_give_zero_vector() {
        let v = vectorizer(r#"{"vocabulary": {"aa": 0, "bb": 1}}"#);
        let out = v.transform("zz yy").unwrap();
        assert!(out.iter().all(|&x| x == 0.0));
        assert_eq!(v.dimension(), 2);
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let result = TfidfVectorizer::from_artifact(artifact(
            r#"{"vocabulary": {"aa": 0, "bb": 5}, "idf": [1.0, 1.0]}"#,
        ));
        assert!(matches!(result, Err(ModelError::InvalidArtifact(_))));
    }

    #[test]
    fn test_rejects_bad_ngram_range() {
        let result = TfidfVectorizer::from_artifact(artifact(
            r#"{"vocabulary": {"aa": 0}, "ngram_range": [2, 1]}"#,
        ));
        assert!(matches!(result, Err(ModelError::InvalidArtifact(_))));
    }

    #[test]
    fn test_unsupported_analyzer_fails_to_parse() {
        let result: Result<TfidfArtifact, _> =
            serde_json::from_str(r#"{"vocabulary": {"aa": 0}, "analyzer": "char_wb"}"#);
        assert!(result.is_err());
    }
}
