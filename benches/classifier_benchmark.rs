use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array1;
use toxic_classifier::classifier::TfidfArtifact;
use toxic_classifier::{
    normalize, process_csv, ClassificationPipeline, ClassifierError, TextVectorizer,
    TfidfVectorizer, ToxicityModel,
};

const SHORT_TEXT: &str = "Đồ ngốc @admin!!!";
const MEDIUM_TEXT: &str = "Chào bạn, hôm nay thế nào? Xem thêm tại https://example.com/bai-viet \
     và cho mình biết ý kiến nhé @ban_than. Cảm ơn rất nhiều!!!";

fn long_text() -> String {
    MEDIUM_TEXT.repeat(20)
}

fn setup_vectorizer() -> TfidfVectorizer {
    let words = [
        "chào", "bạn", "hôm", "nay", "thế", "nào", "xem", "thêm", "tại", "và", "cho", "mình",
        "biết", "kiến", "nhé", "cảm", "ơn", "rất", "nhiều", "đồ", "ngốc", "ngu",
    ];
    let mut vocabulary = std::collections::HashMap::new();
    for (i, w) in words.iter().enumerate() {
        vocabulary.insert(w.to_string(), i);
    }
    for (i, pair) in words.windows(2).enumerate() {
        vocabulary.insert(pair.join(" "), words.len() + i);
    }
    let dimension = vocabulary.len();
    TfidfVectorizer::from_artifact(TfidfArtifact {
        vocabulary,
        idf: Some(vec![1.5; dimension]),
        ngram_range: (1, 2),
        sublinear_tf: true,
        binary: false,
        norm: Some(toxic_classifier::classifier::Norm::L2),
        lowercase: true,
        token_pattern: None,
        stop_words: None,
        analyzer: toxic_classifier::classifier::Analyzer::Word,
    })
    .unwrap()
}

/// Constant-cost stand-in so the benchmarks measure the pipeline, not a model
struct SumModel;

impl ToxicityModel for SumModel {
    fn predict(&self, features: &Array1<f32>) -> Result<i64, ClassifierError> {
        Ok(if features.sum() > 1.0 { 1 } else { 0 })
    }

    fn predict_proba(&self, features: &Array1<f32>) -> Result<[f32; 2], ClassifierError> {
        let p = (features.sum() / 2.0).clamp(0.0, 1.0);
        Ok([1.0 - p, p])
    }
}

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Normalization");

    // Configure sampling
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let long = long_text();
    group.bench_function("short_text", |b| b.iter(|| normalize(black_box(SHORT_TEXT))));
    group.bench_function("medium_text", |b| b.iter(|| normalize(black_box(MEDIUM_TEXT))));
    group.bench_function("long_text", |b| b.iter(|| normalize(black_box(&long))));

    group.finish();
}

fn bench_vectorization(c: &mut Criterion) {
    let vectorizer = setup_vectorizer();
    let mut group = c.benchmark_group("Vectorization");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let medium = normalize(MEDIUM_TEXT);
    let long = normalize(&long_text());
    group.bench_function("medium_text", |b| b.iter(|| vectorizer.transform(black_box(&medium)).unwrap()));
    group.bench_function("long_text", |b| b.iter(|| vectorizer.transform(black_box(&long)).unwrap()));

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let pipeline = ClassificationPipeline::new(Arc::new(setup_vectorizer()), Arc::new(SumModel));
    let mut group = c.benchmark_group("Batch");
    group.sample_size(20);

    for &rows in &[10usize, 100, 1000] {
        let mut csv = String::from("Content\n");
        for i in 0..rows {
            let text = if i % 2 == 0 { SHORT_TEXT } else { MEDIUM_TEXT };
            csv.push_str(&format!("\"{}\"\n", text));
        }
        group.bench_function(format!("rows_{}", rows), |b| {
            b.iter(|| process_csv(&pipeline, black_box(csv.as_bytes())).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalization, bench_vectorization, bench_batch);
criterion_main!(benches);
