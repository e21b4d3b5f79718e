//! CSV batch classification.
//!
//! Reads a CSV with a text column, classifies every row with the same pipeline used for
//! single texts and writes one result row per input row, in input order.

use std::io::{Read, Write};
use std::str::FromStr;

use log::{info, warn};
use serde::Serialize;

use crate::classifier::utils::truncate_chars;
use crate::classifier::{ClassificationPipeline, ClassifierError, PredictionResult};

/// Accepted names for the text column, in priority order
pub const TEXT_COLUMN_ALIASES: [&str; 5] = ["Content", "content", "text", "Text", "cleaned_content"];

/// Header of the result CSV, in [`BatchRow`] field order
pub const OUTPUT_COLUMNS: [&str; 6] = [
    "text",
    "is_toxic",
    "label",
    "confidence",
    "toxic_probability",
    "normal_probability",
];

/// Characters of input text kept in the output `text` column
pub const MAX_TEXT_CHARS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("No text column found (expected one of {expected:?}, found {found:?})")]
    MissingTextColumn {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Row {row}: {source}")]
    Classification {
        row: usize,
        #[source]
        source: ClassifierError,
    },
}

/// One line of the result CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    pub text: String,
    pub is_toxic: bool,
    pub label: i64,
    pub confidence: f32,
    pub toxic_probability: f32,
    pub normal_probability: f32,
}

impl BatchRow {
    fn from_prediction(text: &str, result: &PredictionResult) -> Self {
        Self {
            text: truncate_chars(text, MAX_TEXT_CHARS),
            is_toxic: result.is_toxic,
            label: result.label,
            confidence: result.confidence,
            toxic_probability: result.toxic_probability,
            normal_probability: result.normal_probability,
        }
    }

    /// Row for text rejected before inference: counted as normal with zero scores
    fn rejected(text: &str) -> Self {
        Self {
            text: truncate_chars(text, MAX_TEXT_CHARS),
            is_toxic: false,
            label: 0,
            confidence: 0.0,
            toxic_probability: 0.0,
            normal_probability: 0.0,
        }
    }
}

/// Which rows to keep when writing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFilter {
    #[default]
    All,
    ToxicOnly,
    NormalOnly,
}

impl ResultFilter {
    pub fn accepts(&self, row: &BatchRow) -> bool {
        match self {
            Self::All => true,
            Self::ToxicOnly => row.is_toxic,
            Self::NormalOnly => !row.is_toxic,
        }
    }
}

impl FromStr for ResultFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "toxic" => Ok(Self::ToxicOnly),
            "normal" => Ok(Self::NormalOnly),
            other => Err(format!("unknown filter '{}' (expected all, toxic or normal)", other)),
        }
    }
}

/// Aggregate figures over a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub toxic_count: usize,
    pub normal_count: usize,
    /// Rows rejected as empty or unprocessable (also counted as normal)
    pub rejected_count: usize,
    pub average_confidence: f32,
}

impl BatchSummary {
    fn from_rows(rows: &[BatchRow], rejected_count: usize) -> Self {
        let total = rows.len();
        let toxic_count = rows.iter().filter(|r| r.is_toxic).count();
        let average_confidence = if total > 0 {
            rows.iter().map(|r| r.confidence).sum::<f32>() / total as f32
        } else {
            0.0
        };
        Self {
            total,
            toxic_count,
            normal_count: total - toxic_count,
            rejected_count,
            average_confidence,
        }
    }

    pub fn toxic_percentage(&self) -> f32 {
        percentage(self.toxic_count, self.total)
    }

    pub fn normal_percentage(&self) -> f32 {
        percentage(self.normal_count, self.total)
    }
}

fn percentage(count: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        count as f32 / total as f32 * 100.0
    }
}

/// Result rows in input order plus their summary
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub text_column: String,
    pub rows: Vec<BatchRow>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    /// Writes the rows accepted by `filter` as CSV
    pub fn write_csv<W: Write>(&self, writer: W, filter: ResultFilter) -> Result<usize, BatchError> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(OUTPUT_COLUMNS)?;
        let mut written = 0;
        for row in self.rows.iter().filter(|r| filter.accepts(r)) {
            csv_writer.serialize(row)?;
            written += 1;
        }
        csv_writer.flush()?;
        Ok(written)
    }
}

/// Picks the text column from a header row using [`TEXT_COLUMN_ALIASES`]
pub fn detect_text_column(headers: &csv::StringRecord) -> Result<(usize, String), BatchError> {
    for alias in TEXT_COLUMN_ALIASES {
        if let Some(index) = headers.iter().position(|h| h == alias) {
            return Ok((index, alias.to_string()));
        }
    }
    Err(BatchError::MissingTextColumn {
        expected: TEXT_COLUMN_ALIASES.iter().map(|s| s.to_string()).collect(),
        found: headers.iter().map(str::to_string).collect(),
    })
}

/// Classifies every row of a CSV.
///
/// Rows whose text is empty or unprocessable are kept with zeroed scores. An inference
/// failure aborts the whole batch.
pub fn process_csv<R: Read>(pipeline: &ClassificationPipeline, reader: R) -> Result<BatchOutcome, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let (column, text_column) = detect_text_column(&headers)?;
    info!("Detected text column '{}'", text_column);

    let mut rows = Vec::new();
    let mut rejected_count = 0;
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let text = record.get(column).unwrap_or("");

        let row = match pipeline.predict(text) {
            Ok(result) => BatchRow::from_prediction(text, &result),
            Err(ClassifierError::ValidationError(reason)) => {
                warn!("Row {}: {}", index + 1, reason.tag());
                rejected_count += 1;
                BatchRow::rejected(text)
            }
            Err(source) => {
                return Err(BatchError::Classification {
                    row: index + 1,
                    source,
                })
            }
        };
        rows.push(row);

        if (index + 1) % 1000 == 0 {
            info!("Processed {} rows", index + 1);
        }
    }

    let summary = BatchSummary::from_rows(&rows, rejected_count);
    info!(
        "Batch complete: {} rows, {} toxic ({:.1}%), {} normal ({:.1}%), average confidence {:.1}%",
        summary.total,
        summary.toxic_count,
        summary.toxic_percentage(),
        summary.normal_count,
        summary.normal_percentage(),
        summary.average_confidence * 100.0
    );

    Ok(BatchOutcome {
        text_column,
        rows,
        summary,
    })
}
