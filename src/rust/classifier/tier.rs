use std::fmt;

use serde::Serialize;

/// Human-readable bucket for the probability assigned to the predicted class.
///
/// | Confidence    | Tier        |
/// |---------------|-------------|
/// | [0, 0.50)     | Rất Thấp    |
/// | [0.50, 0.70)  | Thấp        |
/// | [0.70, 0.85)  | Trung Bình  |
/// | [0.85, 0.95)  | Cao         |
/// | [0.95, 1.0]   | Rất Cao     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ConfidenceTier {
    #[serde(rename = "Rất Thấp")]
    VeryLow,
    #[serde(rename = "Thấp")]
    Low,
    #[serde(rename = "Trung Bình")]
    Medium,
    #[serde(rename = "Cao")]
    High,
    #[serde(rename = "Rất Cao")]
    VeryHigh,
}

impl ConfidenceTier {
    pub const ALL: [ConfidenceTier; 5] = [
        Self::VeryLow,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::VeryHigh,
    ];

    /// Buckets a confidence value. Lower bounds are inclusive; NaN lands in `VeryLow`.
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.95 {
            Self::VeryHigh
        } else if confidence >= 0.85 {
            Self::High
        } else if confidence >= 0.70 {
            Self::Medium
        } else if confidence >= 0.50 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    /// Vietnamese display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryLow => "Rất Thấp",
            Self::Low => "Thấp",
            Self::Medium => "Trung Bình",
            Self::High => "Cao",
            Self::VeryHigh => "Rất Cao",
        }
    }

    pub fn english_label(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
