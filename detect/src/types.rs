use std::fmt;

use serde::{Deserialize, Serialize};

/// Verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Human,
    AiGenerated,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Human => "HUMAN",
            Classification::AiGenerated => "AI_GENERATED",
        }
    }

    /// Parses the wire label (`HUMAN` / `AI_GENERATED`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HUMAN" => Some(Classification::Human),
            "AI_GENERATED" => Some(Classification::AiGenerated),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one classification.
///
/// `confidence_score` is always within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub(crate) classification: Classification,
    pub(crate) confidence_score: f64,
    pub(crate) explanation: String,
}

impl ClassificationResult {
    /// Returns `None` if `confidence_score` is not a finite value in `[0, 1]`.
    pub fn new(
        classification: Classification,
        confidence_score: f64,
        explanation: impl Into<String>,
    ) -> Option<Self> {
        if !(0.0..=1.0).contains(&confidence_score) {
            return None;
        }
        Some(Self {
            classification,
            confidence_score,
            explanation: explanation.into(),
        })
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_wire_labels() {
        assert_eq!(
            serde_json::to_string(&Classification::AiGenerated).unwrap(),
            r#""AI_GENERATED""#
        );
        assert_eq!(
            serde_json::from_str::<Classification>(r#""HUMAN""#).unwrap(),
            Classification::Human
        );
        assert_eq!(Classification::parse("AI_GENERATED"), Some(Classification::AiGenerated));
        assert_eq!(Classification::parse("human"), None);
        assert_eq!(Classification::Human.to_string(), "HUMAN");
    }

    #[test]
    fn test_result_rejects_out_of_range_scores() {
        assert!(ClassificationResult::new(Classification::Human, 0.0, "").is_some());
        assert!(ClassificationResult::new(Classification::Human, 1.0, "").is_some());
        assert!(ClassificationResult::new(Classification::Human, 1.01, "").is_none());
        assert!(ClassificationResult::new(Classification::Human, -0.1, "").is_none());
        assert!(ClassificationResult::new(Classification::Human, f64::NAN, "").is_none());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let r = ClassificationResult::new(Classification::AiGenerated, 0.8, "flat").unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["classification"], "AI_GENERATED");
        assert_eq!(v["confidenceScore"], 0.8);
        assert_eq!(v["explanation"], "flat");
    }
}
