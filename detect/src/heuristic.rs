use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Classification, ClassificationResult, Classifier, ClassifierError, ClassifyInput};

/// Canonical file size separating the two verdicts.
///
/// About 9.4 seconds of 16kHz mono 16-bit PCM.
pub const DEFAULT_THRESHOLD_BYTES: u64 = 300_000;

const SHORT_CONFIDENCE: f64 = 0.8;
const SHORT_EXPLANATION: &str = "Low temporal variance and uniform speech characteristics detected";
const LONG_CONFIDENCE: f64 = 0.75;
const LONG_EXPLANATION: &str = "Natural energy variation and irregular speech patterns detected";

/// Configuration for [`HeuristicClassifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub threshold_bytes: u64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
        }
    }
}

/// Size-threshold classifier.
///
/// Signals shorter than the threshold are labelled AI_GENERATED, longer ones
/// HUMAN. File size says nothing about how a voice was produced: this is a
/// deterministic placeholder for wiring and fallback, and should be replaced
/// by a real model rather than tuned.
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    config: HeuristicConfig,
}

impl HeuristicClassifier {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn threshold_bytes(&self) -> u64 {
        self.config.threshold_bytes
    }

    /// Decision for a canonical signal of `byte_len` bytes.
    pub fn decide(&self, byte_len: u64) -> ClassificationResult {
        if byte_len < self.config.threshold_bytes {
            ClassificationResult {
                classification: Classification::AiGenerated,
                confidence_score: SHORT_CONFIDENCE,
                explanation: SHORT_EXPLANATION.to_string(),
            }
        } else {
            ClassificationResult {
                classification: Classification::Human,
                confidence_score: LONG_CONFIDENCE,
                explanation: LONG_EXPLANATION.to_string(),
            }
        }
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn classify(
        &self,
        input: &ClassifyInput<'_>,
    ) -> Result<ClassificationResult, ClassifierError> {
        Ok(self.decide(input.signal.byte_len()))
    }
}
