use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voxguard_process::{Invocation, ProcessError, truncate_diagnostic};

use crate::{Classification, ClassificationResult, Classifier, ClassifierError, ClassifyInput};

const MAX_DIAGNOSTIC_LEN: usize = 4096;

/// Which artifact the inference program receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeInput {
    /// The canonical 16kHz mono WAV.
    #[default]
    Canonical,
    /// The decoded upload, before transcoding.
    Raw,
}

/// Configuration for [`BridgeClassifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Program to run, e.g. `python3`.
    pub program: String,
    /// Arguments placed before the audio path and language.
    pub args: Vec<String>,
    pub input: BridgeInput,
    /// Wall-clock limit for one inference, in seconds.
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: Vec::new(),
            input: BridgeInput::Canonical,
            timeout_secs: 60,
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Classifier that delegates to an external inference program.
///
/// The program gets the audio path and the declared language as its last
/// two arguments and must print a single JSON object on stdout. Anything it
/// writes to stderr is kept as diagnostic text and never parsed.
#[derive(Debug, Clone)]
pub struct BridgeClassifier {
    config: BridgeConfig,
}

impl BridgeClassifier {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn invocation(&self, input: &ClassifyInput<'_>) -> Invocation {
        let audio = match self.config.input {
            BridgeInput::Canonical => input.signal.path(),
            BridgeInput::Raw => input.source,
        };
        let language = if input.language.is_empty() {
            "Unknown"
        } else {
            input.language
        };
        Invocation::new(&self.config.program)
            .args(&self.config.args)
            .arg(audio)
            .arg(language)
            .timeout(self.config.timeout())
    }
}

#[async_trait]
impl Classifier for BridgeClassifier {
    fn name(&self) -> &str {
        "bridge"
    }

    async fn classify(
        &self,
        input: &ClassifyInput<'_>,
    ) -> Result<ClassificationResult, ClassifierError> {
        let invocation = self.invocation(input);
        let output = invocation.run().await.map_err(|e| match e {
            ProcessError::Timeout { timeout, .. } => ClassifierError::Timeout(timeout),
            other => ClassifierError::Execution {
                status: None,
                diagnostic: other.to_string(),
            },
        })?;

        let stderr = truncate_diagnostic(&output.stderr_text(), MAX_DIAGNOSTIC_LEN);
        if !output.success() {
            warn!(
                "inference program `{}` exited with {:?}",
                invocation.program_name(),
                output.code()
            );
            return Err(ClassifierError::Execution {
                status: output.code(),
                diagnostic: stderr,
            });
        }
        if !stderr.is_empty() {
            debug!("inference program stderr: {}", stderr);
        }

        parse_reply(&output.stdout_text())
    }
}

/// Wire shape of the inference program's reply. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    classification: Option<String>,
    #[serde(default)]
    confidence_score: Option<f64>,
    #[serde(default)]
    explanation: Option<String>,
}

fn protocol(reason: impl Into<String>, output: &str) -> ClassifierError {
    ClassifierError::Protocol {
        reason: reason.into(),
        output: truncate_diagnostic(output, MAX_DIAGNOSTIC_LEN),
    }
}

/// Parses the program's stdout into a verdict.
pub(crate) fn parse_reply(stdout: &str) -> Result<ClassificationResult, ClassifierError> {
    let text = stdout.trim();
    if text.is_empty() {
        return Err(protocol("empty output", text));
    }

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| protocol(format!("not json: {e}"), text))?;
    if !value.is_object() {
        return Err(protocol("expected a json object", text));
    }
    let reply: Reply =
        serde_json::from_value(value)
            .map_err(|e| protocol(format!("unexpected shape: {e}"), text))?;

    // The reference inference script reports its own failures in-band.
    if reply.status.as_deref() == Some("error") {
        return Err(ClassifierError::Execution {
            status: Some(0),
            diagnostic: reply
                .message
                .unwrap_or_else(|| "inference program reported an error".to_string()),
        });
    }

    let label = reply
        .classification
        .ok_or_else(|| protocol("missing classification", text))?;
    let classification = Classification::parse(&label)
        .ok_or_else(|| protocol(format!("unknown classification {label:?}"), text))?;
    let raw_score = reply
        .confidence_score
        .ok_or_else(|| protocol("missing confidenceScore", text))?;
    let score = normalize_score(raw_score)
        .ok_or_else(|| protocol(format!("confidenceScore {raw_score} out of range"), text))?;

    ClassificationResult::new(classification, score, reply.explanation.unwrap_or_default())
        .ok_or_else(|| protocol("invalid confidenceScore", text))
}

/// Largest score accepted from a bridge; see [`normalize_score`].
const MAX_BRIDGE_SCORE: f64 = 200.0;

/// Maps a score into `[0, 1]`.
///
/// Values in `(1, 100]` are read as percentages. `ai_engine/bridge.py`
/// reports `91.2 + |raw|` for confident calls, which drifts past 100, so
/// anything in `(100, 200]` is clamped to full confidence. Larger values are
/// a protocol error.
fn normalize_score(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        None
    } else if raw <= 1.0 {
        Some(raw)
    } else if raw <= 100.0 {
        Some(raw / 100.0)
    } else if raw <= MAX_BRIDGE_SCORE {
        Some(1.0)
    } else {
        None
    }
}
