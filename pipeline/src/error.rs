use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use voxguard_audio::TranscodeError;
use voxguard_detect::ClassifierError;
use voxguard_encoding::DecodeError;

use crate::ResourceError;

/// Failure categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    DecodeError,
    TranscodeError,
    BackendExecutionError,
    BackendProtocolError,
    ResourceError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::DecodeError => "DecodeError",
            ErrorCategory::TranscodeError => "TranscodeError",
            ErrorCategory::BackendExecutionError => "BackendExecutionError",
            ErrorCategory::BackendProtocolError => "BackendProtocolError",
            ErrorCategory::ResourceError => "ResourceError",
        }
    }

    /// Message safe to show to any caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            ErrorCategory::DecodeError => "Invalid Base64 audio payload",
            ErrorCategory::TranscodeError => {
                "Failed to process audio file. Ensure it is a valid MP3."
            }
            ErrorCategory::BackendExecutionError => "Voice analysis backend failed",
            ErrorCategory::BackendProtocolError => {
                "Voice analysis backend returned an invalid response"
            }
            ErrorCategory::ResourceError => "Internal Server Error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a pipeline run failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("transcode: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("classify ({backend}): {source}")]
    Backend {
        backend: String,
        #[source]
        source: ClassifierError,
    },

    #[error("resource: {0}")]
    Resource(#[from] ResourceError),

    /// A stage ran past the pipeline's own deadline.
    #[error("{stage} did not finish within {timeout:?}")]
    StageTimeout {
        stage: &'static str,
        category: ErrorCategory,
        timeout: Duration,
    },
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Decode(_) => ErrorCategory::DecodeError,
            PipelineError::Transcode(_) => ErrorCategory::TranscodeError,
            PipelineError::Backend { source, .. } if source.is_protocol() => {
                ErrorCategory::BackendProtocolError
            }
            PipelineError::Backend { .. } => ErrorCategory::BackendExecutionError,
            PipelineError::Resource(_) => ErrorCategory::ResourceError,
            PipelineError::StageTimeout { category, .. } => *category,
        }
    }

    pub fn public_message(&self) -> &'static str {
        self.category().public_message()
    }

    /// Captured tool output, falling back to the error chain.
    pub fn diagnostic(&self) -> String {
        let captured = match self {
            PipelineError::Transcode(e) => e.diagnostic(),
            PipelineError::Backend { source, .. } => source.diagnostic(),
            _ => None,
        };
        match captured {
            Some(text) => format!("{self}\n{text}"),
            None => self.to_string(),
        }
    }

    /// Caller-facing form. `details` is only filled when `expose` is set.
    pub fn to_failure(&self, expose: bool) -> Failure {
        Failure {
            category: self.category(),
            message: self.public_message().to_string(),
            details: expose.then(|| self.diagnostic()),
        }
    }
}

/// The serialized shape of a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
