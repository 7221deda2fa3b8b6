use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`Classifier`](crate::Classifier).
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The backend could not run, or ran and reported failure.
    #[error("classifier failed (exit status {status:?}): {diagnostic}")]
    Execution {
        status: Option<i32>,
        diagnostic: String,
    },

    #[error("classifier did not finish within {0:?}")]
    Timeout(Duration),

    /// The backend ran but its output is not a verdict.
    #[error("classifier returned unusable output: {reason}")]
    Protocol { reason: String, output: String },
}

impl ClassifierError {
    /// Returns true for protocol violations, false for execution failures.
    pub fn is_protocol(&self) -> bool {
        matches!(self, ClassifierError::Protocol { .. })
    }

    /// Diagnostic text suitable for logs and debug responses.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ClassifierError::Execution { diagnostic, .. } if !diagnostic.is_empty() => {
                Some(diagnostic)
            }
            ClassifierError::Protocol { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}
