use std::fmt;

use serde::Serialize;

use crate::ErrorCategory;

/// Where one pipeline run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "category")]
pub enum PipelineState {
    Received,
    Decoded,
    Transcoded,
    Classified,
    Completed,
    Failed(ErrorCategory),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed(_))
    }

    /// Reports whether `next` may follow `self`.
    ///
    /// Stages advance one at a time; any non-terminal state may fail.
    /// Terminal states have no successors.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Completed | Failed(_), _) => false,
            (_, Failed(_)) => true,
            (Received, Decoded)
            | (Decoded, Transcoded)
            | (Transcoded, Classified)
            | (Classified, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Received => f.write_str("received"),
            PipelineState::Decoded => f.write_str("decoded"),
            PipelineState::Transcoded => f.write_str("transcoded"),
            PipelineState::Classified => f.write_str("classified"),
            PipelineState::Completed => f.write_str("completed"),
            PipelineState::Failed(category) => write!(f, "failed({category})"),
        }
    }
}
