//! The voice authenticity pipeline.
//!
//! One [`Pipeline`] serves every request. Each call to
//! [`Pipeline::analyze`] runs an independent instance:
//!
//! ```text
//! Received -> Decoded -> Transcoded -> Classified -> Completed
//!     \__________\____________\______________________> Failed(category)
//! ```
//!
//! 1. a [`ScratchSpace`] named after a fresh request id is allocated
//! 2. the payload is decoded and written into it
//! 3. the transcoder produces the canonical signal next to it
//! 4. the configured classifier returns a verdict
//!
//! The scratch space is removed before the call returns, whatever the
//! outcome. A dropped (cancelled) call removes it too, and any running
//! external program is killed.

mod config;
mod error;
mod pipeline;
mod scratch;
mod state;

pub use config::PipelineConfig;
pub use error::{ErrorCategory, Failure, PipelineError};
pub use pipeline::{AnalyzeRequest, Analysis, Pipeline, PipelineOutcome, Verdict};
pub use scratch::{ResourceError, ScratchArena, ScratchSpace};
pub use state::PipelineState;
