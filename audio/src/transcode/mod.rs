//! Conversion of compressed audio into the canonical signal.
//!
//! Every way a conversion can go wrong is a [`TranscodeError`], so callers
//! can tell codec trouble apart from their own failures.

mod ffmpeg;

use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{CanonicalSignal, Format, SignalError};

pub use ffmpeg::{FfmpegConfig, FfmpegTranscoder};

/// Errors returned by a [`Transcoder`].
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("codec toolchain unavailable: {0}")]
    Unavailable(String),

    #[error("codec toolchain rejected the input (exit status {status:?}): {diagnostic}")]
    Rejected {
        status: Option<i32>,
        diagnostic: String,
    },

    #[error("transcoding did not finish within {0:?}")]
    Timeout(Duration),

    #[error("transcoder produced an invalid signal: {0}")]
    InvalidOutput(#[from] SignalError),

    #[error("transcoder i/o error: {0}")]
    Io(#[from] io::Error),
}

impl TranscodeError {
    /// Diagnostic text from the toolchain, if any was captured.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            TranscodeError::Rejected { diagnostic, .. } if !diagnostic.is_empty() => {
                Some(diagnostic)
            }
            _ => None,
        }
    }
}

/// Converts a compressed audio file into a [`CanonicalSignal`].
///
/// Implementations must be all-or-nothing: `output` either holds a complete
/// canonical WAV when `Ok` is returned, or does not exist.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// The format every produced signal has.
    fn format(&self) -> Format;

    /// Converts `input` and writes the canonical signal to `output`.
    async fn transcode(&self, input: &Path, output: &Path)
        -> Result<CanonicalSignal, TranscodeError>;
}
