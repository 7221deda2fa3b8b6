//! Audio processing utilities for the voxguard pipeline.
//!
//! This crate provides:
//!
//! - [`Format`]: 16-bit PCM format description, with the canonical
//!   16kHz mono target used by every classifier
//! - [`wav`]: RIFF/WAVE header encoding and parsing
//! - [`CanonicalSignal`]: a fully written, validated canonical WAV artifact
//! - [`transcode`]: conversion of compressed audio into the canonical signal
//!
//! # Example
//!
//! ```rust
//! use voxguard_audio::Format;
//! use std::time::Duration;
//!
//! let format = Format::CANONICAL;
//!
//! // 1 second of 16kHz mono 16-bit PCM
//! assert_eq!(format.bytes_in_duration(Duration::from_secs(1)), 32000);
//!
//! // Encode 100ms of silence as a WAV file
//! let wav = voxguard_audio::wav::encode_pcm(format, &vec![0i16; 1600]);
//! assert_eq!(wav.len(), 44 + 3200);
//! ```

mod format;
mod signal;
pub mod transcode;
pub mod wav;

pub use format::Format;
pub use signal::{CanonicalSignal, SignalError};
pub use transcode::{FfmpegConfig, FfmpegTranscoder, TranscodeError, Transcoder};
