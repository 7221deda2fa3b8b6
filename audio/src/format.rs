//! PCM audio format.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Describes a 16-bit signed little-endian PCM layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Format {
    /// Sample rate in Hz (e.g., 16000, 48000).
    pub sample_rate: u32,
    /// True for stereo (2 channels), false for mono (1 channel).
    #[serde(default)]
    pub stereo: bool,
}

impl Format {
    /// Creates a mono format with the given sample rate.
    pub const fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            stereo: false,
        }
    }

    /// Creates a stereo format with the given sample rate.
    pub const fn stereo(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            stereo: true,
        }
    }

    /// Returns the number of channels (1 for mono, 2 for stereo).
    pub fn channels(&self) -> u16 {
        if self.stereo { 2 } else { 1 }
    }

    /// Bits per sample. Always 16.
    pub fn depth(&self) -> u16 {
        16
    }

    /// Returns the number of bytes per sample frame.
    pub fn frame_bytes(&self) -> usize {
        self.channels() as usize * 2
    }

    /// Bytes of PCM data per second.
    pub fn bytes_rate(&self) -> u32 {
        self.sample_rate * self.frame_bytes() as u32
    }

    /// Number of PCM bytes covering `duration`, rounded down to whole frames.
    pub fn bytes_in_duration(&self, duration: Duration) -> usize {
        let frames = (duration.as_nanos() * self.sample_rate as u128 / 1_000_000_000) as usize;
        frames * self.frame_bytes()
    }

    /// Playback duration of `bytes` of PCM data.
    pub fn duration(&self, bytes: u64) -> Duration {
        let rate = self.bytes_rate() as u64;
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((bytes as u128 * 1_000_000_000 / rate as u128) as u64)
    }

    /// Number of sample frames in `bytes` of PCM data.
    pub fn samples(&self, bytes: u64) -> u64 {
        bytes / self.frame_bytes() as u64
    }
}

// Common format presets
impl Format {
    /// 16kHz mono
    pub const MONO_16K: Format = Format::mono(16000);
    /// 44.1kHz stereo (CD quality)
    pub const STEREO_44K: Format = Format::stereo(44100);

    /// The representation every classifier consumes.
    pub const CANONICAL: Format = Format::MONO_16K;
}

impl Default for Format {
    fn default() -> Self {
        Format::CANONICAL
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = if self.stereo { "stereo" } else { "mono" };
        write!(f, "s16le/{}Hz/{}", self.sample_rate, layout)
    }
}
