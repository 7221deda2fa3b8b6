use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::Format;
use crate::wav::{WavError, WavHeader};

/// Upper bound on how far into a file the `data` chunk is searched for.
const HEADER_SCAN_LEN: u64 = 64 * 1024;

/// Errors returned by [`CanonicalSignal::open`].
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("read canonical signal: {0}")]
    Io(#[from] io::Error),

    #[error("invalid wav: {0}")]
    Wav(#[from] WavError),

    #[error("format mismatch: expected {expected}, got {got}")]
    FormatMismatch { expected: Format, got: Format },

    #[error("wav declares {declared} data bytes but only {available} are present")]
    ShortData { declared: u64, available: u64 },

    #[error("wav carries no audio samples")]
    Empty,
}

/// A canonical PCM WAV artifact on disk.
///
/// A value only exists for a file that was completely written, whose
/// header matched the expected format, and that held at least one byte of
/// PCM when it was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSignal {
    path: PathBuf,
    format: Format,
    byte_len: u64,
    data_len: u64,
}

impl CanonicalSignal {
    /// Opens and validates the WAV file at `path`.
    pub async fn open(path: impl Into<PathBuf>, expected: Format) -> Result<Self, SignalError> {
        let path = path.into();
        let file = tokio::fs::File::open(&path).await?;
        let byte_len = file.metadata().await?.len();

        let mut head = Vec::with_capacity(HEADER_SCAN_LEN.min(byte_len) as usize);
        file.take(HEADER_SCAN_LEN).read_to_end(&mut head).await?;

        let header = WavHeader::parse(&head)?;
        if header.format != expected {
            return Err(SignalError::FormatMismatch {
                expected,
                got: header.format,
            });
        }

        let available = byte_len.saturating_sub(header.data_offset as u64);
        let declared = header.data_len as u64;
        // Streaming writers leave 0 or 0xFFFFFFFF when they cannot seek back.
        let data_len = if declared == 0 || declared == u32::MAX as u64 {
            available
        } else if declared > available {
            return Err(SignalError::ShortData {
                declared,
                available,
            });
        } else {
            declared
        };
        if data_len == 0 {
            return Err(SignalError::Empty);
        }

        Ok(Self {
            path,
            format: expected,
            byte_len,
            data_len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Total size of the file, header included.
    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Size of the PCM payload.
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    pub fn duration(&self) -> Duration {
        self.format.duration(self.data_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::{HEADER_LEN, encode_pcm};

    #[tokio::test]
    async fn test_opens_canonical_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canonical.wav");
        let samples = vec![0i16; 32000]; // 2 seconds
        tokio::fs::write(&path, encode_pcm(Format::CANONICAL, &samples))
            .await
            .unwrap();

        let signal = CanonicalSignal::open(&path, Format::CANONICAL).await.unwrap();
        assert_eq!(signal.path(), path.as_path());
        assert_eq!(signal.byte_len(), (HEADER_LEN + 64000) as u64);
        assert_eq!(signal.data_len(), 64000);
        assert_eq!(signal.duration(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_rejects_wrong_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        tokio::fs::write(&path, encode_pcm(Format::STEREO_44K, &[0; 8]))
            .await
            .unwrap();

        let err = CanonicalSignal::open(&path, Format::CANONICAL).await.unwrap_err();
        assert!(matches!(err, SignalError::FormatMismatch { .. }));
    }

    #[tokio::test]
    async fn test_rejects_truncated_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.wav");
        let mut wav = encode_pcm(Format::CANONICAL, &[0; 100]);
        wav.truncate(HEADER_LEN + 10);
        tokio::fs::write(&path, wav).await.unwrap();

        let err = CanonicalSignal::open(&path, Format::CANONICAL).await.unwrap_err();
        assert!(matches!(
            err,
            SignalError::ShortData {
                declared: 200,
                available: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_rejects_header_only_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        tokio::fs::write(&path, encode_pcm(Format::CANONICAL, &[]))
            .await
            .unwrap();

        let err = CanonicalSignal::open(&path, Format::CANONICAL).await.unwrap_err();
        assert!(matches!(err, SignalError::Empty));

        // A streaming writer's placeholder length resolves to the same thing.
        let mut wav = encode_pcm(Format::CANONICAL, &[]);
        wav[HEADER_LEN - 4..HEADER_LEN].copy_from_slice(&u32::MAX.to_le_bytes());
        tokio::fs::write(&path, wav).await.unwrap();
        let err = CanonicalSignal::open(&path, Format::CANONICAL).await.unwrap_err();
        assert!(matches!(err, SignalError::Empty));
    }

    #[tokio::test]
    async fn test_rejects_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        tokio::fs::write(&path, b"definitely not a riff file").await.unwrap();

        let err = CanonicalSignal::open(&path, Format::CANONICAL).await.unwrap_err();
        assert!(matches!(err, SignalError::Wav(WavError::NotWave)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = CanonicalSignal::open("/nonexistent/voxguard.wav", Format::CANONICAL)
            .await
            .unwrap_err();
        assert!(matches!(err, SignalError::Io(_)));
    }
}
