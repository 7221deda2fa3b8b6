use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voxguard_process::{Invocation, ProcessError, truncate_diagnostic};

use super::{TranscodeError, Transcoder};
use crate::{CanonicalSignal, Format};

const MAX_DIAGNOSTIC_LEN: usize = 2048;

/// Configuration for [`FfmpegTranscoder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// Program name or path (default: `ffmpeg`).
    pub program: String,
    /// Target sample rate in Hz; the output is always mono s16le.
    pub sample_rate: u32,
    /// Wall-clock limit for one conversion, in seconds.
    pub timeout_secs: u64,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            sample_rate: Format::CANONICAL.sample_rate,
            timeout_secs: 30,
        }
    }
}

impl FfmpegConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Transcoder backed by the `ffmpeg` command line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    config: FfmpegConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: FfmpegConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FfmpegConfig {
        &self.config
    }

    fn invocation(&self, input: &Path, output: &Path) -> Invocation {
        let format = self.format();
        Invocation::new(&self.config.program)
            .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"])
            .arg(input)
            .args(["-vn", "-map_metadata", "-1", "-fflags", "+bitexact"])
            .arg("-ac")
            .arg(format.channels().to_string())
            .arg("-ar")
            .arg(format.sample_rate.to_string())
            .args(["-c:a", "pcm_s16le", "-f", "wav"])
            .arg(output)
            .timeout(self.config.timeout())
    }

    async fn convert(
        &self,
        input: &Path,
        partial: &Path,
        output: &Path,
    ) -> Result<CanonicalSignal, TranscodeError> {
        let invocation = self.invocation(input, partial);
        let result = invocation.run().await.map_err(|e| match e {
            ProcessError::Spawn { .. } => TranscodeError::Unavailable(e.to_string()),
            ProcessError::Timeout { timeout, .. } => TranscodeError::Timeout(timeout),
            ProcessError::Io { source, .. } => TranscodeError::Io(source),
        })?;

        if !result.success() {
            return Err(TranscodeError::Rejected {
                status: result.code(),
                diagnostic: truncate_diagnostic(&result.stderr_text(), MAX_DIAGNOSTIC_LEN),
            });
        }

        // Validate before publishing under the final name.
        CanonicalSignal::open(partial, self.format()).await?;
        tokio::fs::rename(partial, output).await?;
        Ok(CanonicalSignal::open(output, self.format()).await?)
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new(FfmpegConfig::default())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn format(&self) -> Format {
        Format::mono(self.config.sample_rate)
    }

    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<CanonicalSignal, TranscodeError> {
        let partial = partial_path(output);
        match self.convert(input, &partial, output).await {
            Ok(signal) => {
                debug!(
                    "transcoded {} -> {} ({} bytes, {:?})",
                    input.display(),
                    output.display(),
                    signal.byte_len(),
                    signal.duration()
                );
                Ok(signal)
            }
            Err(e) => {
                discard(&partial).await;
                discard(output).await;
                Err(e)
            }
        }
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("signal"));
    name.push(".partial");
    output.with_file_name(name)
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!("failed to remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_targets_canonical_format() {
        let t = FfmpegTranscoder::default();
        let line = t
            .invocation(Path::new("/s/input.mp3"), Path::new("/s/canonical.wav.partial"))
            .command_line();
        assert!(line.starts_with("ffmpeg "));
        assert!(line.contains("-i /s/input.mp3"));
        assert!(line.contains("-ac 1 -ar 16000"));
        assert!(line.contains("-c:a pcm_s16le -f wav"));
        assert!(line.ends_with("/s/canonical.wav.partial"));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/s/canonical.wav")),
            PathBuf::from("/s/canonical.wav.partial")
        );
    }

    #[test]
    fn test_config_defaults() {
        let cfg: FfmpegConfig = serde_json::from_str(r#"{"sample_rate": 8000}"#).unwrap();
        assert_eq!(cfg.program, "ffmpeg");
        assert_eq!(cfg.sample_rate, 8000);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(FfmpegTranscoder::new(cfg).format(), Format::mono(8000));
    }

    #[tokio::test]
    async fn test_missing_toolchain_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let t = FfmpegTranscoder::new(FfmpegConfig {
            program: "voxguard-no-such-ffmpeg".to_string(),
            ..Default::default()
        });
        let output = dir.path().join("canonical.wav");
        let err = t
            .transcode(&dir.path().join("input.mp3"), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Unavailable(_)));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejected_input_carries_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffmpeg(
            dir.path(),
            "echo 'input.mp3: Invalid data found when processing input' >&2; exit 1",
        );
        let t = FfmpegTranscoder::new(FfmpegConfig {
            program: program.to_string_lossy().into_owned(),
            ..Default::default()
        });
        let output = dir.path().join("canonical.wav");
        let err = t
            .transcode(&dir.path().join("input.mp3"), &output)
            .await
            .unwrap_err();
        match &err {
            TranscodeError::Rejected { status, .. } => assert_eq!(*status, Some(1)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.diagnostic().unwrap().contains("Invalid data"));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_garbage_output_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        // Writes junk to the last argument (the output path) and succeeds.
        let program = fake_ffmpeg(dir.path(), "for last; do :; done; printf junk > \"$last\"");
        let t = FfmpegTranscoder::new(FfmpegConfig {
            program: program.to_string_lossy().into_owned(),
            ..Default::default()
        });
        let output = dir.path().join("canonical.wav");
        let err = t
            .transcode(&dir.path().join("input.mp3"), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidOutput(_)));
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_header_only_output_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.wav");
        std::fs::write(&empty, crate::wav::encode_pcm(Format::CANONICAL, &[])).unwrap();
        // Exits 0 after writing a well-formed WAV with no samples.
        let body = format!("for last; do :; done; cp '{}' \"$last\"", empty.display());
        let program = fake_ffmpeg(dir.path(), &body);
        let t = FfmpegTranscoder::new(FfmpegConfig {
            program: program.to_string_lossy().into_owned(),
            ..Default::default()
        });
        let output = dir.path().join("canonical.wav");
        let err = t
            .transcode(&dir.path().join("input.mp3"), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidOutput(crate::SignalError::Empty)));
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_transcode_error() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffmpeg(dir.path(), "sleep 10");
        let t = FfmpegTranscoder::new(FfmpegConfig {
            program: program.to_string_lossy().into_owned(),
            timeout_secs: 1,
            ..Default::default()
        });
        let err = t
            .transcode(&dir.path().join("input.mp3"), &dir.path().join("canonical.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Timeout(_)));
    }

    #[tokio::test]
    #[ignore] // requires ffmpeg on PATH
    async fn test_ffmpeg_resamples_wav_to_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        let samples: Vec<i16> = (0..44100 * 2).map(|i| ((i % 100) * 200) as i16).collect();
        std::fs::write(&input, crate::wav::encode_pcm(Format::STEREO_44K, &samples)).unwrap();

        let output = dir.path().join("canonical.wav");
        let signal = FfmpegTranscoder::default()
            .transcode(&input, &output)
            .await
            .unwrap();
        assert_eq!(signal.format(), Format::CANONICAL);
        assert!(output.exists());
        // One second of stereo input becomes one second of mono output.
        let secs = signal.duration().as_secs_f64();
        assert!((secs - 1.0).abs() < 0.05, "duration {secs}");
    }

    #[tokio::test]
    #[ignore] // requires ffmpeg on PATH
    async fn test_ffmpeg_rejects_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.mp3");
        std::fs::write(&input, b"this is plain text, not an mp3 stream").unwrap();

        let output = dir.path().join("canonical.wav");
        let err = FfmpegTranscoder::default()
            .transcode(&input, &output)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Rejected { .. }));
        assert!(!output.exists());
    }
}
