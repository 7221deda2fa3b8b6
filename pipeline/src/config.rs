use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use voxguard_audio::FfmpegConfig;
use voxguard_detect::BackendConfig;

/// Everything needed to build a [`Pipeline`](crate::Pipeline).
///
/// ```yaml
/// scratch_dir: /var/tmp/voxguard
/// transcoder:
///   program: ffmpeg
///   timeout_secs: 30
/// backend:
///   kind: heuristic
///   threshold_bytes: 300000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root under which per-request scratch spaces are created.
    pub scratch_dir: PathBuf,
    pub transcoder: FfmpegConfig,
    pub backend: BackendConfig,
    /// Upper bound on any single stage, in seconds. 0 disables it.
    pub stage_timeout_secs: u64,
    /// Include tool diagnostics in caller-facing failures.
    pub expose_diagnostics: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("voxguard"),
            transcoder: FfmpegConfig::default(),
            backend: BackendConfig::default(),
            stage_timeout_secs: 120,
            expose_diagnostics: false,
        }
    }
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Option<Duration> {
        (self.stage_timeout_secs > 0).then(|| Duration::from_secs(self.stage_timeout_secs))
    }
}
