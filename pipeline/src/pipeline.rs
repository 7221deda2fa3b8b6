use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use voxguard_audio::{FfmpegTranscoder, Transcoder};
use voxguard_detect::{ClassificationResult, Classifier, ClassifyInput};

use crate::{
    ErrorCategory, Failure, PipelineConfig, PipelineError, PipelineState, ScratchArena,
    ScratchSpace,
};

/// Name of the decoded upload inside a scratch space, without extension.
const SOURCE_STEM: &str = "input";
/// Name of the canonical signal inside a scratch space.
const CANONICAL_NAME: &str = "canonical.wav";

/// One request to analyze.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    /// Declared language, carried into the verdict untouched.
    pub language: String,
    /// Base64 text, optionally with a `data:` media prefix.
    pub payload: String,
}

impl AnalyzeRequest {
    pub fn new(language: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            payload: payload.into(),
        }
    }
}

/// A successful classification together with the declared language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub language: String,
    #[serde(flatten)]
    pub result: ClassificationResult,
}

pub type PipelineOutcome = Result<Verdict, PipelineError>;

/// Outcome of a run plus how it got there.
#[derive(Debug)]
pub struct Analysis {
    pub request_id: Uuid,
    /// Every state the run visited, starting with `Received`.
    pub states: Vec<PipelineState>,
    pub outcome: PipelineOutcome,
}

impl Analysis {
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Received)
    }
}

/// The decode, transcode and classify pipeline.
///
/// Holds no per-request state; share one instance behind an `Arc`.
#[derive(Clone)]
pub struct Pipeline {
    arena: ScratchArena,
    transcoder: Arc<dyn Transcoder>,
    classifier: Arc<dyn Classifier>,
    stage_timeout: Option<Duration>,
    expose_diagnostics: bool,
}

impl Pipeline {
    pub fn new(
        arena: ScratchArena,
        transcoder: Arc<dyn Transcoder>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            arena,
            transcoder,
            classifier,
            stage_timeout: None,
            expose_diagnostics: false,
        }
    }

    /// Builds the ffmpeg transcoder and configured backend.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            ScratchArena::new(&config.scratch_dir),
            Arc::new(FfmpegTranscoder::new(config.transcoder.clone())),
            config.backend.build(),
        )
        .with_stage_timeout(config.stage_timeout())
        .with_diagnostics(config.expose_diagnostics)
    }

    /// Bounds every stage. External programs also have their own limits.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn with_diagnostics(mut self, expose: bool) -> Self {
        self.expose_diagnostics = expose;
        self
    }

    pub fn arena(&self) -> &ScratchArena {
        &self.arena
    }

    pub fn backend_name(&self) -> &str {
        self.classifier.name()
    }

    /// Caller-facing form of `err` under this pipeline's diagnostics setting.
    pub fn failure(&self, err: &PipelineError) -> Failure {
        err.to_failure(self.expose_diagnostics)
    }

    /// Runs one request to completion.
    pub async fn analyze(&self, request: AnalyzeRequest) -> PipelineOutcome {
        self.analyze_traced(request).await.outcome
    }

    /// Like [`Pipeline::analyze`], also reporting the request id and states.
    ///
    /// Scratch space is released before this returns. Dropping the future
    /// early kills any running external program and removes the space.
    pub async fn analyze_traced(&self, request: AnalyzeRequest) -> Analysis {
        let started = Instant::now();
        let mut run = Run::new(Uuid::new_v4());

        let outcome = match self.arena.acquire(run.request_id).await {
            Ok(mut space) => {
                let outcome = self.run_stages(&mut run, &space, &request).await;
                if let Err(e) = space.release().await {
                    warn!("request {}: {}", run.request_id, e);
                }
                outcome
            }
            Err(e) => Err(PipelineError::from(e)),
        };

        match &outcome {
            Ok(verdict) => {
                run.advance(PipelineState::Completed);
                info!(
                    "request {} completed: {} ({:.2}) via {} in {:?}",
                    run.request_id,
                    verdict.result.classification(),
                    verdict.result.confidence_score(),
                    self.classifier.name(),
                    started.elapsed()
                );
            }
            Err(e) => {
                run.advance(PipelineState::Failed(e.category()));
                error!(
                    "request {} failed with {} in {:?}: {}",
                    run.request_id,
                    e.category(),
                    started.elapsed(),
                    e.diagnostic()
                );
            }
        }

        Analysis {
            request_id: run.request_id,
            states: run.states,
            outcome,
        }
    }

    async fn run_stages(
        &self,
        run: &mut Run,
        space: &ScratchSpace,
        request: &AnalyzeRequest,
    ) -> PipelineOutcome {
        let blob = voxguard_encoding::decode(&request.payload)?;
        run.advance(PipelineState::Decoded);

        let source_name = format!("{}.{}", SOURCE_STEM, blob.extension());
        let source = self
            .bounded("store", ErrorCategory::ResourceError, async {
                space
                    .write_artifact(&source_name, blob.as_bytes())
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;
        debug!("request {}: stored {} bytes as {}", run.request_id, blob.len(), source_name);
        drop(blob);

        let canonical = space.artifact(CANONICAL_NAME);
        let signal = self
            .bounded("transcode", ErrorCategory::TranscodeError, async {
                self.transcoder
                    .transcode(&source, &canonical)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;
        run.advance(PipelineState::Transcoded);

        let input = ClassifyInput {
            signal: &signal,
            source: &source,
            language: &request.language,
        };
        let result = self
            .bounded("classify", ErrorCategory::BackendExecutionError, async {
                self.classifier
                    .classify(&input)
                    .await
                    .map_err(|source| PipelineError::Backend {
                        backend: self.classifier.name().to_string(),
                        source,
                    })
            })
            .await?;
        run.advance(PipelineState::Classified);

        Ok(Verdict {
            language: request.language.clone(),
            result,
        })
    }

    async fn bounded<T, F>(
        &self,
        stage: &'static str,
        category: ErrorCategory,
        fut: F,
    ) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        match self.stage_timeout {
            None => fut.await,
            Some(timeout) => tokio::time::timeout(timeout, fut).await.map_err(|_| {
                PipelineError::StageTimeout {
                    stage,
                    category,
                    timeout,
                }
            })?,
        }
    }
}

/// State bookkeeping for one run.
struct Run {
    request_id: Uuid,
    states: Vec<PipelineState>,
}

impl Run {
    fn new(request_id: Uuid) -> Self {
        debug!("request {}: received", request_id);
        Self {
            request_id,
            states: vec![PipelineState::Received],
        }
    }

    fn current(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Received)
    }

    fn advance(&mut self, next: PipelineState) {
        let current = self.current();
        debug_assert!(
            current.can_transition_to(next),
            "invalid transition {current} -> {next}"
        );
        debug!("request {}: {} -> {}", self.request_id, current, next);
        self.states.push(next);
    }
}
