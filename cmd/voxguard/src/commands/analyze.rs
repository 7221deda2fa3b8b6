//! Classify a local audio file.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use voxguard_pipeline::{AnalyzeRequest, Failure, Pipeline, PipelineState, Verdict};

use super::{get_context, media_type_for, output};
use crate::Cli;

/// Classify a local audio file.
///
/// Runs the same pipeline the HTTP service uses, with the selected
/// context's transcoder and backend.
#[derive(Args)]
pub struct AnalyzeCommand {
    /// Audio file to analyze
    #[arg(long, required_unless_present = "base64", conflicts_with = "base64")]
    audio: Option<PathBuf>,

    /// File holding base64 text, optionally with a data URI prefix
    #[arg(long)]
    base64: Option<PathBuf>,

    /// Declared language, passed through to the result
    #[arg(short, long, default_value = "Unknown")]
    language: String,

    /// Include the visited pipeline states in the output
    #[arg(long)]
    trace: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Report {
    Success {
        status: &'static str,
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(flatten)]
        verdict: Verdict,
        #[serde(skip_serializing_if = "Option::is_none")]
        states: Option<Vec<PipelineState>>,
    },
    Error {
        status: &'static str,
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(flatten)]
        failure: Failure,
        #[serde(skip_serializing_if = "Option::is_none")]
        states: Option<Vec<PipelineState>>,
    },
}

impl AnalyzeCommand {
    fn payload(&self) -> anyhow::Result<String> {
        if let Some(path) = &self.base64 {
            return std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("read {}: {}", path.display(), e));
        }
        let path = self
            .audio
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("either --audio or --base64 is required"))?;
        let data =
            std::fs::read(path).map_err(|e| anyhow::anyhow!("read {}: {}", path.display(), e))?;
        let body = voxguard_encoding::encode(&data);
        Ok(match media_type_for(path) {
            Some(media_type) => format!("data:{};base64,{}", media_type, body),
            None => body,
        })
    }

    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let pipeline = Pipeline::from_config(&ctx.pipeline);
        let request = AnalyzeRequest::new(&self.language, self.payload()?);

        let analysis = pipeline.analyze_traced(request).await;
        let request_id = analysis.request_id.to_string();
        let states = self.trace.then(|| analysis.states.clone());

        match analysis.outcome {
            Ok(verdict) => output(cli).write(&Report::Success {
                status: "success",
                request_id,
                verdict,
                states,
            }),
            Err(err) => {
                let failure = pipeline.failure(&err);
                let category = failure.category;
                output(cli).write(&Report::Error {
                    status: "error",
                    request_id,
                    failure,
                    states,
                })?;
                anyhow::bail!("analysis failed: {}: {}", category, err)
            }
        }
    }
}
