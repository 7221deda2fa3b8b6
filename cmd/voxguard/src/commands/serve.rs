//! HTTP detection service.
//!
//! API endpoints:
//! - GET  /                    - Liveness text
//! - POST /api/voice-detection - Classify `{language, audioFormat, audioBase64}`

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{info, warn};
use voxguard_cli::config::parse_addr;
use voxguard_pipeline::{AnalyzeRequest, ErrorCategory, Pipeline, PipelineError, Verdict};

use super::get_context;
use crate::Cli;

/// Largest accepted request body.
const BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Run the HTTP detection service.
#[derive(Args)]
pub struct ServeCommand {
    /// Listen address (e.g. :3000, 127.0.0.1:8080); overrides the context
    #[arg(long)]
    listen: Option<String>,
}

impl ServeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let addr = match &self.listen {
            Some(listen) => parse_addr(listen)?,
            None => ctx.server.listen_addr()?,
        };

        let api_key = ctx.server.resolve_api_key();
        if api_key.is_none() {
            warn!("no API key configured; every detection request will be rejected");
        }
        let pipeline = Pipeline::from_config(&ctx.pipeline);
        info!(
            "backend {}, scratch root {}",
            pipeline.backend_name(),
            pipeline.arena().root().display()
        );

        let state = AppState {
            pipeline: Arc::new(pipeline),
            api_key: api_key.map(Arc::from),
            languages: ctx.server.languages.into(),
        };

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("listening on http://{}", addr);
        axum::serve(listener, router(state)).await?;
        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    api_key: Option<Arc<str>>,
    languages: Arc<[String]>,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/voice-detection", post(detect))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> &'static str {
    "AI Voice Detection API is running"
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectRequest {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    audio_format: Option<String>,
    #[serde(default)]
    audio_base64: Option<String>,
}

#[derive(Serialize)]
struct SuccessBody {
    status: &'static str,
    #[serde(flatten)]
    verdict: Verdict,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<ErrorCategory>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn reject(code: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        status: "error",
        category: None,
        message: message.into(),
        details: None,
    };
    (code, Json(body)).into_response()
}

fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::DecodeError => StatusCode::BAD_REQUEST,
        ErrorCategory::TranscodeError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::BackendExecutionError | ErrorCategory::BackendProtocolError => {
            StatusCode::BAD_GATEWAY
        }
        ErrorCategory::ResourceError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn pipeline_failure(pipeline: &Pipeline, err: &PipelineError) -> Response {
    let failure = pipeline.failure(err);
    let body = ErrorBody {
        status: "error",
        category: Some(failure.category),
        message: failure.message,
        details: failure.details,
    };
    (status_for(failure.category), Json(body)).into_response()
}

/// Validates a request and returns `(language, payload)`.
fn validate(req: DetectRequest, languages: &[String]) -> Result<(String, String), String> {
    let language = match req.language {
        Some(l) if languages.iter().any(|known| *known == l) => l,
        _ => {
            return Err(format!(
                "Invalid or unsupported language. Supported: {}",
                languages.join(", ")
            ));
        }
    };
    match req.audio_format.as_deref() {
        Some(f) if f.eq_ignore_ascii_case("mp3") => {}
        _ => return Err(r#"Invalid audioFormat. Only "mp3" is supported."#.to_string()),
    }
    match req.audio_base64 {
        Some(b) if !b.trim().is_empty() => Ok((language, b)),
        _ => Err("Missing or invalid audioBase64 string.".to_string()),
    }
}

async fn detect(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<DetectRequest>, JsonRejection>,
) -> Response {
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    match (&state.api_key, presented) {
        (Some(expected), Some(got)) if expected.as_ref() == got => {}
        _ => return reject(StatusCode::UNAUTHORIZED, "Invalid API key"),
    }

    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            let message = format!("Invalid request body: {}", e.body_text());
            return reject(StatusCode::BAD_REQUEST, message);
        }
    };
    let (language, payload) = match validate(req, &state.languages) {
        Ok(v) => v,
        Err(message) => return reject(StatusCode::BAD_REQUEST, message),
    };

    match state.pipeline.analyze(AnalyzeRequest::new(language, payload)).await {
        Ok(verdict) => Json(SuccessBody {
            status: "success",
            verdict,
        })
        .into_response(),
        Err(err) => pipeline_failure(&state.pipeline, &err),
    }
}
