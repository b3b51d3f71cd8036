//! HTTP front end: `POST /gen_media`.
//!
//! Video requests block the handler for the whole poll session. A client
//! that disconnects drops the handler future, which ends the session at
//! its next await point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::bigmodel::GenerationService;
use crate::error::{MediaGenError, PollError};
use crate::job::{ImageParams, JobStatus, PollConfig, VideoParams};
use crate::poller::JobPoller;

pub struct AppState<S> {
    pub poller: JobPoller<S>,
    pub video: VideoParams,
    pub image: ImageParams,
    pub poll: PollConfig,
}

#[derive(Debug, Deserialize)]
pub struct GenMediaRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, rename = "class")]
    pub media_class: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenMediaResponse {
    #[serde(rename = "type")]
    pub media_type: &'static str,
    pub url: String,
}

/// Failure responses of `/gen_media`, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum GenMediaError {
    #[error("prompt and class must not be empty")]
    MissingField,

    #[error("class must be image or video")]
    UnknownClass,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("video generation failed")]
    GenerationFailed,

    #[error("timed out waiting for video generation")]
    Timeout,

    #[error("generation error: {0}")]
    Upstream(String),
}

impl GenMediaError {
    fn status(&self) -> StatusCode {
        match self {
            GenMediaError::MissingField
            | GenMediaError::UnknownClass
            | GenMediaError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GenMediaError::GenerationFailed | GenMediaError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GenMediaError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<MediaGenError> for GenMediaError {
    fn from(err: MediaGenError) -> Self {
        match err {
            MediaGenError::Poll(PollError::Timeout { .. }) => GenMediaError::Timeout,
            other => GenMediaError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for GenMediaError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "gen_media failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: GenerationService + Send + Sync + 'static,
{
    Router::new()
        .route("/gen_media", post(gen_media::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn gen_media<S>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<GenMediaRequest>, JsonRejection>,
) -> Result<Json<GenMediaResponse>, GenMediaError>
where
    S: GenerationService + Send + Sync + 'static,
{
    let Json(body) = body.map_err(|e| GenMediaError::InvalidBody(e.body_text()))?;
    let prompt = body.prompt.filter(|p| !p.trim().is_empty());
    let class = body.media_class.filter(|c| !c.trim().is_empty());
    let (Some(prompt), Some(class)) = (prompt, class) else {
        return Err(GenMediaError::MissingField);
    };
    tracing::info!(prompt = %prompt, class = %class, "gen_media request");

    match class.trim().to_lowercase().as_str() {
        "image" => {
            let url = state
                .poller
                .generate_image(&prompt, &state.image)
                .await
                .map_err(|e| GenMediaError::from(MediaGenError::from(e)))?;
            Ok(Json(GenMediaResponse {
                media_type: "image",
                url,
            }))
        }
        "video" => {
            let job_id = state
                .poller
                .submit(&prompt, &state.video)
                .await
                .map_err(MediaGenError::from)?;
            let job = state
                .poller
                .await_completion(&job_id, &state.poll)
                .await
                .map_err(MediaGenError::from)?;
            match (job.status, job.result_url) {
                (JobStatus::Success, Some(url)) => Ok(Json(GenMediaResponse {
                    media_type: "video",
                    url,
                })),
                _ => Err(GenMediaError::GenerationFailed),
            }
        }
        _ => Err(GenMediaError::UnknownClass),
    }
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve<S>(state: Arc<AppState<S>>, addr: SocketAddr) -> Result<()>
where
    S: GenerationService + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Media service listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
