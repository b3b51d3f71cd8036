//! Request and response bodies for the BigModel v4 generation endpoints.
//!
//! Only the fields the poller and the media service read are modelled;
//! unknown fields in responses are ignored by serde.

use serde::{Deserialize, Serialize};

/// Body of `POST /videos/generations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoGenerationRequest {
    pub model: String,
    pub prompt: String,
    /// "quality" or "speed".
    pub quality: String,
    pub with_audio: bool,
    /// Resolution as `WIDTHxHEIGHT`, e.g. "1920x1080".
    pub size: String,
    pub fps: u32,
    pub watermark_enabled: bool,
    /// Client-generated id echoed back by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Response to a video submission. `id` is the async task id.
///
/// `id` is optional on purpose: a submission that comes back without one
/// is a [`SubmissionError`](crate::error::SubmissionError), not a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub task_status: Option<String>,
}

/// Response of `GET /async-result/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsyncResult {
    #[serde(default)]
    pub task_status: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub video_result: Vec<VideoResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResult {
    pub url: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

/// Body of `POST /images/generations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub size: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    pub url: String,
}

/// Error envelope returned by the service on non-2xx responses:
/// `{"error": {"code": "1214", "message": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}
