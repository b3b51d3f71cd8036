use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::error::BigModelError;
use super::types::{
    AsyncResult, ErrorEnvelope, ImageGenerationRequest, ImageResponse, SubmitResponse,
    VideoGenerationRequest,
};

pub const API_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

/// The remote generation service as seen by the poller and the media service.
///
/// [`BigModelClient`] is the production implementation; tests substitute
/// scripted in-memory services.
pub trait GenerationService {
    /// Submit an asynchronous video generation task.
    fn submit_video(
        &self,
        req: &VideoGenerationRequest,
    ) -> impl Future<Output = Result<SubmitResponse, BigModelError>> + Send;

    /// Read the current state of an asynchronous task.
    fn retrieve(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<AsyncResult, BigModelError>> + Send;

    /// Generate an image synchronously.
    fn generate_image(
        &self,
        req: &ImageGenerationRequest,
    ) -> impl Future<Output = Result<ImageResponse, BigModelError>> + Send;
}

pub struct BigModelClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl BigModelClient {
    /// Create a client for `base_url`, normally [`API_URL`] or a test server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, BigModelError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The underlying HTTP client, shared with the downloader.
    pub fn http(&self) -> &Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, BigModelError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(BigModelError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(env) => match env.error.code {
                    Some(code) => format!("[{code}] {}", env.error.message),
                    None => env.error.message,
                },
                Err(_) => body,
            };
            return Err(BigModelError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

impl GenerationService for BigModelClient {
    async fn submit_video(
        &self,
        req: &VideoGenerationRequest,
    ) -> Result<SubmitResponse, BigModelError> {
        let response = self
            .client
            .post(self.url("videos/generations"))
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn retrieve(&self, id: &str) -> Result<AsyncResult, BigModelError> {
        let response = self
            .client
            .get(self.url(&format!("async-result/{id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn generate_image(
        &self,
        req: &ImageGenerationRequest,
    ) -> Result<ImageResponse, BigModelError> {
        let response = self
            .client
            .post(self.url("images/generations"))
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await?;
        Self::parse_response(response).await
    }
}
