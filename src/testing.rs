//! In-memory `GenerationService` used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::bigmodel::types::{ImageData, ImageResponse, SubmitResponse, VideoResult};
use crate::bigmodel::{
    AsyncResult, BigModelError, GenerationService, ImageGenerationRequest, VideoGenerationRequest,
};

/// Replays a fixed script of status reads.
///
/// Reads consume the script front to back; once it is empty every read
/// returns the `otherwise` result (PENDING by default).
pub struct ScriptedService {
    submit: Mutex<Option<Result<SubmitResponse, BigModelError>>>,
    submissions: Mutex<Vec<VideoGenerationRequest>>,
    script: Mutex<VecDeque<Result<AsyncResult, BigModelError>>>,
    otherwise: AsyncResult,
    queried: Mutex<Vec<String>>,
    image_url: Option<String>,
    read_delay: Duration,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            submit: Mutex::new(None),
            submissions: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            otherwise: AsyncResult::default(),
            queried: Mutex::new(Vec::new()),
            image_url: Some("http://x/image.png".into()),
            read_delay: Duration::ZERO,
        }
    }

    pub fn then_status(mut self, result: AsyncResult) -> Self {
        self.script.get_mut().unwrap().push_back(Ok(result));
        self
    }

    pub fn then_error(mut self, err: BigModelError) -> Self {
        self.script.get_mut().unwrap().push_back(Err(err));
        self
    }

    pub fn otherwise(mut self, result: AsyncResult) -> Self {
        self.otherwise = result;
        self
    }

    /// Every submission answers with this id (or no id at all).
    pub fn submit_returns(mut self, id: Option<&str>) -> Self {
        *self.submit.get_mut().unwrap() = Some(Ok(SubmitResponse {
            id: id.map(str::to_string),
            request_id: None,
            task_status: Some("PROCESSING".into()),
        }));
        self
    }

    /// The next submission fails with `err`.
    pub fn submit_fails(mut self, err: BigModelError) -> Self {
        *self.submit.get_mut().unwrap() = Some(Err(err));
        self
    }

    pub fn image_url(mut self, url: Option<&str>) -> Self {
        self.image_url = url.map(str::to_string);
        self
    }

    /// Every status read takes `delay` before answering.
    pub fn slow_reads(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn query_count(&self) -> usize {
        self.queried.lock().unwrap().len()
    }

    pub fn queried_ids(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn last_submission(&self) -> Option<VideoGenerationRequest> {
        self.submissions.lock().unwrap().last().cloned()
    }
}

impl GenerationService for ScriptedService {
    async fn submit_video(
        &self,
        req: &VideoGenerationRequest,
    ) -> Result<SubmitResponse, BigModelError> {
        let count = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push(req.clone());
            submissions.len()
        };
        let mut submit = self.submit.lock().unwrap();
        match submit.take() {
            None => Ok(SubmitResponse {
                id: Some(format!("task-{count}")),
                request_id: req.request_id.clone(),
                task_status: Some("PROCESSING".into()),
            }),
            Some(Ok(resp)) => {
                *submit = Some(Ok(resp.clone()));
                Ok(resp)
            }
            Some(Err(e)) => Err(e),
        }
    }

    async fn retrieve(&self, id: &str) -> Result<AsyncResult, BigModelError> {
        self.queried.lock().unwrap().push(id.to_string());
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(self.otherwise.clone()),
        }
    }

    async fn generate_image(
        &self,
        _req: &ImageGenerationRequest,
    ) -> Result<ImageResponse, BigModelError> {
        Ok(ImageResponse {
            created: Some(0),
            data: self
                .image_url
                .iter()
                .map(|url| ImageData { url: url.clone() })
                .collect(),
        })
    }
}

pub fn status(task_status: &str) -> AsyncResult {
    AsyncResult {
        task_status: Some(task_status.to_string()),
        request_id: None,
        video_result: Vec::new(),
    }
}

pub fn running() -> AsyncResult {
    status("PROCESSING")
}

pub fn success(url: &str) -> AsyncResult {
    AsyncResult {
        task_status: Some("SUCCESS".into()),
        request_id: None,
        video_result: vec![VideoResult {
            url: url.to_string(),
            cover_image_url: None,
        }],
    }
}

pub fn api_error(status: u16) -> BigModelError {
    BigModelError::ApiError {
        status,
        message: format!("scripted {status}"),
    }
}
