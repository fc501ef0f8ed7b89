//! Anti-Captcha wire protocol.
//!
//! Two JSON endpoints: `POST /createTask` submits a job and returns its id,
//! `POST /getTaskResult` reports `processing` or `ready` with a solution.

use crate::error::{CaptchaError, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tasklink_core::CaptchaConfig;
use zeroize::Zeroizing;

/// Error fields present on every provider reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    /// Zero on success
    #[serde(default)]
    pub error_id: i64,
    /// Symbolic error code
    #[serde(default)]
    pub error_code: Option<String>,
    /// Human readable description
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ApiStatus {
    /// Whether the provider reported an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error_id != 0
    }

    pub(crate) fn rejection(&self) -> CaptchaError {
        CaptchaError::rejected(
            self.error_code
                .clone()
                .unwrap_or_else(|| format!("ERROR_{}", self.error_id)),
            self.error_description.clone().unwrap_or_default(),
        )
    }
}

/// Reply to `createTask`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResponse {
    /// Error fields
    #[serde(flatten)]
    pub error: ApiStatus,
    /// Job identifier, absent on error
    #[serde(default)]
    pub task_id: Option<u64>,
}

/// Reply to `getTaskResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResultResponse {
    /// Error fields
    #[serde(flatten)]
    pub error: ApiStatus,
    /// `processing` or `ready`
    #[serde(default, rename = "status")]
    pub state: Option<String>,
    /// Present once the job is ready
    #[serde(default)]
    pub solution: Option<Solution>,
}

/// Solved challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Solution {
    /// Response token for the page's challenge field
    #[serde(default, alias = "gRecaptchaResponse")]
    pub token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest<'a> {
    client_key: &'a str,
    task: TaskSpec<'a>,
}

#[derive(Serialize)]
struct TaskSpec<'a> {
    #[serde(rename = "type")]
    task_type: &'a str,
    #[serde(rename = "websiteURL")]
    website_url: &'a str,
    #[serde(rename = "websiteKey")]
    website_key: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultRequest<'a> {
    client_key: &'a str,
    task_id: u64,
}

/// Provider job API as seen by the solver.
#[async_trait]
pub trait CaptchaApi: Send + Sync {
    /// Submit a solve job for the widget at `site_url` with `site_key`.
    async fn create_task(
        &self,
        site_url: &str,
        site_key: &str,
    ) -> Result<CreateTaskResponse, TransportError>;

    /// Fetch the current state of job `task_id`.
    async fn get_task_result(&self, task_id: u64) -> Result<TaskResultResponse, TransportError>;
}

/// HTTP client for `api.anti-captcha.com`.
pub struct AntiCaptchaClient {
    client: Client,
    base_url: String,
    api_key: Zeroizing<String>,
    task_type: String,
}

impl fmt::Debug for AntiCaptchaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AntiCaptchaClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("task_type", &self.task_type)
            .finish_non_exhaustive()
    }
}

impl AntiCaptchaClient {
    /// Build a client from the `[captcha]` configuration section.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &CaptchaConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: Zeroizing::new(config.api_key.clone()),
            task_type: config.task_type.clone(),
        })
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CaptchaApi for AntiCaptchaClient {
    async fn create_task(
        &self,
        site_url: &str,
        site_key: &str,
    ) -> Result<CreateTaskResponse, TransportError> {
        let request = CreateTaskRequest {
            client_key: &self.api_key,
            task: TaskSpec {
                task_type: &self.task_type,
                website_url: site_url,
                website_key: site_key,
            },
        };
        self.post("createTask", &request).await
    }

    async fn get_task_result(&self, task_id: u64) -> Result<TaskResultResponse, TransportError> {
        let request = TaskResultRequest {
            client_key: &self.api_key,
            task_id,
        };
        self.post("getTaskResult", &request).await
    }
}
