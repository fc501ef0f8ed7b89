//! Bounded submit/poll solver.

use crate::api::{CaptchaApi, TaskResultResponse};
use crate::error::{CaptchaError, Result};
use async_trait::async_trait;
use tasklink_core::{CaptchaConfig, PollPolicy, RetryPolicy};
use tokio::time::Instant;

/// Widget to solve: the page it sits on and its site key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveRequest {
    /// Page URL the widget is rendered on
    pub site_url: String,
    /// Value of the widget's `data-sitekey`
    pub site_key: String,
}

impl SolveRequest {
    /// Create a solve request.
    pub fn new(site_url: impl Into<String>, site_key: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            site_key: site_key.into(),
        }
    }

    /// Site key shortened for logging.
    #[must_use]
    pub fn key_prefix(&self) -> String {
        self.site_key.chars().take(20).collect()
    }
}

/// State of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveStatus {
    /// Still being worked on
    Pending,
    /// Solved, carrying the response token
    Ready(String),
    /// Provider gave up on the job or returned nothing usable
    Failed {
        /// Provider error code
        code: String,
        /// Human readable description
        description: String,
    },
}

impl From<TaskResultResponse> for SolveStatus {
    fn from(response: TaskResultResponse) -> Self {
        if response.error.is_error() {
            return Self::Failed {
                code: response
                    .error
                    .error_code
                    .unwrap_or_else(|| format!("ERROR_{}", response.error.error_id)),
                description: response.error.error_description.unwrap_or_default(),
            };
        }

        if response.state.as_deref() != Some("ready") {
            return Self::Pending;
        }

        match response.solution.and_then(|s| s.token) {
            Some(token) if !token.is_empty() => Self::Ready(token),
            _ => Self::Failed {
                code: "EMPTY_SOLUTION".to_string(),
                description: "ready result carried no token".to_string(),
            },
        }
    }
}

/// Capability to turn a challenge into a response token.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Solve the challenge, returning the opaque token.
    async fn solve(&self, request: &SolveRequest) -> Result<String>;
}

/// Drives a [`CaptchaApi`] through submit then poll, never past its deadline.
#[derive(Debug)]
pub struct PollingSolver<A> {
    api: A,
    submit: RetryPolicy,
    poll: PollPolicy,
}

impl<A: CaptchaApi> PollingSolver<A> {
    /// Create a solver with explicit policies.
    pub fn new(api: A, submit: RetryPolicy, poll: PollPolicy) -> Self {
        Self { api, submit, poll }
    }

    /// Create a solver with the policies from the `[captcha]` section.
    pub fn from_config(api: A, config: &CaptchaConfig) -> Self {
        Self::new(api, RetryPolicy::from(config), PollPolicy::from(config))
    }

    async fn submit(&self, request: &SolveRequest) -> Result<u64> {
        let mut attempt = 1;
        loop {
            tracing::debug!(
                attempt,
                max_attempts = self.submit.max_attempts,
                "Creating captcha task"
            );

            match self
                .api
                .create_task(&request.site_url, &request.site_key)
                .await
            {
                Ok(response) if response.error.is_error() => {
                    let err = response.error.rejection();
                    tracing::error!(error = %err, "Captcha task rejected");
                    return Err(err);
                }
                Ok(response) => {
                    return response.task_id.ok_or_else(|| {
                        CaptchaError::rejected("NO_TASK_ID", "create reply carried no taskId")
                    });
                }
                Err(e) if self.submit.has_next(attempt) => {
                    let delay = self.submit.delay_for(attempt);
                    tracing::warn!(attempt, error = %e, ?delay, "Failed to create captcha task, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempts = attempt, error = %e, "All captcha task creation attempts failed");
                    return Err(CaptchaError::SolverUnavailable {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    async fn await_solution(&self, task_id: u64) -> Result<String> {
        let started = Instant::now();
        let deadline = started + self.poll.max_wait;

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.poll.next_delay(deadline - now)).await;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let response =
                match tokio::time::timeout(remaining, self.api.get_task_result(task_id)).await {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => {
                        tracing::warn!(task_id, error = %e, "Failed to fetch captcha result");
                        continue;
                    }
                    Err(_) => {
                        tracing::debug!(task_id, "Result request cut off at deadline");
                        break;
                    }
                };

            match SolveStatus::from(response) {
                SolveStatus::Ready(token) => {
                    tracing::info!(task_id, elapsed = ?started.elapsed(), "Captcha solved");
                    return Ok(token);
                }
                SolveStatus::Failed { code, description } => {
                    tracing::error!(task_id, %code, %description, "Captcha task failed");
                    return Err(CaptchaError::ProviderRejected { code, description });
                }
                SolveStatus::Pending => {
                    tracing::debug!(task_id, elapsed = ?started.elapsed(), "Captcha still processing");
                }
            }
        }

        tracing::error!(task_id, timeout = ?self.poll.max_wait, "Captcha solving timed out");
        Err(CaptchaError::SolveTimeout(self.poll.max_wait))
    }
}

#[async_trait]
impl<A: CaptchaApi> CaptchaSolver for PollingSolver<A> {
    async fn solve(&self, request: &SolveRequest) -> Result<String> {
        tracing::info!(
            site_url = %request.site_url,
            site_key = %request.key_prefix(),
            "Solving captcha"
        );
        let task_id = self.submit(request).await?;
        tracing::info!(task_id, "Captcha task created");
        self.await_solution(task_id).await
    }
}
