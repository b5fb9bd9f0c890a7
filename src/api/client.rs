use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{CreateJobRequest, CreateJobResponse, JobStatus, PollMode, StatusResponse};
use crate::config::ClientConfig;
use crate::error::{JobClientError, classify_response, classify_transport};
use crate::poller::{self, AwaitOptions};
use crate::retry::RetryPolicy;

const CREATE_CONTEXT: &str = "Failed to create job";
const STATUS_CONTEXT: &str = "Failed to fetch status";
const CONFIG_CONTEXT: &str = "Invalid client configuration";

/// The two remote operations the poller depends on.
///
/// [`JobClient`] is the HTTP implementation; tests substitute scripted ones.
pub trait JobApi {
    /// Submit a new job.
    fn create_job(
        &self,
        processing_duration: f64,
        should_error: bool,
    ) -> impl Future<Output = Result<CreateJobResponse, JobClientError>> + Send;

    /// Fetch the raw status string for `job_id`.
    fn get_status(
        &self,
        job_id: &str,
        mode: PollMode,
    ) -> impl Future<Output = Result<String, JobClientError>> + Send;
}

/// HTTP client for the job API with a per-instance retry policy.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct JobClient {
    client: Client,
    base_url: Url,
    policy: RetryPolicy,
}

impl JobClient {
    /// Client with the default retry policy.
    pub fn new(base_url: &str) -> Result<Self, JobClientError> {
        Self::with_policy(base_url, RetryPolicy::default())
    }

    pub fn with_policy(base_url: &str, policy: RetryPolicy) -> Result<Self, JobClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| classify_transport(CONFIG_CONTEXT, e))?;
        Self::from_parts(client, base_url, policy)
    }

    /// Build a client from a loaded [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, JobClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| classify_transport(CONFIG_CONTEXT, e))?;
        Self::from_parts(client, &config.base_url, config.retry_policy())
    }

    fn from_parts(client: Client, base_url: &str, policy: RetryPolicy) -> Result<Self, JobClientError> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            policy,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Poll until the job reaches a terminal status. See [`poller::await_completion`].
    pub async fn await_completion(
        &self,
        job_id: &str,
        options: AwaitOptions,
    ) -> Result<JobStatus, JobClientError> {
        poller::await_completion(self, job_id, options).await
    }

    /// Like [`await_completion`](Self::await_completion) but stops early when
    /// `cancel` fires.
    pub async fn await_completion_with_cancel(
        &self,
        job_id: &str,
        options: AwaitOptions,
        cancel: &CancellationToken,
    ) -> Result<JobStatus, JobClientError> {
        poller::await_completion_with_cancel(self, job_id, options, cancel).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, JobClientError> {
        self.base_url
            .join(path)
            .map_err(|e| JobClientError::invalid_argument(CONFIG_CONTEXT, e.to_string()))
    }

    /// Send the request produced by `build`, retrying transient failures per
    /// the policy. The last failure is returned once retries are exhausted.
    async fn execute<T, F>(&self, context: &'static str, build: F) -> Result<T, JobClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            match send_once::<T>(context, build()).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.policy.max_retries && self.policy.should_retry(&err) => {
                    attempt += 1;
                    let wait = self.policy.wait_before_retry(attempt, &err);
                    log_retry(attempt, self.policy.max_retries, &err, wait);
                    sleep(wait).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl JobApi for JobClient {
    async fn create_job(
        &self,
        processing_duration: f64,
        should_error: bool,
    ) -> Result<CreateJobResponse, JobClientError> {
        let url = self.endpoint("jobs")?;
        let body = CreateJobRequest {
            processing_duration,
            should_error,
        };
        let created: CreateJobResponse = self
            .execute(CREATE_CONTEXT, || self.client.post(url.clone()).json(&body))
            .await?;
        debug!(job_id = %created.job_id, status = %created.status, "job created");
        Ok(created)
    }

    async fn get_status(&self, job_id: &str, mode: PollMode) -> Result<String, JobClientError> {
        let url = self.endpoint("status")?;
        let response: StatusResponse = self
            .execute(STATUS_CONTEXT, || {
                self.client
                    .get(url.clone())
                    .query(&[("job_id", job_id), ("mode", mode.as_str())])
            })
            .await?;
        Ok(response.result)
    }
}

async fn send_once<T: DeserializeOwned>(
    context: &'static str,
    request: RequestBuilder,
) -> Result<T, JobClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| classify_transport(context, e))?;

    if !response.status().is_success() {
        return Err(classify_response(context, response).await);
    }

    // A body that stops short is a dropped connection, not a bad payload.
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| JobClientError::Network {
            context,
            message: format!("failed to read response body: {e}"),
        })?;

    serde_json::from_slice::<T>(&body).map_err(|e| JobClientError::Client {
        context,
        status: Some(status),
        message: format!("invalid response body: {e}"),
    })
}

/// Parse the base URL and make sure it ends with `/` so that endpoint paths
/// are appended rather than replacing the last segment.
fn normalize_base_url(raw: &str) -> Result<Url, JobClientError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(JobClientError::invalid_argument(
            CONFIG_CONTEXT,
            "base URL must not be empty",
        ));
    }
    let mut url = Url::parse(trimmed).map_err(|e| {
        JobClientError::invalid_argument(CONFIG_CONTEXT, format!("invalid base URL '{trimmed}': {e}"))
    })?;
    if url.cannot_be_a_base() {
        return Err(JobClientError::invalid_argument(
            CONFIG_CONTEXT,
            format!("'{trimmed}' cannot be used as a base URL"),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn log_retry(attempt: u32, max: u32, err: &JobClientError, wait: Duration) {
    match err {
        JobClientError::RateLimited {
            retry_after_secs, ..
        } => {
            let retry_after = retry_after_secs
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "N/A".to_string());
            warn!(
                attempt,
                max,
                retry_after = %retry_after,
                wait_ms = wait.as_millis() as u64,
                "retry attempt due to 429 rate limit"
            );
        }
        _ => {
            warn!(
                attempt,
                max,
                kind = %err.kind(),
                cause = %err,
                wait_ms = wait.as_millis() as u64,
                "retry attempt due to error"
            );
        }
    }
}
