use crate::config::{FalResolvedConfig, PollSchedule};
use crate::error::CinkbertError;
use crate::providers::policy::{body_preview, ensure_success, read_json};
use crate::utils::logging::with_pretty_json_debug;
use axum::body::Bytes;
use backon::{ConstantBuilder, Retryable};
use cinkbert_schema::{FalQueueState, FalQueueStatus, FalQueueSubmission};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::FAL_PROVIDER;

/// A finished queue job and its decoded output.
#[derive(Debug, Clone)]
pub struct FalJob<O> {
    pub request_id: String,
    pub output: O,
}

#[derive(Clone)]
pub struct FalClient {
    pub(super) client: reqwest::Client,
    pub(super) cfg: Arc<FalResolvedConfig>,
}

#[derive(Debug)]
enum PollOutcome {
    Pending,
    Fatal(CinkbertError),
}

impl From<CinkbertError> for PollOutcome {
    fn from(err: CinkbertError) -> Self {
        PollOutcome::Fatal(err)
    }
}

impl FalClient {
    pub fn new(cfg: Arc<FalResolvedConfig>, client: reqwest::Client) -> Self {
        Self { client, cfg }
    }

    pub fn config(&self) -> &FalResolvedConfig {
        &self.cfg
    }

    pub(super) fn auth_header(&self) -> Result<HeaderValue, CinkbertError> {
        HeaderValue::from_str(&format!("Key {}", self.cfg.api_key))
            .map_err(|e| CinkbertError::UnexpectedError(format!("invalid fal api key: {e}")))
    }

    /// `POST {queue_url}/{endpoint}`.
    pub async fn submit<I: Serialize>(
        &self,
        endpoint: &str,
        input: &I,
    ) -> Result<FalQueueSubmission, CinkbertError> {
        let url = endpoint_url(&self.cfg.queue_url, endpoint)?;

        with_pretty_json_debug(input, |pretty| {
            debug!(endpoint, body = %pretty, "[fal] submit payload");
        });

        let resp = self
            .client
            .post(url)
            .header(AUTHORIZATION, self.auth_header()?)
            .json(input)
            .send()
            .await?;
        let submission: FalQueueSubmission = read_json(FAL_PROVIDER, resp).await?;

        info!(
            endpoint,
            request_id = %submission.request_id,
            queue_position = ?submission.queue_position,
            "[fal] job submitted"
        );
        Ok(submission)
    }

    /// One status check, with logs included.
    pub async fn status(
        &self,
        submission: &FalQueueSubmission,
    ) -> Result<FalQueueStatus, CinkbertError> {
        let mut url = Url::parse(&submission.status_url)?;
        url.query_pairs_mut().append_pair("logs", "1");

        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.auth_header()?)
            .send()
            .await?;
        read_json(FAL_PROVIDER, resp).await
    }

    /// Fetches the output of a completed job. A non-2xx answer here means the job
    /// itself failed, so it maps to `JobFailed` rather than a transport error.
    pub async fn result<O: DeserializeOwned>(
        &self,
        submission: &FalQueueSubmission,
    ) -> Result<O, CinkbertError> {
        let resp = self
            .client
            .get(&submission.response_url)
            .header(AUTHORIZATION, self.auth_header()?)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
            let bytes = resp.bytes().await.unwrap_or_default();
            return Err(CinkbertError::JobFailed {
                request_id: submission.request_id.clone(),
                reason: format!(
                    "{status}: {}",
                    body_preview(&String::from_utf8_lossy(&bytes))
                ),
            });
        }
        read_json(FAL_PROVIDER, resp).await
    }

    /// Submit, poll at a fixed interval until `COMPLETED`, then fetch the output.
    pub async fn run<I, O>(
        &self,
        endpoint: &str,
        input: &I,
        poll: PollSchedule,
    ) -> Result<FalJob<O>, CinkbertError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let started = Instant::now();
        let submission = self.submit(endpoint, input).await?;
        self.wait_until_completed(&submission, poll).await?;
        let output = self.result(&submission).await?;

        info!(
            endpoint,
            request_id = %submission.request_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "[fal] job completed"
        );
        Ok(FalJob {
            request_id: submission.request_id,
            output,
        })
    }

    async fn wait_until_completed(
        &self,
        submission: &FalQueueSubmission,
        poll: PollSchedule,
    ) -> Result<(), CinkbertError> {
        let policy = ConstantBuilder::default()
            .with_delay(poll.interval)
            .with_max_times(poll.max_polls());

        let check = || async {
            let status = self.status(submission).await?;
            match status.status {
                FalQueueState::Completed => match status.failure() {
                    Some(reason) => Err(PollOutcome::Fatal(CinkbertError::JobFailed {
                        request_id: submission.request_id.clone(),
                        reason: reason.to_string(),
                    })),
                    None => Ok(()),
                },
                FalQueueState::InQueue => {
                    debug!(
                        request_id = %submission.request_id,
                        queue_position = ?status.queue_position,
                        "[fal] in queue"
                    );
                    Err(PollOutcome::Pending)
                }
                FalQueueState::InProgress => {
                    for message in status.log_messages() {
                        debug!(request_id = %submission.request_id, "[fal] {message}");
                    }
                    Err(PollOutcome::Pending)
                }
            }
        };

        check
            .retry(policy)
            .when(|outcome: &PollOutcome| matches!(outcome, PollOutcome::Pending))
            .notify(|_: &PollOutcome, dur: Duration| {
                debug!(request_id = %submission.request_id, "[fal] next status check in {:?}", dur);
            })
            .await
            .map_err(|outcome| match outcome {
                PollOutcome::Pending => {
                    warn!(
                        request_id = %submission.request_id,
                        timeout_secs = poll.timeout.as_secs(),
                        "[fal] gave up waiting for job"
                    );
                    CinkbertError::JobTimeout {
                        request_id: submission.request_id.clone(),
                        timeout_secs: poll.timeout.as_secs(),
                    }
                }
                PollOutcome::Fatal(err) => err,
            })
    }

    /// Fetches an already hosted file, e.g. a generated image on the fal CDN.
    pub async fn download(&self, url: &str) -> Result<(Bytes, Option<String>), CinkbertError> {
        let resp = ensure_success(FAL_PROVIDER, self.client.get(url).send().await?).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok((resp.bytes().await?, content_type))
    }
}

/// Joins an endpoint id such as `fal-ai/flux/dev` onto the queue base URL.
fn endpoint_url(base: &Url, endpoint: &str) -> Result<Url, CinkbertError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| CinkbertError::UnexpectedError(format!("fal base url {base} cannot be a base")))?;
        segments.pop_if_empty();
        segments.extend(endpoint.split('/').filter(|s| !s.is_empty()));
    }
    Ok(url)
}
