use crate::config::OpenaiResolvedConfig;
use crate::error::CinkbertError;
use crate::providers::policy::{body_preview, read_json};
use crate::utils::logging::with_pretty_json_debug;
use cinkbert_schema::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::OPENAI_PROVIDER;

/// Thin chat-completions client; one request per call, no retries.
#[derive(Clone)]
pub struct OpenaiClient {
    client: reqwest::Client,
    cfg: Arc<OpenaiResolvedConfig>,
}

impl OpenaiClient {
    pub fn new(cfg: Arc<OpenaiResolvedConfig>, client: reqwest::Client) -> Self {
        Self { client, cfg }
    }

    pub fn config(&self) -> &OpenaiResolvedConfig {
        &self.cfg
    }

    /// Sends one system + user exchange and returns the trimmed reply text.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, CinkbertError> {
        let body = ChatCompletionRequest {
            model: self.cfg.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(0.0),
        };

        with_pretty_json_debug(&body, |pretty| {
            debug!(body = %pretty, "[OpenAI] chat payload");
        });

        let start = Instant::now();
        let resp = self
            .client
            .post(self.cfg.chat_completions_url.clone())
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await?;
        let completion: ChatCompletionResponse = read_json(OPENAI_PROVIDER, resp).await?;

        let content = completion
            .first_content()
            .filter(|content| !content.is_empty())
            .ok_or_else(|| CinkbertError::UpstreamPayload {
                provider: OPENAI_PROVIDER,
                reason: "completion has no content".to_string(),
            })?
            .to_string();

        debug!(
            model = %self.cfg.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            reply = %body_preview(&content),
            "[OpenAI] chat completed"
        );
        Ok(content)
    }
}
