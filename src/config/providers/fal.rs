use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{HttpClientSettings, ProviderDefaults};

/// fal.ai provider configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FalConfig {
    /// API key sent as `Authorization: Key <api_key>`.
    /// TOML: `providers.fal.api_key`. Required.
    #[serde(default)]
    pub api_key: String,

    /// Queue API base URL.
    /// TOML: `providers.fal.queue_url`. Default: `https://queue.fal.run`.
    #[serde(default = "default_queue_url")]
    pub queue_url: Url,

    /// Storage REST base URL used for archive uploads.
    /// TOML: `providers.fal.storage_url`. Default: `https://rest.alpha.fal.ai`.
    #[serde(default = "default_storage_url")]
    pub storage_url: Url,

    /// Endpoint used to run prompts against user-trained LoRA weights.
    /// TOML: `providers.fal.lora_endpoint`. Default: `fal-ai/flux-lora`.
    #[serde(default = "default_lora_endpoint")]
    pub lora_endpoint: String,

    /// Endpoint used to train LoRA weights.
    /// TOML: `providers.fal.training_endpoint`. Default: `fal-ai/flux-lora-fast-training`.
    #[serde(default = "default_training_endpoint")]
    pub training_endpoint: String,

    /// TOML: `providers.fal.training_steps`. Default: `1000`.
    #[serde(default = "default_training_steps")]
    pub training_steps: u32,

    /// Status polling interval for generation jobs.
    /// TOML: `providers.fal.poll_interval_ms`. Default: `1000`.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// TOML: `providers.fal.generation_timeout_secs`. Default: `300`.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Status polling interval for training jobs.
    /// TOML: `providers.fal.training_poll_interval_ms`. Default: `5000`.
    #[serde(default = "default_training_poll_interval_ms")]
    pub training_poll_interval_ms: u64,

    /// TOML: `providers.fal.training_timeout_secs`. Default: `3600`.
    #[serde(default = "default_training_timeout_secs")]
    pub training_timeout_secs: u64,

    /// Falls back to `providers.defaults.proxy` when unset.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Falls back to `providers.defaults.enable_multiplexing` when unset.
    #[serde(default)]
    pub enable_multiplexing: Option<bool>,
}

/// Fixed-interval polling bounded by a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSchedule {
    /// Number of status checks that fit into the timeout (at least one).
    pub fn max_polls(&self) -> usize {
        let interval = self.interval.as_millis().max(1);
        usize::try_from(self.timeout.as_millis() / interval)
            .unwrap_or(usize::MAX)
            .max(1)
    }
}

#[derive(Debug, Clone)]
pub struct FalResolvedConfig {
    pub api_key: String,
    pub queue_url: Url,
    pub storage_url: Url,
    pub lora_endpoint: String,
    pub training_endpoint: String,
    pub training_steps: u32,
    pub generation_poll: PollSchedule,
    pub training_poll: PollSchedule,
    pub http: HttpClientSettings,
}

impl FalConfig {
    pub fn resolve(&self, defaults: &ProviderDefaults) -> FalResolvedConfig {
        FalResolvedConfig {
            api_key: self.api_key.clone(),
            queue_url: self.queue_url.clone(),
            storage_url: self.storage_url.clone(),
            lora_endpoint: self.lora_endpoint.clone(),
            training_endpoint: self.training_endpoint.clone(),
            training_steps: self.training_steps,
            generation_poll: PollSchedule {
                interval: Duration::from_millis(self.poll_interval_ms),
                timeout: Duration::from_secs(self.generation_timeout_secs),
            },
            training_poll: PollSchedule {
                interval: Duration::from_millis(self.training_poll_interval_ms),
                timeout: Duration::from_secs(self.training_timeout_secs),
            },
            http: defaults.http_settings(self.proxy.as_ref(), self.enable_multiplexing),
        }
    }
}

impl Default for FalConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            queue_url: default_queue_url(),
            storage_url: default_storage_url(),
            lora_endpoint: default_lora_endpoint(),
            training_endpoint: default_training_endpoint(),
            training_steps: default_training_steps(),
            poll_interval_ms: default_poll_interval_ms(),
            generation_timeout_secs: default_generation_timeout_secs(),
            training_poll_interval_ms: default_training_poll_interval_ms(),
            training_timeout_secs: default_training_timeout_secs(),
            proxy: None,
            enable_multiplexing: None,
        }
    }
}

fn default_queue_url() -> Url {
    Url::parse("https://queue.fal.run").expect("valid fal queue url")
}

fn default_storage_url() -> Url {
    Url::parse("https://rest.alpha.fal.ai").expect("valid fal storage url")
}

fn default_lora_endpoint() -> String {
    "fal-ai/flux-lora".to_string()
}

fn default_training_endpoint() -> String {
    "fal-ai/flux-lora-fast-training".to_string()
}

fn default_training_steps() -> u32 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_generation_timeout_secs() -> u64 {
    5 * 60
}

fn default_training_poll_interval_ms() -> u64 {
    5000
}

fn default_training_timeout_secs() -> u64 {
    60 * 60
}
