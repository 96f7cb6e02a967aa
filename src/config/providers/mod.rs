mod fal;
mod openai;
mod supabase;

pub use fal::{FalConfig, FalResolvedConfig, PollSchedule};
pub use openai::{OpenaiConfig, OpenaiResolvedConfig};
pub use supabase::{SupabaseConfig, SupabaseResolvedConfig};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Global provider defaults (used when provider-level config is unset).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderDefaults {
    /// Optional upstream HTTP proxy. If set, used for reqwest clients.
    /// TOML: `providers.defaults.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Allow HTTP/2 multiplexing for reqwest clients; disabled forces HTTP/1.
    /// TOML: `providers.defaults.enable_multiplexing`. Default: `false`.
    #[serde(default = "default_enable_multiplexing")]
    pub enable_multiplexing: bool,

    /// TCP connect timeout for upstream calls.
    /// TOML: `providers.defaults.connect_timeout_secs`. Default: `10`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout for a single upstream call (not a whole polled job).
    /// TOML: `providers.defaults.request_timeout_secs`. Default: `600`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderDefaults {
    fn default() -> Self {
        Self {
            proxy: None,
            enable_multiplexing: default_enable_multiplexing(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderDefaults {
    fn http_settings(&self, proxy: Option<&Url>, enable_multiplexing: Option<bool>) -> HttpClientSettings {
        HttpClientSettings {
            proxy: proxy.cloned().or_else(|| self.proxy.clone()),
            enable_multiplexing: enable_multiplexing.unwrap_or(self.enable_multiplexing),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Effective reqwest client settings for one provider.
#[derive(Debug, Clone)]
pub struct HttpClientSettings {
    pub proxy: Option<Url>,
    pub enable_multiplexing: bool,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

/// All provider configurations.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProvidersConfig {
    /// Global defaults for providers (overridden per provider if set).
    #[serde(default)]
    pub defaults: ProviderDefaults,

    /// fal.ai inference, training and file storage.
    #[serde(default)]
    pub fal: FalConfig,

    /// OpenAI chat completions (prompt translation).
    #[serde(default)]
    pub openai: OpenaiConfig,

    /// Supabase auth and object storage.
    #[serde(default)]
    pub supabase: SupabaseConfig,
}

fn default_enable_multiplexing() -> bool {
    false
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    10 * 60
}
