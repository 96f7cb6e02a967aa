use serde::{Deserialize, Serialize};
use url::Url;

use super::{HttpClientSettings, ProviderDefaults};

/// OpenAI provider configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenaiConfig {
    /// Bearer key for chat completions.
    /// TOML: `providers.openai.api_key`. Required.
    #[serde(default)]
    pub api_key: String,

    /// TOML: `providers.openai.api_url`. Default: `https://api.openai.com`.
    #[serde(default = "default_api_url")]
    pub api_url: Url,

    /// Chat model used for language detection and translation.
    /// TOML: `providers.openai.model`. Default: `gpt-4o`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Language whose prompts are translated to English; other prompts pass through.
    /// TOML: `providers.openai.source_language`. Default: `Polish`.
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Falls back to `providers.defaults.proxy` when unset.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Falls back to `providers.defaults.enable_multiplexing` when unset.
    #[serde(default)]
    pub enable_multiplexing: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct OpenaiResolvedConfig {
    pub api_key: String,
    pub chat_completions_url: Url,
    pub model: String,
    pub source_language: String,
    pub http: HttpClientSettings,
}

impl OpenaiConfig {
    pub fn resolve(&self, defaults: &ProviderDefaults) -> OpenaiResolvedConfig {
        let mut chat_completions_url = self.api_url.clone();
        chat_completions_url.set_path("/v1/chat/completions");

        OpenaiResolvedConfig {
            api_key: self.api_key.clone(),
            chat_completions_url,
            model: self.model.clone(),
            source_language: self.source_language.clone(),
            http: defaults.http_settings(self.proxy.as_ref(), self.enable_multiplexing),
        }
    }
}

impl Default for OpenaiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            model: default_model(),
            source_language: default_source_language(),
            proxy: None,
            enable_multiplexing: None,
        }
    }
}

fn default_api_url() -> Url {
    Url::parse("https://api.openai.com").expect("valid OpenAI api url")
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_source_language() -> String {
    "Polish".to_string()
}
