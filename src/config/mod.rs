mod basic;
mod limits;
mod providers;

pub use basic::BasicConfig;
pub use limits::LimitsConfig;
pub use providers::{
    FalConfig, FalResolvedConfig, HttpClientSettings, OpenaiConfig, OpenaiResolvedConfig,
    PollSchedule, ProviderDefaults, ProvidersConfig, SupabaseConfig, SupabaseResolvedConfig,
};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Upload and request size bounds (see `limits` table in config.toml).
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Upstream API settings (see `providers` table in config.toml).
    #[serde(default)]
    pub providers: ProvidersConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "CINKBERT_";

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file and
    /// `CINKBERT_`-prefixed environment variables (`__` separates nested keys).
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration without validating secrets. Tests use this.
    pub fn from_optional_toml() -> Self {
        Self::figment()
            .extract()
            .unwrap_or_else(|err| panic!("failed to extract configuration: {err}"))
    }

    /// Loads configuration and refuses to continue when required secrets are missing.
    pub fn from_toml() -> Self {
        let cfg = Self::from_optional_toml();
        let missing = cfg.missing_required();
        if !missing.is_empty() {
            panic!(
                "missing required configuration: {} (set them in {} or via {}* env vars)",
                missing.join(", "),
                DEFAULT_CONFIG_FILE,
                ENV_PREFIX
            );
        }
        cfg
    }

    /// Dotted keys of required settings that are empty.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let p = &self.providers;
        [
            ("providers.fal.api_key", p.fal.api_key.as_str()),
            ("providers.openai.api_key", p.openai.api_key.as_str()),
            ("providers.supabase.anon_key", p.supabase.anon_key.as_str()),
            (
                "providers.supabase.service_role_key",
                p.supabase.service_role_key.as_str(),
            ),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .chain(p.supabase.url.is_none().then_some("providers.supabase.url"))
        .collect()
    }

    pub fn fal(&self) -> FalResolvedConfig {
        self.providers.fal.resolve(&self.providers.defaults)
    }

    pub fn openai(&self) -> OpenaiResolvedConfig {
        self.providers.openai.resolve(&self.providers.defaults)
    }

    pub fn supabase(&self) -> SupabaseResolvedConfig {
        self.providers.supabase.resolve(&self.providers.defaults)
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_toml);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_report_every_missing_secret() {
        let cfg = Config::default();
        let missing = cfg.missing_required();
        assert_eq!(
            missing,
            vec![
                "providers.fal.api_key",
                "providers.openai.api_key",
                "providers.supabase.anon_key",
                "providers.supabase.service_role_key",
                "providers.supabase.url",
            ]
        );
    }

    #[test]
    fn provider_overrides_win_over_defaults() {
        let mut cfg = Config::default();
        cfg.providers.defaults.enable_multiplexing = true;
        cfg.providers.fal.enable_multiplexing = Some(false);

        assert!(!cfg.fal().http.enable_multiplexing);
        assert!(cfg.openai().http.enable_multiplexing);
    }

    #[test]
    fn nested_toml_tables_are_merged_over_defaults() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                listen_port = 9000

                [limits]
                min_training_images = 6

                [providers.supabase]
                url = "https://project.supabase.co"
                signed_url_ttl_secs = 600
                "#,
            ))
            .extract()
            .expect("extract config");

        assert_eq!(cfg.basic.listen_port, 9000);
        assert_eq!(cfg.limits.min_training_images, 6);
        assert_eq!(cfg.limits.max_training_images, 20);
        assert_eq!(cfg.supabase().signed_url_ttl.as_secs(), 600);
        assert_eq!(cfg.supabase().bucket, "bucket");
    }
}
