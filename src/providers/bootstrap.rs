use crate::config::Config;
use crate::error::CinkbertError;
use crate::providers::fal::FalClient;
use crate::providers::http::{CINKBERT_USER_AGENT, build_client};
use crate::providers::openai::OpenaiClient;
use crate::providers::supabase::SupabaseClient;
use std::sync::Arc;
use tracing::info;

/// Aggregates clients for all upstream services.
#[derive(Clone)]
pub struct Providers {
    pub fal: FalClient,
    pub openai: OpenaiClient,
    pub supabase: SupabaseClient,
}

impl Providers {
    pub fn new(cfg: &Config) -> Result<Self, CinkbertError> {
        let provider_defaults = &cfg.providers.defaults;
        let fal_cfg = Arc::new(cfg.fal());
        let openai_cfg = Arc::new(cfg.openai());
        let supabase_cfg = Arc::new(cfg.supabase());

        // Log resolved provider configs here so `main` stays wiring-only.
        info!(
            providers_defaults_proxy = %provider_defaults.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
            providers_defaults_enable_multiplexing = provider_defaults.enable_multiplexing,
            providers_defaults_request_timeout_secs = provider_defaults.request_timeout_secs,
            "Provider defaults loaded"
        );
        info!(
            fal_queue_url = %fal_cfg.queue_url,
            fal_storage_url = %fal_cfg.storage_url,
            fal_lora_endpoint = %fal_cfg.lora_endpoint,
            fal_training_endpoint = %fal_cfg.training_endpoint,
            fal_training_steps = fal_cfg.training_steps,
            fal_generation_poll = ?fal_cfg.generation_poll,
            fal_training_poll = ?fal_cfg.training_poll,
            fal_proxy = %fal_cfg.http.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
            "fal config (effective)"
        );
        info!(
            openai_url = %openai_cfg.chat_completions_url,
            openai_model = %openai_cfg.model,
            openai_source_language = %openai_cfg.source_language,
            openai_proxy = %openai_cfg.http.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
            "OpenAI config (effective)"
        );
        info!(
            supabase_url = %supabase_cfg.url,
            supabase_bucket = %supabase_cfg.bucket,
            supabase_signed_url_ttl_secs = supabase_cfg.signed_url_ttl.as_secs(),
            supabase_archive_generated = supabase_cfg.archive_generated,
            supabase_archive_uploads = supabase_cfg.archive_uploads,
            "Supabase config (effective)"
        );

        let fal_client = build_client(CINKBERT_USER_AGENT, &fal_cfg.http)?;
        let openai_client = build_client(CINKBERT_USER_AGENT, &openai_cfg.http)?;
        let supabase_client = build_client(CINKBERT_USER_AGENT, &supabase_cfg.http)?;

        Ok(Self {
            fal: FalClient::new(fal_cfg, fal_client),
            openai: OpenaiClient::new(openai_cfg, openai_client),
            supabase: SupabaseClient::new(supabase_cfg, supabase_client),
        })
    }
}
