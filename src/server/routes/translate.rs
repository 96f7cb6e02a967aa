use crate::error::CinkbertError;
use crate::server::extract::ApiJson;
use crate::server::guards::auth::AuthUser;
use crate::server::router::CinkbertState;
use crate::service::translation::{TranslationRequest, TranslationResult, translate_prompt};
use axum::{Json, extract::State};

/// POST /api/translate
pub async fn translate(
    State(state): State<CinkbertState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<TranslationRequest>,
) -> Result<Json<TranslationResult>, CinkbertError> {
    translate_prompt(
        &state.providers.openai,
        &req.text,
        req.trigger_word.as_deref(),
    )
    .await
    .map(Json)
}
