use crate::error::CinkbertError;
use crate::server::extract::ApiJson;
use crate::server::guards::auth::AuthUser;
use crate::server::router::CinkbertState;
use crate::service::generation::{GenerationRequest, GenerationResponse, generate};
use axum::{Json, extract::State};

/// POST /api/predictions
///
/// Blocks until the queue job finishes or `generation_timeout_secs` elapses.
pub async fn create_prediction(
    State(state): State<CinkbertState>,
    user: AuthUser,
    ApiJson(req): ApiJson<GenerationRequest>,
) -> Result<Json<GenerationResponse>, CinkbertError> {
    generate(&state.providers, &state.db, &state.limits, &user.id, req)
        .await
        .map(Json)
}
