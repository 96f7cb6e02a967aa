use crate::catalog::{self, CatalogEntry, STATIC_MODELS};
use crate::error::CinkbertError;
use crate::server::guards::auth::PageUser;
use crate::server::router::CinkbertState;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub static_models: Vec<CatalogEntry>,
    pub user_models: Vec<CatalogEntry>,
}

/// GET /models
pub async fn list_models(
    State(state): State<CinkbertState>,
    PageUser(user): PageUser,
) -> Result<Json<ModelListResponse>, CinkbertError> {
    let rows = state.db.list_user_models(&user.id).await?;
    Ok(Json(ModelListResponse {
        static_models: STATIC_MODELS.iter().map(CatalogEntry::from).collect(),
        user_models: rows.iter().map(CatalogEntry::from).collect(),
    }))
}

/// GET /models/{model}
pub async fn get_model(
    State(state): State<CinkbertState>,
    PageUser(user): PageUser,
    Path(model): Path<String>,
) -> Result<Json<CatalogEntry>, CinkbertError> {
    let resolved = catalog::resolve(&state.db, &user.id, &model).await?;
    Ok(Json(resolved.to_entry()))
}
