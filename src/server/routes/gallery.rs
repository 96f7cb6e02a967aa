use crate::error::CinkbertError;
use crate::server::guards::auth::PageUser;
use crate::server::router::CinkbertState;
use crate::service::gallery::{GalleryQuery, GalleryResponse, list_gallery};
use axum::{
    Json,
    extract::{Query, State},
};

/// GET /gallery?limit&offset
pub async fn gallery(
    State(state): State<CinkbertState>,
    PageUser(user): PageUser,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>, CinkbertError> {
    list_gallery(&state.providers.supabase, &user.id, query)
        .await
        .map(Json)
}
