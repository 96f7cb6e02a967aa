use crate::catalog::SubjectType;
use crate::error::CinkbertError;
use crate::server::guards::auth::{AuthUser, PageUser};
use crate::server::router::CinkbertState;
use crate::service::training::{
    TrainingImage, TrainingResponse, TrainingSource, TrainingUpload, train,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State, multipart::Field},
};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct TrainFormContract {
    pub action: &'static str,
    pub subject_types: Vec<SubjectType>,
    pub min_images: usize,
    pub max_images: usize,
    pub max_upload_bytes: usize,
}

/// GET /train
pub async fn train_page(
    State(state): State<CinkbertState>,
    PageUser(_user): PageUser,
) -> Json<TrainFormContract> {
    Json(TrainFormContract {
        action: "/api/train-model",
        subject_types: SubjectType::ALL.to_vec(),
        min_images: state.limits.min_training_images,
        max_images: state.limits.max_training_images,
        max_upload_bytes: state.limits.max_upload_bytes,
    })
}

/// POST /api/train-model
///
/// Waits for the training job; expect minutes, bounded by `training_timeout_secs`.
pub async fn train_model(
    State(state): State<CinkbertState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<TrainingResponse>, CinkbertError> {
    let upload = read_upload(multipart, state.limits.max_upload_bytes).await?;
    train(&state.providers, &state.db, &state.limits, &user.id, upload)
        .await
        .map(Json)
}

async fn read_upload(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<TrainingUpload, CinkbertError> {
    let mut model_name: Option<String> = None;
    let mut selected_type: Option<String> = None;
    let mut zip: Option<Bytes> = None;
    let mut images: Vec<TrainingImage> = Vec::new();
    let mut total = 0usize;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "modelName" => model_name = Some(field.text().await?),
            "selectedType" => selected_type = Some(field.text().await?),
            "zipFile" => {
                let data = read_file(field, &mut total, max_upload_bytes).await?;
                zip = Some(data);
            }
            "images" | "images[]" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = read_file(field, &mut total, max_upload_bytes).await?;
                images.push(TrainingImage {
                    file_name,
                    content_type,
                    data,
                });
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let model_name = model_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| CinkbertError::invalid_request("modelName is required."))?;
    let selected_type = selected_type
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CinkbertError::invalid_request("selectedType is required."))?;
    let subject_type: SubjectType = selected_type.parse().map_err(|err| {
        CinkbertError::invalid_request(format!("selectedType is not supported: {err}"))
    })?;

    let source = match (zip, images.is_empty()) {
        (Some(data), _) => TrainingSource::Zip(data),
        (None, false) => TrainingSource::Images(images),
        (None, true) => {
            return Err(CinkbertError::invalid_request(
                "Upload a zipFile or at least one images part.",
            ));
        }
    };

    Ok(TrainingUpload {
        model_name,
        subject_type,
        source,
    })
}

/// Streams one file part, failing as soon as the running total passes the limit.
async fn read_file(
    mut field: Field<'_>,
    total: &mut usize,
    limit: usize,
) -> Result<Bytes, CinkbertError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        *total += chunk.len();
        if *total > limit {
            return Err(CinkbertError::PayloadTooLarge {
                actual: *total,
                limit,
            });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}
