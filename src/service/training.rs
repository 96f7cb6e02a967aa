use crate::catalog::{CatalogEntry, SubjectType, derive_trigger_word, derive_url_id};
use crate::config::LimitsConfig;
use crate::db::{DbActorHandle, UserModelCreate};
use crate::error::CinkbertError;
use crate::providers::Providers;
use axum::body::Bytes;
use chrono::Utc;
use cinkbert_schema::{FalLoraTrainingInput, FalLoraTrainingOutput};
use serde::Serialize;
use std::io::{Cursor, Write};
use tracing::{info, warn};
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

const ZIP_CONTENT_TYPE: &str = "application/zip";
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// One uploaded photo, as received from a multipart `images` part.
#[derive(Debug, Clone)]
pub struct TrainingImage {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub enum TrainingSource {
    /// A client-built archive (`zipFile` part).
    Zip(Bytes),
    /// Loose photos, bundled server-side.
    Images(Vec<TrainingImage>),
}

#[derive(Debug, Clone)]
pub struct TrainingUpload {
    pub model_name: String,
    pub subject_type: SubjectType,
    pub source: TrainingSource,
}

/// Archive ready to be shipped to the trainer.
#[derive(Debug, Clone)]
pub struct PreparedArchive {
    pub data: Bytes,
    pub image_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingResponse {
    pub success: bool,
    #[serde(rename = "modelName")]
    pub model_name: String,
    #[serde(rename = "selectedType")]
    pub selected_type: SubjectType,
    #[serde(rename = "triggerWord")]
    pub trigger_word: String,
    pub model: CatalogEntry,
}

/// Bundles or inspects the upload and enforces the image-count bounds.
pub fn prepare_archive(
    source: TrainingSource,
    limits: &LimitsConfig,
) -> Result<PreparedArchive, CinkbertError> {
    let prepared = match source {
        TrainingSource::Zip(data) => {
            let image_count = count_archive_images(&data)?;
            PreparedArchive { data, image_count }
        }
        TrainingSource::Images(images) => {
            ensure_photos(&images)?;
            check_image_count(images.len(), limits)?;
            let image_count = images.len();
            PreparedArchive {
                data: bundle_images(&images)?,
                image_count,
            }
        }
    };
    check_image_count(prepared.image_count, limits)?;
    Ok(prepared)
}

/// Every loose part must be a JPEG, PNG or WebP, by file name or MIME type.
fn ensure_photos(images: &[TrainingImage]) -> Result<(), CinkbertError> {
    let rejected = images.iter().find(|image| {
        image_extension(image.file_name.as_deref(), image.content_type.as_deref()).is_none()
    });
    match rejected {
        Some(image) => Err(CinkbertError::invalid_request(format!(
            "'{}' is not a JPEG, PNG or WebP image.",
            image.file_name.as_deref().unwrap_or("unnamed part")
        ))),
        None => Ok(()),
    }
}

fn check_image_count(actual: usize, limits: &LimitsConfig) -> Result<(), CinkbertError> {
    if actual < limits.min_training_images || actual > limits.max_training_images {
        return Err(CinkbertError::InvalidImageCount {
            actual,
            min: limits.min_training_images,
            max: limits.max_training_images,
        });
    }
    Ok(())
}

/// Writes `image_<n>.<ext>` entries into an in-memory deflate archive.
fn bundle_images(images: &[TrainingImage]) -> Result<Bytes, CinkbertError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(5));
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (n, image) in images.iter().enumerate() {
        let ext = image_extension(image.file_name.as_deref(), image.content_type.as_deref())
            .unwrap_or("jpg");
        writer.start_file(format!("image_{}.{ext}", n + 1), options)?;
        writer.write_all(&image.data)?;
    }

    let cursor = writer.finish()?;
    Ok(Bytes::from(cursor.into_inner()))
}

/// Counts image entries, skipping directories, dotfiles and macOS resource forks.
fn count_archive_images(data: &[u8]) -> Result<usize, CinkbertError> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(|e| {
        CinkbertError::invalid_request(format!("zipFile is not a readable zip archive: {e}"))
    })?;

    let mut count = 0;
    for i in 0..archive.len() {
        // Raw access: counting needs headers only, never the codec.
        let entry = archive.by_index_raw(i).map_err(|e| {
            CinkbertError::invalid_request(format!("zipFile entry {i} is unreadable: {e}"))
        })?;
        if entry.is_dir() {
            continue;
        }
        let Some(path) = entry.enclosed_name() else {
            continue;
        };
        if path.components().any(|c| c.as_os_str() == "__MACOSX") {
            continue;
        }
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if file_name.starts_with('.') {
            continue;
        }
        if image_extension(Some(file_name), None).is_some() {
            count += 1;
        }
    }
    Ok(count)
}

/// Extension for a photo, from its file name first, then its MIME type.
pub fn image_extension(file_name: Option<&str>, content_type: Option<&str>) -> Option<&'static str> {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .and_then(|ext| IMAGE_EXTENSIONS.into_iter().find(|known| *known == ext));
    if from_name.is_some() {
        return from_name;
    }
    match content_type?.split(';').next()?.trim() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Uploads the archive, trains a LoRA on it and records the resulting model.
pub async fn train(
    providers: &Providers,
    db: &DbActorHandle,
    limits: &LimitsConfig,
    user_id: &str,
    upload: TrainingUpload,
) -> Result<TrainingResponse, CinkbertError> {
    let model_name = upload.model_name.trim().to_string();
    if model_name.is_empty() {
        return Err(CinkbertError::invalid_request("modelName must not be empty."));
    }
    let archive = prepare_archive(upload.source, limits)?;

    let subject_type = upload.subject_type;
    let trigger_word = derive_trigger_word(&model_name, subject_type);
    let url_id = derive_url_id(&model_name);
    let fal_cfg = providers.fal.config();

    info!(
        user_id,
        model_name = %model_name,
        subject_type = %subject_type,
        image_count = archive.image_count,
        archive_bytes = archive.data.len(),
        "Training requested"
    );

    if providers.supabase.config().archive_uploads {
        let path = format!(
            "uploads/{user_id}/{}_{url_id}.zip",
            Utc::now().timestamp_millis()
        );
        if let Err(err) = providers
            .supabase
            .upload(&path, ZIP_CONTENT_TYPE, archive.data.clone())
            .await
        {
            warn!(path, error = %err, "Failed to archive training upload");
        }
    }

    let images_data_url = providers
        .fal
        .upload_file(&format!("{url_id}.zip"), ZIP_CONTENT_TYPE, archive.data)
        .await?;

    let input = FalLoraTrainingInput {
        images_data_url,
        trigger_word: trigger_word.clone(),
        is_style: subject_type.is_style(),
        create_masks: true,
        iter_multiplier: 1.0,
        steps: fal_cfg.training_steps,
        data_archive_format: "zip".to_string(),
    };
    let job = providers
        .fal
        .run::<_, FalLoraTrainingOutput>(&fal_cfg.training_endpoint, &input, fal_cfg.training_poll)
        .await?;

    let lora_path = job
        .output
        .weights_url()
        .ok_or_else(|| CinkbertError::UpstreamPayload {
            provider: "fal",
            reason: format!("training job {} returned no weights", job.request_id),
        })?
        .to_string();

    let row = db
        .create_user_model(UserModelCreate {
            user_id: user_id.to_string(),
            url_id,
            name: model_name.clone(),
            provider_model_id: fal_cfg.training_endpoint.clone(),
            subject_type: subject_type.as_str().to_string(),
            supports_file_upload: false,
            lora_path: Some(lora_path),
            trigger_word: Some(trigger_word.clone()),
        })
        .await?;

    info!(
        user_id,
        url_id = %row.url_id,
        request_id = %job.request_id,
        "Training finished, model stored"
    );

    Ok(TrainingResponse {
        success: true,
        model_name,
        selected_type: subject_type,
        trigger_word,
        model: CatalogEntry::from(&row),
    })
}
