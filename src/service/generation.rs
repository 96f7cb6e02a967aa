use crate::catalog::{self, OutputKind, ResolvedModel, SizeControl, ensure_trigger_word};
use crate::config::LimitsConfig;
use crate::db::DbActorHandle;
use crate::error::CinkbertError;
use crate::providers::Providers;
use crate::service::translation::{TranslationResult, translate_prompt};
use base64::Engine as _;
use chrono::Utc;
use cinkbert_schema::{FalFile, FalGenerationInput, FalGenerationOutput, FalImage, FalLora, ImageSize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    #[serde(default, alias = "imageSize")]
    pub image_size: Option<ImageSize>,
    #[serde(default, alias = "numImages")]
    pub num_images: Option<u8>,
    /// `data:` URL or http(s) URL of an input image.
    #[serde(default, alias = "referenceImage")]
    pub reference_image: Option<String>,
    /// Run the prompt through translation first.
    #[serde(default)]
    pub translate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse {
    pub request_id: String,
    pub model: String,
    /// The prompt actually sent upstream.
    pub prompt: String,
    pub images: Vec<FalImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<FalFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationResult>,
}

pub async fn generate(
    providers: &Providers,
    db: &DbActorHandle,
    limits: &LimitsConfig,
    user_id: &str,
    req: GenerationRequest,
) -> Result<GenerationResponse, CinkbertError> {
    let model = catalog::resolve(db, user_id, req.model.trim()).await?;
    let capabilities = model.capabilities();

    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(CinkbertError::invalid_request("Prompt must not be empty."));
    }

    let num_images = req.num_images.unwrap_or(1);
    if num_images == 0 || num_images > limits.max_images_per_request {
        return Err(CinkbertError::invalid_request(format!(
            "num_images must be between 1 and {}.",
            limits.max_images_per_request
        )));
    }

    let reference_image = match req.reference_image.as_deref().map(str::trim) {
        Some(image) if !image.is_empty() => {
            validate_reference_image(image, limits.max_reference_image_bytes)?;
            Some(image.to_string())
        }
        _ => None,
    };
    let image_url = match reference_image {
        Some(image) if capabilities.supports_image_input => Some(image),
        Some(_) => {
            debug!(model = %model.id(), "reference image ignored by a text-only model");
            None
        }
        None if capabilities.requires_image_input => {
            return Err(CinkbertError::invalid_request(format!(
                "Model '{}' needs a reference image.",
                model.id()
            )));
        }
        None => None,
    };

    let translation = if req.translate {
        Some(translate_prompt(&providers.openai, prompt, model.trigger_word()).await?)
    } else {
        None
    };
    let prompt = translation
        .as_ref()
        .map_or(prompt, |t| t.translated_text.as_str());

    let (endpoint, input) = build_input(
        &model,
        &providers.fal.config().lora_endpoint,
        prompt,
        req.image_size.unwrap_or_default(),
        num_images,
        image_url,
    )?;

    info!(
        user_id,
        model = %model.id(),
        endpoint = %endpoint,
        num_images,
        translated = translation.as_ref().is_some_and(|t| t.was_translated),
        "Generation requested"
    );

    let job = providers
        .fal
        .run::<_, FalGenerationOutput>(&endpoint, &input, providers.fal.config().generation_poll)
        .await?;
    let output = job.output;

    if output.images.is_empty() && output.video.is_none() {
        return Err(CinkbertError::UpstreamPayload {
            provider: "fal",
            reason: format!("job {} produced no media", job.request_id),
        });
    }

    if providers.supabase.config().archive_generated {
        archive_images(providers, user_id, &output.images).await;
    }

    Ok(GenerationResponse {
        request_id: job.request_id,
        model: model.id().to_string(),
        prompt: input.prompt,
        images: output.images,
        video: output.video,
        translation,
    })
}

/// Picks the endpoint and fills size, count, image and LoRA fields per the model's capabilities.
fn build_input(
    model: &ResolvedModel,
    lora_endpoint: &str,
    prompt: &str,
    image_size: ImageSize,
    num_images: u8,
    image_url: Option<String>,
) -> Result<(String, FalGenerationInput), CinkbertError> {
    let capabilities = model.capabilities();
    let mut input = FalGenerationInput {
        prompt: prompt.to_string(),
        image_url,
        ..Default::default()
    };

    match capabilities.size_control {
        SizeControl::ImageSize => input.image_size = Some(image_size),
        SizeControl::AspectRatio => input.aspect_ratio = Some(image_size.aspect_ratio().to_string()),
        SizeControl::Fixed => {}
    }
    if capabilities.output == OutputKind::Image {
        input.num_images = Some(num_images);
    }

    let endpoint = match model {
        ResolvedModel::Static(model) => model.provider_model_id.to_string(),
        ResolvedModel::Custom(row) => {
            let lora_path = model.lora_path().ok_or_else(|| {
                CinkbertError::UnexpectedError(format!("user model {} has no LoRA weights", row.id))
            })?;
            input.prompt = ensure_trigger_word(prompt, model.trigger_word());
            input.loras = vec![FalLora {
                path: lora_path.to_string(),
                scale: 1.0,
            }];
            lora_endpoint.to_string()
        }
    };

    Ok((endpoint, input))
}

/// Accepts http(s) URLs as-is and base64 `data:` URLs up to `max_bytes` decoded.
fn validate_reference_image(image: &str, max_bytes: usize) -> Result<(), CinkbertError> {
    if image.starts_with("https://") || image.starts_with("http://") {
        return Ok(());
    }

    let payload = image
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .filter(|(mime, _)| mime.starts_with("image/"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| {
            CinkbertError::invalid_request(
                "reference_image must be an http(s) URL or a base64 image data URL.",
            )
        })?;

    // Cheap upper bound before decoding anything.
    let estimated = payload.len() / 4 * 3;
    if estimated > max_bytes + 3 {
        return Err(CinkbertError::PayloadTooLarge {
            actual: estimated,
            limit: max_bytes,
        });
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| CinkbertError::invalid_request(format!("reference_image is not valid base64: {e}")))?;
    if decoded.len() > max_bytes {
        return Err(CinkbertError::PayloadTooLarge {
            actual: decoded.len(),
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Copies generated images into `generated/<user_id>/`. Failures are logged and skipped.
async fn archive_images(providers: &Providers, user_id: &str, images: &[FalImage]) {
    let stamp = Utc::now().timestamp_millis();
    for (n, image) in images.iter().enumerate() {
        let (bytes, fetched_type) = match providers.fal.download(&image.url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(url = %image.url, error = %err, "Skipping archive of generated image");
                continue;
            }
        };
        let content_type = image
            .content_type
            .clone()
            .or(fetched_type)
            .unwrap_or_else(|| "image/png".to_string());
        let path = format!(
            "generated/{user_id}/{stamp}_{n}.{}",
            extension_for(&content_type, &image.url)
        );

        if let Err(err) = providers.supabase.upload(&path, &content_type, bytes).await {
            warn!(path, error = %err, "Failed to archive generated image");
        }
    }
}

fn extension_for(content_type: &str, url: &str) -> &'static str {
    match content_type.split(';').next().unwrap_or_default().trim() {
        "image/jpeg" | "image/jpg" => return "jpg",
        "image/png" => return "png",
        "image/webp" => return "webp",
        _ => {}
    }
    let path = url.split(['?', '#']).next().unwrap_or_default().to_lowercase();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "jpg"
    } else if path.ends_with(".webp") {
        "webp"
    } else {
        "png"
    }
}
