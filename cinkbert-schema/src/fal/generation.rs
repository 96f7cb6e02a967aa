use serde::{Deserialize, Serialize};

/// fal image size presets.
///
/// `portrait` and `landscape` are accepted as shorthands for the 16:9 variants.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum ImageSize {
    #[serde(rename = "square_hd")]
    SquareHd,
    #[default]
    #[serde(rename = "square")]
    Square,
    #[serde(rename = "portrait_4_3")]
    Portrait4x3,
    #[serde(rename = "portrait_16_9", alias = "portrait")]
    Portrait16x9,
    #[serde(rename = "landscape_4_3")]
    Landscape4x3,
    #[serde(rename = "landscape_16_9", alias = "landscape")]
    Landscape16x9,
}

impl ImageSize {
    pub const ALL: [ImageSize; 6] = [
        ImageSize::SquareHd,
        ImageSize::Square,
        ImageSize::Portrait4x3,
        ImageSize::Portrait16x9,
        ImageSize::Landscape4x3,
        ImageSize::Landscape16x9,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::SquareHd => "square_hd",
            ImageSize::Square => "square",
            ImageSize::Portrait4x3 => "portrait_4_3",
            ImageSize::Portrait16x9 => "portrait_16_9",
            ImageSize::Landscape4x3 => "landscape_4_3",
            ImageSize::Landscape16x9 => "landscape_16_9",
        }
    }

    /// Ratio string for endpoints that take `aspect_ratio` instead of a preset.
    pub fn aspect_ratio(self) -> &'static str {
        match self {
            ImageSize::SquareHd | ImageSize::Square => "1:1",
            ImageSize::Portrait4x3 => "3:4",
            ImageSize::Portrait16x9 => "9:16",
            ImageSize::Landscape4x3 => "4:3",
            ImageSize::Landscape16x9 => "16:9",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FalLora {
    pub path: String,
    pub scale: f32,
}

/// Input shared by the text-to-image, image-to-video and LoRA inference endpoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FalGenerationInput {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_images: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loras: Vec<FalLora>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FalImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FalFile {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FalGenerationOutput {
    #[serde(default)]
    pub images: Vec<FalImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<FalFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_nsfw_concepts: Option<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn image_size_accepts_short_aliases() {
        let portrait: ImageSize = serde_json::from_str(r#""portrait""#).expect("parse alias");
        let landscape: ImageSize = serde_json::from_str(r#""landscape""#).expect("parse alias");
        assert_eq!(portrait, ImageSize::Portrait16x9);
        assert_eq!(landscape, ImageSize::Landscape16x9);
        assert_eq!(
            serde_json::to_value(portrait).expect("serialize"),
            json!("portrait_16_9")
        );
    }

    #[test]
    fn as_str_matches_serialized_form() {
        for size in ImageSize::ALL {
            assert_eq!(
                serde_json::to_value(size).expect("serialize"),
                json!(size.as_str())
            );
        }
    }

    #[test]
    fn generation_input_omits_unset_fields() {
        let input = FalGenerationInput {
            prompt: "a cat".to_string(),
            aspect_ratio: Some(ImageSize::Portrait4x3.aspect_ratio().to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&input).expect("serialize"),
            json!({"prompt": "a cat", "aspect_ratio": "3:4"})
        );
    }
}
