use serde::Serialize;

use super::capabilities::{ModelCapabilities, SizeControl};

/// A built-in catalog entry. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticModel {
    /// URL-friendly id, also the `model` field of generation requests.
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Endpoint id on the fal queue, e.g. `fal-ai/flux/dev`.
    pub provider_model_id: &'static str,
    pub image: &'static str,
    pub capabilities: ModelCapabilities,
}

pub static STATIC_MODELS: &[StaticModel] = &[
    StaticModel {
        id: "flux-dev",
        name: "Flux Dev",
        description: "Experimental image generation model.",
        provider_model_id: "fal-ai/flux/dev",
        image: "/images/models/flux-dev.jpg",
        capabilities: ModelCapabilities::text_to_image(),
    },
    StaticModel {
        id: "stable-diffusion-v35-large",
        name: "Stable Diffusion v3.5 Large",
        description: "Advanced Stable Diffusion generative model.",
        provider_model_id: "fal-ai/stable-diffusion-v35-large",
        image: "https://fal.media/files/zebra/j7weO6D0P1Yhmg-wer12s.jpeg",
        capabilities: ModelCapabilities::text_to_image(),
    },
    StaticModel {
        id: "flux-pro",
        name: "Flux Pro",
        description: "Advanced model.",
        provider_model_id: "fal-ai/flux-pro/v1.1",
        image: "/images/models/flux-pro.jpg",
        capabilities: ModelCapabilities::text_to_image(),
    },
    StaticModel {
        id: "flux-schnell",
        name: "Flux Schnell",
        description: "Fast image generation model.",
        provider_model_id: "fal-ai/flux/schnell",
        image: "https://fal.media/files/elephant/uhXgpZkrztPKpHf6MOYVw_f780fab9d0104151a9e5ad877757b514.jpg",
        capabilities: ModelCapabilities::text_to_image(),
    },
    StaticModel {
        id: "runway-gen3-turbo",
        name: "Runway Gen3 Turbo",
        description: "Turns an image into a short video.",
        provider_model_id: "fal-ai/runway-gen3/turbo/image-to-video",
        image: "/images/models/runway-gen3-turbo.jpg",
        capabilities: ModelCapabilities::image_to_video(),
    },
    StaticModel {
        id: "flux-pro-ultra",
        name: "Flux Pro Ultra",
        description: "Highest quality generative model.",
        provider_model_id: "fal-ai/flux-pro/v1.1-ultra",
        image: "/images/models/flux-pro-ultra.jpg",
        capabilities: ModelCapabilities::text_to_image()
            .with_image_input()
            .with_size_control(SizeControl::AspectRatio),
    },
];

pub fn find_static(id: &str) -> Option<&'static StaticModel> {
    STATIC_MODELS.iter().find(|model| model.id == id)
}

pub fn is_static_model_id(id: &str) -> bool {
    find_static(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OutputKind;
    use std::collections::HashSet;

    #[test]
    fn static_ids_are_unique() {
        let ids: HashSet<_> = STATIC_MODELS.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), STATIC_MODELS.len());
    }

    #[test]
    fn runway_requires_an_input_frame() {
        let runway = find_static("runway-gen3-turbo").expect("runway entry");
        assert!(runway.capabilities.requires_image_input);
        assert_eq!(runway.capabilities.output, OutputKind::Video);
        assert_eq!(runway.capabilities.size_control, SizeControl::Fixed);
    }

    #[test]
    fn ultra_uses_aspect_ratio() {
        let ultra = find_static("flux-pro-ultra").expect("ultra entry");
        assert_eq!(ultra.capabilities.size_control, SizeControl::AspectRatio);
        assert!(ultra.capabilities.supports_image_input);
        assert!(!ultra.capabilities.requires_image_input);
    }

    #[test]
    fn unknown_ids_are_not_static() {
        assert!(is_static_model_id("flux-dev"));
        assert!(!is_static_model_id("my-cat"));
        assert!(!is_static_model_id("Flux-Dev"));
    }
}
