use serde::{Deserialize, Serialize};

use super::FalFile;

/// Input of the `flux-lora-fast-training` endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FalLoraTrainingInput {
    pub images_data_url: String,
    pub trigger_word: String,
    pub is_style: bool,
    pub create_masks: bool,
    pub iter_multiplier: f32,
    pub steps: u32,
    pub data_archive_format: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FalLoraTrainingOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffusers_lora_file: Option<FalFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<FalFile>,
    /// Older revisions of the endpoint returned the weights URL under this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_path: Option<String>,
}

impl FalLoraTrainingOutput {
    pub fn weights_url(&self) -> Option<&str> {
        self.diffusers_lora_file
            .as_ref()
            .map(|file| file.url.as_str())
            .or(self.lora_path.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_url_prefers_diffusers_file() {
        let raw = r#"{"diffusers_lora_file":{"url":"https://fal.media/a.safetensors"},"lora_path":"https://old"}"#;
        let parsed: FalLoraTrainingOutput = serde_json::from_str(raw).expect("parse output");
        assert_eq!(parsed.weights_url(), Some("https://fal.media/a.safetensors"));
    }

    #[test]
    fn weights_url_falls_back_to_lora_path() {
        let parsed: FalLoraTrainingOutput =
            serde_json::from_str(r#"{"lora_path":"https://old"}"#).expect("parse output");
        assert_eq!(parsed.weights_url(), Some("https://old"));

        let empty = FalLoraTrainingOutput::default();
        assert_eq!(empty.weights_url(), None);
    }
}
