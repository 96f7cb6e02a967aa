use serde::{Deserialize, Serialize};

const MIB: usize = 1024 * 1024;

/// Input bounds enforced before any upstream call.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Largest accepted training upload (zip or sum of image parts), in bytes.
    /// TOML: `limits.max_upload_bytes`. Default: 50 MiB.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// TOML: `limits.min_training_images`. Default: `4`.
    #[serde(default = "default_min_training_images")]
    pub min_training_images: usize,

    /// TOML: `limits.max_training_images`. Default: `20`.
    #[serde(default = "default_max_training_images")]
    pub max_training_images: usize,

    /// Largest decoded reference image accepted as a `data:` URL, in bytes.
    /// TOML: `limits.max_reference_image_bytes`. Default: 10 MiB.
    #[serde(default = "default_max_reference_image_bytes")]
    pub max_reference_image_bytes: usize,

    /// Upper bound for `num_images` on a generation request.
    /// TOML: `limits.max_images_per_request`. Default: `4`.
    #[serde(default = "default_max_images_per_request")]
    pub max_images_per_request: u8,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            min_training_images: default_min_training_images(),
            max_training_images: default_max_training_images(),
            max_reference_image_bytes: default_max_reference_image_bytes(),
            max_images_per_request: default_max_images_per_request(),
        }
    }
}

impl LimitsConfig {
    /// Request body cap for the multipart training route.
    pub fn training_body_limit(&self) -> usize {
        self.max_upload_bytes + MIB
    }

    /// Request body cap for the JSON generation route; base64 inflates by 4/3.
    pub fn prediction_body_limit(&self) -> usize {
        self.max_reference_image_bytes * 2 + MIB
    }
}

fn default_max_upload_bytes() -> usize {
    50 * MIB
}

fn default_min_training_images() -> usize {
    4
}

fn default_max_training_images() -> usize {
    20
}

fn default_max_reference_image_bytes() -> usize {
    10 * MIB
}

fn default_max_images_per_request() -> u8 {
    4
}
