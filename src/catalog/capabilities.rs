use serde::Serialize;

/// How a model accepts output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeControl {
    /// fal `image_size` presets (`square_hd`, `landscape_16_9`, ...).
    ImageSize,
    /// A ratio string such as `16:9`.
    AspectRatio,
    /// The model picks its own dimensions.
    #[serde(rename = "none")]
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Image,
    Video,
}

/// What a catalog entry accepts and produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelCapabilities {
    pub supports_image_input: bool,
    pub requires_image_input: bool,
    pub size_control: SizeControl,
    pub output: OutputKind,
}

impl ModelCapabilities {
    /// Plain text-to-image with preset sizes.
    pub const fn text_to_image() -> Self {
        Self {
            supports_image_input: false,
            requires_image_input: false,
            size_control: SizeControl::ImageSize,
            output: OutputKind::Image,
        }
    }

    pub const fn with_image_input(mut self) -> Self {
        self.supports_image_input = true;
        self
    }

    pub const fn with_size_control(mut self, size_control: SizeControl) -> Self {
        self.size_control = size_control;
        self
    }

    /// Image-to-video: an input frame is mandatory and sizing is fixed.
    pub const fn image_to_video() -> Self {
        Self {
            supports_image_input: true,
            requires_image_input: true,
            size_control: SizeControl::Fixed,
            output: OutputKind::Video,
        }
    }
}
