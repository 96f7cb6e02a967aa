//! Wire types for the fal.ai queue, storage and model endpoints.

mod generation;
mod queue;
mod storage;
mod training;

pub use generation::{FalFile, FalGenerationInput, FalGenerationOutput, FalImage, FalLora, ImageSize};
pub use queue::{FalLogEntry, FalQueueState, FalQueueStatus, FalQueueSubmission};
pub use storage::{FalUploadInitiateRequest, FalUploadInitiateResponse};
pub use training::{FalLoraTrainingInput, FalLoraTrainingOutput};
