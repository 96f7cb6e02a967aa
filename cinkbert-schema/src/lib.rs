pub mod fal;
pub mod openai;
pub mod supabase;

pub use fal::{
    FalFile, FalGenerationInput, FalGenerationOutput, FalImage, FalLogEntry, FalLora,
    FalLoraTrainingInput, FalLoraTrainingOutput, FalQueueState, FalQueueStatus,
    FalQueueSubmission, FalUploadInitiateRequest, FalUploadInitiateResponse, ImageSize,
};
pub use openai::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenaiErrorBody};
pub use supabase::{
    PasswordGrantRequest, SignedUrlEntry, SignedUrlsRequest, StorageListRequest, StorageObject,
    StorageObjectMetadata, StorageSortBy, SupabaseErrorBody, SupabaseSession, SupabaseUser,
};
