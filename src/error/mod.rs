mod cinkbert;

pub use cinkbert::{ApiErrorBody, ApiErrorObject, CinkbertError};
