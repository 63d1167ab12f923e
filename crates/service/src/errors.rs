use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("stored value `{value}` for `{key}` is not an integer counter")]
    CorruptState { key: String, value: String },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ServiceError {
    pub fn not_found(key: &str) -> Self { Self::NotFound(format!("no version stored for {}", key)) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::NotFound(_) => 1003,
            ServiceError::CorruptState { .. } => 1101,
            ServiceError::StoreUnavailable(_) => 1200,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
            StoreError::Corrupt { key, value } => ServiceError::CorruptState { key, value },
        }
    }
}
