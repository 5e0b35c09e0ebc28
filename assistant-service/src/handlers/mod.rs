pub mod chat;
pub mod health;
pub mod metrics;
pub mod triage;

use crate::services::RegistryError;
use service_core::error::AppError;

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => AppError::NotFound(anyhow::Error::new(err)),
            RegistryError::Full(_) => AppError::TooManyRequests(err.to_string(), None),
        }
    }
}
