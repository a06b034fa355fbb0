use crate::fetch::error::FetchError;
use crate::providers::error::NormalizeError;
use crate::store::error::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CuacaError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to read locations file '{0}'")]
    RegistryRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse locations file '{0}'")]
    RegistryParse(PathBuf, #[source] serde_json::Error),
}
