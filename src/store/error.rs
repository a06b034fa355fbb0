use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create store directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to create staging file in '{0}'")]
    StagingCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed to write staging file for '{0}'")]
    StagingWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to move staging file into place at '{0}'")]
    Rename(PathBuf, #[source] std::io::Error),

    #[error("Failed to read stored record '{0}'")]
    RecordRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode stored record '{0}'")]
    RecordDecode(PathBuf, #[source] serde_json::Error),

    #[error("Stored record '{0}' is not a JSON object")]
    RecordShape(PathBuf),

    #[error("Failed to serialize record")]
    Serialize(#[source] serde_json::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
