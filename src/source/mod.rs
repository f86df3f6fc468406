pub mod memory;
pub mod multipart;

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::IngestError;

pub use memory::{MemoryField, MemorySource};
pub use multipart::MultipartSource;

/// Capability set an inbound request must expose to the ingestion pipeline.
///
/// The coordinator depends only on this trait, never on a transport's request
/// type; adapters bind it to a concrete transport (HTTP multipart, in-memory
/// payloads, whatever else fronts the library). Each operation fails with
/// [`IngestError::FieldMissing`] when the named field is absent.
#[async_trait]
pub trait RequestSource: Send + Sync {
    /// Filename declared by the client for the named field.
    async fn declared_filename(&self, field: &str) -> Result<String, IngestError>;

    /// Media type declared by the client for the named field.
    async fn declared_media_type(&self, field: &str) -> Result<String, IngestError>;

    /// Write the field's payload to `dest`, creating parent directories.
    /// Either the whole payload lands on disk or the operation fails.
    async fn persist(&self, field: &str, dest: &Path) -> Result<(), IngestError>;
}

/// Shared write path for adapters holding buffered payload bytes.
pub(crate) async fn write_payload(dest: &Path, payload: &[u8]) -> Result<(), IngestError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            IngestError::Persist(format!("failed to create {}: {}", parent.display(), e))
        })?;
    }

    let mut file = fs::File::create(dest).await.map_err(|e| {
        IngestError::Persist(format!("failed to create {}: {}", dest.display(), e))
    })?;
    file.write_all(payload).await.map_err(|e| {
        IngestError::Persist(format!("failed to write {}: {}", dest.display(), e))
    })?;
    file.sync_all().await.map_err(|e| {
        IngestError::Persist(format!("failed to sync {}: {}", dest.display(), e))
    })?;

    tracing::debug!(
        path = %dest.display(),
        size_bytes = payload.len(),
        "payload persisted"
    );

    Ok(())
}
