use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IngestError;
use crate::source::{RequestSource, write_payload};

/// In-memory [`RequestSource`] for tests and non-HTTP callers.
#[derive(Default)]
pub struct MemorySource {
    fields: HashMap<String, MemoryField>,
}

/// One field of a [`MemorySource`].
#[derive(Clone)]
pub struct MemoryField {
    filename: Option<String>,
    media_type: Option<String>,
    payload: Bytes,
}

impl MemoryField {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            filename: None,
            media_type: None,
            payload: payload.into(),
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, field: MemoryField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    fn get(&self, name: &str) -> Result<&MemoryField, IngestError> {
        self.fields
            .get(name)
            .ok_or_else(|| IngestError::FieldMissing(name.to_string()))
    }
}

#[async_trait]
impl RequestSource for MemorySource {
    async fn declared_filename(&self, field: &str) -> Result<String, IngestError> {
        Ok(self.get(field)?.filename.clone().unwrap_or_default())
    }

    async fn declared_media_type(&self, field: &str) -> Result<String, IngestError> {
        Ok(self.get(field)?.media_type.clone().unwrap_or_default())
    }

    async fn persist(&self, field: &str, dest: &Path) -> Result<(), IngestError> {
        write_payload(dest, &self.get(field)?.payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_field() {
        let source = MemorySource::new();
        let err = source.declared_filename("file").await.unwrap_err();
        assert!(matches!(err, IngestError::FieldMissing(ref f) if f == "file"));
    }

    #[tokio::test]
    async fn test_declared_metadata_defaults_to_empty() {
        let source = MemorySource::new().field("file", MemoryField::new(&b"data"[..]));
        assert_eq!(source.declared_filename("file").await.unwrap(), "");
        assert_eq!(source.declared_media_type("file").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_persist_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/dir/payload.bin");
        let source = MemorySource::new().field(
            "file",
            MemoryField::new(&b"hello"[..]).filename("payload.bin"),
        );

        source.persist("file", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    }
}
