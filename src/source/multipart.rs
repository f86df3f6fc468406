use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use bytes::Bytes;

use crate::error::IngestError;
use crate::source::{RequestSource, write_payload};

/// [`RequestSource`] adapter over an axum multipart request.
///
/// Multipart fields can only be streamed once and in order, so the adapter
/// drains the whole form up front into buffered fields and serves the
/// capability set from the buffer. Handlers construct it with [`read`] and
/// hand it to the coordinator.
///
/// [`read`]: MultipartSource::read
pub struct MultipartSource {
    fields: HashMap<String, BufferedField>,
}

struct BufferedField {
    filename: Option<String>,
    media_type: Option<String>,
    payload: Bytes,
}

impl MultipartSource {
    /// Drain `multipart` into a buffered source. Unnamed fields are skipped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let filename = field.file_name().map(str::to_string);
            let media_type = field.content_type().map(str::to_string);
            let payload = field.bytes().await?;
            fields.insert(
                name,
                BufferedField {
                    filename,
                    media_type,
                    payload,
                },
            );
        }
        Ok(Self { fields })
    }

    fn field(&self, name: &str) -> Result<&BufferedField, IngestError> {
        self.fields
            .get(name)
            .ok_or_else(|| IngestError::FieldMissing(name.to_string()))
    }
}

#[async_trait]
impl RequestSource for MultipartSource {
    async fn declared_filename(&self, field: &str) -> Result<String, IngestError> {
        Ok(self.field(field)?.filename.clone().unwrap_or_default())
    }

    async fn declared_media_type(&self, field: &str) -> Result<String, IngestError> {
        Ok(self.field(field)?.media_type.clone().unwrap_or_default())
    }

    async fn persist(&self, field: &str, dest: &Path) -> Result<(), IngestError> {
        write_payload(dest, &self.field(field)?.payload).await
    }
}
