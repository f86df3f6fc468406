use std::path::PathBuf;

use image::imageops::FilterType;
use serde::Serialize;

use crate::config::{Resize, UploadOptions};
use crate::error::IngestError;
use crate::services::storage::ContentRoot;
use crate::source::RequestSource;
use crate::utils::{naming, validation};

/// Stable reference to a successfully ingested artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingested {
    /// `route_prefix + generated_name + extension`, resolvable against the
    /// content root.
    pub link: String,
}

/// Coordinates one upload end to end: resolve options, derive a storage
/// name, persist through the request source, validate, optionally resize,
/// and hand back the link.
///
/// The service holds its defaults as an immutable value; every invocation
/// resolves caller overrides against them through the non-mutating deep
/// merge, so one service can serve concurrent ingestions safely.
pub struct IngestService {
    root: ContentRoot,
    defaults: UploadOptions,
}

impl IngestService {
    /// Service over `content_root` with empty defaults (field `"file"`, no
    /// validation policy).
    pub async fn new(content_root: impl Into<PathBuf>) -> Result<Self, IngestError> {
        Self::with_defaults(content_root, UploadOptions::default()).await
    }

    /// Service over `content_root` with the given default options.
    pub async fn with_defaults(
        content_root: impl Into<PathBuf>,
        defaults: UploadOptions,
    ) -> Result<Self, IngestError> {
        Ok(Self {
            root: ContentRoot::new(content_root).await?,
            defaults,
        })
    }

    pub fn content_root(&self) -> &ContentRoot {
        &self.root
    }

    /// Ingest one upload from `source`.
    ///
    /// The pipeline runs each step exactly once — there are no retries. A
    /// validation rejection deletes the just-written artifact best-effort
    /// before surfacing [`IngestError::InvalidUpload`]; a failed transform
    /// leaves the artifact on disk uncorrected.
    pub async fn ingest<S>(
        &self,
        source: &S,
        route_prefix: &str,
        overrides: Option<&UploadOptions>,
    ) -> Result<Ingested, IngestError>
    where
        S: RequestSource + ?Sized,
    {
        let options = match overrides {
            Some(overrides) => self.defaults.overlaid(overrides)?,
            None => self.defaults.clone(),
        };
        let field = options.fieldname();

        // Read the declaration before anything touches the filesystem, so a
        // missing field never leaves an artifact behind.
        let declared_name = source.declared_filename(field).await?;
        let declared_media_type = source.declared_media_type(field).await?;

        let extension = naming::file_extension(&declared_name);
        let name = naming::generate(extension);
        let link = format!("{route_prefix}{name}");
        let path = self.root.resolve(&link)?;

        source.persist(field, &path).await?;

        if let Some(max_bytes) = options.max_bytes {
            let size = tokio::fs::metadata(&path)
                .await
                .map_err(|e| {
                    IngestError::Persist(format!("failed to stat {}: {}", path.display(), e))
                })?
                .len();
            if size > max_bytes {
                self.root.remove(&link).await;
                tracing::warn!(link = %link, size_bytes = size, max_bytes, "upload over size cap");
                return Err(IngestError::InvalidUpload(format!(
                    "payload of {size} bytes exceeds the {max_bytes} byte cap"
                )));
            }
        }

        let policy = options.policy();
        match validation::is_valid(policy.as_ref(), &path, &declared_media_type) {
            Ok(true) => {}
            Ok(false) => {
                self.root.remove(&link).await;
                tracing::warn!(
                    link = %link,
                    declared_name = %declared_name,
                    declared_media_type = %declared_media_type,
                    "upload rejected by content policy"
                );
                return Err(IngestError::InvalidUpload(format!(
                    "content policy rejected '{declared_name}' ({declared_media_type})"
                )));
            }
            Err(e) => {
                // A failing check must not leave an unvalidated artifact
                // observable on disk.
                self.root.remove(&link).await;
                return Err(IngestError::InvalidUpload(format!(
                    "validation check failed: {e:#}"
                )));
            }
        }

        if let Some(resize) = options.resize {
            resize_in_place(&path, resize)?;
        }

        tracing::info!(link = %link, declared_name = %declared_name, "upload ingested");
        Ok(Ingested { link })
    }

    /// Delete the artifact at `route`. Idempotent from the caller's point of
    /// view: a missing file, a bad route, or an I/O failure is swallowed (and
    /// at most logged).
    pub async fn delete(&self, route: &str) {
        self.root.remove(route).await;
    }
}

/// Resize the persisted image to fit `target`, preserving aspect ratio, and
/// overwrite it in place. On failure the file is left as-is; the caller must
/// treat the artifact as invalid.
fn resize_in_place(path: &std::path::Path, target: Resize) -> Result<(), IngestError> {
    let img = image::open(path).map_err(|e| IngestError::Transform(e.to_string()))?;
    let resized = img.resize(target.width, target.height, FilterType::Triangle);
    resized
        .save(path)
        .map_err(|e| IngestError::Transform(e.to_string()))?;

    tracing::debug!(
        path = %path.display(),
        width = resized.width(),
        height = resized.height(),
        "artifact resized in place"
    );
    Ok(())
}
