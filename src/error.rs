use thiserror::Error;

/// Errors surfaced by the ingestion pipeline.
///
/// Every variant is terminal for the invocation that produced it; the
/// pipeline never retries. Cleanup failures are not represented here —
/// artifact deletion is best-effort and at most logged.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The named field was absent from the inbound request. Nothing was
    /// written to disk.
    #[error("missing upload field '{0}'")]
    FieldMissing(String),

    /// I/O failure while writing the payload to the content root.
    #[error("failed to persist upload: {0}")]
    Persist(String),

    /// The content policy rejected the payload. Any partially written
    /// artifact has already been deleted best-effort.
    #[error("upload rejected: {0}")]
    InvalidUpload(String),

    /// The in-place image transform failed. The persisted artifact is left
    /// on disk uncorrected; the caller must treat it as invalid.
    #[error("image transform failed: {0}")]
    Transform(String),

    /// The route string resolves outside the content root.
    #[error("route '{0}' escapes the content root")]
    InvalidRoute(String),

    /// The merged option tree did not deserialize into valid options.
    #[error("invalid upload options: {0}")]
    Options(#[from] serde_json::Error),

    /// The content root directory could not be created or accessed.
    #[error("content root unavailable: {0}")]
    ContentRoot(String),
}
