use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::utils::merge::merge;
use crate::utils::validation::{AllowList, UploadPredicate, ValidationPolicy};

/// Form field holding the uploaded file when none is configured.
pub const DEFAULT_FIELDNAME: &str = "file";

/// Target dimensions for the optional in-place resize step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

/// Per-upload configuration tree.
///
/// Every field is optional so a caller-supplied value is a genuine partial
/// override: resolution serializes defaults and overrides, deep-merges the
/// trees (caller wins on collision, recursively for nested maps), and
/// deserializes the result. The predicate cannot ride through serialization
/// and is carried by reference, override winning.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    /// Name of the form field holding the file; `"file"` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fieldname: Option<String>,

    /// Extension/media-type allow-list. Ignored when `predicate` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<AllowList>,

    /// Resize the persisted artifact in place after validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<Resize>,

    /// Reject payloads larger than this many bytes after they are written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,

    /// Caller-supplied acceptance check; takes precedence over `validation`.
    #[serde(skip)]
    pub predicate: Option<UploadPredicate>,
}

impl UploadOptions {
    pub fn fieldname(&self) -> &str {
        self.fieldname.as_deref().unwrap_or(DEFAULT_FIELDNAME)
    }

    /// Resolve `overrides` over `self`, returning a fresh options value.
    /// Neither input is mutated; repeated calls with the same inputs yield
    /// identical results.
    pub fn overlaid(&self, overrides: &UploadOptions) -> Result<UploadOptions, IngestError> {
        let base = serde_json::to_value(self)?;
        let overlay = serde_json::to_value(overrides)?;
        let mut resolved: UploadOptions = serde_json::from_value(merge(&base, &overlay))?;
        resolved.predicate = overrides
            .predicate
            .clone()
            .or_else(|| self.predicate.clone());
        Ok(resolved)
    }

    /// The effective validation policy: predicate when present, otherwise the
    /// allow-list, otherwise none (accept anything).
    pub fn policy(&self) -> Option<ValidationPolicy> {
        if let Some(predicate) = &self.predicate {
            Some(ValidationPolicy::Predicate(predicate.clone()))
        } else {
            self.validation.clone().map(ValidationPolicy::AllowList)
        }
    }
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("fieldname", &self.fieldname)
            .field("validation", &self.validation)
            .field("resize", &self.resize)
            .field("max_bytes", &self.max_bytes)
            .field("predicate", &self.predicate.as_ref().map(|_| ".."))
            .finish()
    }
}
