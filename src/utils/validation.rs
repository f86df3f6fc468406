use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::utils::naming;

/// Caller-supplied acceptance check, invoked with the persisted file and the
/// media type declared at upload time. Errors propagate to the caller as
/// ingestion failures.
pub type UploadPredicate = Arc<dyn Fn(&Path, &str) -> Result<bool> + Send + Sync>;

/// Extension/media-type allow-list pair.
///
/// A payload is accepted only when its extension AND its media type are both
/// listed. An empty set on either side rejects everything: an accidentally
/// unconfigured policy must fail closed, not open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowList {
    // Empty sides are skipped during serialization so a partial override
    // merges field-wise instead of clobbering the other side's entries.
    #[serde(skip_serializing_if = "HashSet::is_empty")]
    pub extensions: HashSet<String>,
    #[serde(skip_serializing_if = "HashSet::is_empty")]
    pub media_types: HashSet<String>,
    /// When set, the media type checked against `media_types` is detected
    /// from the persisted file's magic bytes instead of taken from the
    /// client's declaration, falling back to the declared value for formats
    /// without a recognizable signature.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sniff_media_type: bool,
}

impl AllowList {
    /// Build an allow-list from extension and media-type iterables,
    /// normalizing entries (lowercase, no leading dot).
    pub fn new<E, M>(extensions: E, media_types: M) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            media_types: media_types
                .into_iter()
                .map(|m| m.as_ref().to_ascii_lowercase())
                .collect(),
            sniff_media_type: false,
        }
    }

    fn permits(&self, path: &Path, declared_media_type: &str) -> bool {
        if self.extensions.is_empty() || self.media_types.is_empty() {
            return false;
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let extension = naming::file_extension(file_name);
        if !self
            .extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(extension))
        {
            return false;
        }

        let candidate = if self.sniff_media_type {
            sniffed_media_type(path).unwrap_or_else(|| declared_media_type.to_string())
        } else {
            declared_media_type.to_string()
        };
        let candidate = essence(&candidate);
        self.media_types
            .iter()
            .any(|allowed| essence(allowed) == candidate)
    }
}

/// The rule set deciding whether a persisted payload is acceptable.
pub enum ValidationPolicy {
    AllowList(AllowList),
    Predicate(UploadPredicate),
}

impl fmt::Debug for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationPolicy::AllowList(list) => f.debug_tuple("AllowList").field(list).finish(),
            ValidationPolicy::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Decide whether the persisted file at `path` is acceptable.
///
/// An absent policy is an explicit opt-out and accepts anything. Predicate
/// results (and errors) pass through unchanged; allow-lists are pure
/// membership checks over the file's extension and the media type.
pub fn is_valid(
    policy: Option<&ValidationPolicy>,
    path: &Path,
    declared_media_type: &str,
) -> Result<bool> {
    match policy {
        None => Ok(true),
        Some(ValidationPolicy::Predicate(check)) => check(path, declared_media_type),
        Some(ValidationPolicy::AllowList(list)) => Ok(list.permits(path, declared_media_type)),
    }
}

/// Media type stripped to its essence: no parameters, lowercase.
fn essence(media_type: &str) -> String {
    match media_type.parse::<Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
    }
}

fn sniffed_media_type(path: &Path) -> Option<String> {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => Some(kind.mime_type().to_string()),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "content sniff failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pdf_list() -> ValidationPolicy {
        ValidationPolicy::AllowList(AllowList::new(["pdf"], ["application/pdf"]))
    }

    #[test]
    fn test_absent_policy_accepts_anything() {
        let ok = is_valid(None, Path::new("anything.exe"), "application/x-msdownload").unwrap();
        assert!(ok);
    }

    #[test]
    fn test_allow_list_requires_both_memberships() {
        let policy = pdf_list();
        assert!(is_valid(Some(&policy), Path::new("a.pdf"), "application/pdf").unwrap());
        assert!(!is_valid(Some(&policy), Path::new("a.pdf"), "application/octet-stream").unwrap());
        assert!(!is_valid(Some(&policy), Path::new("a.txt"), "application/pdf").unwrap());
        assert!(!is_valid(Some(&policy), Path::new("noext"), "application/pdf").unwrap());
    }

    #[test]
    fn test_empty_allow_list_fails_closed() {
        let policy = ValidationPolicy::AllowList(AllowList::default());
        assert!(!is_valid(Some(&policy), Path::new("a.pdf"), "application/pdf").unwrap());

        let no_media = ValidationPolicy::AllowList(AllowList {
            extensions: ["pdf".to_string()].into_iter().collect(),
            ..AllowList::default()
        });
        assert!(!is_valid(Some(&no_media), Path::new("a.pdf"), "application/pdf").unwrap());
    }

    #[test]
    fn test_extension_matching_is_case_insensitive() {
        let policy = pdf_list();
        assert!(is_valid(Some(&policy), Path::new("REPORT.PDF"), "application/pdf").unwrap());
    }

    #[test]
    fn test_media_type_parameters_are_ignored() {
        let policy = ValidationPolicy::AllowList(AllowList::new(["txt"], ["text/plain"]));
        assert!(is_valid(Some(&policy), Path::new("a.txt"), "text/plain; charset=utf-8").unwrap());
    }

    #[test]
    fn test_predicate_result_passes_through() {
        let accept: UploadPredicate = Arc::new(|_, _| Ok(true));
        let png_only: UploadPredicate = Arc::new(|_, media_type| Ok(media_type == "image/png"));

        let policy = ValidationPolicy::Predicate(accept);
        assert!(is_valid(Some(&policy), Path::new("a.exe"), "whatever").unwrap());

        let policy = ValidationPolicy::Predicate(png_only);
        assert!(is_valid(Some(&policy), Path::new("a.png"), "image/png").unwrap());
        assert!(!is_valid(Some(&policy), Path::new("a.png"), "image/gif").unwrap());
    }

    #[test]
    fn test_predicate_errors_propagate() {
        let failing: UploadPredicate = Arc::new(|_, _| anyhow::bail!("scanner offline"));
        let policy = ValidationPolicy::Predicate(failing);
        let err = is_valid(Some(&policy), Path::new("a.png"), "image/png").unwrap_err();
        assert!(err.to_string().contains("scanner offline"));
    }

    #[test]
    fn test_sniffed_media_type_overrides_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        let mut file = std::fs::File::create(&path).unwrap();
        // PNG signature
        file.write_all(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
            .unwrap();

        let mut list = AllowList::new(["png"], ["image/png"]);
        list.sniff_media_type = true;
        let policy = ValidationPolicy::AllowList(list);

        // The client lies about the media type; the magic bytes win.
        assert!(is_valid(Some(&policy), &path, "application/octet-stream").unwrap());
    }
}
