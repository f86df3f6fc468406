use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::IngestError;

/// Base directory all artifacts live under.
///
/// Route strings are resolved relative to the base; anything that would
/// escape it is rejected before touching the filesystem.
#[derive(Debug, Clone)]
pub struct ContentRoot {
    base: PathBuf,
}

impl ContentRoot {
    /// Open (creating if needed) the content root at `base`.
    pub async fn new(base: impl Into<PathBuf>) -> Result<Self, IngestError> {
        let base = base.into();
        fs::create_dir_all(&base).await.map_err(|e| {
            IngestError::ContentRoot(format!("failed to create {}: {}", base.display(), e))
        })?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a route string to a path under the base.
    ///
    /// A leading `/` is trimmed (routes are externally addressable paths);
    /// parent-directory components and empty routes are rejected.
    pub fn resolve(&self, route: &str) -> Result<PathBuf, IngestError> {
        let relative = route.trim_start_matches('/');
        if relative.is_empty() || route.contains("..") || relative.contains('\\') {
            return Err(IngestError::InvalidRoute(route.to_string()));
        }
        Ok(self.base.join(relative))
    }

    /// Remove the artifact at `route`, best-effort. A missing file is not an
    /// error; every other failure is swallowed and logged, never surfaced.
    pub async fn remove(&self, route: &str) {
        let path = match self.resolve(route) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(route = %route, error = %e, "refusing to remove artifact");
                return;
            }
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "artifact removed");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove artifact");
            }
        }
    }
}
