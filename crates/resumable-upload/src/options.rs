//! Registry-wide configuration.

use std::time::Duration;

/// Configuration shared by every [`crate::registry::UploadRegistry`] created
/// from a [`crate::ResumableUpload`] facade.
#[derive(Debug, Clone)]
pub struct ResumableUploadOptions {
    pub(crate) origin: String,
    pub(crate) path_prefix: String,
    pub(crate) idle_timeout: Duration,
}

impl ResumableUploadOptions {
    /// Creates options with the given origin (e.g. `https://example.com`)
    /// and the default path prefix / idle timeout.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            path_prefix: "/resumable_upload/".to_owned(),
            idle_timeout: Duration::from_secs(60 * 60),
        }
    }

    /// Overrides the path prefix under which resumption paths are minted.
    #[must_use]
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.path_prefix = prefix;
        self
    }

    /// Overrides how long a detached session waits for resumption before it
    /// is torn down with [`crate::error::ResumableUploadError::TimeoutWaitingForResumption`].
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// The configured resumption-path prefix (always ends in `/`).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.path_prefix
    }

    #[must_use]
    pub(crate) fn resume_path(&self, token: &str) -> String {
        format!("{}{token}", self.path_prefix)
    }

    #[must_use]
    pub(crate) fn location_url(&self, resume_path: &str) -> String {
        format!("{}{resume_path}", self.origin)
    }
}
