//! The upload registry: process-wide `token -> session` mapping.
//!
//! Grounded directly on the teacher's `MemoryLocker`
//! (`crates/tus/src/lockers/memory_locker.rs`): a `Clone`-able struct
//! wrapping an `Arc<Mutex<HashMap<...>>>`, used for its async-safe
//! critical-section pattern. Unlike `MemoryLocker`, which hands out lock
//! guards, `find_upload` hands out [`SessionHandle`]s — cheap, `Send + Sync`
//! references safe to carry across tasks, never the session state itself.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use rand::RngCore;
use tokio::sync::Mutex;

use crate::options::ResumableUploadOptions;
use crate::session::SessionHandle;

const TOKEN_BYTES: usize = 24;

#[derive(Clone)]
pub struct UploadRegistry {
    options: ResumableUploadOptions,
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl UploadRegistry {
    #[must_use]
    pub fn new(options: ResumableUploadOptions) -> Self {
        Self {
            options,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn mint_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Mints a unique token, registers `handle` under it, and returns the
    /// resumption path (`<prefix><token>`).
    pub async fn start_upload(&self, handle: SessionHandle) -> String {
        let mut sessions = self.sessions.lock().await;
        let token = loop {
            let candidate = Self::mint_token();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        sessions.insert(token.clone(), handle);
        self.options.resume_path(&token)
    }

    /// Removes the session for `resume_path`, if any. Idempotent.
    pub async fn stop_upload(&self, resume_path: Option<&str>) {
        let Some(resume_path) = resume_path else { return };
        let Some(token) = self.token_for_path(resume_path) else { return };
        self.sessions.lock().await.remove(token);
    }

    /// Looks up the session addressed by a full request path.
    pub async fn find_upload(&self, path: &str) -> Option<SessionHandle> {
        let token = self.token_for_path(path)?;
        self.sessions.lock().await.get(token).cloned()
    }

    /// Whether `path` falls under this registry's configured prefix.
    #[must_use]
    pub fn is_resumption(&self, path: &str) -> bool {
        path.starts_with(self.options.prefix())
    }

    #[must_use]
    pub fn options(&self) -> &ResumableUploadOptions {
        &self.options
    }

    fn token_for_path<'p>(&self, path: &'p str) -> Option<&'p str> {
        path.strip_prefix(self.options.prefix())
            .filter(|token| !token.is_empty() && !token.contains('/'))
    }
}
