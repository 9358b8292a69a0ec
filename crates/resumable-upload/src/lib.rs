//! HTTP Resumable Upload ([IETF draft](https://datatracker.ietf.org/doc/draft-ietf-httpbis-resumable-upload/))
//! support for the Salvo web framework.
//!
//! The protocol the draft specifies was itself drafted against an NIO-style
//! channel pipeline; this crate keeps that shape rather than flattening it
//! into a single request handler. [`ResumableUploadHandler`] is the one
//! `salvo_core::Handler` bound into the routing tree — it classifies each
//! physical request ([`codec`]) and looks up or creates the matching
//! [`session::UploadSession`] ([`registry`]), which drives the application's
//! own [`channel::ChannelHandler`] pipeline across every resumption attempt
//! of one logical upload.
//!
//! # Example
//!
//! ```ignore
//! use salvo_core::prelude::*;
//! use salvo_resumable_upload::{ChannelHandler, ChannelContext, RequestHead, ResumableUpload};
//!
//! struct EchoUpload;
//! impl ChannelHandler for EchoUpload {}
//!
//! let uploads = ResumableUpload::new("https://example.com")
//!     .path_prefix("/uploads")
//!     .with_pipeline(|| Box::new(EchoUpload));
//!
//! let router = Router::new().push(uploads.into_router());
//! ```

use std::sync::Arc;

use salvo_core::{handler, Depot, Router};

pub use adapter::OutboundPart;
pub use channel::{ChannelContext, ChannelHandler, RequestHead};
pub use codec::InteropVersion;
pub use error::{ProtocolError, ResumableUploadError, ResumableUploadResult};
pub use handler::ResumableUploadHandler;
pub use options::ResumableUploadOptions;
pub use registry::UploadRegistry;

mod adapter;
mod channel;
mod codec;
mod error;
mod handler;
mod options;
mod registry;
mod session;
mod sfv;

/// Builds the application's [`ChannelHandler`] for one upload. Called once
/// per logical upload, the first time its creation request is classified.
pub type ChannelHandlerFactory = Arc<dyn Fn() -> Box<dyn ChannelHandler> + Send + Sync>;

#[derive(Clone)]
struct ResumableUploadStateHoop {
    registry: UploadRegistry,
    factory: ChannelHandlerFactory,
}

#[handler]
impl ResumableUploadStateHoop {
    async fn handle(&self, depot: &mut Depot) {
        depot.inject(self.registry.clone());
        depot.inject(self.factory.clone());
    }
}

/// The facade applications configure and turn into a [`Router`].
///
/// Mirrors the builder style of Salvo's own middleware crates: a plain
/// struct with chained `self -> Self` setters, finished off with
/// [`ResumableUpload::into_router`].
#[derive(Clone)]
pub struct ResumableUpload {
    options: ResumableUploadOptions,
    factory: Option<ChannelHandlerFactory>,
}

impl ResumableUpload {
    /// Creates a facade for uploads served from `origin` (e.g.
    /// `https://example.com`), used to build absolute `Location` URLs.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            options: ResumableUploadOptions::new(origin),
            factory: None,
        }
    }

    /// Overrides the path prefix under which resumption paths are minted.
    /// Defaults to `/resumable_upload/`.
    #[must_use]
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options = self.options.path_prefix(prefix);
        self
    }

    /// Overrides how long a detached session waits for resumption before
    /// it is torn down. Defaults to one hour.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.options = self.options.idle_timeout(timeout);
        self
    }

    /// Sets the factory used to build the application's [`ChannelHandler`]
    /// pipeline for each new upload. Required before [`Self::into_router`].
    #[must_use]
    pub fn with_pipeline<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ChannelHandler> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Builds the router: a hoop that injects the registry and pipeline
    /// factory into the [`Depot`], in front of the upload handler bound at
    /// both the creation path (the prefix itself — where a `Creation`
    /// request, classified by [`crate::codec::classify`] on a
    /// *non-resumption* path, arrives) and the resumption subtree under it
    /// (`<prefix>/<token>`, for `HEAD`/`PATCH`/`DELETE`/`OPTIONS`).
    ///
    /// # Panics
    ///
    /// Panics if [`Self::with_pipeline`] was never called.
    #[must_use]
    pub fn into_router(self) -> Router {
        let factory = self
            .factory
            .expect("ResumableUpload::with_pipeline must be called before into_router");
        let registry = UploadRegistry::new(self.options.clone());
        let base_path = self.options.prefix().trim_matches('/').to_owned();

        Router::new()
            .hoop(ResumableUploadStateHoop { registry, factory })
            .push(Router::with_path(&base_path).goal(ResumableUploadHandler))
            .push(Router::with_path(format!("{base_path}/{{**rest}}")).goal(ResumableUploadHandler))
    }
}
