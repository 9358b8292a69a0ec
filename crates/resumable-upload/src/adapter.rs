//! The transport-agnostic side of an "Upload Adapter": the surface an
//! [`crate::session::UploadSession`] uses to talk back to whichever physical
//! HTTP request currently drives it.
//!
//! The resumable upload draft requires sending a `104` informational
//! response before the final response on creation, something the generic
//! request/response model of most server frameworks (including the
//! `salvo_core::Response` this crate otherwise builds on) does not expose as
//! a first-class operation mid-handler. Rather than coupling the session and
//! virtual channel directly to `salvo_core::Response`, they are written
//! against this trait; [`crate::handler`] supplies the one concrete
//! implementation that bridges it to a live Salvo request.

use bytes::Bytes;
use salvo_core::async_trait;
use salvo_core::http::{HeaderMap, StatusCode};

use crate::error::ResumableUploadResult;

/// One part of an outbound response, as produced by a session or the virtual
/// channel it drives.
#[derive(Debug)]
pub enum OutboundPart {
    /// A `1xx` informational response, sent before the final response.
    Informational { status: StatusCode, headers: HeaderMap },
    /// The final response head.
    Head { status: StatusCode, headers: HeaderMap },
    /// A chunk of the response body.
    Body(Bytes),
    /// End of the response body.
    End,
}

/// The physical channel backing one attached adapter.
///
/// Implementations are expected to be cheap to clone and safe to hold across
/// `.await` points; [`crate::session::UploadSession`] keeps at most one of
/// these alive at a time, swapping it out on attach/detach.
#[async_trait]
pub trait PhysicalChannel: Send + Sync + 'static {
    /// Whether the underlying transport can currently accept more writes.
    fn is_writable(&self) -> bool;

    /// Delivers one outbound part to the physical request.
    async fn write(&self, part: OutboundPart) -> ResumableUploadResult<()>;

    /// Requests that the physical request be closed immediately.
    async fn close(&self);

    /// Resumes reading from this adapter's physical channel. Called on
    /// attach when the session recorded a pending read demand while
    /// detached (see `UploadSession::attach`). Adapters that always read
    /// eagerly (the default Salvo adapter) can leave this as a no-op.
    fn request_read(&self) {}
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    pub(crate) struct RecordingChannel {
        pub(crate) parts: Arc<std::sync::Mutex<Vec<String>>>,
        pub(crate) writable: Arc<AtomicBool>,
        pub(crate) closed: Arc<AtomicBool>,
    }

    impl RecordingChannel {
        pub(crate) fn new() -> Self {
            Self {
                parts: Arc::new(std::sync::Mutex::new(Vec::new())),
                writable: Arc::new(AtomicBool::new(true)),
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl PhysicalChannel for RecordingChannel {
        fn is_writable(&self) -> bool {
            self.writable.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
        }

        async fn write(&self, part: OutboundPart) -> ResumableUploadResult<()> {
            let label = match part {
                OutboundPart::Informational { status, .. } => format!("informational:{status}"),
                OutboundPart::Head { status, .. } => format!("head:{status}"),
                OutboundPart::Body(bytes) => format!("body:{}", bytes.len()),
                OutboundPart::End => "end".to_owned(),
            };
            self.parts.lock().unwrap().push(label);
            Ok(())
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn recording_channel_tracks_parts() {
        let channel = RecordingChannel::new();
        channel
            .write(OutboundPart::Head {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
            })
            .await
            .unwrap();
        channel.write(OutboundPart::Body(Bytes::from("hi"))).await.unwrap();
        channel.write(OutboundPart::End).await.unwrap();
        assert_eq!(
            *channel.parts.lock().unwrap(),
            vec!["head:200 OK".to_owned(), "body:2".to_owned(), "end".to_owned()]
        );
        assert!(channel.is_writable());
        channel.close().await;
        assert!(!channel.is_writable());
    }
}
