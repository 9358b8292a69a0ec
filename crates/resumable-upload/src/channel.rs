//! The virtual upload channel: a pipeline-facing, channel-like object whose
//! lifetime spans every resumption attempt for one upload.
//!
//! The application pipeline is modeled as a [`ChannelHandler`] — the same
//! register/active/read/read_complete/writability_changed/inactive/unregistered/
//! error_caught lifecycle the protocol this crate adapts was itself specified
//! against (an NIO-style channel pipeline), rather than as a second
//! `salvo_core::Handler`. The outer Salvo `Handler` is the *adapter*
//! (`crate::handler`); this is the inner, session-lifetime-scoped pipeline it
//! feeds.

use bytes::Bytes;
use salvo_core::http::{HeaderMap, Method};
use tokio::sync::mpsc;

use crate::adapter::OutboundPart;
use crate::error::ResumableUploadError;

/// The request head forwarded to the application pipeline once per session:
/// the stripped creation request, or the original request when this session
/// never carried protocol headers at all.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
}

/// A handler in the application's virtual-channel pipeline.
///
/// All methods have empty default bodies so a handler only needs to
/// implement the events it cares about, matching the ergonomics of a Netty
/// `ChannelInboundHandlerAdapter`.
#[allow(unused_variables)]
pub trait ChannelHandler: Send + 'static {
    /// The channel has been created and registered with its event loop.
    fn register(&mut self, ctx: &mut ChannelContext) {}
    /// The channel is now active and will start receiving request parts.
    fn active(&mut self, ctx: &mut ChannelContext) {}
    /// The (stripped) request head, forwarded exactly once per session.
    fn head(&mut self, ctx: &mut ChannelContext, head: RequestHead) {}
    /// A chunk of request body data has arrived.
    fn read(&mut self, ctx: &mut ChannelContext, data: Bytes) {}
    /// The current read pass has completed (not necessarily end-of-request).
    fn read_complete(&mut self, ctx: &mut ChannelContext) {}
    /// The full upload has been received (`Upload-Complete: ?1` reconciled
    /// against every byte of the body): a normal end-of-request, fired
    /// exactly once, before `inactive`/`unregistered`. The handler is
    /// expected to write its final response here.
    fn end_of_request(&mut self, ctx: &mut ChannelContext) {}
    /// The channel's writability changed; re-check [`ChannelContext::is_writable`].
    fn writability_changed(&mut self, ctx: &mut ChannelContext) {}
    /// The channel is no longer active.
    fn inactive(&mut self, ctx: &mut ChannelContext) {}
    /// The channel has been unregistered and will receive no further events.
    fn unregistered(&mut self, ctx: &mut ChannelContext) {}
    /// An error occurred; this is always followed by `inactive`.
    fn error_caught(&mut self, ctx: &mut ChannelContext, error: &ResumableUploadError) {}
}

/// One action requested of the virtual channel: either by a [`ChannelHandler`]
/// callback, or asynchronously by an [`EgressSender`] clone held by a task
/// that outlives any single callback (e.g. the Salvo pipeline bridge in
/// `crate::handler`, which only learns the application's real response well
/// after `head`/`read` return).
pub(crate) enum Egress {
    Write(OutboundPart),
    Flush,
    Read,
    Close,
}

/// A cheap, `Clone`-able, `Send + Sync` handle for pushing [`Egress`] actions
/// onto a session from outside a synchronous [`ChannelHandler`] callback.
#[derive(Clone)]
pub struct EgressSender(mpsc::UnboundedSender<Egress>);

impl EgressSender {
    pub fn write(&self, part: OutboundPart) {
        let _ = self.0.send(Egress::Write(part));
    }

    pub fn flush(&self) {
        let _ = self.0.send(Egress::Flush);
    }

    pub fn read(&self) {
        let _ = self.0.send(Egress::Read);
    }

    pub fn close(&self) {
        let _ = self.0.send(Egress::Close);
    }
}

/// The surface a [`ChannelHandler`] uses to talk back to the virtual
/// channel: writing response parts and requesting reads.
///
/// Every action is delivered to [`crate::session::UploadSession`] over an
/// unbounded channel rather than a shared `outbox`, so it works the same way
/// whether called synchronously from inside a callback or later from a
/// cloned [`EgressSender`] held by a detached task.
pub struct ChannelContext {
    pub(crate) writable: bool,
    tx: mpsc::UnboundedSender<Egress>,
}

impl ChannelContext {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Egress>) -> Self {
        Self { writable: false, tx }
    }

    /// Whether an adapter is attached and its physical channel is writable.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// A cloneable, `Send + Sync` sender for pushing actions from a task
    /// that outlives the current callback.
    #[must_use]
    pub fn egress_sender(&self) -> EgressSender {
        EgressSender(self.tx.clone())
    }

    /// Queues a response part for delivery to the currently attached adapter.
    pub fn write(&mut self, part: OutboundPart) {
        let _ = self.tx.send(Egress::Write(part));
    }

    /// Queues a flush of any buffered writes.
    pub fn flush(&mut self) {
        let _ = self.tx.send(Egress::Flush);
    }

    /// Requests the next chunk of request body data.
    pub fn read(&mut self) {
        let _ = self.tx.send(Egress::Read);
    }

    /// Ends the virtual channel from the application side.
    pub fn close(&mut self) {
        let _ = self.tx.send(Egress::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingHandler {
        events: Vec<&'static str>,
    }

    impl ChannelHandler for RecordingHandler {
        fn register(&mut self, _ctx: &mut ChannelContext) {
            self.events.push("register");
        }
        fn active(&mut self, _ctx: &mut ChannelContext) {
            self.events.push("active");
        }
        fn read(&mut self, _ctx: &mut ChannelContext, _data: Bytes) {
            self.events.push("read");
        }
        fn inactive(&mut self, _ctx: &mut ChannelContext) {
            self.events.push("inactive");
        }
    }

    fn test_context() -> (ChannelContext, mpsc::UnboundedReceiver<Egress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelContext::new(tx), rx)
    }

    #[test]
    fn handler_receives_lifecycle_events_in_order() {
        let mut handler = RecordingHandler { events: Vec::new() };
        let (mut ctx, _rx) = test_context();
        handler.register(&mut ctx);
        handler.active(&mut ctx);
        handler.read(&mut ctx, Bytes::from("abc"));
        handler.inactive(&mut ctx);
        assert_eq!(handler.events, vec!["register", "active", "read", "inactive"]);
    }

    #[test]
    fn default_methods_are_no_ops() {
        struct Noop;
        impl ChannelHandler for Noop {}
        let (mut ctx, _rx) = test_context();
        let mut handler = Noop;
        handler.register(&mut ctx);
        handler.read_complete(&mut ctx);
        handler.writability_changed(&mut ctx);
        handler.unregistered(&mut ctx);
    }

    #[test]
    fn write_reaches_the_channel() {
        let (mut ctx, mut rx) = test_context();
        ctx.write(OutboundPart::End);
        assert!(matches!(rx.try_recv().unwrap(), Egress::Write(OutboundPart::End)));
    }

    #[test]
    fn egress_sender_clones_work_from_outside_a_callback() {
        let (ctx, mut rx) = test_context();
        let sender = ctx.egress_sender();
        sender.close();
        assert!(matches!(rx.try_recv().unwrap(), Egress::Close));
    }
}
