//! The upload session: a per-logical-upload actor pinned to its own tokio
//! task. All mutation happens inside [`UploadSession::run`]; every other
//! task reaches it only through a [`SessionHandle`], by sending a command
//! and awaiting its reply. There is no `Arc<Mutex<SessionState>>` here — the
//! task itself *is* the lock.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::adapter::{OutboundPart, PhysicalChannel};
use crate::channel::{ChannelContext, ChannelHandler, Egress, RequestHead};
use crate::codec::{self, InteropVersion};
use crate::error::{ResumableUploadError, ResumableUploadResult};
use crate::options::ResumableUploadOptions;
use crate::registry::UploadRegistry;

/// Reconciles a newly declared upload length against what a session already
/// knows, per `SPEC_FULL.md` §4.3's `save_upload_length`.
fn reconcile_length(
    known: Option<u64>,
    offset: u64,
    complete: bool,
    content_length: Option<u64>,
    declared: Option<u64>,
) -> Option<Option<u64>> {
    let computed = if complete {
        content_length.map(|len| offset + len)
    } else {
        None
    };
    let mut candidate = known;
    for value in [computed, declared] {
        let Some(value) = value else { continue };
        match candidate {
            Some(existing) if existing != value => return None,
            _ => candidate = Some(value),
        }
    }
    Some(candidate)
}

struct CreationArgs {
    physical: Arc<dyn PhysicalChannel>,
    head: RequestHead,
    complete: bool,
    content_length: Option<u64>,
    upload_length: Option<u64>,
    version: InteropVersion,
}

struct AppendingArgs {
    physical: Arc<dyn PhysicalChannel>,
    offset: u64,
    complete: bool,
    content_length: Option<u64>,
    upload_length: Option<u64>,
    version: InteropVersion,
}

enum SessionCommand {
    Creation(CreationArgs, oneshot::Sender<ResumableUploadResult<String>>),
    OffsetRetrieval {
        physical: Arc<dyn PhysicalChannel>,
        version: InteropVersion,
        reply: oneshot::Sender<()>,
    },
    Appending(AppendingArgs, oneshot::Sender<ResumableUploadResult<()>>),
    Cancellation {
        physical: Arc<dyn PhysicalChannel>,
        reply: oneshot::Sender<()>,
    },
    BodyChunk {
        bytes: Bytes,
        reply: oneshot::Sender<ResumableUploadResult<()>>,
    },
    EndOfStream {
        reply: oneshot::Sender<ResumableUploadResult<()>>,
    },
    AdapterEnd {
        error: Option<ResumableUploadError>,
    },
}

/// A cheap, `Clone`-able, cross-task reference to an actor-backed
/// [`UploadSession`]. Every method hops onto the session's own task by
/// sending a command and awaiting its reply; none of them touch session
/// state directly.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> ResumableUploadResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ResumableUploadError::SessionGone)?;
        rx.await.map_err(|_| ResumableUploadError::SessionGone)
    }

    /// Handles a `Creation` request, returning the minted resumption path.
    pub async fn receive_creation(
        &self,
        physical: Arc<dyn PhysicalChannel>,
        head: RequestHead,
        complete: bool,
        content_length: Option<u64>,
        upload_length: Option<u64>,
        version: InteropVersion,
    ) -> ResumableUploadResult<String> {
        self.call(|reply| {
            SessionCommand::Creation(
                CreationArgs {
                    physical,
                    head,
                    complete,
                    content_length,
                    upload_length,
                    version,
                },
                reply,
            )
        })
        .await?
    }

    /// Handles a `HEAD` offset-retrieval request against this session.
    pub async fn receive_offset_retrieval(&self, physical: Arc<dyn PhysicalChannel>, version: InteropVersion) {
        let _ = self
            .call(|reply| SessionCommand::OffsetRetrieval { physical, version, reply })
            .await;
    }

    /// Handles a `PATCH` resumption request against this session.
    pub async fn receive_appending(
        &self,
        physical: Arc<dyn PhysicalChannel>,
        offset: u64,
        complete: bool,
        content_length: Option<u64>,
        upload_length: Option<u64>,
        version: InteropVersion,
    ) -> ResumableUploadResult<()> {
        self.call(|reply| {
            SessionCommand::Appending(
                AppendingArgs {
                    physical,
                    offset,
                    complete,
                    content_length,
                    upload_length,
                    version,
                },
                reply,
            )
        })
        .await?
    }

    /// Handles a `DELETE` cancellation request against this session.
    pub async fn receive_cancellation(&self, physical: Arc<dyn PhysicalChannel>) {
        let _ = self
            .call(|reply| SessionCommand::Cancellation { physical, reply })
            .await;
    }

    /// Forwards one chunk of the currently attached request's body.
    pub async fn receive_body_chunk(&self, bytes: Bytes) -> ResumableUploadResult<()> {
        self.call(|reply| SessionCommand::BodyChunk { bytes, reply }).await?
    }

    /// Signals end-of-stream for the currently attached request.
    pub async fn receive_end(&self) -> ResumableUploadResult<()> {
        self.call(|reply| SessionCommand::EndOfStream { reply }).await?
    }

    /// Notifies the session that its attached adapter's physical request has
    /// ended, cleanly or with `error`.
    pub async fn adapter_end(&self, error: Option<ResumableUploadError>) {
        let _ = self.tx.send(SessionCommand::AdapterEnd { error }).await;
    }
}

/// The per-logical-upload actor. See the module docs for why this is a
/// spawned task rather than a shared, mutex-guarded struct.
pub struct UploadSession {
    registry: UploadRegistry,
    options: ResumableUploadOptions,
    handler: Box<dyn ChannelHandler>,
    ctx: ChannelContext,
    commands: mpsc::Receiver<SessionCommand>,
    self_tx: mpsc::Sender<SessionCommand>,

    egress_rx: mpsc::UnboundedReceiver<Egress>,

    resume_path: Option<String>,
    offset: u64,
    upload_length: Option<u64>,
    request_complete: bool,
    request_is_creation: bool,
    upload_complete: bool,
    response_started: bool,
    interop_version: InteropVersion,
    pending_read: bool,
    pending_error: Option<ResumableUploadError>,
    attached: Option<Arc<dyn PhysicalChannel>>,
    channel_started: bool,
    ended: bool,
}

impl UploadSession {
    /// Spawns a new session actor and returns a handle to it. `handler` is
    /// the application's pipeline for this upload; it is installed on the
    /// virtual channel the first time a request head is forwarded.
    pub fn spawn(
        registry: UploadRegistry,
        options: ResumableUploadOptions,
        handler: Box<dyn ChannelHandler>,
    ) -> SessionHandle {
        let (tx, commands) = mpsc::channel(32);
        let (egress_tx, egress_rx) = mpsc::unbounded_channel();
        let session = Self {
            registry,
            options,
            handler,
            ctx: ChannelContext::new(egress_tx),
            commands,
            self_tx: tx.clone(),
            egress_rx,
            resume_path: None,
            offset: 0,
            upload_length: None,
            request_complete: false,
            request_is_creation: false,
            upload_complete: false,
            response_started: false,
            interop_version: InteropVersion::V6,
            pending_read: false,
            pending_error: None,
            attached: None,
            channel_started: false,
            ended: false,
        };
        tokio::spawn(session.run());
        SessionHandle { tx }
    }

    async fn run(mut self) {
        loop {
            if self.ended {
                break;
            }
            // Re-evaluated every iteration: the idle-timer branch below is
            // only included in the `select!` while detached from a live
            // channel. Re-attaching simply stops it from being polled again
            // next time around — no separate cancellation token needed.
            let waiting_for_resumption = self.attached.is_none() && self.channel_started;
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
                Some(action) = self.egress_rx.recv() => {
                    self.apply_egress(action).await;
                }
                () = tokio::time::sleep(self.options.idle_timeout), if waiting_for_resumption => {
                    self.on_idle_timeout().await;
                }
            }
        }
    }

    async fn handle(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Creation(args, reply) => {
                let outcome = self.on_creation(args).await;
                let _ = reply.send(outcome);
            }
            SessionCommand::OffsetRetrieval { physical, version, reply } => {
                self.on_offset_retrieval(physical, version).await;
                let _ = reply.send(());
            }
            SessionCommand::Appending(args, reply) => {
                let outcome = self.on_appending(args).await;
                let _ = reply.send(outcome);
            }
            SessionCommand::Cancellation { physical, reply } => {
                self.on_cancellation(physical).await;
                let _ = reply.send(());
            }
            SessionCommand::BodyChunk { bytes, reply } => {
                let outcome = self.on_body_chunk(bytes).await;
                let _ = reply.send(outcome);
            }
            SessionCommand::EndOfStream { reply } => {
                let outcome = self.on_end_of_stream().await;
                let _ = reply.send(outcome);
            }
            SessionCommand::AdapterEnd { error } => {
                self.on_adapter_end(error).await;
            }
        }
    }

    // -- attach/detach -----------------------------------------------------

    async fn attach(&mut self, physical: Arc<dyn PhysicalChannel>) {
        self.pending_error = None;
        self.ctx.writable = physical.is_writable();
        if self.pending_read {
            physical.request_read();
            self.pending_read = false;
        }
        self.attached = Some(physical);
        self.handler.writability_changed(&mut self.ctx);
        self.drain_outbox().await;
        debug!(resume_path = ?self.resume_path, "adapter attached");
    }

    async fn detach(&mut self, close: bool) {
        if let Some(physical) = self.attached.take() {
            if close {
                physical.close().await;
            }
        }
        self.ctx.writable = false;
        debug!(resume_path = ?self.resume_path, "adapter detached");
    }

    // -- request-head handling ---------------------------------------------

    async fn on_creation(&mut self, args: CreationArgs) -> ResumableUploadResult<String> {
        let CreationArgs {
            physical,
            head,
            complete,
            content_length,
            upload_length,
            version,
        } = args;

        self.attach(physical.clone()).await;

        let Some(reconciled) = reconcile_length(self.upload_length, self.offset, complete, content_length, upload_length)
        else {
            self.respond_conflict(&physical).await;
            self.detach(false).await;
            return Err(ResumableUploadError::BadResumption {
                expected: self.offset,
                got: content_length.unwrap_or_default(),
            });
        };
        self.upload_length = reconciled;
        self.request_is_creation = true;
        self.request_complete = complete;
        self.interop_version = version;

        let handle = SessionHandle {
            tx: self.self_tx.clone(),
        };
        let resume_path = self.registry.start_upload(handle).await;
        self.resume_path = Some(resume_path.clone());
        info!(resume_path = %resume_path, "upload session created");

        let location = self.options.location_url(&resume_path);
        let mut informational_headers = salvo_core::http::HeaderMap::new();
        if let Ok(value) = location.parse() {
            informational_headers.insert(salvo_core::http::header::LOCATION, value);
        }
        let _ = physical
            .write(OutboundPart::Informational {
                status: salvo_core::http::StatusCode::from_u16(104).unwrap_or(salvo_core::http::StatusCode::OK),
                headers: informational_headers,
            })
            .await;

        self.start_channel(head).await;
        Ok(resume_path)
    }

    async fn on_offset_retrieval(&mut self, physical: Arc<dyn PhysicalChannel>, version: InteropVersion) {
        self.detach(true).await;
        let mut headers = salvo_core::http::HeaderMap::new();
        codec::set_version_and_offset(&mut headers, version, self.offset);
        codec::set_completeness(&mut headers, version, self.upload_complete);
        headers.insert(
            salvo_core::http::header::CACHE_CONTROL,
            salvo_core::http::HeaderValue::from_static("no-store"),
        );
        let _ = physical
            .write(OutboundPart::Head {
                status: salvo_core::http::StatusCode::NO_CONTENT,
                headers,
            })
            .await;
        let _ = physical.write(OutboundPart::End).await;
        self.arm_idle_timer();
    }

    async fn on_appending(&mut self, args: AppendingArgs) -> ResumableUploadResult<()> {
        let AppendingArgs {
            physical,
            offset,
            complete,
            content_length,
            upload_length,
            version,
        } = args;

        let conflicted = self.attached.is_some() || self.offset != offset || self.response_started;
        let reconciled = if conflicted {
            None
        } else {
            reconcile_length(self.upload_length, self.offset, complete, content_length, upload_length)
        };

        let Some(reconciled) = reconciled else {
            self.respond_conflict(&physical).await;
            self.handler
                .error_caught(&mut self.ctx, &ResumableUploadError::BadResumption { expected: self.offset, got: offset });
            self.end_channel().await;
            return Err(ResumableUploadError::BadResumption { expected: self.offset, got: offset });
        };

        self.upload_length = reconciled;
        self.request_is_creation = false;
        self.request_complete = complete;
        self.interop_version = version;
        self.attach(physical).await;
        Ok(())
    }

    async fn on_cancellation(&mut self, physical: Arc<dyn PhysicalChannel>) {
        self.detach(true).await;
        let _ = physical.write(OutboundPart::Head {
            status: salvo_core::http::StatusCode::NO_CONTENT,
            headers: salvo_core::http::HeaderMap::new(),
        })
        .await;
        let _ = physical.write(OutboundPart::End).await;
        self.handler
            .error_caught(&mut self.ctx, &ResumableUploadError::UploadCancelled);
        self.end_channel().await;
    }

    // -- body / end ----------------------------------------------------------

    async fn on_body_chunk(&mut self, bytes: Bytes) -> ResumableUploadResult<()> {
        self.offset += bytes.len() as u64;
        if let Some(upload_length) = self.upload_length {
            if self.offset > upload_length {
                if let Some(physical) = self.attached.clone() {
                    self.respond_conflict(&physical).await;
                }
                self.detach(false).await;
                let error = ResumableUploadError::BadResumption {
                    expected: upload_length,
                    got: self.offset,
                };
                self.handler.error_caught(&mut self.ctx, &error);
                self.end_channel().await;
                return Err(error);
            }
        }
        self.handler.read(&mut self.ctx, bytes);
        self.handler.read_complete(&mut self.ctx);
        self.drain_outbox().await;
        Ok(())
    }

    async fn on_end_of_stream(&mut self) -> ResumableUploadResult<()> {
        if self.resume_path.is_none() {
            self.handler.unregistered(&mut self.ctx);
            self.ended = true;
            return Ok(());
        }
        if self.request_complete {
            self.upload_complete = true;
            self.handler.end_of_request(&mut self.ctx);
            self.drain_outbox().await;
            self.end_channel().await;
            return Ok(());
        }
        if let Some(physical) = self.attached.clone() {
            let mut headers = salvo_core::http::HeaderMap::new();
            codec::set_version_and_offset(&mut headers, self.interop_version, self.offset);
            codec::set_completeness(&mut headers, self.interop_version, false);
            if self.request_is_creation {
                if let Some(path) = &self.resume_path {
                    if let Ok(value) = self.options.location_url(path).parse() {
                        headers.insert(salvo_core::http::header::LOCATION, value);
                    }
                }
            }
            let _ = physical
                .write(OutboundPart::Head {
                    status: salvo_core::http::StatusCode::CREATED,
                    headers,
                })
                .await;
            let _ = physical.write(OutboundPart::End).await;
        }
        self.detach(false).await;
        self.arm_idle_timer();
        Ok(())
    }

    async fn on_adapter_end(&mut self, error: Option<ResumableUploadError>) {
        if !self.upload_complete && self.resume_path.is_some() {
            self.pending_error = error;
            self.detach(false).await;
            self.arm_idle_timer();
        } else {
            if let Some(error) = error {
                self.handler.error_caught(&mut self.ctx, &error);
            }
            self.end_channel().await;
        }
    }

    async fn on_idle_timeout(&mut self) {
        warn!(resume_path = ?self.resume_path, "idle timeout waiting for resumption");
        let error = self
            .pending_error
            .take()
            .unwrap_or(ResumableUploadError::TimeoutWaitingForResumption);
        self.handler.error_caught(&mut self.ctx, &error);
        self.end_channel().await;
    }

    // -- virtual channel lifecycle -------------------------------------------

    async fn start_channel(&mut self, head: RequestHead) {
        self.channel_started = true;
        self.handler.register(&mut self.ctx);
        self.handler.active(&mut self.ctx);
        let mut head = head;
        codec::strip_protocol_headers(&mut head.headers);
        self.handler.head(&mut self.ctx, head);
        self.drain_outbox().await;
    }

    async fn end_channel(&mut self) {
        if self.ended {
            return;
        }
        self.handler.inactive(&mut self.ctx);
        self.handler.unregistered(&mut self.ctx);
        self.drain_outbox().await;
        self.detach(true).await;
        self.registry.stop_upload(self.resume_path.as_deref()).await;
        self.ended = true;
    }

    fn arm_idle_timer(&mut self) {
        // Re-armed implicitly: `run`'s select loop only polls a fresh
        // `tokio::time::sleep` while `attached.is_none()`; the next attach
        // simply stops that branch from being polled again next iteration.
    }

    // -- egress ---------------------------------------------------------------

    /// Drains whatever a synchronous `ChannelHandler` callback just pushed.
    /// Anything pushed later, from a cloned `EgressSender` held by a
    /// detached task, arrives instead through `run`'s `egress_rx` branch.
    async fn drain_outbox(&mut self) {
        while let Ok(action) = self.egress_rx.try_recv() {
            self.apply_egress(action).await;
        }
    }

    async fn apply_egress(&mut self, action: Egress) {
        match action {
            Egress::Write(part) => self.egress_write(part).await,
            Egress::Flush => {
                if self.attached.is_none() {
                    self.egress_parent_not_present().await;
                }
            }
            Egress::Read => {
                if let Some(physical) = &self.attached {
                    physical.request_read();
                } else {
                    self.pending_read = true;
                }
            }
            Egress::Close => {
                self.end_channel().await;
            }
        }
    }

    async fn egress_write(&mut self, part: OutboundPart) {
        let Some(physical) = self.attached.clone() else {
            self.egress_parent_not_present().await;
            return;
        };
        self.response_started = true;
        let part = match part {
            OutboundPart::Head { mut status, mut headers } => {
                if self.resume_path.is_some() {
                    codec::set_version_and_offset(&mut headers, self.interop_version, self.offset);
                    codec::set_completeness(&mut headers, self.interop_version, self.upload_complete);
                    if self.request_is_creation {
                        if let Some(path) = &self.resume_path {
                            if let Ok(value) = self.options.location_url(path).parse() {
                                headers.insert(salvo_core::http::header::LOCATION, value);
                            }
                        }
                    }
                } else {
                    codec::rewrite_options_response(&mut status, &mut headers);
                }
                OutboundPart::Head { status, headers }
            }
            other => other,
        };
        let _ = physical.write(part).await;
    }

    async fn egress_parent_not_present(&mut self) {
        let error = ResumableUploadError::ParentNotPresent;
        self.handler.error_caught(&mut self.ctx, &error);
        self.end_channel().await;
    }

    async fn respond_conflict(&mut self, physical: &Arc<dyn PhysicalChannel>) {
        let mut headers = salvo_core::http::HeaderMap::new();
        codec::set_version_and_offset(&mut headers, self.interop_version, self.offset);
        codec::set_completeness(&mut headers, self.interop_version, self.upload_complete);
        let _ = physical
            .write(OutboundPart::Head {
                status: salvo_core::http::StatusCode::CONFLICT,
                headers,
            })
            .await;
        let _ = physical.write(OutboundPart::End).await;
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::tests::RecordingChannel;
    use crate::options::ResumableUploadOptions;
    use crate::registry::UploadRegistry;
    use std::sync::Mutex as StdMutex;

    struct RecordingHandler {
        events: Arc<StdMutex<Vec<String>>>,
    }

    impl ChannelHandler for RecordingHandler {
        fn active(&mut self, _ctx: &mut ChannelContext) {
            self.events.lock().unwrap().push("active".to_owned());
        }
        fn head(&mut self, _ctx: &mut ChannelContext, head: RequestHead) {
            self.events.lock().unwrap().push(format!("head:{}", head.uri));
        }
        fn read(&mut self, _ctx: &mut ChannelContext, data: Bytes) {
            self.events.lock().unwrap().push(format!("read:{}", data.len()));
        }
        fn end_of_request(&mut self, ctx: &mut ChannelContext) {
            self.events.lock().unwrap().push("end_of_request".to_owned());
            ctx.write(OutboundPart::Head {
                status: salvo_core::http::StatusCode::OK,
                headers: salvo_core::http::HeaderMap::new(),
            });
        }
        fn error_caught(&mut self, _ctx: &mut ChannelContext, error: &ResumableUploadError) {
            self.events.lock().unwrap().push(format!("error:{error}"));
        }
        fn inactive(&mut self, _ctx: &mut ChannelContext) {
            self.events.lock().unwrap().push("inactive".to_owned());
        }
    }

    fn options() -> ResumableUploadOptions {
        ResumableUploadOptions::new("https://h")
    }

    #[tokio::test]
    async fn creation_then_body_then_end_tracks_offset() {
        let registry = UploadRegistry::new(options());
        let events = Arc::new(StdMutex::new(Vec::new()));
        let handler = Box::new(RecordingHandler { events: events.clone() });
        let handle = UploadSession::spawn(registry, options(), handler);

        let physical = Arc::new(RecordingChannel::new());
        let head = RequestHead {
            method: salvo_core::http::Method::POST,
            uri: "/up".to_owned(),
            headers: salvo_core::http::HeaderMap::new(),
        };
        let path = handle
            .receive_creation(physical.clone(), head, true, Some(3), None, InteropVersion::V6)
            .await
            .unwrap();
        assert!(path.starts_with("/resumable_upload/"));

        handle.receive_body_chunk(Bytes::from("abc")).await.unwrap();
        handle.receive_end().await.unwrap();

        let recorded = events.lock().unwrap();
        assert!(recorded.iter().any(|e| e.starts_with("head:")));
        assert!(recorded.iter().any(|e| e == "read:3"));
        assert!(recorded.iter().any(|e| e == "end_of_request"));
        assert!(recorded.iter().any(|e| e == "inactive"));
        assert!(physical.parts.lock().unwrap().iter().any(|p| p == "head:200 OK"));
    }

    #[tokio::test]
    async fn appending_offset_mismatch_is_rejected() {
        let registry = UploadRegistry::new(options());
        let events = Arc::new(StdMutex::new(Vec::new()));
        let handler = Box::new(RecordingHandler { events: events.clone() });
        let handle = UploadSession::spawn(registry, options(), handler);

        let physical = Arc::new(RecordingChannel::new());
        let head = RequestHead {
            method: salvo_core::http::Method::POST,
            uri: "/up".to_owned(),
            headers: salvo_core::http::HeaderMap::new(),
        };
        handle
            .receive_creation(physical.clone(), head, false, Some(3), None, InteropVersion::V6)
            .await
            .unwrap();
        handle.receive_body_chunk(Bytes::from("abc")).await.unwrap();
        handle.receive_end().await.unwrap();

        let other = Arc::new(RecordingChannel::new());
        let err = handle
            .receive_appending(other, 1, true, Some(2), None, InteropVersion::V6)
            .await
            .unwrap_err();
        assert!(matches!(err, ResumableUploadError::BadResumption { expected: 3, got: 1 }));
    }
}
