//! The Upload Adapter: the one `salvo_core::Handler` bound into the routing
//! tree, invoked once per physical HTTP request. It classifies the request
//! (`crate::codec`), looks up or creates the matching session
//! (`crate::registry`), and bridges it to a concrete [`PhysicalChannel`]
//! backed by this call's own `&mut Response`.
//!
//! Every physical request/response cycle handled here runs to completion
//! before the handler returns: there is exactly one response per physical
//! request, so there is no need to keep `Response` alive past this call the
//! way a long-lived streaming adapter would.
//!
//! **Known gap:** the draft's `104 Upload Resumption Supported` informational
//! response has no representation in `salvo_core::Response` (see
//! `crate::adapter`'s module docs). [`SalvoPhysicalChannel::write`] logs it
//! and continues; see `DESIGN.md` for the tracked limitation.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use salvo_core::http::{HeaderMap, StatusCode};
use salvo_core::{async_trait, handler, Depot, FlowCtrl, Request, Response};
use tokio::sync::Mutex;
use tracing::debug;

use crate::adapter::{OutboundPart, PhysicalChannel};
use crate::channel::RequestHead;
use crate::codec::{self, Intent};
use crate::error::{ResumableUploadError, ResumableUploadResult};
use crate::registry::UploadRegistry;
use crate::session::UploadSession;
use crate::ChannelHandlerFactory;

struct PhysicalState {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

/// The [`PhysicalChannel`] backing one physical request's response, mutated
/// by the session actor and applied back to `&mut Response` once the
/// handler call that owns it regains control.
struct SalvoPhysicalChannel {
    state: Mutex<PhysicalState>,
}

impl SalvoPhysicalChannel {
    fn new() -> Self {
        Self {
            state: Mutex::new(PhysicalState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: BytesMut::new(),
            }),
        }
    }

    async fn apply(&self, res: &mut Response) {
        let state = self.state.lock().await;
        res.status_code(state.status);
        for (name, value) in &state.headers {
            res.headers_mut().insert(name.clone(), value.clone());
        }
        if !state.body.is_empty() {
            let _ = res.write_body(state.body.clone().freeze());
        }
    }
}

#[async_trait]
impl PhysicalChannel for SalvoPhysicalChannel {
    fn is_writable(&self) -> bool {
        true
    }

    async fn write(&self, part: OutboundPart) -> ResumableUploadResult<()> {
        let mut state = self.state.lock().await;
        match part {
            OutboundPart::Informational { status, headers } => {
                debug!(%status, ?headers, "104-class informational response cannot be represented by salvo_core::Response; dropping");
            }
            OutboundPart::Head { status, headers } => {
                state.status = status;
                state.headers = headers;
            }
            OutboundPart::Body(bytes) => state.body.extend_from_slice(&bytes),
            OutboundPart::End => {}
        }
        Ok(())
    }

    async fn close(&self) {}
}

fn empty_body_status(status: StatusCode) -> (StatusCode, HeaderMap) {
    let mut headers = HeaderMap::new();
    headers.insert(
        salvo_core::http::header::CONTENT_LENGTH,
        salvo_core::http::HeaderValue::from_static("0"),
    );
    (status, headers)
}

async fn write_error(res: &mut Response, error: &ResumableUploadError) {
    let (status, headers) = empty_body_status(error.status());
    res.status_code(status);
    for (name, value) in &headers {
        res.headers_mut().insert(name.clone(), value.clone());
    }
}

fn request_head(req: &Request) -> RequestHead {
    RequestHead {
        method: req.method().clone(),
        uri: req.uri().to_string(),
        headers: req.headers().clone(),
    }
}

/// The Upload Adapter handler. Bind it under the registry's configured
/// prefix and at the creation path via [`crate::ResumableUpload::into_router`].
#[handler]
pub struct ResumableUploadHandler;

#[async_trait]
impl salvo_core::Handler for ResumableUploadHandler {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let Some(registry) = depot.obtain::<UploadRegistry>().ok().cloned() else {
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            return;
        };

        let path = req.uri().path().to_owned();
        let is_resumption = registry.is_resumption(&path);
        let method = req.method().clone();

        let classified = match codec::classify(&method, req.headers(), is_resumption) {
            Ok(c) => c,
            Err(err) => {
                write_error(res, &ResumableUploadError::from(err)).await;
                return;
            }
        };

        match classified.intent {
            Intent::None => {
                ctrl.call_next(req, depot, res).await;
            }
            Intent::Options => {
                ctrl.call_next(req, depot, res).await;
                let mut status = res.status_code.unwrap_or(StatusCode::OK);
                let mut headers = res.headers().clone();
                codec::rewrite_options_response(&mut status, &mut headers);
                res.status_code(status);
                res.set_headers(headers);
            }
            Intent::Creation {
                complete,
                content_length,
                upload_length,
            } => {
                let Some(factory) = depot.obtain::<ChannelHandlerFactory>().ok().cloned() else {
                    res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                    return;
                };
                let physical = Arc::new(SalvoPhysicalChannel::new());
                let head = request_head(req);
                let handle = UploadSession::spawn(registry.clone(), registry.options().clone(), factory());
                let result = handle
                    .receive_creation(
                        physical.clone(),
                        head,
                        complete,
                        content_length,
                        upload_length,
                        classified.version,
                    )
                    .await;
                if let Err(err) = result {
                    write_error(res, &err).await;
                    physical.apply(res).await;
                    return;
                }
                stream_body_to_session(req, &handle).await;
                physical.apply(res).await;
            }
            Intent::OffsetRetrieval => {
                let Some(handle) = registry.find_upload(&path).await else {
                    write_error(res, &ResumableUploadError::NotFound).await;
                    return;
                };
                let physical = Arc::new(SalvoPhysicalChannel::new());
                handle.receive_offset_retrieval(physical.clone(), classified.version).await;
                physical.apply(res).await;
            }
            Intent::Appending {
                offset,
                complete,
                content_length,
                upload_length,
            } => {
                let Some(handle) = registry.find_upload(&path).await else {
                    write_error(res, &ResumableUploadError::NotFound).await;
                    return;
                };
                let physical = Arc::new(SalvoPhysicalChannel::new());
                let result = handle
                    .receive_appending(
                        physical.clone(),
                        offset,
                        complete,
                        content_length,
                        upload_length,
                        classified.version,
                    )
                    .await;
                if let Err(err) = result {
                    write_error(res, &err).await;
                    physical.apply(res).await;
                    return;
                }
                stream_body_to_session(req, &handle).await;
                physical.apply(res).await;
            }
            Intent::Cancellation => {
                let Some(handle) = registry.find_upload(&path).await else {
                    write_error(res, &ResumableUploadError::NotFound).await;
                    return;
                };
                let physical = Arc::new(SalvoPhysicalChannel::new());
                handle.receive_cancellation(physical.clone()).await;
                physical.apply(res).await;
            }
        }
    }
}

async fn stream_body_to_session(req: &mut Request, handle: &crate::session::SessionHandle) {
    let mut body = req.take_body();
    let mut error = None;
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                let bytes: Bytes = bytes;
                if let Err(err) = handle.receive_body_chunk(bytes).await {
                    error = Some(err);
                    break;
                }
            }
            Err(_) => {
                error = Some(ResumableUploadError::ParentNotPresent);
                break;
            }
        }
    }
    match error {
        Some(err) => handle.adapter_end(Some(err)).await,
        None => {
            let _ = handle.receive_end().await;
        }
    }
}
