use bytes::Bytes;
use salvo_core::http::{HeaderMap, StatusCode};
use salvo_core::prelude::*;
use salvo_resumable_upload::{ChannelContext, ChannelHandler, OutboundPart, RequestHead, ResumableUpload};
use tracing::info;

/// Logs every upload's lifecycle and writes a plain `200 OK` once the body
/// has been fully received.
struct LoggingUpload {
    received: u64,
}

impl ChannelHandler for LoggingUpload {
    fn head(&mut self, _ctx: &mut ChannelContext, head: RequestHead) {
        info!(uri = %head.uri, "upload started");
    }

    fn read(&mut self, _ctx: &mut ChannelContext, data: Bytes) {
        self.received += data.len() as u64;
        info!(received = self.received, "chunk received");
    }

    fn end_of_request(&mut self, ctx: &mut ChannelContext) {
        info!(received = self.received, "upload complete, responding");
        ctx.write(OutboundPart::Head {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        });
        ctx.write(OutboundPart::End);
    }

    fn inactive(&mut self, _ctx: &mut ChannelContext) {
        info!(received = self.received, "upload finished");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let uploads = ResumableUpload::new("http://127.0.0.1:5800")
        .path_prefix("/uploads")
        .with_pipeline(|| Box::new(LoggingUpload { received: 0 }));

    let router = Router::new().push(uploads.into_router());

    let acceptor = TcpListener::new("0.0.0.0:5800").bind().await;
    Server::new(acceptor).serve(router).await;
}
