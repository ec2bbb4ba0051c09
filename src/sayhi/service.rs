use stream_session::{OutboundSink, ResponseStream, SessionConfig, pump, spawn_pump};
use tonic::{Request, Response, Status, Streaming};
use tracing::{Instrument, info};

use crate::sayhi::bidi::BidiEchoSession;
use crate::sayhi::client_stream::HiCounter;
use crate::sayhi::server_stream::stream_hi;
use crate::sayhi::{Pattern, unary_reply};
use crate::sayhi_proto::say_hi_service_server::{SayHiService, SayHiServiceServer};
use crate::sayhi_proto::{HiCountRequest, HiCountResponse, HiRequest, HiResponse};

/// Routes each SayHi RPC to the handler for its interaction pattern. Every
/// call gets its own isolated session; nothing is shared between calls.
#[derive(Debug, Clone, Default)]
pub struct SayHiServiceImpl {
    config: SessionConfig,
}

impl SayHiServiceImpl {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn into_server(self) -> SayHiServiceServer<Self> {
        SayHiServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl SayHiService for SayHiServiceImpl {
    async fn say_hi(&self, request: Request<HiRequest>) -> Result<Response<HiResponse>, Status> {
        let request = request.into_inner();
        Pattern::Unary.span().in_scope(|| {
            info!(message = %request.message, peer = %request.sender, "Responding 'hi'");
            Ok(Response::new(unary_reply(&request)))
        })
    }

    async fn client_stream_hi(
        &self,
        request: Request<Streaming<HiRequest>>,
    ) -> Result<Response<HiCountResponse>, Status> {
        let span = Pattern::ClientStream.span();
        let (sink, reply) = OutboundSink::unary();
        let counter = HiCounter::new(sink);

        let pumped = pump(request.into_inner(), &counter)
            .instrument(span)
            .await;

        match reply.await {
            Ok(response) => response.map(Response::new),
            // The counter abandoned its reply: surface the peer's own failure.
            Err(_) => Err(match pumped {
                Err(e) => e.status().clone(),
                Ok(_) => Status::internal("client stream ended without a response"),
            }),
        }
    }

    type ServerStreamHiStream = ResponseStream<HiResponse>;

    async fn server_stream_hi(
        &self,
        request: Request<HiCountRequest>,
    ) -> Result<Response<Self::ServerStreamHiStream>, Status> {
        let request = request.into_inner();
        let count = self.config.clamp_count(request.count);
        let (sink, stream) = OutboundSink::channel();

        tokio::spawn(
            stream_hi(request.sender, count, self.config.server_stream_pacing, sink)
                .instrument(Pattern::ServerStream.span()),
        );

        Ok(Response::new(stream))
    }

    type BidirectionalHiStream = ResponseStream<HiResponse>;

    async fn bidirectional_hi(
        &self,
        request: Request<Streaming<HiRequest>>,
    ) -> Result<Response<Self::BidirectionalHiStream>, Status> {
        let (sink, stream) = OutboundSink::channel();

        Pattern::Bidirectional.span().in_scope(|| {
            let session = BidiEchoSession::start(sink, self.config.bidi_window);
            spawn_pump(request.into_inner(), session);
        });

        Ok(Response::new(stream))
    }
}
