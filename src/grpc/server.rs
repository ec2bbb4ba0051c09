use std::net::SocketAddr;

use stream_session::SessionConfig;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tracing::info;

use crate::quotation::QuotationServiceImpl;
use crate::sayhi::SayHiServiceImpl;

/// Serve the SayHi service on an already bound listener.
pub async fn serve_sayhi(listener: TcpListener, config: SessionConfig) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, ?config, "SayHi gRPC server starting");

    tonic::transport::Server::builder()
        .add_service(SayHiServiceImpl::new(config).into_server())
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await?;

    Ok(())
}

pub async fn start_quotation_server(
    addr: SocketAddr,
    service: QuotationServiceImpl,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_quotation(listener, service).await
}

pub async fn serve_quotation(
    listener: TcpListener,
    service: QuotationServiceImpl,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Quotation gRPC server starting");

    tonic::transport::Server::builder()
        .add_service(service.into_server())
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await?;

    Ok(())
}
