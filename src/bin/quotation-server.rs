use anyhow::Result;
use sayhi_grpc::config::AppConfig;
use sayhi_grpc::grpc;
use sayhi_grpc::http::{self, AppState};
use sayhi_grpc::quotation::QuotationServiceImpl;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    sayhi_grpc::init_tracing();
    let config = AppConfig::from_env()?;

    let cors = http::cors_layer(&config.cors_origin)?;
    let router = http::build_router(AppState::new(QuotationServiceImpl::new()), cors);
    let http_listener = TcpListener::bind(config.http_addr).await?;

    tokio::try_join!(
        grpc::start_quotation_server(config.quotation_grpc_addr, QuotationServiceImpl::new()),
        http::serve(http_listener, router),
    )?;

    Ok(())
}
