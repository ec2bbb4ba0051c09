use anyhow::Result;
use sayhi_grpc::config::AppConfig;
use sayhi_grpc::grpc;
use sayhi_grpc::simulator::Simulator;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    sayhi_grpc::init_tracing();
    let config = AppConfig::from_env()?;

    // Bind before spawning so the simulator's connect cannot race the server.
    let listener = TcpListener::bind(config.grpc_addr).await?;
    let session = config.session.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = grpc::serve_sayhi(listener, session).await {
            error!(error = %e, "gRPC server error");
        }
    });

    let simulator = Simulator::connect(config.grpc_endpoint(), config.simulator.clone()).await?;
    info!(
        interval = ?config.simulator.interval,
        sender = %config.simulator.sender,
        "Client simulator scheduled"
    );

    tokio::select! {
        _ = simulator.run_periodically() => {}
        _ = server => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
