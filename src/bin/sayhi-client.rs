use anyhow::Result;
use sayhi_grpc::config::AppConfig;
use sayhi_grpc::simulator::Simulator;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    sayhi_grpc::init_tracing();
    let config = AppConfig::from_env()?;

    let endpoint = config.grpc_endpoint();
    info!(%endpoint, "Connecting");
    let simulator = Simulator::connect(endpoint, config.simulator).await?;

    let reply = simulator.say_hi("hi").await?;
    info!(message = %reply.message, sender = %reply.sender, "Unary reply");

    let replies = simulator.server_streaming(3).await?;
    for reply in &replies {
        info!(message = %reply.message, "Server stream reply");
    }

    let (client_stream, bidirectional) = simulator.run_once().await;
    info!(?client_stream, "Client streaming result");
    info!(?bidirectional, "Bidirectional result");

    if !(client_stream.success && bidirectional.success) {
        anyhow::bail!("simulator round failed");
    }

    Ok(())
}
