use switchyard::config::Config;
use switchyard::server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();

    let mut server = Server::new(Config::load()?);
    let port = server.config().server.port;
    server.start(port).await?;

    tokio::select! {
        _ = server.process_all() => {}

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    server.stop().await;
    Ok(())
}
