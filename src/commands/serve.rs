use std::net::SocketAddr;

use quotebox::server::QuoteServer;

/// runs the quote server on `port` until ctrl-c.
pub async fn run(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let handle = QuoteServer::default().start(addr).await?;

    println!("Server running at {}", handle.base_url());

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down quote server...");
    handle.shutdown();

    Ok(())
}
