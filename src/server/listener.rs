use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tracing::info;

/// Binds a listening socket with `SO_REUSEADDR`, so a restarted server can
/// take its port back while old connections sit in TIME_WAIT.
pub async fn bind(host: &str, port: u16, backlog: u32) -> anyhow::Result<TcpListener> {
    let addr = tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve {host}:{port}"))?
        .next()
        .with_context(|| format!("no address for {host}:{port}"))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    let listener = socket.listen(backlog)?;

    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}
