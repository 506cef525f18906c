//! Shared helpers for the end-to-end server tests.

use std::net::SocketAddr;
use std::time::Duration;

use switchyard::config::Config;
use switchyard::server::Server;
use switchyard::ws::Client;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A content root with a few files, plus a config pointing at it.
pub fn site(max_connections: usize) -> (TempDir, Config) {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("index.html"), "<h1>switchyard</h1>\n").unwrap();
    std::fs::write(root.path().join("style.css"), "h1 { font-size: 2em; }\n").unwrap();
    std::fs::write(root.path().join("notes.txt"), "plain\ntext\n").unwrap();

    let mut cfg = Config::default();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.max_connections = max_connections;
    cfg.server.close_linger_ms = 20;
    cfg.server.request_timeout_ms = 1_000;
    cfg.static_files.root = root.path().to_path_buf();
    (root, cfg)
}

/// Ticks `server` until `task` finishes, and returns its output.
pub async fn drive<C: Client, T>(server: &mut Server<C>, mut task: JoinHandle<T>) -> T {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        assert!(tokio::time::Instant::now() < deadline, "task did not finish");
        server.tick().await;
        tokio::select! {
            out = &mut task => return out.unwrap(),
            _ = tokio::time::sleep(Duration::from_millis(5)) => {}
        }
    }
}

/// Ticks `server` until `done` holds.
pub async fn tick_until<C: Client>(server: &mut Server<C>, mut done: impl FnMut(&Server<C>) -> bool) {
    for _ in 0..1_000 {
        if done(server) {
            return;
        }
        server.tick().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

pub struct RawResponse {
    pub status: u16,
    pub head: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

/// Sends `request` verbatim and reads until the server closes.
pub async fn raw_exchange(addr: SocketAddr, request: String) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a head");
    let head = String::from_utf8(raw[..split].to_vec()).unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    RawResponse {
        status,
        head,
        body: raw[split + 4..].to_vec(),
    }
}

pub fn get(target: &str) -> String {
    format!("GET {target} HTTP/1.1\r\nHost: device.local\r\n\r\n")
}
