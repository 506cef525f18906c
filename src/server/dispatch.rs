//! Per-connection protocol decision.
//!
//! ```text
//!   accepted stream
//!         │
//!   live >= max? ──yes──▶ 503, close
//!         │
//!   read request head (bounded)
//!         │
//!   GET without Upgrade? ──yes──▶ static file, close
//!   (request line alone if the head does not parse)
//!         │
//!   handshake ok? ──no──▶ 500, close
//!         │
//!   Connection (joins the registry)
//! ```

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::http::parser::{find_headers_end, parse_http_request, parse_request_prefix};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::static_files::StaticFiles;
use crate::http::writer::{ResponseWriter, close_gracefully};
use crate::ws::connection::Connection;
use crate::ws::handshake::{HandshakeError, server_handshake};

pub struct Dispatcher<'a> {
    config: &'a ServerConfig,
    files: &'a StaticFiles,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a ServerConfig, files: &'a StaticFiles) -> Self {
        Self { config, files }
    }

    /// Runs the one-shot decision for a freshly accepted stream.
    ///
    /// Returns the upgraded connection when the handshake succeeded; every
    /// other outcome has already been answered and closed.
    pub async fn dispatch(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
        live: usize,
    ) -> Option<Connection> {
        if live >= self.config.max_connections {
            warn!(peer = %peer, live, max = self.config.max_connections, "Too many connections");
            self.reject(stream, Response::service_unavailable(&self.config.server_name))
                .await;
            return None;
        }

        let head = match self.read_request_head(&mut stream).await {
            Some(head) => head,
            None => {
                debug!(peer = %peer, "No request head, dropping connection");
                return None;
            }
        };

        match parse_http_request(&head) {
            Ok((req, _)) if req.is_file_request() => {
                self.files.serve(&req.path, stream).await;
                None
            }
            Ok((req, _)) => self.upgrade(stream, peer, Some(&req)).await,
            Err(e) => {
                debug!(peer = %peer, error = ?e, "Unparseable request head");
                // Oversized or sloppy GETs still get their file; anything
                // else is refused without attempting the handshake.
                match parse_request_prefix(&head) {
                    Some(req) if req.is_file_request() => {
                        self.files.serve(&req.path, stream).await;
                        None
                    }
                    _ => self.upgrade(stream, peer, None).await,
                }
            }
        }
    }

    async fn upgrade(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
        request: Option<&Request>,
    ) -> Option<Connection> {
        let result = match request {
            Some(req) => server_handshake(&mut stream, req, &self.config.server_name).await,
            None => Err(HandshakeError::Malformed),
        };

        match result {
            Ok(()) => {
                info!(peer = %peer, "Upgraded connection");
                Some(Connection::upgraded(peer, stream, self.config.write_timeout()).await)
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "Handshake failed");
                self.reject(stream, Response::internal_error(&self.config.server_name))
                    .await;
                None
            }
        }
    }

    /// Sends a canned response and closes, ignoring transport errors.
    async fn reject(&self, mut stream: TcpStream, response: Response) {
        if let Err(e) = ResponseWriter::new(&response).write_to_stream(&mut stream).await {
            debug!(error = %e, "Failed to send rejection");
        }
        close_gracefully(stream, self.config.close_linger()).await;
    }

    /// Reads until the end of the request head, at most `max_request_head`
    /// bytes and `request_timeout` long.
    ///
    /// `None` when the peer sent nothing usable in time. A head that is cut
    /// off by EOF or the size limit is returned as is and fails to parse.
    async fn read_request_head(&self, stream: &mut TcpStream) -> Option<BytesMut> {
        let limit = self.config.max_request_head;
        let mut buffer = BytesMut::with_capacity(limit);

        let read = async {
            loop {
                if find_headers_end(&buffer).is_some() || buffer.len() >= limit {
                    break;
                }

                let mut temp = [0u8; 512];
                let want = temp.len().min(limit - buffer.len());
                match stream.read(&mut temp[..want]).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buffer.extend_from_slice(&temp[..n]),
                }
            }
        };

        if timeout(self.config.request_timeout(), read).await.is_err() {
            return None;
        }
        if buffer.is_empty() { None } else { Some(buffer) }
    }
}
