//! Server side of the WebSocket opening handshake (RFC 6455 §4.2).
//!
//! The dispatcher has already read and parsed the request head, so the
//! handshake only validates it and answers with `101 Switching Protocols`.
//! The accept key comes from tungstenite; framing afterwards is
//! tokio-tungstenite's job.

use std::fmt;
use std::io;

use tokio::io::AsyncWrite;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;

use crate::http::request::{Method, Request};
use crate::http::response::{ResponseBuilder, StatusCode};
use crate::http::writer::ResponseWriter;

const SUPPORTED_VERSION: &str = "13";

#[derive(Debug)]
pub enum HandshakeError {
    /// The request head could not be parsed.
    Malformed,
    /// Upgrades are only negotiated over GET.
    WrongMethod(Method),
    /// `Upgrade` missing or not `websocket`.
    NotWebSocket,
    /// `Connection` does not list `Upgrade`.
    MissingConnectionUpgrade,
    MissingKey,
    UnsupportedVersion(Option<String>),
    /// Writing the 101 response failed.
    Io(io::Error),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::Malformed => write!(f, "malformed request head"),
            HandshakeError::WrongMethod(m) => write!(f, "upgrade requested with {m:?}"),
            HandshakeError::NotWebSocket => write!(f, "not a websocket upgrade"),
            HandshakeError::MissingConnectionUpgrade => {
                write!(f, "Connection header does not contain Upgrade")
            }
            HandshakeError::MissingKey => write!(f, "missing Sec-WebSocket-Key"),
            HandshakeError::UnsupportedVersion(Some(v)) => {
                write!(f, "unsupported Sec-WebSocket-Version {v}")
            }
            HandshakeError::UnsupportedVersion(None) => write!(f, "missing Sec-WebSocket-Version"),
            HandshakeError::Io(e) => write!(f, "failed to send handshake response: {e}"),
        }
    }
}

impl std::error::Error for HandshakeError {}

/// Validates an upgrade request and writes the `101` response.
///
/// Nothing is written when validation fails, so the caller can still answer
/// with an error page on the same stream.
pub async fn server_handshake<S>(
    stream: &mut S,
    request: &Request,
    server_name: &str,
) -> Result<(), HandshakeError>
where
    S: AsyncWrite + Unpin,
{
    let accept = accept_key(request)?;

    let response = ResponseBuilder::new(StatusCode::SwitchingProtocols)
        .header("Upgrade", "websocket")
        .header("Connection", "Upgrade")
        .header("Sec-WebSocket-Accept", accept)
        .header("Server", server_name)
        .build();

    ResponseWriter::new(&response)
        .write_to_stream(stream)
        .await
        .map_err(HandshakeError::Io)
}

/// Checks the upgrade headers and derives `Sec-WebSocket-Accept`.
pub fn accept_key(request: &Request) -> Result<String, HandshakeError> {
    if request.method != Method::GET {
        return Err(HandshakeError::WrongMethod(request.method.clone()));
    }
    if !request.header_has_token("Upgrade", "websocket") {
        return Err(HandshakeError::NotWebSocket);
    }
    if !request.header_has_token("Connection", "Upgrade") {
        return Err(HandshakeError::MissingConnectionUpgrade);
    }
    match request.header("Sec-WebSocket-Version") {
        Some(SUPPORTED_VERSION) => {}
        other => return Err(HandshakeError::UnsupportedVersion(other.map(str::to_string))),
    }
    let key = request
        .header("Sec-WebSocket-Key")
        .filter(|k| !k.is_empty())
        .ok_or(HandshakeError::MissingKey)?;

    Ok(derive_accept_key(key.as_bytes()))
}
