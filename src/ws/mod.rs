//! Upgraded (WebSocket) connections.
//!
//! - **`handshake`**: validates an upgrade request and sends `101`
//! - **`connection`**: non-blocking read, bounded write, close
//! - **`client`**: the per-connection behavior trait and its no-op variant

pub mod client;
pub mod connection;
pub mod handshake;

pub use client::{Client, IdleClient};
pub use connection::{Connection, ReadOutcome};
pub use handshake::{HandshakeError, server_handshake};
pub use tokio_tungstenite::tungstenite::Message;
