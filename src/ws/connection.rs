use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::Role;
use tracing::{debug, info};

/// Result of one non-blocking read.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Nothing arrived since the last read.
    NoData,
    /// A complete text or binary message.
    Message(Message),
    /// The peer hung up or the transport failed; the connection must go.
    PeerClosed,
}

/// An upgraded client connection.
///
/// Owned by exactly one client and driven only from the scheduling loop.
/// Failures never surface as errors: they set `closed_pending` and the next
/// [`read`](Connection::read) reports [`ReadOutcome::PeerClosed`].
pub struct Connection {
    peer: SocketAddr,
    ws: WebSocketStream<TcpStream>,
    closed_pending: bool,
    write_timeout: Duration,
}

impl Connection {
    /// Wraps a stream whose handshake has already completed.
    pub async fn upgraded(peer: SocketAddr, stream: TcpStream, write_timeout: Duration) -> Self {
        let ws = WebSocketStream::from_raw_socket(stream, Role::Server, None).await;
        Self {
            peer,
            ws,
            closed_pending: false,
            write_timeout,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// True once a failure or hang-up has been observed.
    pub fn is_closing(&self) -> bool {
        self.closed_pending
    }

    /// Polls for one message without waiting.
    ///
    /// Ping/pong and other control traffic is answered by the codec and
    /// reported as `NoData`. A close frame counts as a hang-up.
    pub fn read(&mut self) -> ReadOutcome {
        if self.closed_pending {
            return ReadOutcome::PeerClosed;
        }

        let polled = self.ws.next().now_or_never();
        match polled {
            None => ReadOutcome::NoData,
            Some(Some(Ok(msg @ (Message::Text(_) | Message::Binary(_))))) => {
                ReadOutcome::Message(msg)
            }
            Some(Some(Ok(Message::Close(frame)))) => {
                debug!(peer = %self.peer, ?frame, "Peer sent close frame");
                self.mark_closed()
            }
            Some(Some(Ok(_))) => ReadOutcome::NoData,
            Some(Some(Err(e))) => {
                debug!(peer = %self.peer, error = %e, "Read failed");
                self.mark_closed()
            }
            Some(None) => self.mark_closed(),
        }
    }

    /// Sends one message.
    ///
    /// A failed or timed-out write is not reported here; it is picked up by
    /// the next `read`.
    pub async fn write(&mut self, msg: impl Into<Message>) {
        if self.closed_pending {
            return;
        }

        match timeout(self.write_timeout, self.ws.send(msg.into())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(peer = %self.peer, error = %e, "Write failed");
                self.closed_pending = true;
            }
            Err(_) => {
                debug!(peer = %self.peer, "Write timed out");
                self.closed_pending = true;
            }
        }
    }

    /// Sends a close frame if the peer is still there and releases the
    /// stream. Consumes the connection, so it cannot be closed twice.
    pub async fn close(mut self) {
        info!(peer = %self.peer, "Closing connection");
        if !self.closed_pending {
            let _ = timeout(self.write_timeout, self.ws.close(None)).await;
        }
    }

    fn mark_closed(&mut self) -> ReadOutcome {
        self.closed_pending = true;
        ReadOutcome::PeerClosed
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("closed_pending", &self.closed_pending)
            .finish_non_exhaustive()
    }
}
