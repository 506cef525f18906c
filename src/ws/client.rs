use std::future::Future;

use tokio_tungstenite::tungstenite::Message;

use crate::ws::connection::Connection;

/// Per-connection behavior, driven once per scheduling tick.
///
/// A client owns exactly one [`Connection`]. The server reads the connection
/// before calling [`process`](Client::process) and hands over the message
/// received during that tick, if any. Clients whose connection reports a
/// hang-up are never processed again; [`closed`](Client::closed) runs once
/// before the connection is released.
pub trait Client {
    fn connection(&self) -> &Connection;

    fn connection_mut(&mut self) -> &mut Connection;

    fn into_connection(self) -> Connection;

    fn process(&mut self, tick: u64, inbound: Option<Message>) -> impl Future<Output = ()>;

    fn closed(&mut self) {}
}

/// A client that holds its connection open and ignores traffic.
#[derive(Debug)]
pub struct IdleClient {
    connection: Connection,
}

impl IdleClient {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl Client for IdleClient {
    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    fn into_connection(self) -> Connection {
        self.connection
    }

    async fn process(&mut self, _tick: u64, _inbound: Option<Message>) {}
}
