//! The scheduling loop and the client registry.
//!
//! One task drives everything. Each tick accepts at most one new stream and
//! runs the dispatcher on it, then reads every live client once. Clients
//! whose connection hung up are removed after the pass, so the registry is
//! never mutated while it is being iterated.

pub mod dispatch;
pub mod listener;

use std::net::SocketAddr;

use futures_util::FutureExt;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::static_files::StaticFiles;
use crate::ws::client::{Client, IdleClient};
use crate::ws::connection::{Connection, ReadOutcome};
use dispatch::Dispatcher;

type ClientFactory<C> = Box<dyn Fn(Connection) -> C>;

pub struct Server<C: Client = IdleClient> {
    config: Config,
    files: StaticFiles,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    clients: Vec<C>,
    ticks: u64,
    make_client: ClientFactory<C>,
}

impl Server<IdleClient> {
    pub fn new(config: Config) -> Self {
        Self::with_client_factory(config, IdleClient::new)
    }
}

impl<C: Client> Server<C> {
    /// Creates a server whose upgraded connections are wrapped by `factory`.
    pub fn with_client_factory(config: Config, factory: impl Fn(Connection) -> C + 'static) -> Self {
        let files = StaticFiles::on_disk(
            config.static_files.root.clone(),
            config.server.server_name.clone(),
        )
        .with_linger(config.server.close_linger());

        Self {
            config,
            files,
            listener: None,
            local_addr: None,
            clients: Vec::new(),
            ticks: 0,
            make_client: Box::new(factory),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Address the listener is bound to, while started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Live clients in accept order.
    pub fn clients_mut(&mut self) -> &mut [C] {
        &mut self.clients
    }

    /// Starts listening on `port` (0 picks a free one), stopping any
    /// previous listener first.
    pub async fn start(&mut self, port: u16) -> anyhow::Result<SocketAddr> {
        if self.listener.is_some() {
            self.stop().await;
        }

        let listener = listener::bind(&self.config.server.host, port, self.config.server.backlog).await?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        self.local_addr = Some(addr);

        info!(addr = %addr, root = %self.files.root().display(), "Started server");
        Ok(addr)
    }

    /// Closes the listener and every client connection, then clears the
    /// registry. Safe to call on a stopped server.
    pub async fn stop(&mut self) {
        let was_running = self.listener.take().is_some();
        self.local_addr = None;

        for mut client in self.clients.drain(..) {
            client.closed();
            client.into_connection().close().await;
        }

        if was_running {
            info!("Stopped server");
        }
    }

    /// Runs the loop forever: one tick, then a pause of `tick_interval`.
    pub async fn process_all(&mut self) {
        let interval = self.config.server.tick_interval();
        loop {
            self.tick().await;
            tokio::time::sleep(interval).await;
        }
    }

    /// One scheduling iteration: admit at most one connection, then give
    /// every client a read and a `process` call.
    pub async fn tick(&mut self) {
        self.check_new_connections().await;
        self.process_clients().await;
        self.ticks += 1;
    }

    async fn check_new_connections(&mut self) {
        let Some(listener) = self.listener.as_ref() else {
            return;
        };
        let (stream, peer) = match listener.accept().now_or_never() {
            None => return,
            Some(Ok(accepted)) => accepted,
            Some(Err(e)) => {
                warn!(error = %e, "Accept failed");
                return;
            }
        };
        info!(peer = %peer, "Client connection");

        let dispatcher = Dispatcher::new(&self.config.server, &self.files);
        if let Some(connection) = dispatcher.dispatch(stream, peer, self.clients.len()).await {
            self.clients.push((self.make_client)(connection));
            info!(peer = %peer, live = self.clients.len(), "Client registered");
        }
    }

    async fn process_clients(&mut self) {
        let tick = self.ticks;
        let mut departed = Vec::new();

        for (index, client) in self.clients.iter_mut().enumerate() {
            match client.connection_mut().read() {
                ReadOutcome::PeerClosed => departed.push(index),
                ReadOutcome::NoData => client.process(tick, None).await,
                ReadOutcome::Message(msg) => client.process(tick, Some(msg)).await,
            }
        }

        for index in departed.into_iter().rev() {
            let mut client = self.clients.remove(index);
            let peer = client.connection().peer_addr();
            client.closed();
            client.into_connection().close().await;
            info!(peer = %peer, live = self.clients.len(), "Client removed");
        }
    }
}
