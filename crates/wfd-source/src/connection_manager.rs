//! Connection Manager (spec §4.9, component C9): binds the media-control
//! TCP listener, accepts exactly one sink at a time, and reacts to
//! link-layer events by (re)binding or tearing the active session down.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use wfd_core::SharedReporter;
use wfd_dbus::SourceState;

use crate::config::SourceConfig;
use crate::link_layer::{LinkLayerEvent, PeerRole};
use crate::session_task;

/// Owns the media-control listener and enforces the single-session rule.
/// `active` is shared with the accept loop so a rebind (triggered by an
/// `AddressAssigned` event) can tell whether it would be interrupting a
/// live session.
pub struct ConnectionManager {
    port: u16,
    config: SourceConfig,
    reporter: SharedReporter,
    dbus_state: SourceState,
    active: Arc<AtomicBool>,
    listen_task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(config: SourceConfig, reporter: SharedReporter, dbus_state: SourceState) -> Self {
        Self {
            port: config.media_control_port,
            config,
            reporter,
            dbus_state,
            active: Arc::new(AtomicBool::new(false)),
            listen_task: None,
        }
    }

    /// Handles one link-layer event (spec §6 "Link-layer inputs").
    pub async fn handle_event(&mut self, event: LinkLayerEvent) -> anyhow::Result<()> {
        match event {
            LinkLayerEvent::AddressAssigned { local_ip } => self.rebind(local_ip).await,
            LinkLayerEvent::PeerConnected { role, local_ip, remote_ip } => {
                self.on_peer_connected(role, local_ip, remote_ip).await
            }
            LinkLayerEvent::PeerDisconnected => {
                self.active.store(false, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    /// Arms the media-control listener at `local_ip:port`, replacing any
    /// previous binding. Called on startup once the link layer assigns an
    /// address, and again whenever it changes.
    async fn rebind(&mut self, local_ip: IpAddr) -> anyhow::Result<()> {
        if let Some(task) = self.listen_task.take() {
            task.abort();
        }

        let addr = SocketAddr::new(local_ip, self.port);
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "media-control listener bound");

        let active = Arc::clone(&self.active);
        let config = self.config.clone();
        let reporter = Arc::clone(&self.reporter);
        let dbus_state = self.dbus_state.clone();

        self.listen_task = Some(tokio::spawn(async move {
            accept_loop(listener, active, config, reporter, dbus_state).await;
        }));

        Ok(())
    }

    /// `group_client` role means we dial out to the sink instead of
    /// listening; `group_owner` keeps the existing listener armed.
    async fn on_peer_connected(
        &mut self,
        role: PeerRole,
        local_ip: IpAddr,
        remote_ip: IpAddr,
    ) -> anyhow::Result<()> {
        match role {
            PeerRole::GroupOwner => {
                self.rebind(local_ip).await?;
            }
            PeerRole::GroupClient => {
                if self.active.swap(true, Ordering::SeqCst) {
                    tracing::warn!(%remote_ip, "ignoring connect request: a session is already active");
                    return Ok(());
                }
                let addr = SocketAddr::new(remote_ip, self.port);
                let stream = tokio::net::TcpStream::connect(addr).await?;
                let config = self.config.clone();
                let reporter = Arc::clone(&self.reporter);
                let dbus_state = self.dbus_state.clone();
                let active = Arc::clone(&self.active);
                tokio::spawn(async move {
                    if let Err(e) = session_task::run(stream, addr, config, reporter, dbus_state).await {
                        tracing::warn!("session ended with error: {e}");
                    }
                    active.store(false, Ordering::SeqCst);
                });
            }
        }
        Ok(())
    }
}

async fn accept_loop(
    listener: TcpListener,
    active: Arc<AtomicBool>,
    config: SourceConfig,
    reporter: SharedReporter,
    dbus_state: SourceState,
) {
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("accept failed: {e}");
                continue;
            }
        };

        if active.swap(true, Ordering::SeqCst) {
            tracing::warn!(%peer_addr, "refusing connection: a session is already active");
            drop(stream);
            continue;
        }

        tracing::info!(%peer_addr, "accepted sink connection");
        let config = config.clone();
        let reporter = Arc::clone(&reporter);
        let dbus_state = dbus_state.clone();
        let active = Arc::clone(&active);

        tokio::spawn(async move {
            if let Err(e) = session_task::run(stream, peer_addr, config, reporter, dbus_state).await {
                tracing::warn!(%peer_addr, "session ended with error: {e}");
            }
            active.store(false, Ordering::SeqCst);
            tracing::info!(%peer_addr, "session closed");
        });
    }
}
