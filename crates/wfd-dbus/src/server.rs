//! D-Bus interface implementation for the aethercast-rs source daemon
//! (spec §6 "Operator surface").

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, RwLock};
use zbus::interface;

use crate::types::{Capabilities, ConnectionState, DeviceInfo};

/// Shared state exposed over D-Bus, mutated by the connection manager as
/// link-layer and session events occur.
#[derive(Debug, Clone)]
pub struct SourceState {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug)]
struct Inner {
    state: ConnectionState,
    scanning: bool,
    enabled: bool,
    capabilities: Capabilities,
    devices: Vec<DeviceInfo>,
}

impl SourceState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state: ConnectionState::Idle,
                scanning: false,
                enabled: false,
                capabilities: Capabilities::default(),
                devices: Vec::new(),
            })),
        }
    }

    pub async fn set_state(&self, state: ConnectionState) {
        self.inner.write().await.state = state;
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.read().await.state
    }

    pub async fn set_scanning(&self, scanning: bool) {
        self.inner.write().await.scanning = scanning;
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.inner.write().await.enabled = enabled;
    }

    pub async fn set_devices(&self, devices: Vec<DeviceInfo>) {
        self.inner.write().await.devices = devices;
    }
}

impl Default for SourceState {
    fn default() -> Self {
        Self::new()
    }
}

/// The reply every operator command carries back: `Ok(())` maps to the
/// wire's `0`, an `Err` maps to its taxonomy code.
pub type OperatorReply = oneshot::Sender<Result<(), wfd_core::Error>>;

/// Commands relayed from the D-Bus interface to the connection manager.
/// Each carries a reply channel so the D-Bus method can return the
/// taxonomy error code synchronously, per spec §7 ("operator commands
/// return an error from the taxonomy synchronously").
#[derive(Debug)]
pub enum OperatorCommand {
    Enable(bool, OperatorReply),
    Scan(Duration, OperatorReply),
    Connect(String, OperatorReply),
    Disconnect(String, OperatorReply),
    DisconnectAll(OperatorReply),
}

/// Maps the taxonomy to the small integer the D-Bus wire carries.
/// `0` is success.
fn error_code(result: &Result<(), wfd_core::Error>) -> u8 {
    let Err(e) = result else { return 0 };
    match e {
        wfd_core::Error::Failed => 1,
        wfd_core::Error::Already => 2,
        wfd_core::Error::ParamInvalid(_) => 3,
        wfd_core::Error::InvalidState => 4,
        wfd_core::Error::NotConnected => 5,
        wfd_core::Error::NotReady => 6,
        wfd_core::Error::InProgress => 7,
        wfd_core::Error::Timeout => 8,
        wfd_core::Error::RemoteClosedConnection => 9,
    }
}

pub struct SourceInterface {
    state: SourceState,
    cmd_tx: tokio::sync::mpsc::Sender<OperatorCommand>,
}

impl SourceInterface {
    #[must_use]
    pub fn new(state: SourceState, cmd_tx: tokio::sync::mpsc::Sender<OperatorCommand>) -> Self {
        Self { state, cmd_tx }
    }

    async fn dispatch<F>(&self, build: F) -> u8
    where
        F: FnOnce(OperatorReply) -> OperatorCommand,
    {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(build(tx)).await.is_err() {
            return error_code(&Err(wfd_core::Error::Failed));
        }
        match rx.await {
            Ok(result) => error_code(&result),
            Err(_) => error_code(&Err(wfd_core::Error::Failed)),
        }
    }
}

#[interface(name = "rs.aethercast.Source1")]
impl SourceInterface {
    /// Enables or disables the source. Returns `0` on success, otherwise
    /// a taxonomy error code (spec §7).
    async fn enable(&self, enabled: bool) -> u8 {
        self.dispatch(|tx| OperatorCommand::Enable(enabled, tx)).await
    }

    /// Starts a scan for nearby sinks, for up to `timeout_secs` seconds.
    async fn scan(&self, timeout_secs: u32) -> u8 {
        self.dispatch(|tx| OperatorCommand::Scan(Duration::from_secs(u64::from(timeout_secs)), tx))
            .await
    }

    /// Connects to a previously discovered device address.
    async fn connect(&self, device: String) -> u8 {
        self.dispatch(|tx| OperatorCommand::Connect(device, tx)).await
    }

    /// Disconnects a specific device address.
    async fn disconnect(&self, device: String) -> u8 {
        self.dispatch(|tx| OperatorCommand::Disconnect(device, tx)).await
    }

    /// Tears down every active session.
    async fn disconnect_all(&self) -> u8 {
        self.dispatch(OperatorCommand::DisconnectAll).await
    }

    /// Lists devices seen since the last scan.
    async fn get_devices(&self) -> Vec<DeviceInfo> {
        self.state.inner.read().await.devices.clone()
    }

    #[zbus(property)]
    async fn state(&self) -> u8 {
        self.state.inner.read().await.state as u8
    }

    #[zbus(property)]
    async fn scanning(&self) -> bool {
        self.state.inner.read().await.scanning
    }

    #[zbus(property)]
    async fn enabled(&self) -> bool {
        self.state.inner.read().await.enabled
    }

    #[zbus(property)]
    async fn capabilities(&self) -> Capabilities {
        self.state.inner.read().await.capabilities
    }

    /// Emitted whenever `state` changes.
    #[zbus(signal)]
    pub async fn state_changed(
        signal_ctxt: &zbus::object_server::SignalEmitter<'_>,
        state: u8,
    ) -> zbus::Result<()>;

    /// Emitted when a sink connects.
    #[zbus(signal)]
    pub async fn peer_connected(
        signal_ctxt: &zbus::object_server::SignalEmitter<'_>,
        address: &str,
    ) -> zbus::Result<()>;

    /// Emitted when a sink disconnects.
    #[zbus(signal)]
    pub async fn peer_disconnected(
        signal_ctxt: &zbus::object_server::SignalEmitter<'_>,
        address: &str,
    ) -> zbus::Result<()>;
}
