//! Maps operator D-Bus commands onto the Connection Manager (spec §6).
//!
//! `scan` and `connect` assume an address-based link layer rather than
//! modeling real Wi-Fi P2P discovery (out of scope per spec §1); `scan`
//! is a no-op that reports success after its timeout elapses, and
//! `connect(device)` treats `device` as a dialable `ip:port` or bare IP.

use std::net::IpAddr;
use std::str::FromStr;

use wfd_core::Error as CoreError;
use wfd_dbus::{ConnectionState, OperatorCommand, SourceState};

use crate::connection_manager::ConnectionManager;
use crate::link_layer::{LinkLayerEvent, PeerRole};

pub async fn run(
    mut cmd_rx: tokio::sync::mpsc::Receiver<OperatorCommand>,
    mut manager: ConnectionManager,
    dbus_state: SourceState,
) {
    while let Some(command) = cmd_rx.recv().await {
        match command {
            OperatorCommand::Enable(enabled, reply) => {
                dbus_state.set_enabled(enabled).await;
                if !enabled {
                    dbus_state.set_state(ConnectionState::Idle).await;
                }
                let _ = reply.send(Ok(()));
            }

            OperatorCommand::Scan(timeout, reply) => {
                dbus_state.set_scanning(true).await;
                tokio::time::sleep(timeout).await;
                dbus_state.set_scanning(false).await;
                let _ = reply.send(Ok(()));
            }

            OperatorCommand::Connect(device, reply) => {
                let result = connect(&mut manager, &device).await;
                let _ = reply.send(result);
            }

            OperatorCommand::Disconnect(_device, reply) => {
                manager.handle_event(LinkLayerEvent::PeerDisconnected).await.ok();
                dbus_state.set_state(ConnectionState::Disconnected).await;
                let _ = reply.send(Ok(()));
            }

            OperatorCommand::DisconnectAll(reply) => {
                manager.handle_event(LinkLayerEvent::PeerDisconnected).await.ok();
                dbus_state.set_state(ConnectionState::Disconnected).await;
                let _ = reply.send(Ok(()));
            }
        }
    }
}

async fn connect(manager: &mut ConnectionManager, device: &str) -> Result<(), CoreError> {
    let remote_ip = IpAddr::from_str(device).map_err(|_| CoreError::ParamInvalid(device.to_string()))?;
    let local_ip = IpAddr::from([0, 0, 0, 0]);

    manager
        .handle_event(LinkLayerEvent::PeerConnected {
            role: PeerRole::GroupClient,
            local_ip,
            remote_ip,
        })
        .await
        .map_err(|_| CoreError::Failed)
}
