use serde::{Deserialize, Serialize};
use zbus::zvariant::Type;

/// Overall connection state of the source (spec §6 operator surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[repr(u8)]
pub enum ConnectionState {
    Idle = 0,
    Failure = 1,
    Connecting = 2,
    Configuration = 3,
    Association = 4,
    Connected = 5,
    Disconnected = 6,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Failure => "failure",
            Self::Connecting => "connecting",
            Self::Configuration => "configuration",
            Self::Association => "association",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{s}")
    }
}

/// `capabilities` property: the roles this build supports. aethercast-rs
/// only ever advertises `source`; `sink` is carried for wire
/// compatibility with the reference property set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct Capabilities {
    pub source: bool,
    pub sink: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { source: true, sink: false }
    }
}

/// A discovered peer, reported by `scan()` and by `connect()`'s device
/// argument.
#[derive(Debug, Clone, Serialize, Deserialize, Type)]
pub struct DeviceInfo {
    /// P2P device address, e.g. a MAC address string.
    pub address: String,
    pub name: String,
    pub connected: bool,
}
