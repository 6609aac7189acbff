//! D-Bus proxy for the aethercast-rs source daemon, used by an operator
//! CLI or settings UI.

use crate::types::{Capabilities, DeviceInfo};

#[zbus::proxy(
    interface = "rs.aethercast.Source1",
    default_service = "rs.aethercast.Source1",
    default_path = "/rs/aethercast/Source1"
)]
pub trait Source {
    /// Enables or disables the source; returns a taxonomy error code
    /// (`0` == success).
    fn enable(&self, enabled: bool) -> zbus::Result<u8>;

    fn scan(&self, timeout_secs: u32) -> zbus::Result<u8>;

    fn connect(&self, device: &str) -> zbus::Result<u8>;

    fn disconnect(&self, device: &str) -> zbus::Result<u8>;

    fn disconnect_all(&self) -> zbus::Result<u8>;

    fn get_devices(&self) -> zbus::Result<Vec<DeviceInfo>>;

    #[zbus(property)]
    fn state(&self) -> zbus::Result<u8>;

    #[zbus(property)]
    fn scanning(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn enabled(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn capabilities(&self) -> zbus::Result<Capabilities>;

    #[zbus(signal)]
    fn state_changed(&self, state: u8) -> zbus::Result<()>;

    #[zbus(signal)]
    fn peer_connected(&self, address: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn peer_disconnected(&self, address: &str) -> zbus::Result<()>;
}
