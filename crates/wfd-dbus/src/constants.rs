//! D-Bus service identity (spec §6).

/// D-Bus service name for the aethercast-rs source daemon.
pub const SERVICE_NAME: &str = "rs.aethercast.Source1";

/// D-Bus object path for the aethercast-rs source daemon.
pub const OBJECT_PATH: &str = "/rs/aethercast/Source1";
