//! Operator system-bus facade (spec §6): the `enable`/`scan`/`connect`/
//! `disconnect`/`disconnect_all` surface plus read-only status
//! properties.

pub mod client;
pub mod constants;
pub mod server;
pub mod types;

pub use client::SourceProxy;
pub use constants::{OBJECT_PATH, SERVICE_NAME};
pub use server::{OperatorCommand, OperatorReply, SourceInterface, SourceState};
pub use types::{Capabilities, ConnectionState, DeviceInfo};
