//! Shared building blocks for the aethercast-rs Wi-Fi Display source:
//! the error taxonomy (§7), the `Reporter` telemetry trait, and the
//! wire-level constants quoted throughout the other crates.

pub mod error;
pub mod queue;
pub mod reporter;
pub mod wire;

pub use error::Error;
pub use queue::BufferQueue;
pub use reporter::{LogReporter, LttngReporter, NullReporter, Reporter, SharedReporter};
