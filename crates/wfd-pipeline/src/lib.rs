//! Buffer Queue & Pool (C5) and Pipeline Scheduler (C6): binds the
//! capture, encode, and send stages to isolated workers and manages
//! their lifecycle atomically.

pub mod error;
pub mod media_sender;
pub mod pipeline;
pub mod scheduler;
pub mod stages;
pub mod worker;

pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use scheduler::Scheduler;
pub use worker::{Executable, Worker};
