//! Process-wide tracing setup shared by the binaries.

pub mod tracing;

pub use tracing::{init, init_with, LogFormat};
