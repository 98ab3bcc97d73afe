//! Device registry: single source of truth for device and session state.

pub mod command;
pub mod error;
pub mod registry;
pub mod snapshot;

pub use command::Command;
pub use error::RegistryError;
pub use registry::DeviceRegistry;
pub use snapshot::{RegistrySnapshot, SessionSummary};
