//! # wl-core
//!
//! Core domain models and business logic for Wirelink.
//!
//! This crate contains pure business logic without any infrastructure
//! dependencies. Time never comes from a global clock: every operation that
//! depends on it takes an explicit [`TimestampMs`].

// Public module exports
pub mod device;
pub mod ids;
pub mod pairing;
pub mod ports;
pub mod registry;
pub mod settings;
pub mod timestamp;
pub mod view;

// Re-export commonly used types at the crate root
pub use device::{Device, DeviceState};
pub use ids::{DeviceId, SessionId};
pub use pairing::{PairingMethod, PairingResult, PairingSession, SessionState};
pub use registry::{Command, DeviceRegistry, RegistryError, RegistrySnapshot};
pub use settings::Settings;
pub use timestamp::TimestampMs;
