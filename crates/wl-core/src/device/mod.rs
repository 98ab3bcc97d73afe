//! Device domain models.

pub mod device;
pub mod state;

pub use device::Device;
pub use state::DeviceState;
