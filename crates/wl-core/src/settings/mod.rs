//! Settings model and defaults.

pub mod defaults;
pub mod model;

pub use model::{PairingSettings, Settings, CURRENT_SCHEMA_VERSION};
