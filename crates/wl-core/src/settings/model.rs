use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub schema_version: u32,

    #[serde(default)]
    pub pairing: PairingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingSettings {
    /// How long a pairing session may stay unresolved before it expires.
    pub session_ttl: Duration,
}
