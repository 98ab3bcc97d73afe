use std::time::Duration;

use super::model::*;

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(120),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            pairing: PairingSettings::default(),
        }
    }
}
