use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::ids::SessionId;
use crate::pairing::{PairingMethod, SessionState};
use crate::timestamp::TimestampMs;

/// Immutable point-in-time view of registry state handed to the projection
/// layer. Devices come pre-sorted in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub taken_at: TimestampMs,
    pub devices: Vec<Device>,
    pub sessions: Vec<SessionSummary>,
}

/// Live pairing session as seen by the shell. Challenge material is not
/// part of the snapshot; it travels once, in the pairing prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub method: PairingMethod,
    pub target_hint: String,
    pub state: SessionState,
    pub expires_at: TimestampMs,
}
