use serde::{Deserialize, Serialize};

/// Device connection state machine
///
/// Design principle: this is a pure type state machine with only state
/// definitions and transition validation logic. What actually drives the
/// transitions (beacons, pairing resolution, user commands) lives in the
/// registry and the application layer.
///
/// State transitions:
/// ```text
///   Available ──ConfirmPairing──► Connecting ──PairingSucceeded──► Connected
///       ▲                             │                                │
///       │◄──PairingFailed/Cancelled───┘                                │
///       │                                                              │
///       │◄───────────Disconnect (device still discoverable)────────────┤
///       │                                                              │
///   Disconnected ◄───Disconnect (device no longer discoverable)────────┘
///       │
///       └──Beacon (re-discovery)──► Available
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    /// Currently discoverable, not connected
    Available,

    /// Pairing confirmed by the user, connection being established
    Connecting,

    /// Paired and connected
    Connected,

    /// Explicitly disconnected while no longer beaconing; only
    /// re-discovery brings the device back
    Disconnected,
}

impl DeviceState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Next state after an explicit disconnect, if one is allowed.
    /// Only a connected device can be disconnected; where it lands depends
    /// on whether it is still beaconing.
    pub fn on_disconnect(self, discoverable: bool) -> Option<Self> {
        match self {
            Self::Connected if discoverable => Some(Self::Available),
            Self::Connected => Some(Self::Disconnected),
            _ => None,
        }
    }

    /// Next state after a discovery beacon. Lifts `Disconnected` back to
    /// `Available`; every other state is unaffected by beacons.
    pub fn on_beacon(self) -> Self {
        match self {
            Self::Disconnected => Self::Available,
            other => other,
        }
    }

    /// Next state when the user confirms a pairing challenge for this
    /// device, if the device can enter the connecting phase.
    pub fn on_pairing_confirmed(self) -> Option<Self> {
        match self {
            Self::Available => Some(Self::Connecting),
            _ => None,
        }
    }

    /// Next state when a pairing session for this device resolves without
    /// success. Rolls back the connecting phase; settled states stay put.
    pub fn on_pairing_abandoned(self) -> Self {
        match self {
            Self::Connecting => Self::Available,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_only_from_connected() {
        assert_eq!(
            DeviceState::Connected.on_disconnect(true),
            Some(DeviceState::Available)
        );
        assert_eq!(
            DeviceState::Connected.on_disconnect(false),
            Some(DeviceState::Disconnected)
        );

        assert!(DeviceState::Available.on_disconnect(true).is_none());
        assert!(DeviceState::Connecting.on_disconnect(true).is_none());
        assert!(DeviceState::Disconnected.on_disconnect(false).is_none());
    }

    #[test]
    fn test_beacon_revives_disconnected() {
        assert_eq!(DeviceState::Disconnected.on_beacon(), DeviceState::Available);

        // Beacons never disturb live states
        assert_eq!(DeviceState::Available.on_beacon(), DeviceState::Available);
        assert_eq!(DeviceState::Connecting.on_beacon(), DeviceState::Connecting);
        assert_eq!(DeviceState::Connected.on_beacon(), DeviceState::Connected);
    }

    #[test]
    fn test_pairing_confirmed_enters_connecting() {
        assert_eq!(
            DeviceState::Available.on_pairing_confirmed(),
            Some(DeviceState::Connecting)
        );
        assert!(DeviceState::Connected.on_pairing_confirmed().is_none());
        assert!(DeviceState::Disconnected.on_pairing_confirmed().is_none());
    }

    #[test]
    fn test_pairing_abandoned_rolls_back_connecting_only() {
        assert_eq!(
            DeviceState::Connecting.on_pairing_abandoned(),
            DeviceState::Available
        );
        assert_eq!(
            DeviceState::Connected.on_pairing_abandoned(),
            DeviceState::Connected
        );
        assert_eq!(
            DeviceState::Disconnected.on_pairing_abandoned(),
            DeviceState::Disconnected
        );
    }
}
