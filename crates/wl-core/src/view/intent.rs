use serde::{Deserialize, Serialize};

use crate::ids::{DeviceId, SessionId};
use crate::pairing::PairingMethod;
use crate::registry::Command;
use crate::timestamp::TimestampMs;

/// Interaction events raised by the rendered device list and pair panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum UserIntent {
    Rename { id: DeviceId, new_name: String },
    CopyId { id: DeviceId },
    Disconnect { id: DeviceId },
    /// The user picked a pairing method in the pair panel
    ChoosePairMethod {
        method: PairingMethod,
        target_hint: String,
    },
    ConfirmPairing { session_id: SessionId },
    CancelPairing { session_id: SessionId },
    /// Discovery beacon relayed by the host channel
    BeaconObserved { id: DeviceId, at: TimestampMs },
}

/// Translate an interaction event into its registry command, 1:1 with no
/// additional logic. (Opening the pair panel itself is host chrome and
/// never reaches the registry.)
pub fn command_for(intent: UserIntent) -> Command {
    match intent {
        UserIntent::Rename { id, new_name } => Command::Rename { id, new_name },
        UserIntent::CopyId { id } => Command::CopyId { id },
        UserIntent::Disconnect { id } => Command::Disconnect { id },
        UserIntent::ChoosePairMethod {
            method,
            target_hint,
        } => Command::BeginPairing {
            method,
            target_hint,
        },
        UserIntent::ConfirmPairing { session_id } => Command::ConfirmPairing { session_id },
        UserIntent::CancelPairing { session_id } => Command::CancelPairing { session_id },
        UserIntent::BeaconObserved { id, at } => Command::MarkSeen { id, at },
    }
}
