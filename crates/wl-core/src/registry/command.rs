use serde::{Deserialize, Serialize};

use crate::ids::{DeviceId, SessionId};
use crate::pairing::PairingMethod;
use crate::timestamp::TimestampMs;

/// Tagged command variants forwarded by the host shell (and, for
/// `MarkSeen`, by the discovery collaborator). The wire shape mirrors the
/// shell's message channel: `{"command": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Rename {
        id: DeviceId,
        new_name: String,
    },
    CopyId {
        id: DeviceId,
    },
    Disconnect {
        id: DeviceId,
    },
    BeginPairing {
        method: PairingMethod,
        target_hint: String,
    },
    ConfirmPairing {
        session_id: SessionId,
    },
    CancelPairing {
        session_id: SessionId,
    },
    MarkSeen {
        id: DeviceId,
        at: TimestampMs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_shape() {
        let raw = r#"{"command":"rename","id":"iphone15pro","new_name":"Field iPhone"}"#;
        let parsed: Command = serde_json::from_str(raw).expect("command should parse");
        assert_eq!(
            parsed,
            Command::Rename {
                id: DeviceId::from("iphone15pro"),
                new_name: "Field iPhone".to_string(),
            }
        );
    }

    #[test]
    fn test_mark_seen_roundtrip() {
        let cmd = Command::MarkSeen {
            id: DeviceId::from("d1"),
            at: TimestampMs::from_epoch_millis(100),
        };
        let json = serde_json::to_string(&cmd).expect("serialize");
        let back: Command = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, cmd);
    }
}
