use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use wl_core::ids::{DeviceId, SessionId};
use wl_core::pairing::{PairingMethod, SessionState};
use wl_core::registry::RegistrySnapshot;

/// Events pushed to the host shell. The wire shape mirrors the shell's
/// message channel: `{"event": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ShellEvent {
    /// A mutation went through; re-project and re-render.
    SnapshotChanged { snapshot: RegistrySnapshot },

    /// The user asked for a device id; the clipboard is host-owned.
    CopyDeviceId { id: DeviceId },

    /// Challenge material ready for the pair panel to render.
    PairingPrompt {
        session_id: SessionId,
        method: PairingMethod,
        secret: String,
    },

    /// A pairing session reached a terminal state.
    PairingResolved {
        session_id: SessionId,
        state: SessionState,
    },

    /// A command was rejected; surfaced as a transient notification.
    CommandRejected { reason: String },
}

#[async_trait]
pub trait ShellEventPort: Send + Sync {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<ShellEvent>>;
}
