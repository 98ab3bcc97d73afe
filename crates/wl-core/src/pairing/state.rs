use serde::{Deserialize, Serialize};

/// Pairing session state machine
///
/// Design principle: this is a pure type state machine with only state
/// definitions and transition validation logic. Runtime behaviors like
/// timeouts and automatic state transitions are handled by the application
/// layer.
///
/// State transitions:
/// ```text
///   Initiated
///    │ challenge material handed to the shell
///    ▼
///   AwaitingUserConfirmation
///    │ user confirms the code / scans the QR
///    ▼
///   Verifying
///    │
///    ├── completion result: success ──► Succeeded
///    └── completion result: failure ──► Failed
///
/// Global rules:
///   any active state + TTL elapsed  ──► Expired
///   any active state + user cancel  ──► Cancelled
///   completion may also land while Initiated or AwaitingUserConfirmation
///   (the collaborator can resolve a session before the user interacts)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session created, challenge material not yet presented
    Initiated,

    /// Challenge shown; waiting for the user to confirm it
    AwaitingUserConfirmation,

    /// User confirmed; waiting for the transport to finish the handshake
    Verifying,

    /// Pairing completed successfully (terminal)
    Succeeded,

    /// Pairing failed (terminal)
    Failed,

    /// TTL elapsed before completion (terminal)
    Expired,

    /// Explicitly cancelled by the user (terminal)
    Cancelled,
}

impl SessionState {
    /// Check if this is a terminal state (no more transitions possible)
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Expired | Self::Cancelled
        )
    }

    /// Check if the session is still in flight
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Next state once the challenge material is handed to the shell
    pub fn on_present(self) -> Option<Self> {
        match self {
            Self::Initiated => Some(Self::AwaitingUserConfirmation),
            _ => None,
        }
    }

    /// Next state once the user confirms the presented challenge
    pub fn on_confirm(self) -> Option<Self> {
        match self {
            Self::AwaitingUserConfirmation => Some(Self::Verifying),
            _ => None,
        }
    }

    /// Next state when the collaborator reports a completion result.
    /// Valid from every active state: the remote side may resolve the
    /// handshake before the local user gets around to interacting.
    pub fn on_complete(self, success: bool) -> Option<Self> {
        if self.is_active() {
            Some(if success { Self::Succeeded } else { Self::Failed })
        } else {
            None
        }
    }

    /// Next state on explicit user cancellation
    pub fn on_cancel(self) -> Option<Self> {
        if self.is_active() {
            Some(Self::Cancelled)
        } else {
            None
        }
    }

    /// Mark state as expired
    pub fn expire(self) -> Self {
        if self.is_active() {
            Self::Expired
        } else {
            self
        }
    }
}
