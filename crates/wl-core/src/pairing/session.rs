use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::SessionState;
use crate::ids::SessionId;
use crate::timestamp::TimestampMs;

/// How the user wants to pair the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMethod {
    /// 6-digit code typed on the remote device
    Code,
    /// QR payload scanned by the remote device
    Qr,
}

/// Challenge material generated for a session.
///
/// Placeholder secrets only: no cryptographic handshake is performed, the
/// shell just renders this for the user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingChallenge {
    Code { digits: String },
    Qr { token: String },
}

impl PairingChallenge {
    pub fn generate(method: PairingMethod) -> Self {
        match method {
            PairingMethod::Code => {
                let digits: u32 = rand::rng().random_range(0..1_000_000);
                Self::Code {
                    digits: format!("{digits:06}"),
                }
            }
            PairingMethod::Qr => Self::Qr {
                token: uuid::Uuid::new_v4().simple().to_string(),
            },
        }
    }

    /// The string the shell renders (code digits or QR payload).
    pub fn secret(&self) -> &str {
        match self {
            Self::Code { digits } => digits,
            Self::Qr { token } => token,
        }
    }
}

// Challenge material stays out of logs and debug dumps.
impl fmt::Debug for PairingChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code { .. } => f.debug_struct("Code").field("digits", &"[REDACTED]").finish(),
            Self::Qr { .. } => f.debug_struct("Qr").field("token", &"[REDACTED]").finish(),
        }
    }
}

/// What the shell needs to render a pairing prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengePresentation {
    pub session_id: SessionId,
    pub method: PairingMethod,
    pub secret: String,
}

/// Completion result reported by the discovery collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingResult {
    Success {
        /// Name announced by the remote device, if any
        device_name: Option<String>,
        /// Transport the connection was established over, if known
        transport_hint: Option<String>,
    },
    Failure {
        reason: String,
    },
}

impl PairingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A bounded-lifetime negotiation with a target device.
///
/// Ephemeral: lives in the registry only while active and is evicted the
/// moment it reaches a terminal state.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingSession {
    pub id: SessionId,
    pub method: PairingMethod,
    /// Opaque handle naming the pairing target (the device id for targets
    /// surfaced by discovery).
    pub target_hint: String,
    challenge: PairingChallenge,
    pub created_at: TimestampMs,
    pub expires_at: TimestampMs,
    pub state: SessionState,
}

impl PairingSession {
    pub fn begin(
        method: PairingMethod,
        target_hint: impl Into<String>,
        now: TimestampMs,
        ttl: Duration,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            method,
            target_hint: target_hint.into(),
            challenge: PairingChallenge::generate(method),
            created_at: now,
            expires_at: now.offset_by(ttl),
            state: SessionState::Initiated,
        }
    }

    pub fn challenge(&self) -> &PairingChallenge {
        &self.challenge
    }

    pub fn presentation(&self) -> ChallengePresentation {
        ChallengePresentation {
            session_id: self.id.clone(),
            method: self.method,
            secret: self.challenge.secret().to_string(),
        }
    }

    pub fn is_expired(&self, now: TimestampMs) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for PairingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingSession")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("target_hint", &self.target_hint)
            .field("challenge", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("state", &self.state)
            .finish()
    }
}
