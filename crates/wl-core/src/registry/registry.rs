use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

use super::error::RegistryError;
use super::snapshot::{RegistrySnapshot, SessionSummary};
use crate::device::{Device, DeviceState};
use crate::ids::{DeviceId, SessionId};
use crate::pairing::{
    ChallengePresentation, PairingMethod, PairingResult, PairingSession, SessionState,
};
use crate::settings::PairingSettings;
use crate::timestamp::TimestampMs;

/// Single source of truth for device and pairing-session state.
///
/// All mutations go through the methods below and are expected to be
/// serialized by the caller (the application layer runs them from one
/// command loop). Every operation is synchronous and in-memory.
///
/// Invariant: the session map only ever holds active sessions — a session
/// is evicted the moment it reaches a terminal state.
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, Device>,
    sessions: HashMap<SessionId, PairingSession>,
    session_ttl: Duration,
}

impl DeviceRegistry {
    pub fn new(settings: &PairingSettings) -> Self {
        Self {
            devices: HashMap::new(),
            sessions: HashMap::new(),
            session_ttl: settings.session_ttl,
        }
    }

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn session(&self, id: &SessionId) -> Option<&PairingSession> {
        self.sessions.get(id)
    }

    /// Devices in the given state, most recently seen first, never-seen
    /// devices last, ties broken by id so the order is deterministic.
    pub fn list_by_state(&self, state: DeviceState) -> Vec<&Device> {
        let mut devices: Vec<&Device> = self
            .devices
            .values()
            .filter(|device| device.state == state)
            .collect();
        devices.sort_by(|a, b| a.display_cmp(b));
        devices
    }

    /// Apply a discovery beacon. Unknown ids materialize a fresh
    /// `Available` device; known ids merge under the monotonic-max policy,
    /// so stale beacons are ignored and arrival order does not matter.
    /// Returns whether the registry changed.
    pub fn mark_seen(&mut self, id: DeviceId, at: TimestampMs) -> bool {
        match self.devices.entry(id) {
            Entry::Occupied(mut entry) => entry.get_mut().mark_seen(at),
            Entry::Vacant(entry) => {
                let id = entry.key().clone();
                entry.insert(Device::discovered(id, at));
                true
            }
        }
    }

    /// Rename a device. The new name is trimmed; a name that is empty after
    /// trimming is rejected and the registry is left untouched. `last_seen`
    /// is not a rename concern and stays as it was.
    pub fn rename(&mut self, id: &DeviceId, new_name: &str) -> Result<&Device, RegistryError> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "device name must not be empty".to_string(),
            ));
        }
        let device = self.devices.get_mut(id).ok_or(RegistryError::NotFound)?;
        device.display_name = trimmed.to_string();
        Ok(device)
    }

    /// Disconnect a connected device. Lands in `Available` while the device
    /// is still beaconing, `Disconnected` otherwise. Not retry-idempotent:
    /// a second call fails with `InvalidState`.
    pub fn disconnect(&mut self, id: &DeviceId) -> Result<(), RegistryError> {
        let device = self.devices.get_mut(id).ok_or(RegistryError::NotFound)?;
        let next = device
            .state
            .on_disconnect(device.discoverable)
            .ok_or_else(|| {
                RegistryError::InvalidState(format!("device {id} is not connected"))
            })?;
        device.state = next;
        Ok(())
    }

    /// Start a pairing session for `target_hint`. At most one live session
    /// per hint; a session that already expired no longer counts and is
    /// swept out of the way here.
    pub fn begin_pairing(
        &mut self,
        method: PairingMethod,
        target_hint: &str,
        now: TimestampMs,
    ) -> Result<&PairingSession, RegistryError> {
        if let Some(existing) = self
            .sessions
            .values()
            .find(|session| session.target_hint == target_hint)
        {
            if !existing.is_expired(now) {
                return Err(RegistryError::AlreadyPairing {
                    target_hint: target_hint.to_string(),
                });
            }
            let stale = existing.id.clone();
            self.evict(&stale, SessionState::Expired);
        }

        let session = PairingSession::begin(method, target_hint, now, self.session_ttl);
        #[cfg(feature = "tracing")]
        debug!(session_id = %session.id, target_hint, "pairing session started");
        Ok(self.sessions.entry(session.id.clone()).or_insert(session))
    }

    /// Hand the challenge material to the shell for rendering, moving the
    /// session to `AwaitingUserConfirmation`.
    pub fn present_challenge(
        &mut self,
        session_id: &SessionId,
        now: TimestampMs,
    ) -> Result<ChallengePresentation, RegistryError> {
        let session = self.live_session(session_id, now)?;
        session.state = session
            .state
            .on_present()
            .ok_or_else(|| RegistryError::InvalidState("challenge already presented".to_string()))?;
        Ok(session.presentation())
    }

    /// The user confirmed the presented challenge: session moves to
    /// `Verifying` and a known, available target device enters `Connecting`.
    pub fn confirm_pairing(
        &mut self,
        session_id: &SessionId,
        now: TimestampMs,
    ) -> Result<(), RegistryError> {
        let session = self.live_session(session_id, now)?;
        session.state = session.state.on_confirm().ok_or_else(|| {
            RegistryError::InvalidState("pairing is not awaiting confirmation".to_string())
        })?;

        let target = DeviceId::from(session.target_hint.as_str());
        if let Some(device) = self.devices.get_mut(&target) {
            if let Some(next) = device.state.on_pairing_confirmed() {
                device.state = next;
            }
        }
        Ok(())
    }

    /// Resolve a session with the collaborator's completion result.
    ///
    /// Success upserts the target device into `Connected` with `last_seen`
    /// refreshed; failure rolls a `Connecting` target back to `Available`.
    /// Either way the session is evicted, freeing its hint.
    pub fn complete_pairing(
        &mut self,
        session_id: &SessionId,
        result: PairingResult,
        now: TimestampMs,
    ) -> Result<Option<&Device>, RegistryError> {
        self.live_session(session_id, now)?;
        let session = match self.sessions.remove(session_id) {
            Some(session) => session,
            None => return Err(RegistryError::SessionNotFound),
        };

        match result {
            PairingResult::Success {
                device_name,
                transport_hint,
            } => {
                #[cfg(feature = "tracing")]
                info!(session_id = %session.id, target_hint = %session.target_hint, "pairing succeeded");

                let id = DeviceId::from(session.target_hint.as_str());
                let device = match self.devices.entry(id.clone()) {
                    Entry::Occupied(entry) => {
                        let device = entry.into_mut();
                        device.connected_at(now);
                        device
                    }
                    Entry::Vacant(entry) => entry.insert(Device {
                        id,
                        display_name: session.target_hint.clone(),
                        state: DeviceState::Connected,
                        last_seen: Some(now),
                        transport_hint: String::new(),
                        discoverable: false,
                    }),
                };
                if let Some(name) = device_name {
                    device.display_name = name;
                }
                if let Some(hint) = transport_hint {
                    device.transport_hint = hint;
                }
                Ok(Some(device))
            }
            PairingResult::Failure {
                reason: _reason,
            } => {
                #[cfg(feature = "tracing")]
                info!(session_id = %session.id, reason = %_reason, "pairing failed");
                self.abandon_target(&session.target_hint);
                Ok(None)
            }
        }
    }

    /// Explicit user cancellation. Cooperative: only takes effect here, at
    /// command-processing time, and only from non-terminal states.
    pub fn cancel_pairing(
        &mut self,
        session_id: &SessionId,
        now: TimestampMs,
    ) -> Result<(), RegistryError> {
        self.live_session(session_id, now)?;
        self.evict(session_id, SessionState::Cancelled);
        Ok(())
    }

    /// Expire every live session past its deadline. Not an error path: the
    /// transitions are logged and the expired ids returned for the caller
    /// to notify with.
    pub fn sweep_expired(&mut self, now: TimestampMs) -> Vec<SessionId> {
        let expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| session.is_expired(now))
            .map(|session| session.id.clone())
            .collect();
        for id in &expired {
            #[cfg(feature = "tracing")]
            info!(session_id = %id, "pairing session expired");
            self.evict(id, SessionState::Expired);
        }
        expired
    }

    /// Immutable point-in-time copy for projection: devices in display
    /// order plus summaries of the live sessions.
    pub fn snapshot(&self, taken_at: TimestampMs) -> RegistrySnapshot {
        let mut devices: Vec<Device> = self.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.display_cmp(b));

        let mut sessions: Vec<SessionSummary> = self
            .sessions
            .values()
            .map(|session| SessionSummary {
                id: session.id.clone(),
                method: session.method,
                target_hint: session.target_hint.clone(),
                state: session.state,
                expires_at: session.expires_at,
            })
            .collect();
        sessions.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));

        RegistrySnapshot {
            taken_at,
            devices,
            sessions,
        }
    }

    /// Look up a session that is still live, expiring it on the spot when
    /// its deadline already passed.
    fn live_session(
        &mut self,
        session_id: &SessionId,
        now: TimestampMs,
    ) -> Result<&mut PairingSession, RegistryError> {
        if !self.sessions.contains_key(session_id) {
            return Err(RegistryError::SessionNotFound);
        }
        let expired = self
            .sessions
            .get(session_id)
            .map_or(false, |session| session.is_expired(now));
        if expired {
            self.evict(session_id, SessionState::Expired);
            return Err(RegistryError::SessionExpired);
        }
        self.sessions
            .get_mut(session_id)
            .ok_or(RegistryError::SessionNotFound)
    }

    /// Remove a session in the given terminal state, rolling back its
    /// target device when the resolution was not a success.
    fn evict(&mut self, session_id: &SessionId, terminal: SessionState) {
        if let Some(session) = self.sessions.remove(session_id) {
            if terminal != SessionState::Succeeded {
                self.abandon_target(&session.target_hint);
            }
        }
    }

    fn abandon_target(&mut self, target_hint: &str) {
        if let Some(device) = self.devices.get_mut(&DeviceId::from(target_hint)) {
            device.state = device.state.on_pairing_abandoned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> TimestampMs {
        TimestampMs::from_epoch_millis(ms)
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::new(&PairingSettings::default())
    }

    fn success() -> PairingResult {
        PairingResult::Success {
            device_name: None,
            transport_hint: None,
        }
    }

    fn failure(reason: &str) -> PairingResult {
        PairingResult::Failure {
            reason: reason.to_string(),
        }
    }

    // =========================================================================
    // mark_seen
    // =========================================================================

    #[test]
    fn test_mark_seen_is_order_independent() {
        let timestamps = [100, 50, 200, 150, 200, 10];
        // Whatever order the beacons land in, the max wins.
        for rotation in 0..timestamps.len() {
            let mut reg = registry();
            for i in 0..timestamps.len() {
                let t = timestamps[(rotation + i) % timestamps.len()];
                reg.mark_seen(DeviceId::from("d1"), at(t));
            }
            let device = reg.device(&DeviceId::from("d1")).expect("device exists");
            assert_eq!(device.last_seen, Some(at(200)));
        }
    }

    #[test]
    fn test_mark_seen_materializes_available_device() {
        let mut reg = registry();
        assert!(reg.mark_seen(DeviceId::from("d1"), at(100)));

        let listed = reg.list_by_state(DeviceState::Available);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, DeviceId::from("d1"));
        assert_eq!(listed[0].last_seen, Some(at(100)));
    }

    #[test]
    fn test_stale_beacon_reports_no_change() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("d1"), at(100));
        assert!(!reg.mark_seen(DeviceId::from("d1"), at(40)));
    }

    // =========================================================================
    // rename
    // =========================================================================

    #[test]
    fn test_rename_trims_and_keeps_last_seen() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("d1"), at(100));

        let device = reg
            .rename(&DeviceId::from("d1"), "  Field iPhone  ")
            .expect("rename succeeds");
        assert_eq!(device.display_name, "Field iPhone");
        assert_eq!(device.last_seen, Some(at(100)));
    }

    #[test]
    fn test_rename_rejects_blank_names() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("d1"), at(100));

        for blank in ["", "   ", "\t\n"] {
            let err = reg.rename(&DeviceId::from("d1"), blank).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidArgument(_)));
        }
        // Failed calls leave the registry unchanged
        let device = reg.device(&DeviceId::from("d1")).expect("device exists");
        assert_eq!(device.display_name, "d1");
    }

    #[test]
    fn test_rename_unknown_device() {
        let mut reg = registry();
        assert_eq!(
            reg.rename(&DeviceId::from("ghost"), "name").unwrap_err(),
            RegistryError::NotFound
        );
    }

    // =========================================================================
    // disconnect
    // =========================================================================

    fn connect(reg: &mut DeviceRegistry, id: &str, now: TimestampMs) {
        let session = reg
            .begin_pairing(PairingMethod::Code, id, now)
            .expect("begin")
            .id
            .clone();
        reg.complete_pairing(&session, success(), now).expect("complete");
    }

    #[test]
    fn test_disconnect_discoverable_device_returns_to_available() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("d1"), at(100));
        connect(&mut reg, "d1", at(200));

        reg.disconnect(&DeviceId::from("d1")).expect("disconnect");
        assert_eq!(
            reg.device(&DeviceId::from("d1")).map(|d| d.state),
            Some(DeviceState::Available)
        );
    }

    #[test]
    fn test_disconnect_non_discoverable_device_is_terminal() {
        let mut reg = registry();
        // Paired without ever being discovered: not beaconing
        connect(&mut reg, "d1", at(200));

        reg.disconnect(&DeviceId::from("d1")).expect("disconnect");
        assert_eq!(
            reg.device(&DeviceId::from("d1")).map(|d| d.state),
            Some(DeviceState::Disconnected)
        );
    }

    #[test]
    fn test_disconnect_is_not_retry_idempotent() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("d1"), at(100));
        connect(&mut reg, "d1", at(200));

        reg.disconnect(&DeviceId::from("d1")).expect("first disconnect");
        let err = reg.disconnect(&DeviceId::from("d1")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidState(_)));
    }

    #[test]
    fn test_disconnect_available_device_fails() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("d1"), at(100));
        let err = reg.disconnect(&DeviceId::from("d1")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidState(_)));
    }

    // =========================================================================
    // ordering
    // =========================================================================

    #[test]
    fn test_list_by_state_orders_most_recent_first() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("samsungs24"), at(1_000));
        reg.mark_seen(DeviceId::from("macbookpro"), at(3_000));
        reg.mark_seen(DeviceId::from("ipadair"), at(2_000));

        let ids: Vec<&str> = reg
            .list_by_state(DeviceState::Available)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, ["macbookpro", "ipadair", "samsungs24"]);
    }

    #[test]
    fn test_list_by_state_breaks_ties_by_id() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("b"), at(1_000));
        reg.mark_seen(DeviceId::from("a"), at(1_000));
        reg.mark_seen(DeviceId::from("c"), at(1_000));

        let ids: Vec<&str> = reg
            .list_by_state(DeviceState::Available)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    // =========================================================================
    // pairing sessions
    // =========================================================================

    #[test]
    fn test_begin_pairing_rejects_duplicate_hint() {
        let mut reg = registry();
        reg.begin_pairing(PairingMethod::Code, "d1", at(0)).expect("first");

        let err = reg.begin_pairing(PairingMethod::Qr, "d1", at(1)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyPairing {
                target_hint: "d1".to_string()
            }
        );

        // A different hint is fine concurrently
        reg.begin_pairing(PairingMethod::Code, "d2", at(1)).expect("second hint");
    }

    #[test]
    fn test_begin_pairing_hint_freed_after_cancel() {
        let mut reg = registry();
        let session = reg
            .begin_pairing(PairingMethod::Code, "d1", at(0))
            .expect("begin")
            .id
            .clone();
        reg.cancel_pairing(&session, at(1)).expect("cancel");
        reg.begin_pairing(PairingMethod::Code, "d1", at(2)).expect("retry");
    }

    #[test]
    fn test_begin_pairing_hint_freed_after_expiry() {
        let mut reg = registry();
        reg.begin_pairing(PairingMethod::Code, "d1", at(0)).expect("begin");

        // TTL is 120s; at 121s the old session no longer blocks the hint
        reg.begin_pairing(PairingMethod::Code, "d1", at(121_000))
            .expect("expired session swept aside");
        assert_eq!(reg.snapshot(at(121_000)).sessions.len(), 1);
    }

    #[test]
    fn test_complete_pairing_after_ttl_fails_expired() {
        let mut reg = registry();
        let session = reg
            .begin_pairing(PairingMethod::Code, "d1", at(0))
            .expect("begin")
            .id
            .clone();

        let err = reg
            .complete_pairing(&session, success(), at(120_000))
            .unwrap_err();
        assert_eq!(err, RegistryError::SessionExpired);

        // The session is gone afterwards
        assert_eq!(
            reg.complete_pairing(&session, success(), at(120_001))
                .unwrap_err(),
            RegistryError::SessionNotFound
        );
    }

    #[test]
    fn test_complete_pairing_unknown_session() {
        let mut reg = registry();
        assert_eq!(
            reg.complete_pairing(&SessionId::from("ghost"), success(), at(0))
                .unwrap_err(),
            RegistryError::SessionNotFound
        );
    }

    #[test]
    fn test_complete_pairing_applies_announced_identity() {
        let mut reg = registry();
        let session = reg
            .begin_pairing(PairingMethod::Qr, "d1", at(0))
            .expect("begin")
            .id
            .clone();

        let result = PairingResult::Success {
            device_name: Some("iPhone 15 Pro".to_string()),
            transport_hint: Some("wifi-aware".to_string()),
        };
        let device = reg
            .complete_pairing(&session, result, at(5_000))
            .expect("complete")
            .expect("device upserted");
        assert_eq!(device.display_name, "iPhone 15 Pro");
        assert_eq!(device.transport_hint, "wifi-aware");
        assert_eq!(device.state, DeviceState::Connected);
        assert_eq!(device.last_seen, Some(at(5_000)));
    }

    #[test]
    fn test_failed_pairing_rolls_connecting_back_to_available() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("d1"), at(100));
        let session = reg
            .begin_pairing(PairingMethod::Code, "d1", at(200))
            .expect("begin")
            .id
            .clone();
        reg.present_challenge(&session, at(300)).expect("present");
        reg.confirm_pairing(&session, at(400)).expect("confirm");
        assert_eq!(
            reg.device(&DeviceId::from("d1")).map(|d| d.state),
            Some(DeviceState::Connecting)
        );

        reg.complete_pairing(&session, failure("handshake refused"), at(500))
            .expect("complete");
        assert_eq!(
            reg.device(&DeviceId::from("d1")).map(|d| d.state),
            Some(DeviceState::Available)
        );
    }

    #[test]
    fn test_present_challenge_is_single_shot() {
        let mut reg = registry();
        let session = reg
            .begin_pairing(PairingMethod::Code, "d1", at(0))
            .expect("begin")
            .id
            .clone();

        reg.present_challenge(&session, at(1)).expect("first present");
        let err = reg.present_challenge(&session, at(2)).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidState(_)));
    }

    #[test]
    fn test_confirm_requires_presented_challenge() {
        let mut reg = registry();
        let session = reg
            .begin_pairing(PairingMethod::Code, "d1", at(0))
            .expect("begin")
            .id
            .clone();

        let err = reg.confirm_pairing(&session, at(1)).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidState(_)));
    }

    #[test]
    fn test_cancel_after_expiry_reports_expired() {
        let mut reg = registry();
        let session = reg
            .begin_pairing(PairingMethod::Code, "d1", at(0))
            .expect("begin")
            .id
            .clone();

        assert_eq!(
            reg.cancel_pairing(&session, at(200_000)).unwrap_err(),
            RegistryError::SessionExpired
        );
    }

    #[test]
    fn test_sweep_expires_only_overdue_sessions() {
        let mut reg = registry();
        let overdue = reg
            .begin_pairing(PairingMethod::Code, "d1", at(0))
            .expect("begin")
            .id
            .clone();
        reg.begin_pairing(PairingMethod::Code, "d2", at(60_000)).expect("begin");

        let swept = reg.sweep_expired(at(120_000));
        assert_eq!(swept, vec![overdue]);
        assert_eq!(reg.snapshot(at(120_000)).sessions.len(), 1);
    }

    // =========================================================================
    // end to end
    // =========================================================================

    #[test]
    fn test_discovery_to_connected_scenario() {
        let mut reg = registry();

        reg.mark_seen(DeviceId::from("d1"), at(100));
        let available = reg.list_by_state(DeviceState::Available);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, DeviceId::from("d1"));
        assert_eq!(available[0].last_seen, Some(at(100)));

        let session = reg
            .begin_pairing(PairingMethod::Code, "d1", at(200))
            .expect("begin")
            .id
            .clone();
        reg.complete_pairing(&session, success(), at(300)).expect("complete");

        let connected = reg.list_by_state(DeviceState::Connected);
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].id, DeviceId::from("d1"));
        assert!(reg.list_by_state(DeviceState::Available).is_empty());
    }

    #[test]
    fn test_snapshot_devices_come_pre_sorted() {
        let mut reg = registry();
        reg.mark_seen(DeviceId::from("b"), at(1_000));
        reg.mark_seen(DeviceId::from("a"), at(2_000));

        let snapshot = reg.snapshot(at(3_000));
        let ids: Vec<&str> = snapshot.devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(snapshot.taken_at, at(3_000));
    }
}
