use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::state::DeviceState;
use crate::ids::DeviceId;
use crate::timestamp::TimestampMs;

/// A remote endpoint tracked by the registry.
///
/// Identity is `id`; `display_name` is user-editable and carries no
/// uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub display_name: String,
    pub state: DeviceState,
    /// Last time a beacon or connection touched this device. `None` only
    /// for devices that have never been seen.
    pub last_seen: Option<TimestampMs>,
    /// Opaque transport descriptor supplied by the discovery layer.
    pub transport_hint: String,
    /// Whether the device is currently beaconing.
    pub discoverable: bool,
}

impl Device {
    /// Materialize a device from its first discovery beacon.
    pub fn discovered(id: DeviceId, at: TimestampMs) -> Self {
        let display_name = id.as_str().to_string();
        Self {
            id,
            display_name,
            state: DeviceState::Available,
            last_seen: Some(at),
            transport_hint: String::new(),
            discoverable: true,
        }
    }

    /// Apply a discovery beacon.
    ///
    /// `last_seen` follows a monotonic-max policy: beacons older than the
    /// stored timestamp are ignored, so arrival order is immaterial.
    /// Returns whether anything changed.
    pub fn mark_seen(&mut self, at: TimestampMs) -> bool {
        let mut changed = false;

        if self.last_seen.map_or(true, |seen| at > seen) {
            self.last_seen = Some(at);
            changed = true;
        }
        if !self.discoverable {
            self.discoverable = true;
            changed = true;
        }
        let next = self.state.on_beacon();
        if next != self.state {
            self.state = next;
            changed = true;
        }

        changed
    }

    /// Record that the device entered the connected state at `at`.
    /// Keeps the invariant that a connected device always has a `last_seen`.
    pub fn connected_at(&mut self, at: TimestampMs) {
        self.state = DeviceState::Connected;
        if self.last_seen.map_or(true, |seen| at > seen) {
            self.last_seen = Some(at);
        }
    }

    /// Display ordering: `last_seen` descending, never-seen devices last,
    /// ties broken by `id` ascending so the order is deterministic.
    pub fn display_cmp(&self, other: &Device) -> Ordering {
        match (self.last_seen, other.last_seen) {
            (Some(a), Some(b)) => b.cmp(&a).then_with(|| self.id.cmp(&other.id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.id.cmp(&other.id),
        }
    }
}
