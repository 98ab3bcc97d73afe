use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceState};
use crate::ids::DeviceId;
use crate::registry::RegistrySnapshot;
use crate::timestamp::TimestampMs;

const MINUTE_MS: i64 = 60 * 1_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    Rename,
    CopyId,
    Disconnect,
}

/// One row of the device list, ready for the shell to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub id: DeviceId,
    pub name: String,
    /// Humanized `last_seen`; absent for never-seen devices.
    pub relative_time: Option<String>,
    pub menu_actions: Vec<MenuAction>,
}

/// The side panel's two sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceListView {
    pub connected: Vec<DisplayRow>,
    pub available: Vec<DisplayRow>,
}

/// Project a registry snapshot into the grouped display model. Pure and
/// stateless; row order is the snapshot's display order.
pub fn project(snapshot: &RegistrySnapshot, now: TimestampMs) -> DeviceListView {
    let mut view = DeviceListView {
        connected: Vec::new(),
        available: Vec::new(),
    };
    for device in &snapshot.devices {
        match device.state {
            DeviceState::Connected => view.connected.push(row_for(device, now)),
            DeviceState::Available => view.available.push(row_for(device, now)),
            // Connecting devices are mid-pairing and rendered by the pair
            // panel; Disconnected devices are not listed at all.
            DeviceState::Connecting | DeviceState::Disconnected => {}
        }
    }
    view
}

fn row_for(device: &Device, now: TimestampMs) -> DisplayRow {
    let mut menu_actions = vec![MenuAction::Rename, MenuAction::CopyId];
    if device.state.is_connected() {
        menu_actions.push(MenuAction::Disconnect);
    }
    DisplayRow {
        id: device.id.clone(),
        name: device.display_name.clone(),
        relative_time: device.last_seen.map(|seen| relative_time(seen, now)),
        menu_actions,
    }
}

/// Humanize a last-seen timestamp relative to `now`.
///
/// Buckets: under a minute "just now", under an hour "N min ago", under a
/// day "N hr ago", anything older the calendar date.
pub fn relative_time(seen: TimestampMs, now: TimestampMs) -> String {
    let elapsed = now.millis_since(seen);
    if elapsed < MINUTE_MS {
        "just now".to_string()
    } else if elapsed < HOUR_MS {
        format!("{} min ago", elapsed / MINUTE_MS)
    } else if elapsed < DAY_MS {
        format!("{} hr ago", elapsed / HOUR_MS)
    } else {
        match DateTime::from_timestamp_millis(seen.as_millis()) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => "long ago".to_string(),
        }
    }
}
