//! View projection: pure mapping from registry snapshots to display models
//! and from display interactions back to commands.

pub mod intent;
pub mod projection;

pub use intent::{command_for, UserIntent};
pub use projection::{project, relative_time, DeviceListView, DisplayRow, MenuAction};
