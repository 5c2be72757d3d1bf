//! Per-app-id permission bits stored in the UID permission map (`u32 -> u8`).

pub const PERMISSION_NONE: u8 = 0;
/// Default permission: an app-id absent from the map holds exactly this.
pub const PERMISSION_INTERNET: u8 = 1 << 2;
pub const PERMISSION_UPDATE_DEVICE_STATS: u8 = 1 << 3;
/// Marker for an uninstalled package. Never stored in the map.
pub const PERMISSION_UNINSTALLED: u8 = 0xFF;

pub const UID_PERMISSION_MAP_SIZE: u32 = 4_000;
