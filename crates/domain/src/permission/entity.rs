use bitflags::bitflags;

use ebpf_common::permission::{
    PERMISSION_INTERNET, PERMISSION_UNINSTALLED, PERMISSION_UPDATE_DEVICE_STATS,
};

bitflags! {
    /// Network permission mask of an app-id.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permission: u8 {
        const INTERNET = PERMISSION_INTERNET;
        const UPDATE_DEVICE_STATS = PERMISSION_UPDATE_DEVICE_STATS;
    }
}

impl Permission {
    /// Permission of an app-id with no map entry.
    pub const DEFAULT: Permission = Permission::INTERNET;

    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// Whether writing `mask` should instead delete the app-id's entry.
///
/// Uninstalled packages and masks holding nothing beyond the default
/// `INTERNET` bit are represented by absence.
pub fn clears_entry(mask: u8) -> bool {
    mask == PERMISSION_UNINSTALLED || mask & !PERMISSION_INTERNET == 0
}
