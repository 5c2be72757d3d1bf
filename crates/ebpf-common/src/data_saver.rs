//! Single-slot data saver toggle (`Array<u8>` of one entry).

pub const DATA_SAVER_ENABLED_KEY: u32 = 0;

pub const DATA_SAVER_DISABLED: u8 = 0;
pub const DATA_SAVER_ENABLED: u8 = 1;
