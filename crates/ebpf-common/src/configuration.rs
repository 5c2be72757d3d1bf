//! Keys and values of the global configuration map.
//!
//! Both keys are slots of one two-entry `Array<u32>`. They are logically unrelated
//! and are written under separate locks in userspace.

/// Chain-enable word (same bit positions as the UID owner match bits).
pub const UID_RULES_CONFIGURATION_KEY: u32 = 0;
/// Selector for the active statistics map.
pub const CURRENT_STATS_MAP_CONFIGURATION_KEY: u32 = 1;

pub const CONFIGURATION_MAP_SIZE: u32 = 2;

/// Default chain-enable word: no chain enabled.
pub const UID_RULES_DEFAULT_CONFIGURATION: u32 = 0;

pub const STATS_SELECT_MAP_A: u32 = 0;
pub const STATS_SELECT_MAP_B: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        assert_ne!(UID_RULES_CONFIGURATION_KEY, CURRENT_STATS_MAP_CONFIGURATION_KEY);
        assert!(CURRENT_STATS_MAP_CONFIGURATION_KEY < CONFIGURATION_MAP_SIZE);
    }

    #[test]
    fn test_selectors_are_distinct() {
        assert_ne!(STATS_SELECT_MAP_A, STATS_SELECT_MAP_B);
    }
}
