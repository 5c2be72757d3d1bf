//! Per-UID owner match records shared with the packet-path program.
//!
//! Each bit of `UidOwnerValue.rule` selects one firewall chain or one
//! special match condition. The chain-enable word in the configuration map
//! uses the same bit positions.

// ── Match bits ──────────────────────────────────────────────────────

/// Metered-network allow list (data saver "happy box").
pub const HAPPY_BOX_MATCH: u64 = 1 << 0;
/// Metered-network deny list set by the user.
pub const PENALTY_BOX_USER_MATCH: u64 = 1 << 1;
pub const DOZABLE_MATCH: u64 = 1 << 2;
pub const STANDBY_MATCH: u64 = 1 << 3;
pub const POWERSAVE_MATCH: u64 = 1 << 4;
pub const RESTRICTED_MATCH: u64 = 1 << 5;
pub const LOW_POWER_STANDBY_MATCH: u64 = 1 << 6;
/// Ingress interface filter; `UidOwnerValue.iif` is only valid with this bit.
pub const IIF_MATCH: u64 = 1 << 7;
pub const LOCKDOWN_VPN_MATCH: u64 = 1 << 8;
pub const OEM_DENY_1_MATCH: u64 = 1 << 9;
pub const OEM_DENY_2_MATCH: u64 = 1 << 10;
pub const OEM_DENY_3_MATCH: u64 = 1 << 11;
pub const BACKGROUND_MATCH: u64 = 1 << 12;
/// Metered-network deny list set by an administrator.
pub const PENALTY_BOX_ADMIN_MATCH: u64 = 1 << 13;

/// Union of every bit the kernel program understands.
pub const ALL_MATCHES: u64 = HAPPY_BOX_MATCH
    | PENALTY_BOX_USER_MATCH
    | DOZABLE_MATCH
    | STANDBY_MATCH
    | POWERSAVE_MATCH
    | RESTRICTED_MATCH
    | LOW_POWER_STANDBY_MATCH
    | IIF_MATCH
    | LOCKDOWN_VPN_MATCH
    | OEM_DENY_1_MATCH
    | OEM_DENY_2_MATCH
    | OEM_DENY_3_MATCH
    | BACKGROUND_MATCH
    | PENALTY_BOX_ADMIN_MATCH;

/// Maximum entries in the UID owner map.
pub const UID_OWNER_MAP_SIZE: u32 = 4_000;

// ── UID owner value — 16 bytes ──────────────────────────────────────

/// Value stored in the UID owner map, keyed by the 32-bit UID.
///
/// An entry exists only while `rule != 0`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UidOwnerValue {
    /// Allowed ingress interface index. Zero unless `IIF_MATCH` is set.
    pub iif: u32,
    pub _pad: u32,
    /// Bitmask of `*_MATCH` flags.
    pub rule: u64,
}

impl UidOwnerValue {
    pub const fn new(iif: u32, rule: u64) -> Self {
        Self { iif, _pad: 0, rule }
    }
}

#[cfg(feature = "userspace")]
unsafe impl aya::Pod for UidOwnerValue {}
