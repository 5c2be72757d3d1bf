//! Why a UID's traffic is dropped, derived from the chain-enable word, the
//! UID's rule word and the data saver flag.

use bitflags::bitflags;

use super::chain::FirewallChain;
use super::entity::UidMatch;
use crate::common::entity::is_system_uid;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlockedReasons: u32 {
        const BATTERY_SAVER = 1;
        const DOZE = 1 << 1;
        const APP_STANDBY = 1 << 2;
        const RESTRICTED_MODE = 1 << 3;
        const LOW_POWER_STANDBY = 1 << 5;
        const APP_BACKGROUND = 1 << 6;
        const OEM_DENY = 1 << 7;
        const METERED_DATA_SAVER = 1 << 16;
        const METERED_USER_RESTRICTED = 1 << 17;
        const METERED_ADMIN_DISABLED = 1 << 18;
    }
}

/// Reasons that only apply on metered networks.
pub const BLOCKED_METERED_REASON_MASK: u32 = 0xffff_0000;

impl BlockedReasons {
    pub fn metered(self) -> Self {
        Self::from_bits_retain(self.bits() & BLOCKED_METERED_REASON_MASK)
    }

    pub fn unmetered(self) -> Self {
        Self::from_bits_retain(self.bits() & !BLOCKED_METERED_REASON_MASK)
    }

    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// Reason contributed by an enabled power or OEM chain. Metered chains are
/// evaluated separately and have none.
fn chain_reason(chain: FirewallChain) -> Option<BlockedReasons> {
    match chain {
        FirewallChain::Dozable => Some(BlockedReasons::DOZE),
        FirewallChain::Powersave => Some(BlockedReasons::BATTERY_SAVER),
        FirewallChain::Restricted => Some(BlockedReasons::RESTRICTED_MODE),
        FirewallChain::LowPowerStandby => Some(BlockedReasons::LOW_POWER_STANDBY),
        FirewallChain::Background => Some(BlockedReasons::APP_BACKGROUND),
        FirewallChain::Standby => Some(BlockedReasons::APP_STANDBY),
        FirewallChain::OemDeny1 | FirewallChain::OemDeny2 | FirewallChain::OemDeny3 => {
            Some(BlockedReasons::OEM_DENY)
        }
        FirewallChain::MeteredAllow
        | FirewallChain::MeteredDenyUser
        | FirewallChain::MeteredDenyAdmin => None,
    }
}

/// Compute the blocked reasons for `uid`.
///
/// `enabled_chains` is the chain-enable configuration word, `rule` the UID's
/// owner rule (empty when the UID has no entry).
pub fn blocked_reasons(
    uid: u32,
    enabled_chains: UidMatch,
    rule: UidMatch,
    data_saver_enabled: bool,
) -> BlockedReasons {
    if is_system_uid(uid) {
        return BlockedReasons::empty();
    }

    let mut reasons = BlockedReasons::empty();
    for chain in FirewallChain::ALL {
        let Some(reason) = chain_reason(chain) else {
            continue;
        };
        let bit = chain.match_for();
        if !enabled_chains.contains(bit) {
            continue;
        }
        let has_bit = rule.contains(bit);
        if chain.is_allow_list() != has_bit {
            reasons |= reason;
        }
    }

    if rule.contains(UidMatch::PENALTY_BOX_USER) {
        reasons |= BlockedReasons::METERED_USER_RESTRICTED;
    }
    if rule.contains(UidMatch::PENALTY_BOX_ADMIN) {
        reasons |= BlockedReasons::METERED_ADMIN_DISABLED;
    }
    if data_saver_enabled && !rule.contains(UidMatch::HAPPY_BOX) {
        reasons |= BlockedReasons::METERED_DATA_SAVER;
    }
    reasons
}

/// Whether `reasons` block traffic on a network of the given kind.
pub fn is_blocked(reasons: BlockedReasons, metered: bool) -> bool {
    let effective = if metered { reasons } else { reasons.unmetered() };
    !effective.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: u32 = 10_123;

    #[test]
    fn system_uid_never_blocked() {
        let r = blocked_reasons(1_000, UidMatch::all(), UidMatch::PENALTY_BOX_USER, true);
        assert!(r.is_empty());
    }

    #[test]
    fn nothing_enabled_nothing_blocked() {
        assert!(blocked_reasons(APP, UidMatch::empty(), UidMatch::empty(), false).is_empty());
    }

    #[test]
    fn allow_list_blocks_uid_without_bit() {
        let r = blocked_reasons(APP, UidMatch::DOZABLE, UidMatch::empty(), false);
        assert_eq!(r, BlockedReasons::DOZE);
        let r = blocked_reasons(APP, UidMatch::DOZABLE, UidMatch::DOZABLE, false);
        assert!(r.is_empty());
    }

    #[test]
    fn deny_list_blocks_uid_with_bit() {
        let r = blocked_reasons(APP, UidMatch::STANDBY, UidMatch::empty(), false);
        assert!(r.is_empty());
        let r = blocked_reasons(APP, UidMatch::STANDBY, UidMatch::STANDBY, false);
        assert_eq!(r, BlockedReasons::APP_STANDBY);
    }

    #[test]
    fn disabled_chain_ignored() {
        let r = blocked_reasons(APP, UidMatch::empty(), UidMatch::OEM_DENY_2, false);
        assert!(r.is_empty());
    }

    #[test]
    fn metered_reasons() {
        let rule = UidMatch::PENALTY_BOX_USER | UidMatch::PENALTY_BOX_ADMIN;
        let r = blocked_reasons(APP, UidMatch::empty(), rule, true);
        assert_eq!(
            r,
            BlockedReasons::METERED_USER_RESTRICTED
                | BlockedReasons::METERED_ADMIN_DISABLED
                | BlockedReasons::METERED_DATA_SAVER
        );
        assert_eq!(r.unmetered(), BlockedReasons::empty());
        assert!(is_blocked(r, true));
        assert!(!is_blocked(r, false));
    }

    #[test]
    fn happy_box_exempts_from_data_saver() {
        let r = blocked_reasons(APP, UidMatch::empty(), UidMatch::HAPPY_BOX, true);
        assert!(r.is_empty());
    }

    #[test]
    fn unmetered_reason_blocks_everywhere() {
        let r = blocked_reasons(APP, UidMatch::POWERSAVE, UidMatch::empty(), false);
        assert!(is_blocked(r, false));
        assert!(is_blocked(r, true));
        assert!(r.metered().is_empty());
    }
}
