use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::Serialize;

use ebpf_common::uid_owner::{
    BACKGROUND_MATCH, DOZABLE_MATCH, HAPPY_BOX_MATCH, IIF_MATCH, LOCKDOWN_VPN_MATCH,
    LOW_POWER_STANDBY_MATCH, OEM_DENY_1_MATCH, OEM_DENY_2_MATCH, OEM_DENY_3_MATCH,
    PENALTY_BOX_ADMIN_MATCH, PENALTY_BOX_USER_MATCH, POWERSAVE_MATCH, RESTRICTED_MATCH,
    STANDBY_MATCH, UidOwnerValue,
};

use super::error::FirewallError;

// ── Match bits ──────────────────────────────────────────────────────

bitflags! {
    /// Bits of a UID owner rule word. Chain bits double as chain-enable
    /// bits in the configuration map.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UidMatch: u64 {
        const HAPPY_BOX = HAPPY_BOX_MATCH;
        const PENALTY_BOX_USER = PENALTY_BOX_USER_MATCH;
        const DOZABLE = DOZABLE_MATCH;
        const STANDBY = STANDBY_MATCH;
        const POWERSAVE = POWERSAVE_MATCH;
        const RESTRICTED = RESTRICTED_MATCH;
        const LOW_POWER_STANDBY = LOW_POWER_STANDBY_MATCH;
        const IIF = IIF_MATCH;
        const LOCKDOWN_VPN = LOCKDOWN_VPN_MATCH;
        const OEM_DENY_1 = OEM_DENY_1_MATCH;
        const OEM_DENY_2 = OEM_DENY_2_MATCH;
        const OEM_DENY_3 = OEM_DENY_3_MATCH;
        const BACKGROUND = BACKGROUND_MATCH;
        const PENALTY_BOX_ADMIN = PENALTY_BOX_ADMIN_MATCH;
    }
}

impl UidMatch {
    /// Names of the known bits that are set, lowest bit first.
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

// ── UID owner record ────────────────────────────────────────────────

/// Decoded UID owner map value.
///
/// The map holds an entry for a UID only while `rule` is non-empty, so a
/// record that becomes empty must be deleted rather than written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UidOwnerRecord {
    /// Allowed ingress interface; zero unless `rule` contains `IIF`.
    pub iif: u32,
    pub rule: UidMatch,
}

impl UidOwnerRecord {
    /// Reject an interface index paired with any match other than `IIF`.
    pub fn validate_add(matches: UidMatch, iif: u32) -> Result<(), FirewallError> {
        if iif != 0 && matches != UidMatch::IIF {
            return Err(FirewallError::IifWithoutIifMatch {
                iif,
                matches: matches.names().join("|"),
            });
        }
        Ok(())
    }

    /// OR in `matches`. The interface index is only overwritten when adding
    /// `IIF` itself.
    #[must_use]
    pub fn with_match(self, matches: UidMatch, iif: u32) -> Self {
        Self {
            iif: if matches == UidMatch::IIF { iif } else { self.iif },
            rule: self.rule | matches,
        }
    }

    /// Clear `matches`; removing `IIF` also clears the interface index.
    #[must_use]
    pub fn without_match(self, matches: UidMatch) -> Self {
        Self {
            iif: if matches == UidMatch::IIF { 0 } else { self.iif },
            rule: self.rule.difference(matches),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rule.is_empty()
    }
}

impl From<UidOwnerValue> for UidOwnerRecord {
    fn from(v: UidOwnerValue) -> Self {
        Self {
            iif: v.iif,
            rule: UidMatch::from_bits_retain(v.rule),
        }
    }
}

impl From<UidOwnerRecord> for UidOwnerValue {
    fn from(r: UidOwnerRecord) -> Self {
        UidOwnerValue::new(r.iif, r.rule.bits())
    }
}

// ── Rule ────────────────────────────────────────────────────────────

/// Logical rule of a UID on a chain, independent of chain polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallRule {
    Allow,
    Deny,
}

impl fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

impl FromStr for FirewallRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(format!("unknown rule '{other}', expected allow or deny")),
        }
    }
}
