use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::entity::UidMatch;
use super::error::FirewallError;

/// Per-UID firewall chain. Numeric ids are part of the administrative
/// interface and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum FirewallChain {
    Dozable = 1,
    Standby = 2,
    Powersave = 3,
    Restricted = 4,
    LowPowerStandby = 5,
    Background = 6,
    OemDeny1 = 7,
    OemDeny2 = 8,
    OemDeny3 = 9,
    MeteredAllow = 10,
    MeteredDenyUser = 11,
    MeteredDenyAdmin = 12,
}

impl FirewallChain {
    pub const ALL: [FirewallChain; 12] = [
        Self::Dozable,
        Self::Standby,
        Self::Powersave,
        Self::Restricted,
        Self::LowPowerStandby,
        Self::Background,
        Self::OemDeny1,
        Self::OemDeny2,
        Self::OemDeny3,
        Self::MeteredAllow,
        Self::MeteredDenyUser,
        Self::MeteredDenyAdmin,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    /// Bit this chain occupies in both the UID owner rule word and the
    /// chain-enable configuration word.
    pub fn match_for(self) -> UidMatch {
        match self {
            Self::Dozable => UidMatch::DOZABLE,
            Self::Standby => UidMatch::STANDBY,
            Self::Powersave => UidMatch::POWERSAVE,
            Self::Restricted => UidMatch::RESTRICTED,
            Self::LowPowerStandby => UidMatch::LOW_POWER_STANDBY,
            Self::Background => UidMatch::BACKGROUND,
            Self::OemDeny1 => UidMatch::OEM_DENY_1,
            Self::OemDeny2 => UidMatch::OEM_DENY_2,
            Self::OemDeny3 => UidMatch::OEM_DENY_3,
            Self::MeteredAllow => UidMatch::HAPPY_BOX,
            Self::MeteredDenyUser => UidMatch::PENALTY_BOX_USER,
            Self::MeteredDenyAdmin => UidMatch::PENALTY_BOX_ADMIN,
        }
    }

    /// Allow-list chains block every UID without the bit once enabled;
    /// deny-list chains block only UIDs with the bit.
    pub fn is_allow_list(self) -> bool {
        matches!(
            self,
            Self::Dozable
                | Self::Powersave
                | Self::Restricted
                | Self::LowPowerStandby
                | Self::Background
                | Self::MeteredAllow
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dozable => "dozable",
            Self::Standby => "standby",
            Self::Powersave => "powersave",
            Self::Restricted => "restricted",
            Self::LowPowerStandby => "low_power_standby",
            Self::Background => "background",
            Self::OemDeny1 => "oem_deny_1",
            Self::OemDeny2 => "oem_deny_2",
            Self::OemDeny3 => "oem_deny_3",
            Self::MeteredAllow => "metered_allow",
            Self::MeteredDenyUser => "metered_deny_user",
            Self::MeteredDenyAdmin => "metered_deny_admin",
        }
    }
}

impl TryFrom<i32> for FirewallChain {
    type Error = FirewallError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == id)
            .ok_or(FirewallError::UnknownChain(id))
    }
}

impl FromStr for FirewallChain {
    type Err = FirewallError;

    /// Accepts either the snake_case name or the numeric id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<i32>() {
            return Self::try_from(id);
        }
        let wanted = s.replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| FirewallError::UnknownChainName(s.to_string()))
    }
}

impl fmt::Display for FirewallChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
