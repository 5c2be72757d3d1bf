use thiserror::Error;

use crate::common::error::DomainError;

#[derive(Debug, Error)]
pub enum FirewallError {
    #[error("unknown firewall chain id: {0}")]
    UnknownChain(i32),

    #[error("unknown firewall chain name: {0}")]
    UnknownChainName(String),

    #[error("interface index {iif} is only valid with the IIF match, got {matches}")]
    IifWithoutIifMatch { iif: u32, matches: String },

    #[error("uid {uid} has no firewall entry")]
    NoEntry { uid: u32 },

    #[error("chain {chain} is not an {expected} chain")]
    WrongPolarity {
        chain: &'static str,
        expected: &'static str,
    },
}

impl From<FirewallError> for DomainError {
    fn from(e: FirewallError) -> Self {
        match e {
            FirewallError::NoEntry { uid } => DomainError::NotFound(format!("uid {uid}")),
            other => DomainError::InvalidArgument(other.to_string()),
        }
    }
}
