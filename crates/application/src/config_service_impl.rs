use std::sync::Mutex;

use domain::common::error::DomainError;
use domain::firewall::chain::FirewallChain;
use domain::firewall::entity::UidMatch;
use ebpf_common::configuration::{UID_RULES_CONFIGURATION_KEY, UID_RULES_DEFAULT_CONFIGURATION};
use libc::ENOENT;
use tracing::info;

use crate::lock::acquire;
use crate::maps::ConfigurationMap;

/// Global chain-enable word in the configuration map.
///
/// Shares the configuration map with `StatsMapAppService` but not its lock:
/// the two keys are unrelated and the locks never nest.
pub struct ConfigAppService {
    configuration: ConfigurationMap,
    uid_rules_config_lock: Mutex<()>,
}

impl ConfigAppService {
    pub fn new(configuration: ConfigurationMap) -> Self {
        Self {
            configuration,
            uid_rules_config_lock: Mutex::new(()),
        }
    }

    /// Raw chain-enable word. The word is written at start-up, so a missing
    /// key is a kernel-side failure.
    pub fn uid_rules_configuration(&self) -> Result<u32, DomainError> {
        self.configuration
            .get(&UID_RULES_CONFIGURATION_KEY)?
            .ok_or_else(|| DomainError::resource("read uid rules configuration", ENOENT))
    }

    /// Chains currently enabled, as match bits.
    pub fn enabled_chains(&self) -> Result<UidMatch, DomainError> {
        Ok(UidMatch::from_bits_retain(u64::from(
            self.uid_rules_configuration()?,
        )))
    }

    pub fn set_child_chain_enabled(
        &self,
        chain: FirewallChain,
        enabled: bool,
    ) -> Result<(), DomainError> {
        let bit = config_bit(chain);
        let _guard = acquire(&self.uid_rules_config_lock, "uid_rules_config_lock")?;
        let current = self.uid_rules_configuration()?;
        let updated = if enabled { current | bit } else { current & !bit };
        self.configuration.put(UID_RULES_CONFIGURATION_KEY, updated)?;
        info!(chain = %chain, enabled, config = updated, "firewall chain toggled");
        Ok(())
    }

    pub fn is_chain_enabled(&self, chain: FirewallChain) -> Result<bool, DomainError> {
        Ok(self.uid_rules_configuration()? & config_bit(chain) != 0)
    }

    /// Write the default word (no chain enabled).
    pub fn reset(&self) -> Result<(), DomainError> {
        let _guard = acquire(&self.uid_rules_config_lock, "uid_rules_config_lock")?;
        self.configuration
            .put(UID_RULES_CONFIGURATION_KEY, UID_RULES_DEFAULT_CONFIGURATION)
    }
}

/// Chain bits all sit below bit 32; see the layout tests in `ebpf-common`.
fn config_bit(chain: FirewallChain) -> u32 {
    chain.match_for().bits() as u32
}
