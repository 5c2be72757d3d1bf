use std::sync::{Arc, Mutex};

use domain::common::error::DomainError;
use ebpf_common::configuration::{
    CURRENT_STATS_MAP_CONFIGURATION_KEY, STATS_SELECT_MAP_A, STATS_SELECT_MAP_B,
};
use libc::ENOENT;
use ports::secondary::kernel_sync_port::KernelSyncPort;
use tracing::{error, info};

use crate::lock::acquire;
use crate::maps::ConfigurationMap;

/// Double-buffered statistics map selector.
///
/// The packet path writes to whichever stats map the selector names. After a
/// flip, the kernel barrier guarantees no packet still writes to the old
/// map, so the caller may drain and reuse it.
pub struct StatsMapAppService {
    configuration: ConfigurationMap,
    kernel: Arc<dyn KernelSyncPort>,
    stats_selector_lock: Mutex<()>,
}

impl StatsMapAppService {
    pub fn new(configuration: ConfigurationMap, kernel: Arc<dyn KernelSyncPort>) -> Self {
        Self {
            configuration,
            kernel,
            stats_selector_lock: Mutex::new(()),
        }
    }

    /// Currently active selector (`STATS_SELECT_MAP_A` or `_B`).
    pub fn active_stats_map(&self) -> Result<u32, DomainError> {
        self.configuration
            .get(&CURRENT_STATS_MAP_CONFIGURATION_KEY)?
            .ok_or_else(|| DomainError::resource("read stats map selector", ENOENT))
    }

    /// Flip the selector and wait for in-flight readers of the old map.
    ///
    /// Returns the newly active selector. If the barrier fails the flip has
    /// already happened; the old map must not be reused.
    pub fn swap_active_stats_map(&self) -> Result<u32, DomainError> {
        let next = {
            let _guard = acquire(&self.stats_selector_lock, "stats_selector_lock")?;
            let current = self.active_stats_map()?;
            let next = match current {
                STATS_SELECT_MAP_A => STATS_SELECT_MAP_B,
                STATS_SELECT_MAP_B => STATS_SELECT_MAP_A,
                other => {
                    return Err(DomainError::InvalidArgument(format!(
                        "stats map selector holds {other}, expected {STATS_SELECT_MAP_A} or {STATS_SELECT_MAP_B}"
                    )));
                }
            };
            self.configuration
                .put(CURRENT_STATS_MAP_CONFIGURATION_KEY, next)?;
            next
        };

        if let Err(e) = self.kernel.synchronize_kernel_rcu() {
            error!(selector = next, error = %e, "stats map swapped but kernel barrier failed");
            return Err(e);
        }
        info!(selector = next, "active stats map swapped");
        Ok(next)
    }

    /// Select map A.
    pub fn reset(&self) -> Result<(), DomainError> {
        let _guard = acquire(&self.stats_selector_lock, "stats_selector_lock")?;
        self.configuration
            .put(CURRENT_STATS_MAP_CONFIGURATION_KEY, STATS_SELECT_MAP_A)
    }
}
