use std::sync::Mutex;

use domain::common::error::DomainError;
use ebpf_common::data_saver::{DATA_SAVER_DISABLED, DATA_SAVER_ENABLED, DATA_SAVER_ENABLED_KEY};
use tracing::info;

use crate::lock::acquire;
use crate::maps::DataSaverEnabledMap;

/// Data saver toggle read by the packet path on metered networks.
pub struct DataSaverAppService {
    data_saver_enabled: DataSaverEnabledMap,
    data_saver_lock: Mutex<()>,
}

impl DataSaverAppService {
    pub fn new(data_saver_enabled: DataSaverEnabledMap) -> Self {
        Self {
            data_saver_enabled,
            data_saver_lock: Mutex::new(()),
        }
    }

    pub fn set_data_saver_enabled(&self, enabled: bool) -> Result<(), DomainError> {
        let value = if enabled {
            DATA_SAVER_ENABLED
        } else {
            DATA_SAVER_DISABLED
        };
        let _guard = acquire(&self.data_saver_lock, "data_saver_lock")?;
        self.data_saver_enabled.put(DATA_SAVER_ENABLED_KEY, value)?;
        info!(enabled, "data saver updated");
        Ok(())
    }

    /// A missing flag reads as disabled.
    pub fn data_saver_enabled(&self) -> Result<bool, DomainError> {
        Ok(self
            .data_saver_enabled
            .get(&DATA_SAVER_ENABLED_KEY)?
            .is_some_and(|v| v != DATA_SAVER_DISABLED))
    }
}
