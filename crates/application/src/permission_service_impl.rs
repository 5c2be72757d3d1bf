use std::sync::Mutex;

use domain::common::entity::{BatchOutcome, app_id};
use domain::common::error::DomainError;
use domain::permission::entity::{Permission, clears_entry};
use tracing::{debug, error, info};

use crate::lock::acquire;
use crate::maps::UidPermissionMap;

/// Network permissions per app-id.
pub struct PermissionAppService {
    uid_permission: UidPermissionMap,
    permission_lock: Mutex<()>,
}

impl PermissionAppService {
    pub fn new(uid_permission: UidPermissionMap) -> Self {
        Self {
            uid_permission,
            permission_lock: Mutex::new(()),
        }
    }

    /// Store `mask` for the app-id of `uid`. Masks that equal the default,
    /// and the uninstalled marker, delete the entry instead.
    pub fn set_permission(&self, uid: u32, mask: u8) -> Result<(), DomainError> {
        let _guard = acquire(&self.permission_lock, "permission_lock")?;
        self.set_permission_locked(uid, mask)
    }

    fn set_permission_locked(&self, uid: u32, mask: u8) -> Result<(), DomainError> {
        let key = app_id(uid);
        if clears_entry(mask) {
            let existed = self.uid_permission.delete(&key)?;
            debug!(uid, app_id = key, existed, "permission entry cleared");
        } else {
            self.uid_permission.put(key, mask)?;
            debug!(uid, app_id = key, mask, "permission set");
        }
        Ok(())
    }

    /// Apply `mask` to each of `uids`. Failures are logged and reported.
    pub fn set_net_perm_for_uids(&self, mask: u8, uids: &[u32]) -> Result<BatchOutcome, DomainError> {
        let _guard = acquire(&self.permission_lock, "permission_lock")?;
        let mut outcome = BatchOutcome::default();
        for &uid in uids {
            let res = self.set_permission_locked(uid, mask);
            if let Err(ref e) = res {
                error!(uid, mask, error = %e, "failed to set permission");
            }
            outcome.record(uid, res.is_ok());
        }
        info!(mask, uids = uids.len(), failed = outcome.failed.len(), "permissions updated");
        Ok(outcome)
    }

    /// Permission of `uid`. Absence, and a failed read, yield the default.
    pub fn get_permission(&self, uid: u32) -> Permission {
        let key = app_id(uid);
        match self.uid_permission.get(&key) {
            Ok(Some(mask)) => Permission::from_bits_retain(mask),
            Ok(None) => Permission::DEFAULT,
            Err(e) => {
                error!(uid, app_id = key, error = %e, "failed to read permission, using default");
                Permission::DEFAULT
            }
        }
    }
}
