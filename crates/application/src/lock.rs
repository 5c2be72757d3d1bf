use std::sync::{Mutex, MutexGuard};

use domain::common::error::DomainError;
use libc::ENOTRECOVERABLE;

/// Acquire one of the per-map locks. A poisoned lock is an error, not a
/// panic: the map may hold a half-applied batch.
pub fn acquire<'a>(lock: &'a Mutex<()>, name: &str) -> Result<MutexGuard<'a, ()>, DomainError> {
    lock.lock()
        .map_err(|_| DomainError::resource(format!("{name} poisoned"), ENOTRECOVERABLE))
}
