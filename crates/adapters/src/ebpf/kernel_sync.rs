use std::io;
use std::os::fd::{FromRawFd, OwnedFd};

use domain::common::error::DomainError;
use ports::secondary::kernel_sync_port::KernelSyncPort;
use tracing::debug;

/// `PF_KEY_V2` from `<linux/pfkeyv2.h>`.
const PF_KEY_V2: libc::c_int = 2;

/// Kernel RCU barrier via a throwaway `AF_KEY` socket.
///
/// Closing a `PF_KEY` socket makes the kernel wait for an RCU grace period,
/// which is the cheapest unprivileged way to trigger `synchronize_rcu()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PfKeySync;

impl KernelSyncPort for PfKeySync {
    fn synchronize_kernel_rcu(&self) -> Result<(), DomainError> {
        #[allow(unsafe_code)]
        // SAFETY: socket(2) takes no pointers.
        let fd = unsafe {
            libc::socket(libc::AF_KEY, libc::SOCK_RAW | libc::SOCK_CLOEXEC, PF_KEY_V2)
        };
        if fd < 0 {
            let errno = io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO);
            return Err(DomainError::resource("open AF_KEY socket", errno));
        }
        #[allow(unsafe_code)]
        // SAFETY: `fd` was just returned by socket(2) and has no other owner.
        let sock = unsafe { OwnedFd::from_raw_fd(fd) };
        // Dropping the fd closes it, which blocks for the grace period.
        drop(sock);
        debug!("kernel rcu barrier completed");
        Ok(())
    }
}
