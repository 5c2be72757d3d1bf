use domain::common::error::DomainError;

/// Secondary port for the kernel memory-reclamation barrier.
///
/// Returns once every packet-path reader that started before the call has
/// finished, so data swapped out before the call is no longer observed.
///
/// Implemented by `PfKeySync` in the adapter layer.
pub trait KernelSyncPort: Send + Sync {
    fn synchronize_kernel_rcu(&self) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_sync_port_is_object_safe() {
        fn _check(port: &dyn KernelSyncPort) {
            let _ = port.synchronize_kernel_rcu();
        }
    }
}
