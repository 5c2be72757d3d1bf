use domain::common::error::DomainError;

/// Secondary port over one kernel-shared key/value map.
///
/// Every call is a single kernel map operation per key. Iteration is not a
/// snapshot: another writer may delete entries while keys are enumerated, so
/// `for_each` skips keys whose value has gone and callers that count must
/// deduplicate.
///
/// Implemented by `PinnedBpfMap` (hash maps) and `PinnedBpfArray` (array
/// maps) in the adapter layer.
pub trait BpfMapPort<K, V>: Send + Sync {
    /// Look up `key`. `Ok(None)` when the key is absent.
    fn get(&self, key: &K) -> Result<Option<V>, DomainError>;

    /// Insert or overwrite `key`.
    fn put(&self, key: K, value: V) -> Result<(), DomainError>;

    /// Remove `key`. Returns `false` when it was already absent.
    fn delete(&self, key: &K) -> Result<bool, DomainError>;

    /// Enumerate the keys currently present. May repeat keys if the kernel
    /// restarts iteration after a concurrent deletion.
    fn keys(&self) -> Result<Vec<K>, DomainError>;

    /// Visit each live entry.
    fn for_each(&self, f: &mut dyn FnMut(K, V)) -> Result<(), DomainError> {
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                f(key, value);
            }
        }
        Ok(())
    }

    /// Delete every entry.
    fn clear(&self) -> Result<(), DomainError> {
        for key in self.keys()? {
            self.delete(&key)?;
        }
        Ok(())
    }
}
