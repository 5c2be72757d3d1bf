//! In-memory fakes of the secondary ports, for controller tests.

use std::hash::Hash;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use domain::common::error::DomainError;
use libc::EIO;

use crate::secondary::bpf_map_port::BpfMapPort;
use crate::secondary::interface_resolver_port::InterfaceResolverPort;
use crate::secondary::kernel_sync_port::KernelSyncPort;

struct MapState<K, V> {
    entries: ahash::HashMap<K, V>,
    /// Keys still enumerated by `keys()` but gone by the time they are read.
    vanished: ahash::HashSet<K>,
    /// Keys whose writes fail with `EIO`.
    failing_keys: ahash::HashSet<K>,
    write_errno: Option<i32>,
    read_errno: Option<i32>,
    duplicate_keys: bool,
}

/// `BpfMapPort` backed by an `ahash` map, with fault injection.
pub struct InMemoryMap<K, V> {
    state: Mutex<MapState<K, V>>,
}

impl<K, V> Default for InMemoryMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> InMemoryMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MapState {
                entries: ahash::HashMap::default(),
                vanished: ahash::HashSet::default(),
                failing_keys: ahash::HashSet::default(),
                write_errno: None,
                read_errno: None,
                duplicate_keys: false,
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MapState<K, V>> {
        self.state.lock().unwrap()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep `key` in enumeration but make reads return absent, as if another
    /// process deleted it mid-iteration.
    pub fn vanish_on_read(&self, key: K) {
        self.state().vanished.insert(key);
    }

    pub fn fail_writes_for(&self, key: K) {
        self.state().failing_keys.insert(key);
    }

    /// Fail every subsequent `put`/`delete` with `errno`.
    pub fn fail_all_writes(&self, errno: i32) {
        self.state().write_errno = Some(errno);
    }

    /// Fail every subsequent `get` with `errno`.
    pub fn fail_all_reads(&self, errno: i32) {
        self.state().read_errno = Some(errno);
    }

    /// Enumerate every key twice, as the kernel does when iteration restarts.
    pub fn duplicate_keys_on_enumeration(&self) {
        self.state().duplicate_keys = true;
    }

    fn check_write(state: &MapState<K, V>, key: &K) -> Result<(), DomainError> {
        if let Some(errno) = state.write_errno {
            return Err(DomainError::resource("in-memory map write", errno));
        }
        if state.failing_keys.contains(key) {
            return Err(DomainError::resource("in-memory map write", EIO));
        }
        Ok(())
    }
}

impl<K, V> BpfMapPort<K, V> for InMemoryMap<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Result<Option<V>, DomainError> {
        let state = self.state();
        if let Some(errno) = state.read_errno {
            return Err(DomainError::resource("in-memory map read", errno));
        }
        if state.vanished.contains(key) {
            return Ok(None);
        }
        Ok(state.entries.get(key).cloned())
    }

    fn put(&self, key: K, value: V) -> Result<(), DomainError> {
        let mut state = self.state();
        Self::check_write(&state, &key)?;
        state.vanished.remove(&key);
        state.entries.insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &K) -> Result<bool, DomainError> {
        let mut state = self.state();
        Self::check_write(&state, key)?;
        state.vanished.remove(key);
        Ok(state.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<K>, DomainError> {
        let state = self.state();
        let mut keys: Vec<K> = state.entries.keys().cloned().collect();
        if state.duplicate_keys {
            keys.extend(state.entries.keys().cloned());
        }
        Ok(keys)
    }
}

/// `KernelSyncPort` that counts invocations and optionally fails.
#[derive(Default)]
pub struct FakeKernelSync {
    calls: AtomicUsize,
    errno: Option<i32>,
}

impl FakeKernelSync {
    pub fn failing(errno: i32) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            errno: Some(errno),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KernelSyncPort for FakeKernelSync {
    fn synchronize_kernel_rcu(&self) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.errno {
            Some(errno) => Err(DomainError::resource("synchronize_kernel_rcu", errno)),
            None => Ok(()),
        }
    }
}

/// `InterfaceResolverPort` over a fixed name/index table.
#[derive(Default)]
pub struct StaticInterfaces {
    by_name: ahash::HashMap<String, u32>,
}

impl StaticInterfaces {
    pub fn new(entries: &[(&str, u32)]) -> Self {
        Self {
            by_name: entries
                .iter()
                .map(|(name, idx)| ((*name).to_string(), *idx))
                .collect(),
        }
    }
}

impl InterfaceResolverPort for StaticInterfaces {
    fn index_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    fn name_of(&self, index: u32) -> Option<String> {
        self.by_name
            .iter()
            .find(|(_, idx)| **idx == index)
            .map(|(name, _)| name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_map_basic_ops() {
        let map: InMemoryMap<u32, u64> = InMemoryMap::new();
        assert_eq!(map.get(&1).unwrap(), None);
        map.put(1, 10).unwrap();
        assert_eq!(map.get(&1).unwrap(), Some(10));
        assert!(map.delete(&1).unwrap());
        assert!(!map.delete(&1).unwrap());
        assert!(map.is_empty());
    }

    #[test]
    fn for_each_skips_vanished() {
        let map: InMemoryMap<u32, u64> = InMemoryMap::new();
        map.put(1, 10).unwrap();
        map.put(2, 20).unwrap();
        map.vanish_on_read(2);
        let mut seen = Vec::new();
        map.for_each(&mut |k, v| seen.push((k, v))).unwrap();
        assert_eq!(seen, vec![(1, 10)]);
    }

    #[test]
    fn clear_removes_everything() {
        let map: InMemoryMap<u32, u64> = InMemoryMap::new();
        for k in 0..5 {
            map.put(k, u64::from(k)).unwrap();
        }
        map.clear().unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn injected_write_failure() {
        let map: InMemoryMap<u32, u64> = InMemoryMap::new();
        map.fail_writes_for(3);
        assert!(map.put(3, 1).is_err());
        assert!(map.put(4, 1).is_ok());
        map.fail_all_writes(1);
        assert_eq!(map.put(4, 2).unwrap_err().errno(), Some(1));
    }

    #[test]
    fn fake_kernel_sync_counts() {
        let ok = FakeKernelSync::default();
        ok.synchronize_kernel_rcu().unwrap();
        assert_eq!(ok.calls(), 1);
        let bad = FakeKernelSync::failing(22);
        assert!(bad.synchronize_kernel_rcu().is_err());
        assert_eq!(bad.calls(), 1);
    }

    #[test]
    fn static_interfaces_resolve_both_ways() {
        let ifaces = StaticInterfaces::new(&[("wlan0", 3)]);
        assert_eq!(ifaces.index_of("wlan0"), Some(3));
        assert_eq!(ifaces.name_of(3).as_deref(), Some("wlan0"));
        assert_eq!(ifaces.index_of("eth9"), None);
    }
}
