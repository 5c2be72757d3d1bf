use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use aya::Pod;
use aya::maps::{Array, MapData};
use domain::common::error::DomainError;
use ports::secondary::bpf_map_port::BpfMapPort;
use tracing::debug;

use super::pinned_map::{AccessMode, WriterMode, map_errno, open_pinned};

/// aya `Array` over a pinned map, implementing `BpfMapPort<u32, V>`.
///
/// Every slot below `max_entries` always holds a value, so `get` never
/// returns `None` for an in-range index and `delete` is unsupported.
pub struct PinnedBpfArray<V: Pod> {
    name: String,
    access: AccessMode,
    map: Mutex<Array<MapData, V>>,
}

impl<V: Pod> PinnedBpfArray<V> {
    /// Open the array map pinned at `path`.
    pub fn open(path: &Path, access: AccessMode, writer: WriterMode) -> anyhow::Result<Self> {
        let (name, map) = open_pinned(path, access, writer)?;
        let map = Array::<MapData, V>::try_from(map)
            .map_err(|e| anyhow::anyhow!("map {name} is not an array of the expected shape: {e}"))?;
        Ok(Self {
            name,
            access,
            map: Mutex::new(map),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> Result<MutexGuard<'_, Array<MapData, V>>, DomainError> {
        self.map.lock().map_err(|_| {
            DomainError::resource(format!("{} handle lock poisoned", self.name), libc::EIO)
        })
    }
}

impl<V> BpfMapPort<u32, V> for PinnedBpfArray<V>
where
    V: Pod + Send,
{
    fn get(&self, key: &u32) -> Result<Option<V>, DomainError> {
        self.access.check_read("get", &self.name)?;
        let map = self.lock()?;
        if *key >= map.len() {
            return Ok(None);
        }
        map.get(key, 0)
            .map(Some)
            .map_err(|e| DomainError::resource(format!("get {}", self.name), map_errno(&e)))
    }

    fn put(&self, key: u32, value: V) -> Result<(), DomainError> {
        self.access.check_write("put", &self.name)?;
        let mut map = self.lock()?;
        map.set(key, value, 0)
            .map_err(|e| DomainError::resource(format!("put {}", self.name), map_errno(&e)))
    }

    fn delete(&self, _key: &u32) -> Result<bool, DomainError> {
        Err(DomainError::Unsupported(format!(
            "delete on array map {}",
            self.name
        )))
    }

    fn keys(&self) -> Result<Vec<u32>, DomainError> {
        self.access.check_read("keys", &self.name)?;
        let map = self.lock()?;
        let keys = slot_indexes(map.len());
        debug!(map = %self.name, count = keys.len(), "enumerated slots");
        Ok(keys)
    }
}

fn slot_indexes(len: u32) -> Vec<u32> {
    (0..len).collect()
}
