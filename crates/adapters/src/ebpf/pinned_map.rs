use std::os::fd::{AsFd, AsRawFd};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, anyhow};
use aya::Pod;
use aya::maps::{HashMap, Map, MapData, MapError};
use domain::common::error::DomainError;
use nix::fcntl::{FcntlArg, fcntl};
use ports::secondary::bpf_map_port::BpfMapPort;
use tracing::{debug, info};

const ENOENT: i32 = libc::ENOENT;
const EIO: i32 = libc::EIO;

/// Which operations a handle permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    fn can_read(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    fn can_write(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }

    pub(crate) fn check_read(self, op: &str, map: &str) -> Result<(), DomainError> {
        if self.can_read() {
            Ok(())
        } else {
            Err(DomainError::Unsupported(format!("{op} on write-only map {map}")))
        }
    }

    pub(crate) fn check_write(self, op: &str, map: &str) -> Result<(), DomainError> {
        if self.can_write() {
            Ok(())
        } else {
            Err(DomainError::Unsupported(format!("{op} on read-only map {map}")))
        }
    }
}

/// How a handle coordinates with other processes writing the same map.
///
/// The lock is an open-file-description lock on the byte at offset
/// `map id` of the map fd; it is released when the handle is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterMode {
    /// Exclusive write lock: this process is the only writer. Fails at
    /// once when another handle holds the lock.
    Single,
    /// As `Single`, but waits for the current holder to release it.
    SingleWait,
    /// Shared read lock: blocks a `Single` writer elsewhere.
    Shared,
    /// No lock, for maps another process also writes.
    Lockless,
}

/// aya `HashMap` over a pinned map, implementing `BpfMapPort`.
///
/// aya needs `&mut` for writes, so the map sits behind a `Mutex`. That
/// mutex only serialises syscalls on this handle; read-modify-write
/// atomicity is the caller's concern.
pub struct PinnedBpfMap<K, V> {
    name: String,
    access: AccessMode,
    map: Mutex<HashMap<MapData, K, V>>,
}

impl<K: Pod, V: Pod> PinnedBpfMap<K, V> {
    /// Open the hash map pinned at `path`.
    pub fn open(path: &Path, access: AccessMode, writer: WriterMode) -> anyhow::Result<Self> {
        let (name, map) = open_pinned(path, access, writer)?;
        let map = HashMap::<MapData, K, V>::try_from(map)
            .map_err(|e| anyhow!("map {name} is not a hash map of the expected shape: {e}"))?;
        Ok(Self {
            name,
            access,
            map: Mutex::new(map),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<MapData, K, V>>, DomainError> {
        self.map
            .lock()
            .map_err(|_| DomainError::resource(format!("{} handle lock poisoned", self.name), EIO))
    }

    fn check_read(&self, op: &str) -> Result<(), DomainError> {
        self.access.check_read(op, &self.name)
    }

    fn check_write(&self, op: &str) -> Result<(), DomainError> {
        self.access.check_write(op, &self.name)
    }

    fn failure(&self, op: &str, e: &MapError) -> DomainError {
        DomainError::resource(format!("{op} {}", self.name), map_errno(e))
    }
}

impl<K, V> BpfMapPort<K, V> for PinnedBpfMap<K, V>
where
    K: Pod + Send,
    V: Pod + Send,
{
    fn get(&self, key: &K) -> Result<Option<V>, DomainError> {
        self.check_read("get")?;
        let map = self.lock()?;
        match map.get(key, 0) {
            Ok(value) => Ok(Some(value)),
            Err(e) if map_errno(&e) == ENOENT => Ok(None),
            Err(e) => Err(self.failure("get", &e)),
        }
    }

    fn put(&self, key: K, value: V) -> Result<(), DomainError> {
        self.check_write("put")?;
        let mut map = self.lock()?;
        map.insert(key, value, 0)
            .map_err(|e| self.failure("put", &e))
    }

    fn delete(&self, key: &K) -> Result<bool, DomainError> {
        self.check_write("delete")?;
        let mut map = self.lock()?;
        match map.remove(key) {
            Ok(()) => Ok(true),
            Err(e) if map_errno(&e) == ENOENT => Ok(false),
            Err(e) => Err(self.failure("delete", &e)),
        }
    }

    fn keys(&self) -> Result<Vec<K>, DomainError> {
        self.check_read("keys")?;
        let map = self.lock()?;
        let mut keys = Vec::new();
        for key in map.keys() {
            match key {
                Ok(k) => keys.push(k),
                Err(e) => return Err(self.failure("iterate", &e)),
            }
        }
        debug!(map = %self.name, count = keys.len(), "enumerated keys");
        Ok(keys)
    }
}

/// Errno carried by an aya map error. A missing key maps to `ENOENT`.
pub fn map_errno(e: &MapError) -> i32 {
    match e {
        MapError::KeyNotFound => ENOENT,
        MapError::OutOfBounds { .. } => libc::E2BIG,
        MapError::SyscallError(err) => err.io_error.raw_os_error().unwrap_or(EIO),
        _ => EIO,
    }
}

/// Open the pin at `path`, take the `writer` lock and classify the map.
pub(crate) fn open_pinned(
    path: &Path,
    access: AccessMode,
    writer: WriterMode,
) -> anyhow::Result<(String, Map)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let data = MapData::from_pin(path)
        .map_err(|e| anyhow!("failed to open pinned map {}: {e}", path.display()))?;
    let map_id = data
        .info()
        .with_context(|| format!("failed to read info of map {name}"))?
        .id();
    lock_map(&data, map_id, writer).with_context(|| format!("failed to lock map {name}"))?;

    let map = Map::from_map_data(data).map_err(|e| anyhow!("invalid map type for {name}: {e}"))?;
    info!(map = %name, map_id, ?access, ?writer, "pinned map opened");
    Ok((name, map))
}

fn lock_map(data: &MapData, map_id: u32, writer: WriterMode) -> anyhow::Result<()> {
    let l_type = match writer {
        WriterMode::Single | WriterMode::SingleWait => libc::F_WRLCK,
        WriterMode::Shared => libc::F_RDLCK,
        WriterMode::Lockless => return Ok(()),
    };
    let lock = libc::flock {
        l_type: l_type as libc::c_short,
        l_whence: libc::SEEK_SET as libc::c_short,
        l_start: map_id as libc::off_t,
        l_len: 1,
        l_pid: 0,
    };
    let arg = if writer == WriterMode::SingleWait {
        FcntlArg::F_OFD_SETLKW(&lock)
    } else {
        FcntlArg::F_OFD_SETLK(&lock)
    };
    fcntl(data.fd().as_fd().as_raw_fd(), arg).map_err(|errno| {
        anyhow!("map {map_id} is held by another writer ({writer:?}): {errno}")
    })?;
    Ok(())
}
