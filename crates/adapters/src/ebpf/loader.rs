use std::path::{Path, PathBuf};
use std::sync::Arc;

use ebpf_common::cookie_tag::{CookieTagKey, CookieTagValue};
use ebpf_common::ingress_discard::{IngressDiscardKey, IngressDiscardValue};
use ebpf_common::pin_paths::{
    CONFIGURATION_MAP, COOKIE_TAG_MAP, DATA_SAVER_ENABLED_MAP, INGRESS_DISCARD_MAP,
    UID_OWNER_MAP, UID_PERMISSION_MAP,
};
use ebpf_common::uid_owner::UidOwnerValue;
use tracing::info;

use super::pinned_array::PinnedBpfArray;
use super::pinned_map::{AccessMode, PinnedBpfMap, WriterMode};

/// Handles on every netd map this process manages.
pub struct NetdMaps {
    pub configuration: Arc<PinnedBpfArray<u32>>,
    pub uid_owner: Arc<PinnedBpfMap<u32, UidOwnerValue>>,
    pub uid_permission: Arc<PinnedBpfMap<u32, u8>>,
    pub cookie_tag: Arc<PinnedBpfMap<CookieTagKey, CookieTagValue>>,
    pub data_saver_enabled: Arc<PinnedBpfArray<u8>>,
    pub ingress_discard: Arc<PinnedBpfMap<IngressDiscardKey, IngressDiscardValue>>,
}

/// Opens the pinned netd maps under one bpffs directory.
pub struct NetdMapLoader {
    pin_root: PathBuf,
    access: AccessMode,
    writer: WriterMode,
}

impl NetdMapLoader {
    /// `writer` applies to the maps this process owns. The cookie tag map is
    /// also written by the socket destroy listener and is always opened
    /// lockless.
    pub fn new(pin_root: impl Into<PathBuf>, access: AccessMode, writer: WriterMode) -> Self {
        Self {
            pin_root: pin_root.into(),
            access,
            writer,
        }
    }

    pub fn path_of(&self, map: &str) -> PathBuf {
        self.pin_root.join(map)
    }

    pub fn pin_root(&self) -> &Path {
        &self.pin_root
    }

    fn open<K: aya::Pod, V: aya::Pod>(
        &self,
        map: &str,
        writer: WriterMode,
    ) -> anyhow::Result<Arc<PinnedBpfMap<K, V>>> {
        Ok(Arc::new(PinnedBpfMap::open(
            &self.path_of(map),
            self.access,
            writer,
        )?))
    }

    fn open_array<V: aya::Pod>(
        &self,
        map: &str,
        writer: WriterMode,
    ) -> anyhow::Result<Arc<PinnedBpfArray<V>>> {
        Ok(Arc::new(PinnedBpfArray::open(
            &self.path_of(map),
            self.access,
            writer,
        )?))
    }

    /// The configuration and data saver maps are arrays; the rest are hashes.
    pub fn open_all(&self) -> anyhow::Result<NetdMaps> {
        let maps = NetdMaps {
            configuration: self.open_array(CONFIGURATION_MAP, self.writer)?,
            uid_owner: self.open(UID_OWNER_MAP, self.writer)?,
            uid_permission: self.open(UID_PERMISSION_MAP, self.writer)?,
            cookie_tag: self.open(COOKIE_TAG_MAP, WriterMode::Lockless)?,
            data_saver_enabled: self.open_array(DATA_SAVER_ENABLED_MAP, self.writer)?,
            ingress_discard: self.open(INGRESS_DISCARD_MAP, self.writer)?,
        };
        info!(
            pin_root = %self.pin_root.display(),
            access = ?self.access,
            writer = ?self.writer,
            "netd maps opened"
        );
        Ok(maps)
    }
}
