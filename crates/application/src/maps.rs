//! Shared handle types for the netd maps.

use std::sync::Arc;

use ebpf_common::cookie_tag::{CookieTagKey, CookieTagValue};
use ebpf_common::ingress_discard::{IngressDiscardKey, IngressDiscardValue};
use ebpf_common::uid_owner::UidOwnerValue;
use ports::secondary::bpf_map_port::BpfMapPort;

pub type ConfigurationMap = Arc<dyn BpfMapPort<u32, u32>>;
pub type UidOwnerMap = Arc<dyn BpfMapPort<u32, UidOwnerValue>>;
pub type UidPermissionMap = Arc<dyn BpfMapPort<u32, u8>>;
pub type CookieTagMap = Arc<dyn BpfMapPort<CookieTagKey, CookieTagValue>>;
pub type DataSaverEnabledMap = Arc<dyn BpfMapPort<u32, u8>>;
pub type IngressDiscardMap = Arc<dyn BpfMapPort<IngressDiscardKey, IngressDiscardValue>>;
