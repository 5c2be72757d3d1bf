//! Pinned map names. The full path is `<bpf_fs>/<PIN_DIR>/<name>`; it is the
//! compatibility contract with already-loaded kernel programs.

pub const DEFAULT_BPF_FS: &str = "/sys/fs/bpf";
pub const PIN_DIR: &str = "netd_shared";

pub const CONFIGURATION_MAP: &str = "map_netd_configuration_map";
pub const UID_OWNER_MAP: &str = "map_netd_uid_owner_map";
pub const UID_PERMISSION_MAP: &str = "map_netd_uid_permission_map";
pub const COOKIE_TAG_MAP: &str = "map_netd_cookie_tag_map";
pub const DATA_SAVER_ENABLED_MAP: &str = "map_netd_data_saver_enabled_map";
pub const INGRESS_DISCARD_MAP: &str = "map_netd_ingress_discard_map";

pub const ALL_MAPS: [&str; 6] = [
    CONFIGURATION_MAP,
    UID_OWNER_MAP,
    UID_PERMISSION_MAP,
    COOKIE_TAG_MAP,
    DATA_SAVER_ENABLED_MAP,
    INGRESS_DISCARD_MAP,
];
