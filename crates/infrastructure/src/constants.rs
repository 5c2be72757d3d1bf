use ebpf_common::pin_paths::{DEFAULT_BPF_FS, PIN_DIR};

// ── Paths ──────────────────────────────────────────────────────────

pub const DEFAULT_CONFIG_PATH: &str = "/etc/netmaps/config.yaml";

/// bpffs mount point holding the pinned maps.
pub const DEFAULT_BPF_FS_ROOT: &str = DEFAULT_BPF_FS;

/// Directory under the bpffs root shared with the packet-path loader.
pub const DEFAULT_PIN_DIR: &str = PIN_DIR;
