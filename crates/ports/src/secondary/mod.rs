pub mod bpf_map_port;
pub mod interface_resolver_port;
pub mod kernel_sync_port;
