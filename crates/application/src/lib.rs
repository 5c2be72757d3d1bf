#![forbid(unsafe_code)]

pub mod config_service_impl;
pub mod data_saver_service_impl;
pub mod firewall_chain_service_impl;
pub mod ingress_discard_service_impl;
pub mod lock;
pub mod maps;
pub mod net_maps;
pub mod permission_service_impl;
pub mod stats_map_service_impl;
