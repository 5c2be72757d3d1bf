pub mod interface_resolver;
pub mod kernel_sync;
pub mod loader;
pub mod pinned_array;
pub mod pinned_map;
