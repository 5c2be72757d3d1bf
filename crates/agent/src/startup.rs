use std::path::Path;
use std::sync::Arc;

use adapters::ebpf::interface_resolver::IfIndexResolver;
use adapters::ebpf::kernel_sync::PfKeySync;
use adapters::ebpf::loader::NetdMapLoader;
use adapters::ebpf::pinned_map::{AccessMode, WriterMode};
use anyhow::Context;
use application::net_maps::{NetMaps, NetMapsDeps};
use infrastructure::config::AgentConfig;
use infrastructure::constants::DEFAULT_CONFIG_PATH;
use infrastructure::logging::init_logging;
use tracing::info;

use crate::cli::Cli;

/// Load config and install the global subscriber.
pub fn bootstrap(cli: &Cli) -> anyhow::Result<AgentConfig> {
    // A missing file is only tolerated at the default location.
    let path = Path::new(&cli.config);
    let config = AgentConfig::load_or_default(path, cli.config == DEFAULT_CONFIG_PATH)
        .with_context(|| format!("loading {}", path.display()))?;

    // CLI flags take precedence over config file
    let log_level = cli.log_level.unwrap_or(config.agent.log_level);
    let log_format = cli.log_format.unwrap_or(config.agent.log_format);
    init_logging(log_level, log_format)?;

    Ok(config)
}

/// Lock discipline for a command against the configured maps.
///
/// Every mutating command holds the exclusive lock: the read-modify-write
/// sequences are only serialised within one process.
pub fn map_modes(config: &AgentConfig, read_only: bool) -> (AccessMode, WriterMode) {
    if read_only {
        (AccessMode::ReadOnly, WriterMode::Lockless)
    } else if config.maps.wait_for_writer {
        (AccessMode::ReadWrite, WriterMode::SingleWait)
    } else {
        (AccessMode::ReadWrite, WriterMode::Single)
    }
}

/// Open every pinned map and wire the controllers over them.
pub fn open_net_maps(config: &AgentConfig, read_only: bool) -> anyhow::Result<NetMaps> {
    let (access, writer) = map_modes(config, read_only);
    let loader = NetdMapLoader::new(config.maps.pin_root(), access, writer);
    let maps = loader
        .open_all()
        .with_context(|| format!("opening maps under {}", loader.pin_root().display()))?;

    info!(
        pin_root = %loader.pin_root().display(),
        ?access,
        ?writer,
        "pinned maps opened"
    );

    Ok(NetMaps::new(NetMapsDeps {
        configuration: maps.configuration,
        uid_owner: maps.uid_owner,
        uid_permission: maps.uid_permission,
        cookie_tag: maps.cookie_tag,
        data_saver_enabled: maps.data_saver_enabled,
        ingress_discard: maps.ingress_discard,
        kernel: Arc::new(PfKeySync),
        interfaces: Arc::new(IfIndexResolver),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_never_take_writer_locks() {
        let config = AgentConfig::default();
        assert_eq!(
            map_modes(&config, true),
            (AccessMode::ReadOnly, WriterMode::Lockless)
        );
    }

    #[test]
    fn mutations_always_take_exclusive_lock() {
        let mut config = AgentConfig::default();
        assert_eq!(
            map_modes(&config, false),
            (AccessMode::ReadWrite, WriterMode::Single)
        );
        config.maps.wait_for_writer = true;
        assert_eq!(
            map_modes(&config, false),
            (AccessMode::ReadWrite, WriterMode::SingleWait)
        );
    }
}
