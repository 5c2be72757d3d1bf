use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use domain::common::error::DomainError;
use domain::firewall::blocked::{BlockedReasons, blocked_reasons, is_blocked};
use domain::firewall::entity::UidMatch;
use ports::secondary::bpf_map_port::BpfMapPort;
use ports::secondary::interface_resolver_port::InterfaceResolverPort;
use ports::secondary::kernel_sync_port::KernelSyncPort;
use serde::Serialize;
use tracing::{error, info};

use crate::config_service_impl::ConfigAppService;
use crate::data_saver_service_impl::DataSaverAppService;
use crate::firewall_chain_service_impl::FirewallChainAppService;
use crate::ingress_discard_service_impl::IngressDiscardAppService;
use crate::maps::{
    ConfigurationMap, CookieTagMap, DataSaverEnabledMap, IngressDiscardMap, UidOwnerMap,
    UidPermissionMap,
};
use crate::permission_service_impl::PermissionAppService;
use crate::stats_map_service_impl::StatsMapAppService;

/// Everything `NetMaps` needs from the outside world.
pub struct NetMapsDeps {
    pub configuration: ConfigurationMap,
    pub uid_owner: UidOwnerMap,
    pub uid_permission: UidPermissionMap,
    pub cookie_tag: CookieTagMap,
    pub data_saver_enabled: DataSaverEnabledMap,
    pub ingress_discard: IngressDiscardMap,
    pub kernel: Arc<dyn KernelSyncPort>,
    pub interfaces: Arc<dyn InterfaceResolverPort>,
}

/// Entry counts of the maps reported for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapSizes {
    pub cookie_tag: usize,
    pub uid_owner: usize,
    pub uid_permission: usize,
}

/// Owner of every netd map controller.
///
/// Built once and shared by reference; each controller holds the lock for
/// the map or configuration key it writes.
pub struct NetMaps {
    pub firewall: FirewallChainAppService,
    pub config: ConfigAppService,
    pub stats: StatsMapAppService,
    pub permission: PermissionAppService,
    pub ingress_discard: IngressDiscardAppService,
    pub data_saver: DataSaverAppService,
    uid_owner: UidOwnerMap,
    uid_permission: UidPermissionMap,
    cookie_tag: CookieTagMap,
}

impl NetMaps {
    pub fn new(deps: NetMapsDeps) -> Self {
        Self {
            firewall: FirewallChainAppService::new(
                Arc::clone(&deps.uid_owner),
                Arc::clone(&deps.interfaces),
            ),
            config: ConfigAppService::new(Arc::clone(&deps.configuration)),
            stats: StatsMapAppService::new(deps.configuration, deps.kernel),
            permission: PermissionAppService::new(Arc::clone(&deps.uid_permission)),
            ingress_discard: IngressDiscardAppService::new(deps.ingress_discard, deps.interfaces),
            data_saver: DataSaverAppService::new(deps.data_saver_enabled),
            uid_owner: deps.uid_owner,
            uid_permission: deps.uid_permission,
            cookie_tag: deps.cookie_tag,
        }
    }

    /// Reset the maps this controller owns to their start-up state.
    ///
    /// Order: chain-enable word, stats selector, UID owner map, data saver,
    /// ingress discard map. The permission and cookie tag maps survive.
    pub fn init(&self) -> Result<(), DomainError> {
        let steps: [(&str, &dyn Fn() -> Result<(), DomainError>); 5] = [
            ("reset uid rules configuration", &|| self.config.reset()),
            ("reset stats map selector", &|| self.stats.reset()),
            ("clear uid owner map", &|| self.firewall.clear()),
            ("disable data saver", &|| {
                self.data_saver.set_data_saver_enabled(false)
            }),
            ("clear ingress discard map", &|| self.ingress_discard.clear()),
        ];
        for (step, run) in steps {
            run().map_err(|e| {
                error!(step, error = %e, "netd map initialization failed");
                DomainError::InitFailed(format!("{step}: {e}"))
            })?;
        }
        info!("netd maps initialized");
        Ok(())
    }

    // ── Blocked reasons ─────────────────────────────────────────────

    pub fn get_uid_networking_blocked_reasons(&self, uid: u32) -> Result<BlockedReasons, DomainError> {
        let enabled = self.config.enabled_chains()?;
        let rule = self
            .firewall
            .uid_record(uid)?
            .map_or(UidMatch::empty(), |r| r.rule);
        let data_saver = self.data_saver.data_saver_enabled()?;
        Ok(blocked_reasons(uid, enabled, rule, data_saver))
    }

    pub fn is_uid_networking_blocked(&self, uid: u32, metered: bool) -> Result<bool, DomainError> {
        Ok(is_blocked(
            self.get_uid_networking_blocked_reasons(uid)?,
            metered,
        ))
    }

    pub fn is_uid_restricted_on_metered_networks(&self, uid: u32) -> Result<bool, DomainError> {
        Ok(!self
            .get_uid_networking_blocked_reasons(uid)?
            .metered()
            .is_empty())
    }

    // ── Introspection ───────────────────────────────────────────────

    /// Distinct keys per map. Iteration can restart when another process
    /// deletes entries, so keys are counted through a set.
    pub fn map_sizes(&self) -> Result<MapSizes, DomainError> {
        Ok(MapSizes {
            cookie_tag: distinct_keys(self.cookie_tag.as_ref())?,
            uid_owner: distinct_keys(self.uid_owner.as_ref())?,
            uid_permission: distinct_keys(self.uid_permission.as_ref())?,
        })
    }
}

fn distinct_keys<K: Eq + Hash, V>(map: &dyn BpfMapPort<K, V>) -> Result<usize, DomainError> {
    let mut keys = HashSet::new();
    map.for_each(&mut |k, _| {
        keys.insert(k);
    })?;
    Ok(keys.len())
}
