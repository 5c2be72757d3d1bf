use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use domain::common::error::DomainError;
use domain::ingress::entity::{IngressDiscardRule, discard_key};
use ports::secondary::interface_resolver_port::InterfaceResolverPort;
use tracing::info;

use crate::lock::acquire;
use crate::maps::IngressDiscardMap;

/// Drops traffic to an address unless it arrives on an allowed interface.
pub struct IngressDiscardAppService {
    ingress_discard: IngressDiscardMap,
    interfaces: Arc<dyn InterfaceResolverPort>,
    ingress_discard_lock: Mutex<()>,
}

impl IngressDiscardAppService {
    pub fn new(ingress_discard: IngressDiscardMap, interfaces: Arc<dyn InterfaceResolverPort>) -> Self {
        Self {
            ingress_discard,
            interfaces,
            ingress_discard_lock: Mutex::new(()),
        }
    }

    pub fn set_ingress_discard_rule(&self, addr: IpAddr, iface: &str) -> Result<(), DomainError> {
        let ifindex = self
            .interfaces
            .index_of(iface)
            .ok_or_else(|| DomainError::NotFound(format!("interface {iface}")))?;
        let _guard = acquire(&self.ingress_discard_lock, "ingress_discard_lock")?;
        self.ingress_discard
            .put(discard_key(addr), IngressDiscardRule::single(ifindex).into())?;
        info!(%addr, iface, ifindex, "ingress discard rule set");
        Ok(())
    }

    /// Remove the rule for `addr`. Removing an absent rule is not an error.
    pub fn remove_ingress_discard_rule(&self, addr: IpAddr) -> Result<(), DomainError> {
        let _guard = acquire(&self.ingress_discard_lock, "ingress_discard_lock")?;
        let existed = self.ingress_discard.delete(&discard_key(addr))?;
        info!(%addr, existed, "ingress discard rule removed");
        Ok(())
    }

    pub fn get_ingress_discard_rule(
        &self,
        addr: IpAddr,
    ) -> Result<Option<IngressDiscardRule>, DomainError> {
        Ok(self
            .ingress_discard
            .get(&discard_key(addr))?
            .map(IngressDiscardRule::from))
    }

    pub fn clear(&self) -> Result<(), DomainError> {
        let _guard = acquire(&self.ingress_discard_lock, "ingress_discard_lock")?;
        self.ingress_discard.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    use ebpf_common::ingress_discard::{IngressDiscardKey, IngressDiscardValue};
    use ports::test_utils::{InMemoryMap, StaticInterfaces};

    fn make_service() -> (
        IngressDiscardAppService,
        Arc<InMemoryMap<IngressDiscardKey, IngressDiscardValue>>,
    ) {
        let map = Arc::new(InMemoryMap::<IngressDiscardKey, IngressDiscardValue>::new());
        let ifaces = Arc::new(StaticInterfaces::new(&[("wlan0", 3)]));
        (IngressDiscardAppService::new(map.clone(), ifaces), map)
    }

    #[test]
    fn set_get_remove_v4() {
        let (svc, map) = make_service();
        let addr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));
        svc.set_ingress_discard_rule(addr, "wlan0").unwrap();
        assert_eq!(
            svc.get_ingress_discard_rule(addr).unwrap(),
            Some(IngressDiscardRule { iif1: 3, iif2: 3 })
        );
        // Same rule seen through the IPv4-mapped address.
        let mapped = IpAddr::V6(Ipv4Addr::new(192, 0, 2, 10).to_ipv6_mapped());
        assert!(svc.get_ingress_discard_rule(mapped).unwrap().is_some());

        svc.remove_ingress_discard_rule(addr).unwrap();
        assert!(map.is_empty());
        svc.remove_ingress_discard_rule(addr).unwrap();
    }

    #[test]
    fn unknown_interface_is_not_found() {
        let (svc, map) = make_service();
        let addr = IpAddr::V6(Ipv6Addr::LOCALHOST);
        let err = svc.set_ingress_discard_rule(addr, "eth3").unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(map.is_empty());
    }

    #[test]
    fn write_failure_surfaces() {
        let (svc, map) = make_service();
        map.fail_all_writes(7);
        let addr = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert_eq!(
            svc.set_ingress_discard_rule(addr, "wlan0").unwrap_err().errno(),
            Some(7)
        );
    }

    #[test]
    fn clear_empties_map() {
        let (svc, map) = make_service();
        svc.set_ingress_discard_rule(IpAddr::V6(Ipv6Addr::LOCALHOST), "wlan0")
            .unwrap();
        svc.clear().unwrap();
        assert!(map.is_empty());
    }
}
