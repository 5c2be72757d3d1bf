use std::net::IpAddr;

use serde::Serialize;

use ebpf_common::ingress_discard::{IngressDiscardKey, IngressDiscardValue};

/// Ingress discard key for `addr`; IPv4 is stored IPv4-mapped.
pub fn discard_key(addr: IpAddr) -> IngressDiscardKey {
    match addr {
        IpAddr::V4(v4) => IngressDiscardKey::from_v4_octets(v4.octets()),
        IpAddr::V6(v6) => IngressDiscardKey::from_v6_octets(v6.octets()),
    }
}

/// Interfaces on which traffic to a discarded address is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngressDiscardRule {
    pub iif1: u32,
    pub iif2: u32,
}

impl IngressDiscardRule {
    /// Rule admitting a single interface. Both slots carry the same index.
    pub fn single(ifindex: u32) -> Self {
        Self {
            iif1: ifindex,
            iif2: ifindex,
        }
    }
}

impl From<IngressDiscardValue> for IngressDiscardRule {
    fn from(v: IngressDiscardValue) -> Self {
        Self {
            iif1: v.iif1,
            iif2: v.iif2,
        }
    }
}

impl From<IngressDiscardRule> for IngressDiscardValue {
    fn from(r: IngressDiscardRule) -> Self {
        Self {
            iif1: r.iif1,
            iif2: r.iif2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn v4_and_mapped_v6_share_a_key() {
        let v4 = discard_key(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        let mapped = discard_key(IpAddr::V6(Ipv4Addr::new(10, 0, 0, 1).to_ipv6_mapped()));
        assert_eq!(v4, mapped);
    }

    #[test]
    fn v6_key_is_raw_octets() {
        let addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
        assert_eq!(discard_key(IpAddr::V6(addr)).dst_addr, addr.octets());
    }

    #[test]
    fn single_fills_both_slots() {
        let v: IngressDiscardValue = IngressDiscardRule::single(4).into();
        assert_eq!((v.iif1, v.iif2), (4, 4));
    }
}
