//! Ingress discard map: packets to `dst_addr` are dropped unless they arrive
//! on one of the two allowed interfaces.

pub const INGRESS_DISCARD_MAP_SIZE: u32 = 100;

// ── Key — 16 bytes ──────────────────────────────────────────────────

/// Destination address in network byte order. IPv4 addresses are stored
/// IPv4-mapped (`::ffff:a.b.c.d`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IngressDiscardKey {
    pub dst_addr: [u8; 16],
}

impl IngressDiscardKey {
    pub fn from_v4_octets(octets: [u8; 4]) -> Self {
        let mut dst_addr = [0u8; 16];
        dst_addr[10] = 0xff;
        dst_addr[11] = 0xff;
        dst_addr[12..].copy_from_slice(&octets);
        Self { dst_addr }
    }

    pub fn from_v6_octets(octets: [u8; 16]) -> Self {
        Self { dst_addr: octets }
    }
}

// ── Value — 8 bytes ─────────────────────────────────────────────────

/// Two allowed ingress interfaces. Both slots hold the same index when only
/// one interface is allowed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngressDiscardValue {
    pub iif1: u32,
    pub iif2: u32,
}

#[cfg(feature = "userspace")]
unsafe impl aya::Pod for IngressDiscardKey {}
#[cfg(feature = "userspace")]
unsafe impl aya::Pod for IngressDiscardValue {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem;

    #[test]
    fn test_ingress_discard_layout() {
        assert_eq!(mem::size_of::<IngressDiscardKey>(), 16);
        assert_eq!(mem::size_of::<IngressDiscardValue>(), 8);
        assert_eq!(mem::offset_of!(IngressDiscardValue, iif2), 4);
    }

    #[test]
    fn test_v4_key_is_mapped() {
        let key = IngressDiscardKey::from_v4_octets([192, 0, 2, 1]);
        assert_eq!(
            key.dst_addr,
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 192, 0, 2, 1]
        );
    }
}
