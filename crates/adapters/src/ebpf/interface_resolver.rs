use nix::net::if_::{if_nameindex, if_nametoindex};
use ports::secondary::interface_resolver_port::InterfaceResolverPort;
use tracing::debug;

/// Interface resolution through `if_nametoindex(3)` / `if_nameindex(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IfIndexResolver;

impl InterfaceResolverPort for IfIndexResolver {
    fn index_of(&self, name: &str) -> Option<u32> {
        match if_nametoindex(name) {
            Ok(0) => None,
            Ok(idx) => Some(idx),
            Err(errno) => {
                debug!(interface = name, %errno, "interface not found");
                None
            }
        }
    }

    fn name_of(&self, index: u32) -> Option<String> {
        let ifaces = if_nameindex().ok()?;
        ifaces
            .iter()
            .find(|iface| iface.index() == index)
            .map(|iface| iface.name().to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_resolves_both_ways() {
        let resolver = IfIndexResolver;
        let Some(idx) = resolver.index_of("lo") else {
            // No loopback in this sandbox.
            return;
        };
        assert_eq!(resolver.name_of(idx).as_deref(), Some("lo"));
    }

    #[test]
    fn unknown_interface_is_none() {
        assert_eq!(IfIndexResolver.index_of("does-not-exist0"), None);
    }
}
