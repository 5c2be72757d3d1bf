/// Secondary port for network interface name/index resolution.
///
/// Implemented by `IfIndexResolver` in the adapter layer.
pub trait InterfaceResolverPort: Send + Sync {
    /// Index of the interface called `name`, or `None` if there is none.
    fn index_of(&self, name: &str) -> Option<u32>;

    /// Name of the interface with `index`, or `None` if there is none.
    fn name_of(&self, index: u32) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_resolver_port_is_object_safe() {
        fn _check(port: &dyn InterfaceResolverPort) {
            let _ = port.index_of("lo");
        }
    }
}
