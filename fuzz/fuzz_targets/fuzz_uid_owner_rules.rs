#![no_main]

use std::collections::HashMap;
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;

use application::firewall_chain_service_impl::FirewallChainAppService;
use domain::firewall::chain::FirewallChain;
use domain::firewall::entity::UidMatch;
use ebpf_common::uid_owner::UidOwnerValue;
use ports::secondary::bpf_map_port::BpfMapPort;
use ports::test_utils::{InMemoryMap, StaticInterfaces};

// Random add/remove/replace sequences against the UID owner map.
//
// Layout: consumed in 3-byte ops
//   [0] = op (0=add, 1=remove, 2=replace, 3=iif add, 4=lockdown toggle)
//   [1] = chain selector / iif
//   [2] = uid selector (8 UIDs) or replacement bitmap
//
// After every op: a UID has an entry iff its rule word is nonzero, and
// the stored rule word matches the model.
fuzz_target!(|data: &[u8]| {
    let map: Arc<InMemoryMap<u32, UidOwnerValue>> = Arc::new(InMemoryMap::new());
    let svc = FirewallChainAppService::new(
        map.clone(),
        Arc::new(StaticInterfaces::new(&[("wlan0", 3)])),
    );
    let mut model: HashMap<u32, u64> = HashMap::new();

    for op in data.chunks_exact(3) {
        let chain = FirewallChain::ALL[op[1] as usize % FirewallChain::ALL.len()];
        let uid = 10_000 + u32::from(op[2] % 8);

        match op[0] % 5 {
            0 => {
                if svc.add_rule(uid, chain.match_for(), 0).is_ok() {
                    *model.entry(uid).or_default() |= chain.match_for().bits();
                }
            }
            1 => {
                if svc.remove_rule(uid, chain.match_for()).is_ok() {
                    *model.entry(uid).or_default() &= !chain.match_for().bits();
                }
            }
            2 => {
                let uids: Vec<u32> = (0..8u32)
                    .filter(|i| op[2] & (1 << i) != 0)
                    .map(|i| 10_000 + i)
                    .collect();
                let outcome = svc.replace_chain(chain, &uids).expect("replace_chain");
                assert!(outcome.is_complete());
                let bit = chain.match_for().bits();
                for (u, rule) in model.iter_mut() {
                    *rule &= !bit;
                    if uids.contains(u) {
                        *rule |= bit;
                    }
                }
                for &u in &uids {
                    model.entry(u).or_insert(bit);
                }
            }
            3 => {
                let iif = u32::from(op[1]) + 1;
                if svc.add_rule(uid, UidMatch::IIF, iif).is_ok() {
                    *model.entry(uid).or_default() |= UidMatch::IIF.bits();
                }
            }
            _ => {
                let add = op[1] & 1 == 0;
                if svc.update_uid_lockdown_rule(uid, add).is_ok() {
                    let bit = UidMatch::LOCKDOWN_VPN.bits();
                    let rule = model.entry(uid).or_default();
                    if add {
                        *rule |= bit;
                    } else {
                        *rule &= !bit;
                    }
                }
            }
        }

        for (&u, &rule) in &model {
            let stored = map.get(&u).expect("in-memory read");
            match stored {
                Some(v) => {
                    assert_ne!(v.rule, 0, "uid {u} kept an empty entry");
                    assert_eq!(v.rule, rule, "uid {u} rule drifted from model");
                }
                None => assert_eq!(rule, 0, "uid {u} lost a nonzero rule"),
            }
        }
    }
});
