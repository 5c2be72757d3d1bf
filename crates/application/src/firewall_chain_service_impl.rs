use std::sync::{Arc, Mutex, MutexGuard};

use domain::common::entity::BatchOutcome;
use domain::common::error::DomainError;
use domain::firewall::chain::FirewallChain;
use domain::firewall::entity::{FirewallRule, UidMatch, UidOwnerRecord};
use domain::firewall::error::FirewallError;
use domain::firewall::replace::stale_uids;
use ports::secondary::interface_resolver_port::InterfaceResolverPort;
use tracing::{debug, error, info};

use crate::lock::acquire;
use crate::maps::UidOwnerMap;

/// Per-UID firewall rules in the UID owner map.
///
/// Every read-modify-write of the map happens under `uid_owner_lock`.
/// Batch operations take the lock once and run the single-UID helpers with
/// the guard as witness.
pub struct FirewallChainAppService {
    uid_owner: UidOwnerMap,
    interfaces: Arc<dyn InterfaceResolverPort>,
    uid_owner_lock: Mutex<()>,
}

impl FirewallChainAppService {
    pub fn new(uid_owner: UidOwnerMap, interfaces: Arc<dyn InterfaceResolverPort>) -> Self {
        Self {
            uid_owner,
            interfaces,
            uid_owner_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, DomainError> {
        acquire(&self.uid_owner_lock, "uid_owner_lock")
    }

    /// Current record of `uid`, or `None` when the UID has no entry.
    pub fn uid_record(&self, uid: u32) -> Result<Option<UidOwnerRecord>, DomainError> {
        Ok(self.uid_owner.get(&uid)?.map(UidOwnerRecord::from))
    }

    // ── Single-UID rules ────────────────────────────────────────────

    /// Set `matches` for `uid`. `iif` must be zero unless `matches` is `IIF`.
    pub fn add_rule(&self, uid: u32, matches: UidMatch, iif: u32) -> Result<(), DomainError> {
        UidOwnerRecord::validate_add(matches, iif)?;
        let guard = self.lock()?;
        self.add_rule_locked(&guard, uid, matches, iif)
    }

    /// Clear `matches` for `uid`. Fails with `NotFound` when the UID has no
    /// entry at all.
    pub fn remove_rule(&self, uid: u32, matches: UidMatch) -> Result<(), DomainError> {
        let guard = self.lock()?;
        self.remove_rule_locked(&guard, uid, matches)
    }

    fn add_rule_locked(
        &self,
        _guard: &MutexGuard<'_, ()>,
        uid: u32,
        matches: UidMatch,
        iif: u32,
    ) -> Result<(), DomainError> {
        let current = self.uid_record(uid)?.unwrap_or_default();
        let updated = current.with_match(matches, iif);
        self.uid_owner.put(uid, updated.into())?;
        debug!(uid, matches = ?matches.names(), iif = updated.iif, "uid rule added");
        Ok(())
    }

    fn remove_rule_locked(
        &self,
        _guard: &MutexGuard<'_, ()>,
        uid: u32,
        matches: UidMatch,
    ) -> Result<(), DomainError> {
        let current = self
            .uid_record(uid)?
            .ok_or(FirewallError::NoEntry { uid })?;
        let updated = current.without_match(matches);
        if updated.is_empty() {
            self.uid_owner.delete(&uid)?;
        } else {
            self.uid_owner.put(uid, updated.into())?;
        }
        debug!(uid, matches = ?matches.names(), "uid rule removed");
        Ok(())
    }

    // ── Chains ──────────────────────────────────────────────────────

    /// Make `uids` the exact set of UIDs holding `chain`'s bit.
    ///
    /// Per-UID failures are logged and reported in the outcome; the batch
    /// always runs to the end.
    pub fn replace_chain(
        &self,
        chain: FirewallChain,
        uids: &[u32],
    ) -> Result<BatchOutcome, DomainError> {
        let bit = chain.match_for();
        let guard = self.lock()?;

        let mut entries = Vec::new();
        self.uid_owner.for_each(&mut |uid, value| {
            entries.push((uid, UidOwnerRecord::from(value).rule));
        })?;
        let stale = stale_uids(entries, bit, uids);

        let mut outcome = BatchOutcome::default();
        for uid in stale {
            let res = self.remove_rule_locked(&guard, uid, bit);
            if let Err(ref e) = res {
                error!(uid, chain = %chain, error = %e, "replace_chain: failed to remove rule");
            }
            outcome.record(uid, res.is_ok());
        }
        for &uid in uids {
            let res = self.add_rule_locked(&guard, uid, bit, 0);
            if let Err(ref e) = res {
                error!(uid, chain = %chain, error = %e, "replace_chain: failed to add rule");
            }
            outcome.record(uid, res.is_ok());
        }
        info!(
            chain = %chain,
            uids = uids.len(),
            failed = outcome.failed.len(),
            "firewall chain replaced"
        );
        Ok(outcome)
    }

    /// Apply a logical ALLOW/DENY, translated through chain polarity.
    pub fn set_uid_rule(
        &self,
        chain: FirewallChain,
        uid: u32,
        rule: FirewallRule,
    ) -> Result<(), DomainError> {
        let add = match rule {
            FirewallRule::Allow => chain.is_allow_list(),
            FirewallRule::Deny => !chain.is_allow_list(),
        };
        if add {
            self.add_rule(uid, chain.match_for(), 0)
        } else {
            self.remove_rule(uid, chain.match_for())
        }
    }

    /// Logical rule of `uid` on `chain`. A UID without an entry gets the
    /// chain's default: DENY on allow-lists, ALLOW on deny-lists.
    pub fn get_uid_rule(&self, chain: FirewallChain, uid: u32) -> Result<FirewallRule, DomainError> {
        let has_bit = self
            .uid_record(uid)?
            .is_some_and(|r| r.rule.contains(chain.match_for()));
        Ok(if chain.is_allow_list() == has_bit {
            FirewallRule::Allow
        } else {
            FirewallRule::Deny
        })
    }

    /// UIDs whose entry carries `chain`'s bit, in ascending order.
    pub fn get_uids_with_rule_on_chain(&self, chain: FirewallChain) -> Result<Vec<u32>, DomainError> {
        let bit = chain.match_for();
        let _guard = self.lock()?;
        let mut uids = Vec::new();
        self.uid_owner.for_each(&mut |uid, value| {
            if UidOwnerRecord::from(value).rule.contains(bit) {
                uids.push(uid);
            }
        })?;
        uids.sort_unstable();
        uids.dedup();
        Ok(uids)
    }

    /// UIDs explicitly allowed on an allow-list chain.
    pub fn get_uids_with_allow_rule_on_allow_list_chain(
        &self,
        chain: FirewallChain,
    ) -> Result<Vec<u32>, DomainError> {
        if !chain.is_allow_list() {
            return Err(FirewallError::WrongPolarity {
                chain: chain.name(),
                expected: "allow-list",
            }
            .into());
        }
        self.get_uids_with_rule_on_chain(chain)
    }

    /// UIDs explicitly denied on a deny-list chain.
    pub fn get_uids_with_deny_rule_on_deny_list_chain(
        &self,
        chain: FirewallChain,
    ) -> Result<Vec<u32>, DomainError> {
        if chain.is_allow_list() {
            return Err(FirewallError::WrongPolarity {
                chain: chain.name(),
                expected: "deny-list",
            }
            .into());
        }
        self.get_uids_with_rule_on_chain(chain)
    }

    // ── Special matches ─────────────────────────────────────────────

    pub fn update_uid_lockdown_rule(&self, uid: u32, add: bool) -> Result<(), DomainError> {
        if add {
            self.add_rule(uid, UidMatch::LOCKDOWN_VPN, 0)
        } else {
            self.remove_rule(uid, UidMatch::LOCKDOWN_VPN)
        }
    }

    /// Restrict `uids` to receive only on `if_name`. `None` allows every
    /// interface (index 0). An unknown name fails before anything is written.
    pub fn add_uid_interface_rules(
        &self,
        if_name: Option<&str>,
        uids: &[u32],
    ) -> Result<BatchOutcome, DomainError> {
        let ifindex = match if_name {
            None => 0,
            Some(name) => self
                .interfaces
                .index_of(name)
                .ok_or_else(|| DomainError::NotFound(format!("interface {name}")))?,
        };
        let guard = self.lock()?;
        let mut outcome = BatchOutcome::default();
        for &uid in uids {
            let res = self.add_rule_locked(&guard, uid, UidMatch::IIF, ifindex);
            if let Err(ref e) = res {
                error!(uid, interface = ?if_name, error = %e, "failed to add interface rule");
            }
            outcome.record(uid, res.is_ok());
        }
        info!(interface = ?if_name, ifindex, uids = uids.len(), "interface rules added");
        Ok(outcome)
    }

    /// Drop the interface restriction of `uids`. UIDs without an entry are
    /// logged and skipped.
    pub fn remove_uid_interface_rules(&self, uids: &[u32]) -> Result<BatchOutcome, DomainError> {
        let guard = self.lock()?;
        let mut outcome = BatchOutcome::default();
        for &uid in uids {
            let res = self.remove_rule_locked(&guard, uid, UidMatch::IIF);
            if let Err(ref e) = res {
                error!(uid, error = %e, "failed to remove interface rule");
            }
            outcome.record(uid, res.is_ok());
        }
        info!(uids = uids.len(), "interface rules removed");
        Ok(outcome)
    }

    /// Delete every entry of the UID owner map.
    pub fn clear(&self) -> Result<(), DomainError> {
        let _guard = self.lock()?;
        self.uid_owner.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebpf_common::uid_owner::UidOwnerValue;
    use ports::secondary::bpf_map_port::BpfMapPort;
    use ports::test_utils::{InMemoryMap, StaticInterfaces};

    fn make_service() -> (FirewallChainAppService, Arc<InMemoryMap<u32, UidOwnerValue>>) {
        let map = Arc::new(InMemoryMap::<u32, UidOwnerValue>::new());
        let ifaces = Arc::new(StaticInterfaces::new(&[("wlan0", 3), ("rmnet0", 9)]));
        let svc = FirewallChainAppService::new(map.clone(), ifaces);
        (svc, map)
    }

    fn rule_of(map: &InMemoryMap<u32, UidOwnerValue>, uid: u32) -> Option<UidOwnerValue> {
        map.get(&uid).unwrap()
    }

    #[test]
    fn add_then_remove_leaves_no_entry() {
        let (svc, map) = make_service();
        svc.add_rule(10_001, UidMatch::DOZABLE, 0).unwrap();
        assert_eq!(rule_of(&map, 10_001).unwrap().rule, UidMatch::DOZABLE.bits());
        svc.remove_rule(10_001, UidMatch::DOZABLE).unwrap();
        assert!(rule_of(&map, 10_001).is_none());
    }

    #[test]
    fn chain_and_interface_bits_share_one_entry() {
        let (svc, map) = make_service();
        svc.add_rule(10_001, UidMatch::HAPPY_BOX, 0).unwrap();
        svc.add_rule(10_001, UidMatch::IIF, 5).unwrap();
        assert_eq!(
            rule_of(&map, 10_001).unwrap(),
            UidOwnerValue::new(5, (UidMatch::HAPPY_BOX | UidMatch::IIF).bits())
        );

        svc.remove_rule(10_001, UidMatch::HAPPY_BOX).unwrap();
        assert_eq!(
            rule_of(&map, 10_001).unwrap(),
            UidOwnerValue::new(5, UidMatch::IIF.bits())
        );

        svc.remove_rule(10_001, UidMatch::IIF).unwrap();
        assert!(rule_of(&map, 10_001).is_none());
    }

    #[test]
    fn add_is_idempotent() {
        let (svc, map) = make_service();
        svc.add_rule(5, UidMatch::STANDBY, 0).unwrap();
        svc.add_rule(5, UidMatch::STANDBY, 0).unwrap();
        assert_eq!(rule_of(&map, 5).unwrap().rule, UidMatch::STANDBY.bits());
    }

    #[test]
    fn bits_are_independent() {
        let (svc, map) = make_service();
        svc.add_rule(7, UidMatch::DOZABLE, 0).unwrap();
        svc.add_rule(7, UidMatch::POWERSAVE, 0).unwrap();
        svc.remove_rule(7, UidMatch::DOZABLE).unwrap();
        assert_eq!(rule_of(&map, 7).unwrap().rule, UidMatch::POWERSAVE.bits());
    }

    #[test]
    fn add_rejects_iif_on_other_match() {
        let (svc, map) = make_service();
        let err = svc.add_rule(7, UidMatch::DOZABLE, 3).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert!(map.is_empty());
    }

    #[test]
    fn remove_without_entry_is_not_found() {
        let (svc, _) = make_service();
        let err = svc.remove_rule(42, UidMatch::STANDBY).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn write_failure_surfaces() {
        let (svc, map) = make_service();
        map.fail_all_writes(libc::ENOSPC);
        let err = svc.add_rule(1, UidMatch::STANDBY, 0).unwrap_err();
        assert_eq!(err.errno(), Some(libc::ENOSPC));
    }

    #[test]
    fn replace_chain_is_set_difference() {
        let (svc, map) = make_service();
        for uid in [1, 2, 3] {
            svc.add_rule(uid, UidMatch::STANDBY, 0).unwrap();
        }
        svc.add_rule(1, UidMatch::DOZABLE, 0).unwrap();

        let outcome = svc.replace_chain(FirewallChain::Standby, &[2, 3, 4]).unwrap();
        assert!(outcome.is_complete());

        assert_eq!(
            svc.get_uids_with_rule_on_chain(FirewallChain::Standby).unwrap(),
            vec![2, 3, 4]
        );
        // uid 1 keeps its other bit.
        assert_eq!(rule_of(&map, 1).unwrap().rule, UidMatch::DOZABLE.bits());
    }

    #[test]
    fn replace_chain_with_empty_set_removes_entries() {
        let (svc, map) = make_service();
        svc.add_rule(1, UidMatch::OEM_DENY_1, 0).unwrap();
        svc.replace_chain(FirewallChain::OemDeny1, &[]).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn replace_chain_tolerates_restarted_enumeration() {
        let (svc, map) = make_service();
        svc.add_rule(1, UidMatch::STANDBY, 0).unwrap();
        map.duplicate_keys_on_enumeration();

        let outcome = svc.replace_chain(FirewallChain::Standby, &[]).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.applied, 1);
        assert!(rule_of(&map, 1).is_none());
    }

    #[test]
    fn replace_chain_continues_past_failures() {
        let (svc, map) = make_service();
        map.fail_writes_for(3);
        let outcome = svc.replace_chain(FirewallChain::Dozable, &[2, 3, 4]).unwrap();
        assert_eq!(outcome.failed, vec![3]);
        assert_eq!(outcome.applied, 2);
        assert_eq!(
            svc.get_uids_with_rule_on_chain(FirewallChain::Dozable).unwrap(),
            vec![2, 4]
        );
    }

    #[test]
    fn get_uid_rule_follows_polarity() {
        let (svc, _) = make_service();
        let uid = 10_050;
        assert_eq!(
            svc.get_uid_rule(FirewallChain::Dozable, uid).unwrap(),
            FirewallRule::Deny
        );
        assert_eq!(
            svc.get_uid_rule(FirewallChain::Standby, uid).unwrap(),
            FirewallRule::Allow
        );
        svc.add_rule(uid, FirewallChain::Dozable.match_for(), 0).unwrap();
        svc.add_rule(uid, FirewallChain::Standby.match_for(), 0).unwrap();
        assert_eq!(
            svc.get_uid_rule(FirewallChain::Dozable, uid).unwrap(),
            FirewallRule::Allow
        );
        assert_eq!(
            svc.get_uid_rule(FirewallChain::Standby, uid).unwrap(),
            FirewallRule::Deny
        );
    }

    #[test]
    fn set_uid_rule_translates_polarity() {
        let (svc, map) = make_service();
        svc.set_uid_rule(FirewallChain::Powersave, 9, FirewallRule::Allow)
            .unwrap();
        svc.set_uid_rule(FirewallChain::OemDeny2, 9, FirewallRule::Deny)
            .unwrap();
        assert_eq!(
            rule_of(&map, 9).unwrap().rule,
            (UidMatch::POWERSAVE | UidMatch::OEM_DENY_2).bits()
        );
        svc.set_uid_rule(FirewallChain::Powersave, 9, FirewallRule::Deny)
            .unwrap();
        svc.set_uid_rule(FirewallChain::OemDeny2, 9, FirewallRule::Allow)
            .unwrap();
        assert!(rule_of(&map, 9).is_none());
    }

    #[test]
    fn enumeration_skips_vanished_entries() {
        let (svc, map) = make_service();
        svc.add_rule(1, UidMatch::STANDBY, 0).unwrap();
        svc.add_rule(2, UidMatch::STANDBY, 0).unwrap();
        map.vanish_on_read(2);
        assert_eq!(
            svc.get_uids_with_rule_on_chain(FirewallChain::Standby).unwrap(),
            vec![1]
        );
    }

    #[test]
    fn polarity_guarded_getters() {
        let (svc, _) = make_service();
        svc.add_rule(11, UidMatch::DOZABLE, 0).unwrap();
        svc.add_rule(12, UidMatch::STANDBY, 0).unwrap();
        assert_eq!(
            svc.get_uids_with_allow_rule_on_allow_list_chain(FirewallChain::Dozable)
                .unwrap(),
            vec![11]
        );
        assert_eq!(
            svc.get_uids_with_deny_rule_on_deny_list_chain(FirewallChain::Standby)
                .unwrap(),
            vec![12]
        );
        assert!(matches!(
            svc.get_uids_with_allow_rule_on_allow_list_chain(FirewallChain::Standby),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(matches!(
            svc.get_uids_with_deny_rule_on_deny_list_chain(FirewallChain::Dozable),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn interface_match_keeps_chain_bits() {
        let (svc, map) = make_service();
        svc.add_rule(10_001, UidMatch::DOZABLE, 0).unwrap();
        svc.add_uid_interface_rules(Some("wlan0"), &[10_001]).unwrap();
        let v = rule_of(&map, 10_001).unwrap();
        assert_eq!(v.rule, (UidMatch::DOZABLE | UidMatch::IIF).bits());
        assert_eq!(v.iif, 3);

        svc.remove_rule(10_001, UidMatch::IIF).unwrap();
        let v = rule_of(&map, 10_001).unwrap();
        assert_eq!(v.rule, UidMatch::DOZABLE.bits());
        assert_eq!(v.iif, 0);
    }

    #[test]
    fn wildcard_interface_uses_index_zero() {
        let (svc, map) = make_service();
        svc.add_uid_interface_rules(None, &[20, 21]).unwrap();
        for uid in [20, 21] {
            let v = rule_of(&map, uid).unwrap();
            assert_eq!(v.rule, UidMatch::IIF.bits());
            assert_eq!(v.iif, 0);
        }
    }

    #[test]
    fn unknown_interface_writes_nothing() {
        let (svc, map) = make_service();
        let err = svc.add_uid_interface_rules(Some("eth7"), &[1, 2]).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(map.is_empty());
    }

    #[test]
    fn remove_interface_rules_skips_missing() {
        let (svc, map) = make_service();
        svc.add_uid_interface_rules(Some("rmnet0"), &[30]).unwrap();
        let outcome = svc.remove_uid_interface_rules(&[30, 31]).unwrap();
        assert_eq!(outcome.failed, vec![31]);
        assert!(map.is_empty());
    }

    #[test]
    fn lockdown_rule() {
        let (svc, map) = make_service();
        svc.update_uid_lockdown_rule(40, true).unwrap();
        assert_eq!(rule_of(&map, 40).unwrap().rule, UidMatch::LOCKDOWN_VPN.bits());
        svc.update_uid_lockdown_rule(40, false).unwrap();
        assert!(rule_of(&map, 40).is_none());
        assert!(svc.update_uid_lockdown_rule(40, false).is_err());
    }

    #[test]
    fn clear_empties_map() {
        let (svc, map) = make_service();
        svc.add_rule(1, UidMatch::STANDBY, 0).unwrap();
        svc.add_rule(2, UidMatch::DOZABLE, 0).unwrap();
        svc.clear().unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn concurrent_adds_do_not_lose_bits() {
        let (svc, map) = make_service();
        let svc = Arc::new(svc);
        let chains = [
            FirewallChain::Dozable,
            FirewallChain::Standby,
            FirewallChain::Powersave,
            FirewallChain::Restricted,
        ];
        let handles: Vec<_> = chains
            .into_iter()
            .map(|chain| {
                let svc = Arc::clone(&svc);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        svc.add_rule(77, chain.match_for(), 0).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let expected = chains
            .into_iter()
            .fold(UidMatch::empty(), |acc, c| acc | c.match_for());
        assert_eq!(rule_of(&map, 77).unwrap().rule, expected.bits());
    }
}
