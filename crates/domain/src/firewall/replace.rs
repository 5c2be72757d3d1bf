use std::collections::HashSet;

use super::entity::UidMatch;

/// UIDs holding `chain_bit` that are not in `replacement`.
///
/// `entries` is a walk of the UID owner map taken before any of the
/// replacement UIDs are added. A restarted walk can repeat a UID; each
/// stale UID is returned once, in first-seen order.
pub fn stale_uids<I>(entries: I, chain_bit: UidMatch, replacement: &[u32]) -> Vec<u32>
where
    I: IntoIterator<Item = (u32, UidMatch)>,
{
    let keep: HashSet<u32> = replacement.iter().copied().collect();
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|(uid, rule)| rule.contains(chain_bit) && !keep.contains(uid))
        .filter(|(uid, _)| seen.insert(*uid))
        .map(|(uid, _)| uid)
        .collect()
}
