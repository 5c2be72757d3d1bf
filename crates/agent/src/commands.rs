use std::net::IpAddr;

use anyhow::{Result, bail};
use application::net_maps::NetMaps;
use domain::common::entity::BatchOutcome;
use domain::firewall::chain::FirewallChain;
use domain::firewall::entity::FirewallRule;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::cli::OutputFormat;

fn emit<T: Serialize>(output: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}

/// Print a batch result; a partial batch is an error exit.
fn emit_batch(output: OutputFormat, what: &str, outcome: &BatchOutcome) -> Result<()> {
    emit(output, outcome, || {
        if outcome.failed.is_empty() {
            format!("{what}: {} applied", outcome.applied)
        } else {
            format!(
                "{what}: {} applied, failed uids: {:?}",
                outcome.applied, outcome.failed
            )
        }
    })?;
    if !outcome.is_complete() {
        warn!(what, failed = outcome.failed.len(), "batch partially applied");
        bail!("{what}: {} uid(s) failed", outcome.failed.len());
    }
    Ok(())
}

fn done(output: OutputFormat, what: String) -> Result<()> {
    let value = json!({ "ok": true, "op": what });
    emit(output, &value, || what)
}

// ── Init ────────────────────────────────────────────────────────────────

pub fn cmd_init(maps: &NetMaps, output: OutputFormat) -> Result<()> {
    maps.init()?;
    done(output, "maps initialized".to_string())
}

// ── Rules ───────────────────────────────────────────────────────────────

pub fn cmd_rule_add(maps: &NetMaps, chain: FirewallChain, uid: u32, output: OutputFormat) -> Result<()> {
    maps.firewall.add_rule(uid, chain.match_for(), 0)?;
    done(output, format!("uid {uid} added to {chain}"))
}

pub fn cmd_rule_remove(
    maps: &NetMaps,
    chain: FirewallChain,
    uid: u32,
    output: OutputFormat,
) -> Result<()> {
    maps.firewall.remove_rule(uid, chain.match_for())?;
    done(output, format!("uid {uid} removed from {chain}"))
}

pub fn cmd_rule_set(
    maps: &NetMaps,
    chain: FirewallChain,
    uid: u32,
    rule: FirewallRule,
    output: OutputFormat,
) -> Result<()> {
    maps.firewall.set_uid_rule(chain, uid, rule)?;
    done(output, format!("uid {uid} set to {rule} on {chain}"))
}

pub fn cmd_rule_get(maps: &NetMaps, chain: FirewallChain, uid: u32, output: OutputFormat) -> Result<()> {
    let rule = maps.firewall.get_uid_rule(chain, uid)?;
    emit(
        output,
        &json!({ "chain": chain, "uid": uid, "rule": rule }),
        || rule.to_string(),
    )
}

// ── Chains ──────────────────────────────────────────────────────────────

pub fn cmd_chain_replace(
    maps: &NetMaps,
    chain: FirewallChain,
    uids: &[u32],
    output: OutputFormat,
) -> Result<()> {
    let outcome = maps.firewall.replace_chain(chain, uids)?;
    emit_batch(output, &format!("replace {chain}"), &outcome)
}

pub fn cmd_chain_enable(
    maps: &NetMaps,
    chain: FirewallChain,
    enable: bool,
    output: OutputFormat,
) -> Result<()> {
    maps.config.set_child_chain_enabled(chain, enable)?;
    let state = if enable { "enabled" } else { "disabled" };
    done(output, format!("{chain} {state}"))
}

#[derive(Serialize)]
struct ChainStatus {
    chain: FirewallChain,
    id: i32,
    allow_list: bool,
    enabled: bool,
}

pub fn cmd_chain_status(maps: &NetMaps, output: OutputFormat) -> Result<()> {
    let enabled = maps.config.enabled_chains()?;
    let rows: Vec<ChainStatus> = FirewallChain::ALL
        .into_iter()
        .map(|chain| ChainStatus {
            chain,
            id: chain.id(),
            allow_list: chain.is_allow_list(),
            enabled: enabled.contains(chain.match_for()),
        })
        .collect();

    emit(output, &rows, || {
        let mut out = format!("{:<20} {:>3}  {:<6}  {:<8}", "CHAIN", "ID", "KIND", "STATE");
        for row in &rows {
            let kind = if row.allow_list { "allow" } else { "deny" };
            let state = if row.enabled { "enabled" } else { "disabled" };
            out.push_str(&format!(
                "\n{:<20} {:>3}  {:<6}  {:<8}",
                row.chain.name(),
                row.id,
                kind,
                state
            ));
        }
        out
    })
}

pub fn cmd_chain_list(maps: &NetMaps, chain: FirewallChain, output: OutputFormat) -> Result<()> {
    let uids = maps.firewall.get_uids_with_rule_on_chain(chain)?;
    emit(output, &json!({ "chain": chain, "uids": uids }), || {
        uids.iter().map(u32::to_string).collect::<Vec<_>>().join("\n")
    })
}

// ── Lockdown / interface rules ──────────────────────────────────────────

pub fn cmd_lockdown(maps: &NetMaps, uid: u32, add: bool, output: OutputFormat) -> Result<()> {
    maps.firewall.update_uid_lockdown_rule(uid, add)?;
    let verb = if add { "added" } else { "removed" };
    done(output, format!("lockdown {verb} for uid {uid}"))
}

pub fn cmd_iface_add(
    maps: &NetMaps,
    iface: Option<&str>,
    uids: &[u32],
    output: OutputFormat,
) -> Result<()> {
    let outcome = maps.firewall.add_uid_interface_rules(iface, uids)?;
    emit_batch(output, &format!("iface {}", iface.unwrap_or("any")), &outcome)
}

pub fn cmd_iface_remove(maps: &NetMaps, uids: &[u32], output: OutputFormat) -> Result<()> {
    let outcome = maps.firewall.remove_uid_interface_rules(uids)?;
    emit_batch(output, "iface remove", &outcome)
}

// ── Stats ───────────────────────────────────────────────────────────────

fn stats_map_name(selector: u32) -> &'static str {
    if selector == ebpf_common::configuration::STATS_SELECT_MAP_A {
        "A"
    } else {
        "B"
    }
}

pub fn cmd_stats_swap(maps: &NetMaps, output: OutputFormat) -> Result<()> {
    let active = maps.stats.swap_active_stats_map()?;
    emit(output, &json!({ "active": stats_map_name(active) }), || {
        format!("active stats map: {}", stats_map_name(active))
    })
}

pub fn cmd_stats_active(maps: &NetMaps, output: OutputFormat) -> Result<()> {
    let active = maps.stats.active_stats_map()?;
    emit(output, &json!({ "active": stats_map_name(active) }), || {
        stats_map_name(active).to_string()
    })
}

// ── Permissions ─────────────────────────────────────────────────────────

pub fn cmd_perm_set(maps: &NetMaps, mask: u8, uids: &[u32], output: OutputFormat) -> Result<()> {
    let outcome = maps.permission.set_net_perm_for_uids(mask, uids)?;
    emit_batch(output, &format!("permission {mask:#04x}"), &outcome)
}

pub fn cmd_perm_get(maps: &NetMaps, uid: u32, output: OutputFormat) -> Result<()> {
    let perm = maps.permission.get_permission(uid);
    let names = perm.names();
    emit(
        output,
        &json!({ "uid": uid, "mask": perm.bits(), "permissions": names }),
        || format!("{:#04x} [{}]", perm.bits(), names.join(", ")),
    )
}

// ── Ingress discard ─────────────────────────────────────────────────────

pub fn cmd_discard_set(maps: &NetMaps, addr: IpAddr, iface: &str, output: OutputFormat) -> Result<()> {
    maps.ingress_discard.set_ingress_discard_rule(addr, iface)?;
    done(output, format!("discard {addr} unless via {iface}"))
}

pub fn cmd_discard_remove(maps: &NetMaps, addr: IpAddr, output: OutputFormat) -> Result<()> {
    maps.ingress_discard.remove_ingress_discard_rule(addr)?;
    done(output, format!("discard rule for {addr} removed"))
}

pub fn cmd_discard_get(maps: &NetMaps, addr: IpAddr, output: OutputFormat) -> Result<()> {
    let rule = maps.ingress_discard.get_ingress_discard_rule(addr)?;
    emit(output, &json!({ "addr": addr, "rule": rule }), || match rule {
        Some(r) if r.iif1 == r.iif2 => format!("{addr}: iif {}", r.iif1),
        Some(r) => format!("{addr}: iif {} or {}", r.iif1, r.iif2),
        None => format!("{addr}: no rule"),
    })
}

// ── Data saver ──────────────────────────────────────────────────────────

pub fn cmd_data_saver_set(maps: &NetMaps, enabled: bool, output: OutputFormat) -> Result<()> {
    maps.data_saver.set_data_saver_enabled(enabled)?;
    let state = if enabled { "on" } else { "off" };
    done(output, format!("data saver {state}"))
}

pub fn cmd_data_saver_status(maps: &NetMaps, output: OutputFormat) -> Result<()> {
    let enabled = maps.data_saver.data_saver_enabled()?;
    let state = if enabled { "on" } else { "off" };
    emit(output, &json!({ "enabled": enabled }), || state.to_string())
}

// ── Introspection ───────────────────────────────────────────────────────

pub fn cmd_blocked(maps: &NetMaps, uid: u32, metered: bool, output: OutputFormat) -> Result<()> {
    let reasons = maps.get_uid_networking_blocked_reasons(uid)?;
    let blocked = maps.is_uid_networking_blocked(uid, metered)?;
    let names = reasons.names();
    emit(
        output,
        &json!({
            "uid": uid,
            "metered": metered,
            "blocked": blocked,
            "reasons": reasons.bits(),
            "reason_names": names,
        }),
        || {
            let verdict = if blocked { "blocked" } else { "allowed" };
            if names.is_empty() {
                verdict.to_string()
            } else {
                format!("{verdict} [{}]", names.join(", "))
            }
        },
    )
}

pub fn cmd_sizes(maps: &NetMaps, output: OutputFormat) -> Result<()> {
    let sizes = maps.map_sizes()?;
    emit(output, &sizes, || {
        format!(
            "cookie_tag:     {}\nuid_owner:      {}\nuid_permission: {}",
            sizes.cookie_tag, sizes.uid_owner, sizes.uid_permission
        )
    })
}
