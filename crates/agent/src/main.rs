#![forbid(unsafe_code)]

mod cli;
mod commands;
mod startup;

use anyhow::Result;

use cli::{
    ChainAction, Command, DataSaverAction, DiscardAction, IfaceAction, PermAction, RuleAction,
    StatsAction, ToggleUid,
};

fn main() -> Result<()> {
    let cli = cli::parse();
    let output = cli.output;

    if matches!(cli.command, Command::Version) {
        println!("netmaps {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = startup::bootstrap(&cli)?;

    // Root span fields appear in every log entry
    let _root_span = tracing::span!(
        tracing::Level::INFO,
        "service",
        service.name = "netmaps",
        service.version = env!("CARGO_PKG_VERSION"),
    )
    .entered();

    let maps = startup::open_net_maps(&config, cli.command.is_read_only())?;

    match cli.command {
        Command::Version => Ok(()),
        Command::Init => commands::cmd_init(&maps, output),

        Command::Rule { action } => match action {
            RuleAction::Add(t) => commands::cmd_rule_add(&maps, t.chain, t.uid, output),
            RuleAction::Remove(t) => commands::cmd_rule_remove(&maps, t.chain, t.uid, output),
            RuleAction::Set { target, rule } => {
                commands::cmd_rule_set(&maps, target.chain, target.uid, rule, output)
            }
            RuleAction::Get(t) => commands::cmd_rule_get(&maps, t.chain, t.uid, output),
        },

        Command::Chain { action } => match action {
            ChainAction::Replace { chain, uids } => {
                commands::cmd_chain_replace(&maps, chain, &uids, output)
            }
            ChainAction::Enable { chain } => commands::cmd_chain_enable(&maps, chain, true, output),
            ChainAction::Disable { chain } => {
                commands::cmd_chain_enable(&maps, chain, false, output)
            }
            ChainAction::Status => commands::cmd_chain_status(&maps, output),
            ChainAction::List { chain } => commands::cmd_chain_list(&maps, chain, output),
        },

        Command::Lockdown { action } => match action {
            ToggleUid::Add { uid } => commands::cmd_lockdown(&maps, uid, true, output),
            ToggleUid::Remove { uid } => commands::cmd_lockdown(&maps, uid, false, output),
        },

        Command::Iface { action } => match action {
            IfaceAction::Add { iface, uids } => {
                commands::cmd_iface_add(&maps, iface.as_deref(), &uids, output)
            }
            IfaceAction::Remove { uids } => commands::cmd_iface_remove(&maps, &uids, output),
        },

        Command::Stats { action } => match action {
            StatsAction::Swap => commands::cmd_stats_swap(&maps, output),
            StatsAction::Active => commands::cmd_stats_active(&maps, output),
        },

        Command::Perm { action } => match action {
            PermAction::Set { mask, uids } => commands::cmd_perm_set(&maps, mask, &uids, output),
            PermAction::Get { uid } => commands::cmd_perm_get(&maps, uid, output),
        },

        Command::Discard { action } => match action {
            DiscardAction::Set { addr, iface } => {
                commands::cmd_discard_set(&maps, addr, &iface, output)
            }
            DiscardAction::Remove { addr } => commands::cmd_discard_remove(&maps, addr, output),
            DiscardAction::Get { addr } => commands::cmd_discard_get(&maps, addr, output),
        },

        Command::DataSaver { action } => match action {
            DataSaverAction::On => commands::cmd_data_saver_set(&maps, true, output),
            DataSaverAction::Off => commands::cmd_data_saver_set(&maps, false, output),
            DataSaverAction::Status => commands::cmd_data_saver_status(&maps, output),
        },

        Command::Blocked { uid, metered } => commands::cmd_blocked(&maps, uid, metered, output),
        Command::Sizes => commands::cmd_sizes(&maps, output),
    }
}
