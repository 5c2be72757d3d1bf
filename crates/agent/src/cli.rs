use std::net::IpAddr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use domain::firewall::chain::FirewallChain;
use domain::firewall::entity::FirewallRule;
use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "netmaps",
    about = "UID firewall policy controller for pinned netd BPF maps",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Log level override (takes precedence over config file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Log format: json or text
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain lines (default)
    Text,
    /// JSON documents
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version and build information
    Version,
    /// Reset every controller-owned map to its boot state
    Init,
    /// Per-UID chain match bits
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },
    /// Firewall chain operations
    Chain {
        #[command(subcommand)]
        action: ChainAction,
    },
    /// Lockdown (VPN) rule for one UID
    Lockdown {
        #[command(subcommand)]
        action: ToggleUid,
    },
    /// Interface-restricted UID rules
    Iface {
        #[command(subcommand)]
        action: IfaceAction,
    },
    /// Double-buffered stats map selection
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },
    /// Per-app network permissions
    Perm {
        #[command(subcommand)]
        action: PermAction,
    },
    /// Ingress discard rules keyed by local address
    Discard {
        #[command(subcommand)]
        action: DiscardAction,
    },
    /// Global data saver flag
    DataSaver {
        #[command(subcommand)]
        action: DataSaverAction,
    },
    /// Show why a UID's traffic would be blocked
    Blocked {
        uid: u32,
        /// Evaluate against a metered network
        #[arg(long)]
        metered: bool,
    },
    /// Print the entry counts of the sized maps
    Sizes,
}

/// A chain and a UID on it.
#[derive(Args, Debug, Clone)]
pub struct ChainUid {
    /// Chain name (e.g. `dozable`, `metered_allow`) or numeric id
    pub chain: FirewallChain,
    pub uid: u32,
}

#[derive(Subcommand, Debug)]
pub enum RuleAction {
    /// Set a UID's bit on a chain
    Add(ChainUid),
    /// Clear a UID's bit on a chain
    Remove(ChainUid),
    /// Apply an allow/deny rule, honoring the chain's polarity
    Set {
        #[command(flatten)]
        target: ChainUid,
        rule: FirewallRule,
    },
    /// Read the effective allow/deny rule
    Get(ChainUid),
}

#[derive(Subcommand, Debug)]
pub enum ChainAction {
    /// Replace the full UID set of a chain
    Replace {
        chain: FirewallChain,
        #[arg(num_args = 0..)]
        uids: Vec<u32>,
    },
    /// Enable a child chain
    Enable { chain: FirewallChain },
    /// Disable a child chain
    Disable { chain: FirewallChain },
    /// Print the enabled/disabled state of every chain
    Status,
    /// List the UIDs carrying a chain's bit
    List { chain: FirewallChain },
}

#[derive(Subcommand, Debug)]
pub enum ToggleUid {
    Add { uid: u32 },
    Remove { uid: u32 },
}

#[derive(Subcommand, Debug)]
pub enum IfaceAction {
    /// Restrict UIDs to one interface (omit the name for index 0, any interface)
    Add {
        #[arg(long)]
        iface: Option<String>,
        #[arg(required = true)]
        uids: Vec<u32>,
    },
    /// Drop the interface restriction from UIDs
    Remove {
        #[arg(required = true)]
        uids: Vec<u32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StatsAction {
    /// Flip the active stats map and wait for readers to drain
    Swap,
    /// Print the active stats map
    Active,
}

#[derive(Subcommand, Debug)]
pub enum PermAction {
    /// Set a permission mask for UIDs
    Set {
        /// Bitmask: 4 = INTERNET, 8 = UPDATE_DEVICE_STATS, 128 = UNINSTALLED
        mask: u8,
        #[arg(required = true)]
        uids: Vec<u32>,
    },
    /// Print a UID's permission mask
    Get { uid: u32 },
}

#[derive(Subcommand, Debug)]
pub enum DiscardAction {
    /// Discard ingress traffic to ADDR unless it arrives on IFACE
    Set { addr: IpAddr, iface: String },
    Remove { addr: IpAddr },
    Get { addr: IpAddr },
}

#[derive(Subcommand, Debug)]
pub enum DataSaverAction {
    On,
    Off,
    Status,
}

impl Command {
    /// Whether the command only reads maps.
    pub fn is_read_only(&self) -> bool {
        match self {
            Self::Version | Self::Blocked { .. } | Self::Sizes => true,
            Self::Rule { action } => matches!(action, RuleAction::Get(_)),
            Self::Chain { action } => {
                matches!(action, ChainAction::Status | ChainAction::List { .. })
            }
            Self::Stats { action } => matches!(action, StatsAction::Active),
            Self::Perm { action } => matches!(action, PermAction::Get { .. }),
            Self::Discard { action } => matches!(action, DiscardAction::Get { .. }),
            Self::DataSaver { action } => matches!(action, DataSaverAction::Status),
            Self::Init | Self::Lockdown { .. } | Self::Iface { .. } => false,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_default_config_path() {
        let cli = Cli::try_parse_from(["netmaps", "sizes"]).unwrap();
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
        assert!(cli.log_level.is_none());
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["netmaps"]).is_err());
    }

    #[test]
    fn cli_log_level_override() {
        let cli = Cli::try_parse_from(["netmaps", "--log-level", "debug", "version"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn cli_output_json_after_subcommand() {
        let cli = Cli::try_parse_from(["netmaps", "sizes", "--output", "json"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn rule_set_parses_chain_name_and_rule() {
        let cli =
            Cli::try_parse_from(["netmaps", "rule", "set", "metered-allow", "10001", "allow"])
                .unwrap();
        match cli.command {
            Command::Rule {
                action: RuleAction::Set { target, rule },
            } => {
                assert_eq!(target.chain, FirewallChain::MeteredAllow);
                assert_eq!(target.uid, 10001);
                assert_eq!(rule, FirewallRule::Allow);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn chain_accepts_numeric_id() {
        let cli = Cli::try_parse_from(["netmaps", "chain", "list", "1"]).unwrap();
        match cli.command {
            Command::Chain {
                action: ChainAction::List { chain },
            } => assert_eq!(chain, FirewallChain::Dozable),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_chain_rejected() {
        assert!(Cli::try_parse_from(["netmaps", "chain", "enable", "bogus"]).is_err());
        assert!(Cli::try_parse_from(["netmaps", "chain", "enable", "13"]).is_err());
    }

    #[test]
    fn chain_replace_accepts_empty_set() {
        let cli = Cli::try_parse_from(["netmaps", "chain", "replace", "standby"]).unwrap();
        match cli.command {
            Command::Chain {
                action: ChainAction::Replace { chain, uids },
            } => {
                assert_eq!(chain, FirewallChain::Standby);
                assert!(uids.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn iface_add_without_name_means_any_interface() {
        let cli = Cli::try_parse_from(["netmaps", "iface", "add", "10001", "10002"]).unwrap();
        match cli.command {
            Command::Iface {
                action: IfaceAction::Add { iface, uids },
            } => {
                assert!(iface.is_none());
                assert_eq!(uids, vec![10001, 10002]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn discard_parses_addresses() {
        let cli = Cli::try_parse_from(["netmaps", "discard", "set", "2001:db8::1", "wlan0"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Discard {
                action: DiscardAction::Set { addr: IpAddr::V6(_), .. }
            }
        ));
    }

    #[test]
    fn read_only_classification() {
        let read = Cli::try_parse_from(["netmaps", "blocked", "10001", "--metered"]).unwrap();
        assert!(read.command.is_read_only());
        let write = Cli::try_parse_from(["netmaps", "stats", "swap"]).unwrap();
        assert!(!write.command.is_read_only());
        let perm = Cli::try_parse_from(["netmaps", "perm", "get", "10001"]).unwrap();
        assert!(perm.command.is_read_only());
    }
}
