pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Keep your validator keys in sync. Custodian-sourced, self-healing,
/// unattended.
#[derive(Parser, Debug)]
#[command(name = "keysync", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Network preset selecting the custodian endpoint
    #[arg(long, global = true, env = "NETWORK")]
    pub network: Option<String>,

    /// Custodian (remote signer) base URL; overrides --network
    #[arg(long, global = true, env = "CUSTODIAN_URL")]
    pub custodian_url: Option<String>,

    /// Validator client base URL
    #[arg(long, global = true, env = "CLIENT_URL")]
    pub client_url: Option<String>,

    /// Path to alternative config file (default: ./keysync.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the reconciliation daemon, one cycle per interval
    Run {
        /// Seconds between cycles
        #[arg(long, env = "KEYSYNC_INTERVAL")]
        interval: Option<u64>,
    },

    /// Run a single reconciliation cycle and exit
    Sync,

    /// Fetch both inventories and show the pending delta, mutating nothing
    Status,
}
