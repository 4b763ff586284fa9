use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Query tool for a Nimiq node RPC endpoint.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Node hostname or IP address.
    #[arg(long, default_value = "127.0.0.1", env = "NIMIQ_RPC_HOST")]
    pub host: String,

    /// Node RPC port.
    #[arg(long, default_value = "8648", env = "NIMIQ_RPC_PORT")]
    pub port: u16,

    /// Connect over HTTPS instead of HTTP.
    #[arg(long)]
    pub tls: bool,

    /// RPC username (optional).
    #[arg(long, env = "NIMIQ_RPC_USER")]
    pub user: Option<String>,

    /// RPC password (optional).
    #[arg(long, env = "NIMIQ_RPC_PASS")]
    pub password: Option<String>,

    /// PEM file with an additional root certificate to trust.
    #[arg(long)]
    pub ca: Option<PathBuf>,

    /// Per-request timeout in seconds. Omit for no timeout.
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Consensus state, chain height and peer count.
    Status,
    /// Fetch a block by height or hash.
    Block {
        /// Block height or block hash.
        id: String,
        /// Include full transactions instead of hashes.
        #[arg(long)]
        transactions: bool,
    },
    /// Fetch an account by address.
    Account { address: String },
    /// List known peers.
    Peers,
    /// Mempool statistics.
    Mempool,
}
