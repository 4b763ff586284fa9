mod cli;

use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;

use nimiq_rpc::types::{Block, SyncingState, TransactionEntry};
use nimiq_rpc::{Client, Config};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_level(true)
        .init();

    let mut config = Config::new(args.host.clone(), args.port);
    if args.tls {
        config = config.with_scheme("https");
    }
    if let (Some(user), Some(password)) = (&args.user, &args.password) {
        config = config.with_credentials(user, password);
    }
    if let Some(ca) = &args.ca {
        config = config.with_ca_path(ca);
    }
    if let Some(seconds) = args.timeout {
        config = config.with_timeout(Duration::from_secs(seconds));
    }

    let endpoint = config.base_url();
    let client = Client::new(config).wrap_err("while building the RPC client")?;

    match args.command {
        cli::Command::Status => {
            let consensus = client
                .consensus()
                .await
                .wrap_err_with(|| format!("could not reach node at {endpoint}"))?;
            let height = client.block_number().await?;
            let peers = client.peer_count().await?;
            println!("consensus: {consensus:?}");
            println!("height:    {height}");
            println!("peers:     {peers}");
            match client.syncing().await? {
                SyncingState::NotSyncing => println!("syncing:   no"),
                SyncingState::Syncing(status) => println!(
                    "syncing:   {} / {}",
                    status.current_block, status.highest_block
                ),
            }
        }
        cli::Command::Block { id, transactions } => {
            let block = match id.parse::<u32>() {
                Ok(number) => client.get_block_by_number(number, transactions).await?,
                Err(_) => client.get_block_by_hash(&id, transactions).await?,
            };
            match block {
                Some(block) => print_block(&block),
                None => println!("block {id} not found"),
            }
        }
        cli::Command::Account { address } => {
            let account = client.get_account(&address).await?;
            println!("address: {}", account.address);
            println!("balance: {} luna", account.balance);
            println!("type:    {:?}", account.account_type);
        }
        cli::Command::Peers => {
            let peers = client.peer_list().await?;
            tracing::debug!(count = peers.len(), "fetched peer list");
            for peer in peers {
                let connection = peer
                    .connection_state
                    .map(|state| format!("{state:?}"))
                    .unwrap_or_else(|| "-".to_owned());
                println!("{:<34} {:?} {}", peer.id, peer.address_state, connection);
            }
        }
        cli::Command::Mempool => {
            let info = client.mempool().await?;
            println!("total transactions: {}", info.total);
            let mut buckets = info.buckets.clone();
            buckets.sort_unstable();
            for bucket in buckets {
                let count = info.transactions_per_bucket.get(&bucket).copied().unwrap_or(0);
                println!("  fee >= {bucket}/byte: {count}");
            }
        }
    }

    Ok(())
}

fn print_block(block: &Block) {
    println!("number:        {}", block.number);
    println!("hash:          {}", block.hash);
    println!("timestamp:     {}", block.timestamp);
    println!("miner:         {}", block.miner_address);
    println!("confirmations: {}", block.confirmations);
    println!("transactions:  {}", block.transactions.len());
    for entry in &block.transactions {
        match entry {
            TransactionEntry::Hash(hash) => println!("  {hash}"),
            TransactionEntry::Full(tx) => {
                println!("  {} {} -> {} ({} luna)", tx.hash, tx.from_address, tx.to_address, tx.value);
            }
        }
    }
}
