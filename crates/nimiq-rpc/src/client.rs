use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::config::{Config, Credentials};
use crate::error::Error;
use crate::protocol::{parse_jsonrpc_error, JsonRpcRequest};
use crate::types::{
    Account, Block, BlockTemplate, ConsensusState, LogLevel, MempoolInfo, OutgoingTransaction,
    Peer, PeerStateCommand, PoolConnectionState, SyncStatus, SyncingState, Transaction,
    TransactionEntry, TransactionReceipt, Wallet, Work,
};

/// Nimiq node JSON-RPC client over HTTP(S).
///
/// One HTTP POST per call, no batching and no retries. Request ids are drawn
/// from an atomic counter starting at 0, so sequential calls on one client
/// carry strictly increasing ids.
pub struct Client {
    http: reqwest::Client,
    url: String,
    auth: Option<Credentials>,
    next_id: AtomicU64,
}

impl Client {
    /// Build a client from connection settings.
    ///
    /// Fails if the scheme is not http/https or the CA file cannot be loaded.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }
        if let Some(path) = &config.ca_path {
            let pem = std::fs::read(path).map_err(|e| {
                Error::Config(format!("read CA file {}: {e}", path.display()))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                Error::Config(format!("parse CA file {}: {e}", path.display()))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder.build().map_err(Error::Transport)?;

        Ok(Self {
            http,
            url: config.base_url(),
            auth: config.credentials.clone(),
            next_id: AtomicU64::new(0),
        })
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Issue a raw JSON-RPC call and return the untyped `result` value.
    ///
    /// The typed facade methods below are built on this; it stays public for
    /// remote methods outside the catalog.
    pub async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, Error> {
        let id = self.next_request_id();
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            "rpc call"
        );
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let mut builder = self
            .http
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&req);
        if let Some(auth) = &self.auth {
            builder = builder.basic_auth(&auth.user, Some(&auth.password));
        }

        let response = builder.send().await.map_err(Error::Transport)?;
        let status = response.status();

        let body = response.text().await.map_err(Error::Transport)?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        let decoded: crate::protocol::JsonRpcResponse =
            serde_json::from_str(&body).map_err(|e| {
                Error::Protocol(format!("decode JSON-RPC response: {e}; body={body}"))
            })?;

        if let Some(err) = decoded.error {
            return Err(parse_jsonrpc_error(err));
        }

        Ok(decoded.result.unwrap_or(Value::Null))
    }

    // ==========================================================================
    // Network
    // ==========================================================================

    /// Number of connected peers.
    pub async fn peer_count(&self) -> Result<u32, Error> {
        let raw = self.request("peerCount", Vec::new()).await?;
        decode("peerCount", raw)
    }

    /// Chain sync progress, or [`SyncingState::NotSyncing`] once caught up.
    pub async fn syncing(&self) -> Result<SyncingState, Error> {
        let raw = self.request("syncing", Vec::new()).await?;
        map_syncing(raw)
    }

    /// Consensus state of the node.
    pub async fn consensus(&self) -> Result<ConsensusState, Error> {
        let raw = self.request("consensus", Vec::new()).await?;
        decode("consensus", raw)
    }

    /// All peers known to the node.
    pub async fn peer_list(&self) -> Result<Vec<Peer>, Error> {
        let raw = self.request("peerList", Vec::new()).await?;
        decode("peerList", raw)
    }

    /// State of a single peer, addressed by its peer address.
    pub async fn peer_state(&self, address: &str) -> Result<Peer, Error> {
        let raw = self.request("peerState", vec![json!(address)]).await?;
        decode("peerState", raw)
    }

    /// Apply a command (connect, disconnect, ban, unban) to a peer and return
    /// its new state.
    pub async fn set_peer_state(
        &self,
        address: &str,
        command: PeerStateCommand,
    ) -> Result<Peer, Error> {
        let raw = self
            .request("peerState", vec![json!(address), json!(command.as_str())])
            .await?;
        decode("peerState", raw)
    }

    // ==========================================================================
    // Transactions
    // ==========================================================================

    /// Submit a signed, hex-encoded transaction. Returns its hash.
    pub async fn send_raw_transaction(&self, tx_hex: &str) -> Result<String, Error> {
        let raw = self.request("sendRawTransaction", vec![json!(tx_hex)]).await?;
        decode("sendRawTransaction", raw)
    }

    /// Have the node assemble and sign a transaction; returns the hex encoding
    /// without relaying it.
    pub async fn create_raw_transaction(
        &self,
        transaction: &OutgoingTransaction,
    ) -> Result<String, Error> {
        let raw = self
            .request("createRawTransaction", vec![outgoing_param(transaction)])
            .await?;
        decode("createRawTransaction", raw)
    }

    /// Have the node assemble, sign and relay a transaction. Returns its hash.
    pub async fn send_transaction(
        &self,
        transaction: &OutgoingTransaction,
    ) -> Result<String, Error> {
        let raw = self
            .request("sendTransaction", vec![outgoing_param(transaction)])
            .await?;
        decode("sendTransaction", raw)
    }

    /// Decode a hex-encoded transaction without submitting it.
    pub async fn get_raw_transaction_info(&self, tx_hex: &str) -> Result<Transaction, Error> {
        let raw = self
            .request("getRawTransactionInfo", vec![json!(tx_hex)])
            .await?;
        decode("getRawTransactionInfo", raw)
    }

    pub async fn get_transaction_by_block_hash_and_index(
        &self,
        block_hash: &str,
        index: u32,
    ) -> Result<Option<Transaction>, Error> {
        let raw = self
            .request(
                "getTransactionByBlockHashAndIndex",
                vec![json!(block_hash), json!(index)],
            )
            .await?;
        decode_nullable("getTransactionByBlockHashAndIndex", raw)
    }

    pub async fn get_transaction_by_block_number_and_index(
        &self,
        block_number: u32,
        index: u32,
    ) -> Result<Option<Transaction>, Error> {
        let raw = self
            .request(
                "getTransactionByBlockNumberAndIndex",
                vec![json!(block_number), json!(index)],
            )
            .await?;
        decode_nullable("getTransactionByBlockNumberAndIndex", raw)
    }

    /// Look up a transaction by hash. `None` if the node does not know it.
    pub async fn get_transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<Transaction>, Error> {
        let raw = self.request("getTransactionByHash", vec![json!(hash)]).await?;
        decode_nullable("getTransactionByHash", raw)
    }

    /// Inclusion receipt for a transaction. `None` while unconfirmed/unknown.
    pub async fn get_transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, Error> {
        let raw = self
            .request("getTransactionReceipt", vec![json!(hash)])
            .await?;
        decode_nullable("getTransactionReceipt", raw)
    }

    /// Latest transactions involving an address, most recent first.
    pub async fn get_transactions_by_address(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<Vec<Transaction>, Error> {
        let raw = self
            .request(
                "getTransactionsByAddress",
                vec![json!(address), json!(limit)],
            )
            .await?;
        decode("getTransactionsByAddress", raw)
    }

    // ==========================================================================
    // Mempool
    // ==========================================================================

    /// Transactions currently in the mempool; full objects when
    /// `include_transactions`, bare hashes otherwise.
    pub async fn mempool_content(
        &self,
        include_transactions: bool,
    ) -> Result<Vec<TransactionEntry>, Error> {
        let raw = self
            .request("mempoolContent", vec![json!(include_transactions)])
            .await?;
        decode("mempoolContent", raw)
    }

    /// Mempool statistics grouped into fee-per-byte buckets.
    pub async fn mempool(&self) -> Result<MempoolInfo, Error> {
        let raw = self.request("mempool", Vec::new()).await?;
        decode("mempool", raw)
    }

    pub async fn min_fee_per_byte(&self) -> Result<u64, Error> {
        let raw = self.request("minFeePerByte", Vec::new()).await?;
        decode("minFeePerByte", raw)
    }

    /// Set the mempool admission fee. Returns the new value.
    pub async fn set_min_fee_per_byte(&self, fee: u64) -> Result<u64, Error> {
        let raw = self.request("minFeePerByte", vec![json!(fee)]).await?;
        decode("minFeePerByte", raw)
    }

    // ==========================================================================
    // Mining
    // ==========================================================================

    pub async fn is_mining(&self) -> Result<bool, Error> {
        let raw = self.request("mining", Vec::new()).await?;
        decode("mining", raw)
    }

    pub async fn set_mining(&self, enabled: bool) -> Result<bool, Error> {
        let raw = self.request("mining", vec![json!(enabled)]).await?;
        decode("mining", raw)
    }

    /// Current hashrate in hashes per second.
    pub async fn hashrate(&self) -> Result<f64, Error> {
        let raw = self.request("hashrate", Vec::new()).await?;
        decode("hashrate", raw)
    }

    pub async fn miner_threads(&self) -> Result<u32, Error> {
        let raw = self.request("minerThreads", Vec::new()).await?;
        decode("minerThreads", raw)
    }

    pub async fn set_miner_threads(&self, threads: u32) -> Result<u32, Error> {
        let raw = self.request("minerThreads", vec![json!(threads)]).await?;
        decode("minerThreads", raw)
    }

    /// Address credited with mining rewards.
    pub async fn miner_address(&self) -> Result<String, Error> {
        let raw = self.request("minerAddress", Vec::new()).await?;
        decode("minerAddress", raw)
    }

    /// Configured mining pool (`host:port`), if any.
    pub async fn pool(&self) -> Result<Option<String>, Error> {
        let raw = self.request("pool", Vec::new()).await?;
        decode_nullable("pool", raw)
    }

    /// Point the miner at a pool (`host:port`). Returns the new pool.
    pub async fn set_pool(&self, pool: &str) -> Result<Option<String>, Error> {
        let raw = self.request("pool", vec![json!(pool)]).await?;
        decode_nullable("pool", raw)
    }

    pub async fn pool_connection_state(&self) -> Result<PoolConnectionState, Error> {
        let raw = self.request("poolConnectionState", Vec::new()).await?;
        decode("poolConnectionState", raw)
    }

    /// Pool balance already confirmed by the pool operator, in luna.
    pub async fn pool_confirmed_balance(&self) -> Result<u64, Error> {
        let raw = self.request("poolConfirmedBalance", Vec::new()).await?;
        decode("poolConfirmedBalance", raw)
    }

    /// Proof-of-work puzzle for the next block. Address and extra data
    /// override the node's miner settings when given.
    pub async fn get_work(
        &self,
        address: Option<&str>,
        extra_data_hex: Option<&str>,
    ) -> Result<Work, Error> {
        let raw = self
            .request("getWork", override_params(address, extra_data_hex))
            .await?;
        decode("getWork", raw)
    }

    /// Full block template for external miners.
    pub async fn get_block_template(
        &self,
        address: Option<&str>,
        extra_data_hex: Option<&str>,
    ) -> Result<BlockTemplate, Error> {
        let raw = self
            .request("getBlockTemplate", override_params(address, extra_data_hex))
            .await?;
        decode("getBlockTemplate", raw)
    }

    /// Submit a mined, hex-encoded block.
    pub async fn submit_block(&self, block_hex: &str) -> Result<(), Error> {
        self.request("submitBlock", vec![json!(block_hex)]).await?;
        Ok(())
    }

    // ==========================================================================
    // Accounts
    // ==========================================================================

    /// All accounts the node holds keys for.
    pub async fn accounts(&self) -> Result<Vec<Account>, Error> {
        let raw = self.request("accounts", Vec::new()).await?;
        decode("accounts", raw)
    }

    /// Create a fresh account in the node's wallet store.
    pub async fn create_account(&self) -> Result<Wallet, Error> {
        let raw = self.request("createAccount", Vec::new()).await?;
        decode("createAccount", raw)
    }

    /// Balance of an address in luna.
    pub async fn get_balance(&self, address: &str) -> Result<u64, Error> {
        let raw = self.request("getBalance", vec![json!(address)]).await?;
        decode("getBalance", raw)
    }

    pub async fn get_account(&self, address: &str) -> Result<Account, Error> {
        let raw = self.request("getAccount", vec![json!(address)]).await?;
        decode("getAccount", raw)
    }

    // ==========================================================================
    // Blocks
    // ==========================================================================

    /// Current chain height.
    pub async fn block_number(&self) -> Result<u32, Error> {
        let raw = self.request("blockNumber", Vec::new()).await?;
        decode("blockNumber", raw)
    }

    pub async fn get_block_transaction_count_by_hash(
        &self,
        block_hash: &str,
    ) -> Result<Option<u32>, Error> {
        let raw = self
            .request("getBlockTransactionCountByHash", vec![json!(block_hash)])
            .await?;
        decode_nullable("getBlockTransactionCountByHash", raw)
    }

    pub async fn get_block_transaction_count_by_number(
        &self,
        block_number: u32,
    ) -> Result<Option<u32>, Error> {
        let raw = self
            .request(
                "getBlockTransactionCountByNumber",
                vec![json!(block_number)],
            )
            .await?;
        decode_nullable("getBlockTransactionCountByNumber", raw)
    }

    /// Block by hash. Full transaction objects when `include_transactions`,
    /// bare hashes otherwise.
    pub async fn get_block_by_hash(
        &self,
        block_hash: &str,
        include_transactions: bool,
    ) -> Result<Option<Block>, Error> {
        let raw = self
            .request(
                "getBlockByHash",
                vec![json!(block_hash), json!(include_transactions)],
            )
            .await?;
        decode_nullable("getBlockByHash", raw)
    }

    /// Block by height. Full transaction objects when `include_transactions`,
    /// bare hashes otherwise.
    pub async fn get_block_by_number(
        &self,
        block_number: u32,
        include_transactions: bool,
    ) -> Result<Option<Block>, Error> {
        let raw = self
            .request(
                "getBlockByNumber",
                vec![json!(block_number), json!(include_transactions)],
            )
            .await?;
        decode_nullable("getBlockByNumber", raw)
    }

    // ==========================================================================
    // Node tuning
    // ==========================================================================

    /// Read a node constant by name.
    pub async fn get_constant(&self, name: &str) -> Result<u64, Error> {
        let raw = self.request("constant", vec![json!(name)]).await?;
        decode("constant", raw)
    }

    /// Override a node constant. Returns the value now in effect.
    pub async fn set_constant(&self, name: &str, value: u64) -> Result<u64, Error> {
        let raw = self
            .request("constant", vec![json!(name), json!(value)])
            .await?;
        decode("constant", raw)
    }

    /// Restore a node constant to its default value.
    pub async fn reset_constant(&self, name: &str) -> Result<u64, Error> {
        let raw = self
            .request("constant", vec![json!(name), json!("reset")])
            .await?;
        decode("constant", raw)
    }

    /// Set the node's log level for a tag (`*` for all tags).
    pub async fn set_log_level(&self, tag: &str, level: LogLevel) -> Result<bool, Error> {
        let raw = self
            .request("log", vec![json!(tag), json!(level.as_str())])
            .await?;
        decode("log", raw)
    }
}

fn decode<T: DeserializeOwned>(method: &str, raw: Value) -> Result<T, Error> {
    serde_json::from_value(raw)
        .map_err(|e| Error::Protocol(format!("invalid {method} result: {e}")))
}

/// Decode a result the node reports as JSON null when there is nothing to
/// return (not-found lookups, unset pool).
fn decode_nullable<T: DeserializeOwned>(method: &str, raw: Value) -> Result<Option<T>, Error> {
    if raw.is_null() {
        return Ok(None);
    }
    decode(method, raw).map(Some)
}

/// `syncing` overloads a bare `false` for "not syncing"; everything else must
/// be a structured status object.
fn map_syncing(raw: Value) -> Result<SyncingState, Error> {
    match raw {
        Value::Bool(false) => Ok(SyncingState::NotSyncing),
        Value::Bool(true) => Err(Error::Protocol(
            "syncing returned bare true without a status object".to_owned(),
        )),
        other => decode::<SyncStatus>("syncing", other).map(SyncingState::Syncing),
    }
}

fn outgoing_param(transaction: &OutgoingTransaction) -> Value {
    serde_json::to_value(transaction).expect("outgoing transaction serializes to a JSON object")
}

/// Positional params for `getWork` / `getBlockTemplate`. Both overrides are
/// optional, but a present extra-data must not shift position when the
/// address is omitted.
fn override_params(address: Option<&str>, extra_data_hex: Option<&str>) -> Vec<Value> {
    let mut params = Vec::new();
    if address.is_some() || extra_data_hex.is_some() {
        params.push(json!(address));
    }
    if let Some(extra) = extra_data_hex {
        params.push(json!(extra));
    }
    params
}
