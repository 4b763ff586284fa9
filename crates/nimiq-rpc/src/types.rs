//! Domain models for the Nimiq RPC interface.
//!
//! Every struct is a field-by-field serde mapping of the JSON object the node
//! returns. Wire names are camelCase; fields the node may omit or null out are
//! `Option`. Extra fields the node adds in newer versions are ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ==============================================================================
// Enumerations
// ==============================================================================

/// Account type discriminant, numeric on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AccountType {
    Basic = 0,
    Vesting = 1,
    Htlc = 2,
}

impl TryFrom<u8> for AccountType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AccountType::Basic),
            1 => Ok(AccountType::Vesting),
            2 => Ok(AccountType::Htlc),
            other => Err(format!("unknown account type {other}")),
        }
    }
}

impl From<AccountType> for u8 {
    fn from(value: AccountType) -> Self {
        value as u8
    }
}

/// State of a known peer address, numeric on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PeerAddressState {
    New = 1,
    Established = 2,
    Tried = 3,
    Failed = 4,
    Banned = 5,
}

impl TryFrom<u8> for PeerAddressState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PeerAddressState::New),
            2 => Ok(PeerAddressState::Established),
            3 => Ok(PeerAddressState::Tried),
            4 => Ok(PeerAddressState::Failed),
            5 => Ok(PeerAddressState::Banned),
            other => Err(format!("unknown peer address state {other}")),
        }
    }
}

impl From<PeerAddressState> for u8 {
    fn from(value: PeerAddressState) -> Self {
        value as u8
    }
}

/// State of an active peer connection, numeric on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PeerConnectionState {
    New = 1,
    Connecting = 2,
    Connected = 3,
    Negotiating = 4,
    Established = 5,
    Closed = 6,
}

impl TryFrom<u8> for PeerConnectionState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PeerConnectionState::New),
            2 => Ok(PeerConnectionState::Connecting),
            3 => Ok(PeerConnectionState::Connected),
            4 => Ok(PeerConnectionState::Negotiating),
            5 => Ok(PeerConnectionState::Established),
            6 => Ok(PeerConnectionState::Closed),
            other => Err(format!("unknown peer connection state {other}")),
        }
    }
}

impl From<PeerConnectionState> for u8 {
    fn from(value: PeerConnectionState) -> Self {
        value as u8
    }
}

/// Connection state towards the configured mining pool, numeric on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PoolConnectionState {
    Connected = 0,
    Connecting = 1,
    Closed = 2,
}

impl TryFrom<u8> for PoolConnectionState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PoolConnectionState::Connected),
            1 => Ok(PoolConnectionState::Connecting),
            2 => Ok(PoolConnectionState::Closed),
            other => Err(format!("unknown pool connection state {other}")),
        }
    }
}

impl From<PoolConnectionState> for u8 {
    fn from(value: PoolConnectionState) -> Self {
        value as u8
    }
}

/// Consensus progress of the node, lowercase string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusState {
    Connecting,
    Syncing,
    Established,
}

/// Command accepted by the `peerState` method, sent as a lowercase string
/// via [`PeerStateCommand::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStateCommand {
    Connect,
    Disconnect,
    Ban,
    Unban,
}

impl PeerStateCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            PeerStateCommand::Connect => "connect",
            PeerStateCommand::Disconnect => "disconnect",
            PeerStateCommand::Ban => "ban",
            PeerStateCommand::Unban => "unban",
        }
    }
}

/// Log level accepted by the `log` method, sent as a lowercase string via
/// [`LogLevel::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    Assert,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Assert => "assert",
        }
    }
}

// ==============================================================================
// Accounts and wallets
// ==============================================================================

/// An account as returned by `getAccount` / `accounts`.
///
/// The contract fields are only present for vesting and HTLC accounts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub address: String,
    pub balance: u64,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub vesting_start: Option<u32>,
    #[serde(default)]
    pub vesting_step_blocks: Option<u32>,
    #[serde(default)]
    pub vesting_step_amount: Option<u64>,
    #[serde(default)]
    pub vesting_total_amount: Option<u64>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub sender_address: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
    #[serde(default)]
    pub hash_root: Option<String>,
    #[serde(default)]
    pub hash_algorithm: Option<u8>,
    #[serde(default)]
    pub hash_count: Option<u8>,
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub total_amount: Option<u64>,
}

/// A wallet created in the node via `createAccount`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub address: String,
    pub public_key: String,
    #[serde(default)]
    pub private_key: Option<String>,
}

// ==============================================================================
// Transactions
// ==============================================================================

/// A transaction as returned by the various `getTransaction*` methods.
///
/// Block-related fields are absent while the transaction sits in the mempool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub confirmations: u32,
    #[serde(default)]
    pub transaction_index: Option<u32>,
    pub from: String,
    pub from_address: String,
    pub to: String,
    pub to_address: String,
    pub value: u64,
    pub fee: u64,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub flags: u8,
    /// Signature validity, reported by `getRawTransactionInfo` only.
    #[serde(default)]
    pub valid: Option<bool>,
    /// Mempool presence, reported by `getRawTransactionInfo` only.
    #[serde(default)]
    pub in_mempool: Option<bool>,
}

/// Inclusion proof for a transaction, from `getTransactionReceipt`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub transaction_index: u32,
    pub block_hash: String,
    pub block_number: u32,
    pub confirmations: u32,
    pub timestamp: u64,
}

/// A transaction to be created or sent by the node.
///
/// `data` is serialized even when unset; the node expects the key to be
/// present with a null value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingTransaction {
    pub from: String,
    pub from_type: AccountType,
    pub to: String,
    pub to_type: AccountType,
    pub value: u64,
    pub fee: u64,
    pub data: Option<String>,
}

impl OutgoingTransaction {
    /// A basic-to-basic transfer with no payload data.
    pub fn new(from: impl Into<String>, to: impl Into<String>, value: u64, fee: u64) -> Self {
        Self {
            from: from.into(),
            from_type: AccountType::Basic,
            to: to.into(),
            to_type: AccountType::Basic,
            value,
            fee,
            data: None,
        }
    }
}

/// Either a bare transaction hash or a full transaction, depending on the
/// `includeTransactions` flag of the originating call.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TransactionEntry {
    Hash(String),
    Full(Transaction),
}

impl TransactionEntry {
    /// The transaction hash, whichever shape was returned.
    pub fn hash(&self) -> &str {
        match self {
            TransactionEntry::Hash(hash) => hash,
            TransactionEntry::Full(tx) => &tx.hash,
        }
    }
}

// ==============================================================================
// Blocks
// ==============================================================================

/// A block as returned by `getBlockByHash` / `getBlockByNumber`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: u32,
    pub hash: String,
    #[serde(default)]
    pub pow: Option<String>,
    pub parent_hash: String,
    pub nonce: u64,
    pub body_hash: String,
    pub accounts_hash: String,
    pub difficulty: String,
    pub timestamp: u64,
    #[serde(default)]
    pub confirmations: u32,
    pub miner: String,
    pub miner_address: String,
    #[serde(default)]
    pub extra_data: String,
    pub size: u64,
    pub transactions: Vec<TransactionEntry>,
}

/// Proof-of-work puzzle from `getWork`.
#[derive(Debug, Clone, Deserialize)]
pub struct Work {
    pub data: String,
    pub suffix: String,
    pub target: u64,
    pub algorithm: String,
}

/// Header part of a block template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTemplateHeader {
    pub version: u16,
    pub prev_hash: String,
    pub interlink_hash: String,
    pub accounts_hash: String,
    pub n_bits: u32,
    pub height: u32,
}

/// Body part of a block template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTemplateBody {
    pub hash: String,
    pub miner_addr: String,
    pub extra_data: String,
    #[serde(default)]
    pub transactions: Vec<String>,
    #[serde(default)]
    pub pruned_accounts: Vec<String>,
    #[serde(default)]
    pub merkle_hashes: Vec<String>,
}

/// Full block template from `getBlockTemplate`, for external miners.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockTemplate {
    pub header: BlockTemplateHeader,
    pub interlink: String,
    pub body: BlockTemplateBody,
    pub target: u64,
}

// ==============================================================================
// Node state
// ==============================================================================

/// Progress of an ongoing chain sync, from `syncing`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub starting_block: u32,
    pub current_block: u32,
    pub highest_block: u32,
}

/// Result of the `syncing` call. The node overloads a JSON `false` to mean
/// "not currently syncing"; a structured status is returned otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncingState {
    NotSyncing,
    Syncing(SyncStatus),
}

/// A peer as returned by `peerList` / `peerState`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: String,
    pub address: String,
    pub address_state: PeerAddressState,
    #[serde(default)]
    pub connection_state: Option<PeerConnectionState>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub time_offset: Option<i64>,
    #[serde(default)]
    pub head_hash: Option<String>,
    #[serde(default)]
    pub latency: Option<u64>,
    #[serde(default)]
    pub rx: Option<u64>,
    #[serde(default)]
    pub tx: Option<u64>,
}

/// Mempool statistics from `mempool`.
///
/// The node emits per-bucket transaction counts as top-level keys named after
/// the stringified fee-per-byte bucket value, next to `total` and `buckets`
/// (e.g. `{"1": 3, "total": 3, "buckets": [1]}`); they are gathered into
/// `transactions_per_bucket` on decode. Unknown non-numeric keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MempoolInfo {
    pub total: u64,
    pub buckets: Vec<u64>,
    pub transactions_per_bucket: HashMap<u64, u64>,
}

impl<'de> Deserialize<'de> for MempoolInfo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = serde_json::Map::deserialize(deserializer)?;

        let mut info = MempoolInfo::default();
        for (key, value) in raw {
            match key.as_str() {
                "total" => {
                    info.total = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
                }
                "buckets" => {
                    info.buckets =
                        serde_json::from_value(value).map_err(serde::de::Error::custom)?;
                }
                other => {
                    let Ok(fee) = other.parse::<u64>() else {
                        continue;
                    };
                    let count = value.as_u64().ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            "non-numeric count for mempool bucket `{other}`"
                        ))
                    })?;
                    info.transactions_per_bucket.insert(fee, count);
                }
            }
        }

        Ok(info)
    }
}
