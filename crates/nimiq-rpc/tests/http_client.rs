//! End-to-end client behavior against a local stub node that serves canned
//! JSON-RPC bodies and records every request envelope it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};

use nimiq_rpc::types::{
    AccountType, ConsensusState, PeerAddressState, PeerStateCommand, SyncingState,
    TransactionEntry,
};
use nimiq_rpc::{Client, Config, Error};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nimiq_rpc=debug")),
            )
            .with_target(true)
            .try_init();
    });
}

#[derive(Clone, Default)]
struct StubNode {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<Value>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
}

impl StubNode {
    fn push(&self, body: impl Into<String>) {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(body.into());
    }

    fn push_result(&self, result: Value) {
        self.push(json!({"jsonrpc": "2.0", "result": result, "id": 0}).to_string());
    }

    fn request(&self, index: usize) -> Value {
        self.requests.lock().expect("requests lock")[index].clone()
    }

    fn last_request(&self) -> Value {
        self.requests
            .lock()
            .expect("requests lock")
            .last()
            .expect("at least one request recorded")
            .clone()
    }

    fn last_auth_header(&self) -> Option<String> {
        self.auth_headers
            .lock()
            .expect("auth lock")
            .last()
            .expect("at least one request recorded")
            .clone()
    }
}

async fn handle(State(node): State<StubNode>, headers: HeaderMap, body: String) -> String {
    let parsed = serde_json::from_str(&body).unwrap_or(Value::Null);
    node.requests.lock().expect("requests lock").push(parsed);
    node.auth_headers.lock().expect("auth lock").push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    );
    node.responses
        .lock()
        .expect("responses lock")
        .pop_front()
        .unwrap_or_else(|| r#"{"jsonrpc":"2.0","result":null,"id":0}"#.to_owned())
}

/// Bind a stub node on an ephemeral port and return it with a client
/// configured to talk to it.
async fn spawn_stub() -> (StubNode, Client) {
    spawn_stub_with(Config::default).await
}

async fn spawn_stub_with(make_config: impl FnOnce() -> Config) -> (StubNode, Client) {
    init_tracing();

    let node = StubNode::default();
    let app = Router::new()
        .route("/", post(handle))
        .with_state(node.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub node listener");
    let port = listener.local_addr().expect("stub node local addr").port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub node");
    });

    let mut config = make_config();
    config.host = "127.0.0.1".to_owned();
    config.port = port;
    let client = Client::new(config).expect("client must construct");
    (node, client)
}

#[tokio::test]
async fn request_ids_increase_from_zero() {
    let (node, client) = spawn_stub().await;
    for _ in 0..3 {
        node.push_result(json!(6));
    }

    for _ in 0..3 {
        client.peer_count().await.expect("peerCount must succeed");
    }

    for (index, expected_id) in [(0usize, 0u64), (1, 1), (2, 2)] {
        let envelope = node.request(index);
        assert_eq!(envelope["jsonrpc"], "2.0");
        assert_eq!(envelope["method"], "peerCount");
        assert_eq!(envelope["id"], json!(expected_id));
    }
}

#[tokio::test]
async fn result_value_passes_through_unchanged() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!(1000));

    let balance = client
        .get_balance("NQ46 NTNU QX94 MVD0 BBT0 GXAR QUHK VGNF 39ET")
        .await
        .expect("getBalance must succeed");

    assert_eq!(balance, 1000);
    let envelope = node.last_request();
    assert_eq!(envelope["method"], "getBalance");
    assert_eq!(
        envelope["params"],
        json!(["NQ46 NTNU QX94 MVD0 BBT0 GXAR QUHK VGNF 39ET"])
    );
}

#[tokio::test]
async fn remote_error_surfaces_code_and_message() {
    let (node, client) = spawn_stub().await;
    node.push(
        json!({
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": "Method not found"},
            "id": 0,
        })
        .to_string(),
    );

    let err = client
        .peer_count()
        .await
        .expect_err("error response must fail the call");

    assert!(
        matches!(err, Error::Remote { code: -32601, ref message } if message == "Method not found"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn unreachable_node_is_a_transport_error() {
    init_tracing();

    // Reserve a free port, then close the listener so nothing answers on it.
    let port = {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("bind throwaway listener");
        listener.local_addr().expect("throwaway local addr").port()
    };

    let mut config = Config::default();
    config.host = "127.0.0.1".to_owned();
    config.port = port;
    let client = Client::new(config).expect("client must construct");

    let err = client
        .peer_count()
        .await
        .expect_err("a closed port must fail the call");
    assert!(
        matches!(err, Error::Transport(_)),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn malformed_body_is_a_protocol_error() {
    let (node, client) = spawn_stub().await;
    node.push("not json at all");

    let err = client.peer_count().await.expect_err("garbage must fail");
    assert!(matches!(err, Error::Protocol(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn get_block_by_hash_sends_hash_then_flag() {
    let (node, client) = spawn_stub().await;
    node.push_result(Value::Null);

    let block = client
        .get_block_by_hash(
            "bc3945d22c9f6441409a6e539728534a4fc97859bda87333071fad9dad942786",
            false,
        )
        .await
        .expect("null result is a valid not-found");

    assert!(block.is_none());
    let envelope = node.last_request();
    assert_eq!(envelope["method"], "getBlockByHash");
    assert_eq!(
        envelope["params"],
        json!([
            "bc3945d22c9f6441409a6e539728534a4fc97859bda87333071fad9dad942786",
            false
        ])
    );
}

#[tokio::test]
async fn block_transaction_count_sends_its_argument() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!(2));
    node.push_result(json!(2));

    let by_hash = client
        .get_block_transaction_count_by_hash(
            "bc3945d22c9f6441409a6e539728534a4fc97859bda87333071fad9dad942786",
        )
        .await
        .expect("count by hash must succeed");
    assert_eq!(by_hash, Some(2));
    assert_eq!(
        node.last_request()["params"],
        json!(["bc3945d22c9f6441409a6e539728534a4fc97859bda87333071fad9dad942786"])
    );

    let by_number = client
        .get_block_transaction_count_by_number(11608)
        .await
        .expect("count by number must succeed");
    assert_eq!(by_number, Some(2));
    assert_eq!(node.last_request()["params"], json!([11608]));
}

#[tokio::test]
async fn syncing_false_maps_to_not_syncing() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!(false));

    let state = client.syncing().await.expect("syncing must succeed");
    assert_eq!(state, SyncingState::NotSyncing);
}

#[tokio::test]
async fn syncing_status_object_maps_to_syncing() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!({
        "startingBlock": 578430,
        "currentBlock": 586493,
        "highestBlock": 586493,
    }));

    let state = client.syncing().await.expect("syncing must succeed");
    let SyncingState::Syncing(status) = state else {
        panic!("expected a sync status");
    };
    assert_eq!(status.starting_block, 578430);
}

#[tokio::test]
async fn transaction_lookup_null_maps_to_none() {
    let (node, client) = spawn_stub().await;
    node.push_result(Value::Null);

    let tx = client
        .get_transaction_by_hash(
            "78957b87ab5546e11e9540ce5a37ebbf93a0ebd73c0ce05f137288f30ee9f430",
        )
        .await
        .expect("null is not-found, not an error");
    assert!(tx.is_none());
}

#[tokio::test]
async fn transaction_lookup_parses_full_object() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!({
        "hash": "78957b87ab5546e11e9540ce5a37ebbf93a0ebd73c0ce05f137288f30ee9f430",
        "blockHash": "bc3945d22c9f6441409a6e539728534a4fc97859bda87333071fad9dad942786",
        "blockNumber": 11608,
        "timestamp": 1523412456,
        "confirmations": 718846,
        "transactionIndex": 0,
        "from": "355b4fe2304a9c818b9f0c3c1aaaf4ad4f6a0279",
        "fromAddress": "NQ16 6MDL YQHG 9AE8 32UY 1GX1 MAPL MM7N L0KR",
        "to": "4f61c06feeb7971af6997125fe40d629c01af92f",
        "toAddress": "NQ05 9VGU 0TYE NXBH MVLR E4JY UG6N 5701 MX9F",
        "value": 2636710000u64,
        "fee": 0,
        "data": null,
        "flags": 0,
    }));

    let tx = client
        .get_transaction_by_hash(
            "78957b87ab5546e11e9540ce5a37ebbf93a0ebd73c0ce05f137288f30ee9f430",
        )
        .await
        .expect("transaction must parse")
        .expect("transaction must be present");

    assert_eq!(tx.block_number, Some(11608));
    assert_eq!(tx.value, 2_636_710_000);
    assert_eq!(tx.fee, 0);
    assert_eq!(
        tx.from_address,
        "NQ16 6MDL YQHG 9AE8 32UY 1GX1 MAPL MM7N L0KR"
    );
}

#[tokio::test]
async fn set_peer_state_sends_address_then_command() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!({
        "id": "b99034c552e9c0fd34eb95c1cdf17f5e",
        "address": "wss://seed1.nimiq-testnet.com:8080/b99034c552e9c0fd34eb95c1cdf17f5e",
        "addressState": 2,
        "connectionState": 5,
    }));

    let peer = client
        .set_peer_state(
            "wss://seed1.nimiq-testnet.com:8080/b99034c552e9c0fd34eb95c1cdf17f5e",
            PeerStateCommand::Connect,
        )
        .await
        .expect("peerState must succeed");

    assert_eq!(peer.address_state, PeerAddressState::Established);
    let envelope = node.last_request();
    assert_eq!(envelope["method"], "peerState");
    assert_eq!(
        envelope["params"],
        json!([
            "wss://seed1.nimiq-testnet.com:8080/b99034c552e9c0fd34eb95c1cdf17f5e",
            "connect"
        ])
    );
}

#[tokio::test]
async fn set_mining_dispatches_the_mining_method() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!(false));

    let mining = client.set_mining(false).await.expect("mining must succeed");
    assert!(!mining);

    let envelope = node.last_request();
    assert_eq!(envelope["method"], "mining");
    assert_eq!(envelope["params"], json!([false]));
}

#[tokio::test]
async fn create_raw_transaction_sends_structured_param() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!("00c3c0d1af80b84c3b3de4e3d79d5c8cc950e044098c9699"));

    let mut tx = nimiq_rpc::types::OutgoingTransaction::new(
        "NQ39 NY67 X0F0 UTQE 0YER 4JEU B67L UPP8 G0FM",
        "NQ16 61ET MB3M 2JG6 TBLK BR0D B6EA X6XQ L91U",
        100000,
        1,
    );
    tx.from_type = AccountType::Basic;

    let hex = client
        .create_raw_transaction(&tx)
        .await
        .expect("createRawTransaction must succeed");
    assert!(hex.starts_with("00c3c0d1"));

    let envelope = node.last_request();
    assert_eq!(envelope["method"], "createRawTransaction");
    assert_eq!(
        envelope["params"][0],
        json!({
            "from": "NQ39 NY67 X0F0 UTQE 0YER 4JEU B67L UPP8 G0FM",
            "fromType": 0,
            "to": "NQ16 61ET MB3M 2JG6 TBLK BR0D B6EA X6XQ L91U",
            "toType": 0,
            "value": 100000,
            "fee": 1,
            "data": null,
        })
    );
}

#[tokio::test]
async fn mempool_content_returns_hashes_or_transactions() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!([
        "5bb722c2afe25c18ba33d453b3ac2c90ac278c595cc92f6188c8b699e8fb006a",
        "f59a30e0a7e3348ef569225db1f4c29026aeac4350f8c6e751f669eddce0c718",
    ]));

    let content = client
        .mempool_content(false)
        .await
        .expect("mempoolContent must succeed");

    assert_eq!(content.len(), 2);
    assert!(matches!(content[0], TransactionEntry::Hash(_)));
    assert_eq!(node.last_request()["params"], json!([false]));
}

#[tokio::test]
async fn get_work_without_overrides_sends_no_params() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!({
        "data": "00015a7d47ddf515",
        "suffix": "11fad9806b8b4167",
        "target": 503371296u64,
        "algorithm": "nimiq-argon2",
    }));

    let work = client.get_work(None, None).await.expect("getWork must succeed");
    assert_eq!(work.algorithm, "nimiq-argon2");
    assert_eq!(node.last_request()["params"], json!([]));
}

#[tokio::test]
async fn consensus_state_parses() {
    let (node, client) = spawn_stub().await;
    node.push_result(json!("established"));

    let state = client.consensus().await.expect("consensus must succeed");
    assert_eq!(state, ConsensusState::Established);
}

#[tokio::test]
async fn basic_auth_header_is_sent_when_configured() {
    let (node, client) = spawn_stub_with(|| {
        Config::default().with_credentials("super", "secret")
    })
    .await;
    node.push_result(json!(0));

    client
        .min_fee_per_byte()
        .await
        .expect("minFeePerByte must succeed");

    let auth = node.last_auth_header().expect("authorization header present");
    // base64("super:secret")
    assert_eq!(auth, "Basic c3VwZXI6c2VjcmV0");
}
