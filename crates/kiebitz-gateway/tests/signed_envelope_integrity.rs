//! Proves the gateway never trusts a `SignedEnvelope`'s `data` field over
//! the `json` the signature actually covers, for both of the ways that
//! distinction matters: a forged field that would otherwise redirect a
//! write, and a forged timestamp that would otherwise bypass expiry.

use std::sync::Arc;

use chrono::Utc;
use kiebitz_core::ports::MEDIATOR_KEYS;
use kiebitz_core::ConfirmProviderData;
use kiebitz_crypto::{sha256, KeyPair};
use kiebitz_gateway::dispatch::providers::MediatorQuery;
use kiebitz_gateway::rpc::handle_json_rpc;
use kiebitz_gateway::AppState;
use kiebitz_storage::adapters::{LockedBookingGateway, MemoryStore};
use kiebitz_storage::{Database, ProviderStatus};
use kiebitz_types::{ActorData, ActorKey, Base64Bytes, SignedEnvelope};
use serde_json::json;

type TestState = AppState<MemoryStore, LockedBookingGateway<MemoryStore, MemoryStore>>;

fn test_state() -> TestState {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(LockedBookingGateway::new(store.clone(), store.clone()));
    AppState::new(
        store,
        gateway,
        KeyPair::generate().public_key(),
        KeyPair::generate().public_key(),
        KeyPair::generate(),
        b"secret".to_vec(),
        Arc::new(kiebitz_core::ports::NoopMetricsSink),
    )
}

async fn rpc_call(state: &TestState, method: &str, params: serde_json::Value) -> serde_json::Value {
    let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": [params] }).to_string();
    handle_json_rpc(state, &body).await
}

#[tokio::test]
async fn confirm_provider_ignores_a_forged_id_and_uses_the_signed_json() {
    let state = test_state();
    let provider = KeyPair::generate();
    let mediator = KeyPair::generate();
    let provider_id = sha256(&provider.public_key().to_sec1_bytes());

    // Provider self-publishes, landing in the unverified bucket.
    let store_data = kiebitz_core::StoreProviderData {
        timestamp: Utc::now(),
        encrypted_data: Base64Bytes(vec![1, 2, 3]),
    };
    let store_json = serde_json::to_string(&store_data).unwrap();
    let store_envelope = SignedEnvelope {
        signature: Base64Bytes(provider.sign(store_json.as_bytes())),
        public_key: Base64Bytes(provider.public_key().to_sec1_bytes()),
        json: store_json,
        data: store_data,
    };
    let response = rpc_call(
        &state,
        "storeProviderData",
        serde_json::to_value(&store_envelope).unwrap(),
    )
    .await;
    assert!(response.get("result").is_some(), "setup call failed: {response}");

    // Install the mediator so `is_mediator` resolves it.
    let mediator_key = ActorKey {
        id: [0u8; 32],
        data: ActorData {
            signing: Base64Bytes(mediator.public_key().to_sec1_bytes()),
            encryption: None,
            zip_code: None,
        },
        signature: Base64Bytes(vec![]),
        public_key: Base64Bytes(mediator.public_key().to_sec1_bytes()),
    };
    state
        .database
        .put(MEDIATOR_KEYS, "mediator-1", serde_json::to_vec(&mediator_key).unwrap())
        .await
        .unwrap();

    // The mediator signs a confirmation naming the real provider id. An
    // attacker who gets hold of this envelope swaps in a bogus id in the
    // convenience `data` copy, leaving `json`/`signature` untouched.
    let confirm_data = ConfirmProviderData {
        timestamp: Utc::now(),
        id: provider_id,
        key: ActorKey {
            id: provider_id,
            data: ActorData {
                signing: Base64Bytes(provider.public_key().to_sec1_bytes()),
                encryption: None,
                zip_code: None,
            },
            signature: Base64Bytes(mediator.sign(b"provider-key-record")),
            public_key: Base64Bytes(provider.public_key().to_sec1_bytes()),
        },
        encrypted_confirmation: Base64Bytes(vec![9, 9]),
        public_provider: None,
    };
    let confirm_json = serde_json::to_string(&confirm_data).unwrap();
    let signature = mediator.sign(confirm_json.as_bytes());
    let mut envelope = SignedEnvelope {
        json: confirm_json,
        signature: Base64Bytes(signature),
        public_key: Base64Bytes(mediator.public_key().to_sec1_bytes()),
        data: confirm_data,
    };
    envelope.data.id = [0xffu8; 32]; // forged: no provider has ever published under this id

    let response = rpc_call(&state, "confirmProvider", serde_json::to_value(&envelope).unwrap()).await;
    assert!(
        response.get("result").is_some(),
        "confirmProvider should have succeeded against the signed json's real id: {response}"
    );

    let status = state.providers.check_provider_data(provider_id).await.unwrap();
    assert_eq!(status, ProviderStatus::VerifiedFirst);
}

#[tokio::test]
async fn provider_gate_rejects_a_forged_fresh_timestamp_when_the_signed_json_is_stale() {
    let state = test_state();
    let provider = KeyPair::generate();

    let provider_key = ActorKey {
        id: [1u8; 32],
        data: ActorData {
            signing: Base64Bytes(provider.public_key().to_sec1_bytes()),
            encryption: None,
            zip_code: None,
        },
        signature: Base64Bytes(vec![]),
        public_key: Base64Bytes(provider.public_key().to_sec1_bytes()),
    };
    state
        .database
        .put(
            kiebitz_core::ports::PROVIDER_KEYS,
            "provider-1",
            serde_json::to_vec(&provider_key).unwrap(),
        )
        .await
        .unwrap();

    // `json` (what is signed) carries a stale timestamp; `data` is forged
    // to claim the request was just made.
    let stale = MediatorQuery { timestamp: Utc::now() - chrono::Duration::seconds(120) };
    let stale_json = serde_json::to_string(&stale).unwrap();
    let signature = provider.sign(stale_json.as_bytes());
    let mut envelope = SignedEnvelope {
        json: stale_json,
        signature: Base64Bytes(signature),
        public_key: Base64Bytes(provider.public_key().to_sec1_bytes()),
        data: stale,
    };
    envelope.data.timestamp = Utc::now();

    let response = rpc_call(&state, "checkProviderData", serde_json::to_value(&envelope).unwrap()).await;
    assert!(
        response.get("error").is_some(),
        "a stale signed envelope must be rejected regardless of the forged data field: {response}"
    );
}
