//! Drives the crate through its public surface only, the way a consumer
//! wires it up. Run with `RUST_LOG=debug` to watch the internals.

use alloy_primitives::{keccak256, Address, U256};
use contract_sdk::abi::{evm, wasm, ParamType};
use contract_sdk::tx::{sign_transaction, NonceStrategy, SequentialNonce, TransactionParams};
use contract_sdk::ws::SessionHandle;
use contract_sdk::{
    build_call, build_deploy, Algorithm, CryptoSuite, SessionKey, SubscribeTopic,
    SubscriptionManager, Value, VmDialect,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const TOKEN_ABI: &str = r#"[
    {
        "type": "function",
        "name": "transfer",
        "inputs": [
            {"name": "to", "type": "address"},
            {"name": "amount", "type": "uint256"}
        ],
        "outputs": [{"name": "", "type": "bool"}]
    }
]"#;

fn token_abi() -> contract_sdk::Abi {
    contract_sdk::Abi::parse(TOKEN_ABI.as_bytes()).unwrap()
}

#[test]
fn test_call_data_round_trips_under_both_dialects() {
    init_tracing();
    let to = Address::repeat_byte(0xbb);
    let args = [to.to_string(), "7".to_string()];

    let descriptor = build_call(
        &token_abi(),
        VmDialect::Evm,
        "0x00000000000000000000000000000000000000aa",
        "transfer",
        &args,
    )
    .unwrap();
    assert!(descriptor.is_write);
    assert!(descriptor.cns_name.is_none());
    assert_eq!(descriptor.data[..4], evm::selector("transfer(address,uint256)"));
    let values = evm::decode_values(
        &[ParamType::Address, ParamType::Uint(256)],
        &descriptor.data[4..],
    )
    .unwrap();
    assert_eq!(values[0], Value::Address(to));
    assert_eq!(values[1], Value::Uint(U256::from(7u8), 256));

    // the same invocation addressed by registered name under the WASM VM
    let descriptor = build_call(&token_abi(), VmDialect::Wasm, "token", "transfer", &args).unwrap();
    assert_eq!(descriptor.cns_name.as_deref(), Some("token"));
    assert!(descriptor.to.is_some());
    let (name, raw_args) = wasm::decode_call(&descriptor.data).unwrap();
    assert_eq!(name, "transfer");
    assert_eq!(raw_args.len(), 2);
    assert_eq!(raw_args[0], to.as_slice());
    assert_eq!(raw_args[1].last(), Some(&7));
}

#[test]
fn test_deploy_payload_follows_bytecode_kind() {
    init_tracing();

    // the wasm magic wins even when the caller says otherwise
    let wasm_code = b"\0asm\x01\x00\x00\x00";
    let descriptor = build_deploy(Some("evm"), b"[]", wasm_code, &[]).unwrap();
    assert_eq!(descriptor.dialect, VmDialect::Wasm);
    assert!(descriptor.to.is_none());
    assert!(descriptor.is_write);

    let evm_code = [0x60u8, 0x80, 0x60, 0x40, 0x52];
    let descriptor = build_deploy(Some("evm"), b"[]", &evm_code, &[]).unwrap();
    assert_eq!(descriptor.dialect, VmDialect::Evm);
    assert!(descriptor.data.starts_with(&evm_code));
}

#[test]
fn test_signing_round_trips_per_algorithm() {
    init_tracing();
    for algorithm in [Algorithm::Homestead, Algorithm::Gm] {
        let suite = CryptoSuite::new(algorithm);
        let keypair = suite.generate().unwrap();
        let digest = keccak256(b"payload");

        let signature = suite.sign(&digest, &keypair).unwrap();
        assert!(suite
            .verify(&digest, &signature, keypair.public_key())
            .unwrap());
        assert!(!suite
            .verify(&keccak256(b"other payload"), &signature, keypair.public_key())
            .unwrap());

        let recovered = suite.recover_public_key(&digest, &signature).unwrap();
        assert_eq!(recovered, keypair.public_key());
        assert_eq!(suite.address_of(keypair.public_key()).unwrap(), keypair.address());
    }
}

#[test]
fn test_signed_transaction_decodes_as_nine_field_list() {
    init_tracing();
    let suite = CryptoSuite::new(Algorithm::Homestead);
    let keypair = suite.generate().unwrap();

    let mut params = TransactionParams::new(Some(Address::repeat_byte(0xaa)), vec![1, 2, 3]);
    params.nonce = SequentialNonce::starting_at(7).next_nonce();
    params.gas = 30_000;
    params.gas_price = U256::ZERO;

    let raw = sign_transaction(&suite, &keypair, &params).unwrap();
    assert!(raw.starts_with("0x"));

    let payload = hex::decode(&raw[2..]).unwrap();
    let fields: Vec<alloy_rlp::Bytes> =
        alloy_rlp::Decodable::decode(&mut payload.as_slice()).unwrap();
    assert_eq!(fields.len(), 9);
    assert_eq!(fields[0].as_ref(), [7u8]);
    assert_eq!(fields[3].as_ref(), Address::repeat_byte(0xaa).as_slice());
    assert_eq!(fields[5].as_ref(), [1u8, 2, 3]);
    let v = fields[6].as_ref();
    assert!(v == [27u8] || v == [28u8], "v byte out of range: {v:?}");
}

#[tokio::test]
async fn test_subscription_registry_from_outside() {
    init_tracing();
    let manager = SubscriptionManager::new();
    let (handle, mut rx) = SessionHandle::pair(SessionKey::new("ops", "a"), 8);
    manager.register(handle).await;

    assert_eq!(manager.broadcast(&SubscribeTopic::NewHeads.request()).await, 1);
    let frame = rx.try_recv().unwrap();
    let text = match frame {
        tokio_tungstenite::tungstenite::Message::Text(text) => text,
        other => panic!("expected a text frame, got {other:?}"),
    };
    let request: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(request["method"], "eth_subscribe");
    assert_eq!(request["id"], "newHeads");

    manager.unregister("ops", "a").await.unwrap();
    assert_eq!(manager.session_count().await, 0);
}
