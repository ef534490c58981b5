//! Tests for the dfi-defitx crate.

use dfi_script::Network;

use crate::marker;
use crate::{AddPoolLiquidity, DefiTxError, DefiTxPayload, DefiTxType, PoolSwap, TokenAmount};

/// Mainnet P2PKH for hash160 0x11 * 20.
const ADDR_A: &str = "8Ge6f2eohG3EJu42qr5thGPHEnFmyox4Wy";
/// Mainnet P2WPKH for private key 1.
const ADDR_B: &str = "df1qw508d6qejxtdg4y5r3zarvary0c5xw7kyrml82";
/// Testnet P2PKH for hash160 0x11 * 20.
const TESTNET_A: &str = "74dHhhkwZiebrbdmmb5wEtZvMGUwwWBGpT";

const POOL_SWAP_HEX: &str = "6a4c5044665478731976a914111111111111111111111111111111111111111188ac0000e1f50500000000160014751e76e8199196d454941c45d1b3a323f1433bd6010000000000000000ffff63a7b3b6e00d";
const ADD_LIQUIDITY_HEX: &str = "6a4c50446654786c011976a914111111111111111111111111111111111111111188ac0200000000640000000000000001000000c800000000000000160014751e76e8199196d454941c45d1b3a323f1433bd6";

fn swap_a_to_b() -> PoolSwap {
    PoolSwap::builder(Network::Mainnet)
        .address_from(ADDR_A)
        .token_from(0)
        .amount_from(100_000_000)
        .address_to(ADDR_B)
        .token_to(1)
        .max_price(999_999_999_999_999_999)
        .build()
        .expect("valid pool swap")
}

fn liquidity_a() -> AddPoolLiquidity {
    AddPoolLiquidity::builder(Network::Mainnet)
        .entry(ADDR_A, [TokenAmount::new(0, 100), TokenAmount::new(1, 200)])
        .share_address(ADDR_B)
        .build()
        .expect("valid liquidity deposit")
}

fn assert_invalid_field<T: std::fmt::Debug>(result: Result<T, DefiTxError>, expected: &str) {
    match result {
        Err(DefiTxError::ValidationError { field, .. }) => assert_eq!(field, expected),
        other => panic!("expected ValidationError on {}, got {:?}", expected, other),
    }
}

// -----------------------------------------------------------------------
// PoolSwap
// -----------------------------------------------------------------------

/// Exact consensus bytes for a swap of 1 DFI into token 1.
#[test]
fn test_pool_swap_encoding() {
    let payload = DefiTxPayload::from(swap_a_to_b());
    assert_eq!(hex::encode(payload.to_bytes().unwrap()), POOL_SWAP_HEX);
    assert_eq!(payload.tx_type(), DefiTxType::PoolSwap);
}

#[test]
fn test_pool_swap_decode_roundtrip() {
    let payload = DefiTxPayload::from(swap_a_to_b());
    let script = payload.to_script().unwrap();
    assert!(script.is_op_return());
    let decoded = DefiTxPayload::decode(script.to_bytes(), Network::Mainnet).unwrap();
    assert_eq!(decoded, payload);

    let DefiTxPayload::PoolSwap(swap) = decoded else {
        panic!("expected PoolSwap");
    };
    assert_eq!(swap.address_from().as_str(), ADDR_A);
    assert_eq!(swap.amount_from(), 100_000_000);
    assert_eq!(swap.address_to().as_str(), ADDR_B);
    assert_eq!(swap.token_to(), 1);
    assert_eq!(swap.max_price(), 999_999_999_999_999_999);
}

/// Uppercase bech32 input is stored in its canonical lowercase form.
#[test]
fn test_pool_swap_canonical_addresses() {
    let swap = PoolSwap::builder(Network::Mainnet)
        .address_from(ADDR_A)
        .token_from(0)
        .amount_from(1)
        .address_to(ADDR_B.to_ascii_uppercase())
        .token_to(1)
        .max_price(1)
        .build()
        .unwrap();
    assert_eq!(swap.address_to().as_str(), ADDR_B);
}

#[test]
fn test_pool_swap_validation() {
    let base = || {
        PoolSwap::builder(Network::Mainnet)
            .address_from(ADDR_A)
            .token_from(0)
            .amount_from(1)
            .address_to(ADDR_B)
            .token_to(1)
            .max_price(1)
    };

    assert_invalid_field(base().address_from(TESTNET_A).build(), "addressFrom");
    assert_invalid_field(base().address_to("not-an-address").build(), "addressTo");
    assert_invalid_field(base().token_from(128).build(), "tokenFrom");
    assert_invalid_field(base().token_to(u32::MAX).build(), "tokenTo");
    assert_invalid_field(base().amount_from(-1).build(), "amountFrom");
    assert_invalid_field(base().max_price(i64::MIN).build(), "maxPrice");
    assert_invalid_field(PoolSwap::builder(Network::Mainnet).build(), "addressFrom");
    assert_invalid_field(
        PoolSwap::builder(Network::Mainnet).address_from(ADDR_A).token_from(3).build(),
        "amountFrom",
    );

    let max = base().token_from(127).token_to(127).build().unwrap();
    assert_eq!(max.token_from(), 127);
}

#[test]
fn test_pool_swap_decode_rejects_nonzero_reserved() {
    let mut bytes = hex::decode(POOL_SWAP_HEX).unwrap();
    // Reserved field sits 16 bytes before the end.
    let idx = bytes.len() - 16;
    bytes[idx] = 1;
    let err = DefiTxPayload::decode(&bytes, Network::Mainnet).unwrap_err();
    assert!(matches!(err, DefiTxError::MalformedDefiTx(_)), "got {:?}", err);
}

#[test]
fn test_pool_swap_decode_rejects_wide_token() {
    let mut bytes = hex::decode(POOL_SWAP_HEX).unwrap();
    // Token-from byte follows OP_RETURN, PUSHDATA1 len, marker, type, script.
    let idx = 3 + 4 + 1 + 1 + 25;
    assert_eq!(bytes[idx], 0);
    bytes[idx] = 0x80;
    assert!(matches!(
        DefiTxPayload::decode(&bytes, Network::Mainnet),
        Err(DefiTxError::MalformedDefiTx(_))
    ));
}

#[test]
fn test_pool_swap_decode_rejects_truncated_record() {
    let record = swap_a_to_b().record_bytes().unwrap();
    for cut in [0, 1, 30, record.len() - 1] {
        let script = marker::wrap(DefiTxType::PoolSwap, &record[..cut]).unwrap();
        assert!(
            matches!(
                DefiTxPayload::decode(script.to_bytes(), Network::Mainnet),
                Err(DefiTxError::MalformedDefiTx(_))
            ),
            "record cut at {} should be rejected",
            cut
        );
    }
}

#[test]
fn test_pool_swap_decode_rejects_trailing_bytes() {
    let mut record = swap_a_to_b().record_bytes().unwrap();
    record.push(0);
    let script = marker::wrap(DefiTxType::PoolSwap, &record).unwrap();
    assert!(matches!(
        DefiTxPayload::decode(script.to_bytes(), Network::Mainnet),
        Err(DefiTxError::MalformedDefiTx(_))
    ));
}

/// Embedded scripts are resolved on the network the caller names.
#[test]
fn test_pool_swap_decode_on_other_network() {
    let bytes = hex::decode(POOL_SWAP_HEX).unwrap();
    let DefiTxPayload::PoolSwap(swap) = DefiTxPayload::decode(&bytes, Network::Testnet).unwrap()
    else {
        panic!("expected PoolSwap");
    };
    assert_eq!(swap.address_from().as_str(), TESTNET_A);
}

#[test]
fn test_pool_swap_json_and_display() {
    let payload = DefiTxPayload::from(swap_a_to_b());
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["type"], "PoolSwap");
    assert_eq!(json["addressFrom"], ADDR_A);
    assert_eq!(json["tokenFrom"], 0);
    assert_eq!(json["amountFrom"], 100_000_000);
    assert_eq!(json["addressTo"], ADDR_B);
    assert_eq!(json["tokenTo"], 1);
    assert_eq!(json["maxPrice"], 999_999_999_999_999_999i64);

    let text = payload.to_string();
    assert!(text.starts_with("PoolSwap 100000000@0"));
    assert!(text.contains(ADDR_B));
}

// -----------------------------------------------------------------------
// AddPoolLiquidity
// -----------------------------------------------------------------------

#[test]
fn test_add_liquidity_encoding() {
    let payload = DefiTxPayload::from(liquidity_a());
    assert_eq!(hex::encode(payload.to_bytes().unwrap()), ADD_LIQUIDITY_HEX);
    let decoded = DefiTxPayload::decode(&payload.to_bytes().unwrap(), Network::Mainnet).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn test_add_liquidity_validation() {
    assert_invalid_field(
        AddPoolLiquidity::builder(Network::Mainnet).share_address(ADDR_B).build(),
        "entries",
    );
    assert_invalid_field(
        AddPoolLiquidity::builder(Network::Mainnet)
            .entry(ADDR_A, Vec::<TokenAmount>::new())
            .share_address(ADDR_B)
            .build(),
        "entries[0].amounts",
    );
    assert_invalid_field(
        AddPoolLiquidity::builder(Network::Mainnet)
            .entry(ADDR_A, [TokenAmount::new(0, 1)])
            .entry(TESTNET_A, [TokenAmount::new(0, 1)])
            .share_address(ADDR_B)
            .build(),
        "entries[1].address",
    );
    assert_invalid_field(
        AddPoolLiquidity::builder(Network::Mainnet)
            .entry(ADDR_A, [TokenAmount::new(0, -5)])
            .share_address(ADDR_B)
            .build(),
        "entries[0].amounts",
    );
    assert_invalid_field(
        AddPoolLiquidity::builder(Network::Mainnet)
            .entry(ADDR_A, [TokenAmount::new(0, 1)])
            .build(),
        "shareAddress",
    );
}

#[test]
fn test_add_liquidity_decode_rejects_empty_entries() {
    let script = marker::wrap(DefiTxType::AddPoolLiquidity, &[0x00]).unwrap();
    assert!(matches!(
        DefiTxPayload::decode(script.to_bytes(), Network::Mainnet),
        Err(DefiTxError::MalformedDefiTx(_))
    ));
}

#[test]
fn test_token_amount_parse() {
    let amount: TokenAmount = "150@7".parse().unwrap();
    assert_eq!(amount, TokenAmount::new(7, 150));
    assert_eq!(amount.to_string(), "150@7");
    assert!("150".parse::<TokenAmount>().is_err());
    assert!("x@1".parse::<TokenAmount>().is_err());
    assert!("1@-1".parse::<TokenAmount>().is_err());
}

#[test]
fn test_add_liquidity_json() {
    let json = serde_json::to_value(DefiTxPayload::from(liquidity_a())).unwrap();
    assert_eq!(json["type"], "AddPoolLiquidity");
    assert_eq!(json["shareAddress"], ADDR_B);
    assert_eq!(json["entries"][0]["address"], ADDR_A);
    assert_eq!(json["entries"][0]["amounts"][1]["tokenId"], 1);
    assert_eq!(json["entries"][0]["amounts"][1]["amount"], 200);
}

// -----------------------------------------------------------------------
// Unsupported operations
// -----------------------------------------------------------------------

#[test]
fn test_known_but_unsupported_types() {
    for tx_type in [
        DefiTxType::RemovePoolLiquidity,
        DefiTxType::CreatePoolPair,
        DefiTxType::UpdatePoolPair,
    ] {
        let script = marker::wrap(tx_type, &[0x00; 16]).unwrap();
        match DefiTxPayload::decode(script.to_bytes(), Network::Mainnet) {
            Err(DefiTxError::MalformedDefiTx(msg)) => {
                assert!(msg.contains("not supported"), "{}", msg)
            }
            other => panic!("{} should be unsupported, got {:?}", tx_type, other),
        }
    }
}

#[test]
fn test_decode_rejects_non_dftx_scripts() {
    let p2pkh = hex::decode("76a914111111111111111111111111111111111111111188ac").unwrap();
    assert!(DefiTxPayload::decode(&p2pkh, Network::Mainnet).is_err());
    let other_marker = hex::decode("6a0644665478787300").unwrap();
    assert!(DefiTxPayload::decode(&other_marker, Network::Mainnet).is_err());
}
