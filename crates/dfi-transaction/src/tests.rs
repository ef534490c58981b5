//! Tests for the dfi-transaction crate.
//!
//! Segwit vectors come from BIP-143 (version 1 transactions, so outputs
//! carry no token id). Legacy sighash vectors cover a version 4
//! transaction whose second output transfers token 130.

use dfi_primitives::chainhash::Hash;
use dfi_primitives::ec::{PrivateKey, Signature};
use dfi_script::Script;

use crate::fee;
use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::sighash::{self, SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_NONE, SIGHASH_SINGLE};
use crate::signer::{self, SpendKind};
use crate::template::{p2pkh, p2sh_p2wpkh, p2wpkh, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Vectors
// -----------------------------------------------------------------------

/// BIP-143 native P2WPKH example, unsigned.
const BIP143_P2WPKH_TX: &str = "0100000002fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f0000000000eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac11000000";
const BIP143_P2WPKH_KEY: &str = "619c335025c7f4012e556c2a58b2506e30b8511b53ade95ea316fd8c3286feb9";

/// BIP-143 P2SH-P2WPKH example, unsigned.
const BIP143_P2SH_P2WPKH_TX: &str = "0100000001db6b1b20aa0fd7b23880be2ecbd4a98130974cf4748fb66092ac4d3ceb1a54770100000000feffffff02b8b4eb0b000000001976a914a457b684d7f0d539a46a45bbc043f35b59d0d96388ac0008af2f000000001976a914fd270b1ee6abcaea97fea7ad0402e8bd8ad6d77c88ac92040000";
const BIP143_P2SH_P2WPKH_KEY: &str =
    "eb696a065ef48a2192da5b28b694f87544b30fae8327c4510137a922f32c6dcf";

/// Two inputs, two outputs, version 4; the second output carries token 130.
const TOKEN_TX: &str = "0400000002aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa0100000000ffffffffbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb0000000000feffffff0280f0fa02000000001976a914111111111111111111111111111111111111111188ac00d2040000000000001976a914222222222222222222222222222222222222222288ac800200000000";

fn key_one() -> PrivateKey {
    PrivateKey::from_hex("0000000000000000000000000000000000000000000000000000000000000001").unwrap()
}

/// Verify the DER signature (sighash byte stripped) against `digest`.
fn assert_signature_valid(sig_with_flag: &[u8], digest: &[u8; 32], key: &PrivateKey) {
    let (der, flag) = sig_with_flag.split_at(sig_with_flag.len() - 1);
    assert_eq!(flag, &[SIGHASH_ALL as u8], "sighash byte should be ALL");
    let sig = Signature::from_der(der).expect("signature should be valid DER");
    assert!(sig.is_low_s(), "signature should be low-S");
    assert!(key.pub_key().verify(digest, &sig), "signature should verify");
}

// -----------------------------------------------------------------------
// Serialization
// -----------------------------------------------------------------------

/// Version 4 outputs carry a base-128 token id after the script.
#[test]
fn test_token_tx_roundtrip() {
    let tx = Transaction::from_hex(TOKEN_TX).expect("should parse token tx");
    assert_eq!(tx.version, 4);
    assert_eq!(tx.input_count(), 2);
    assert_eq!(tx.outputs[0].token_id, 0);
    assert_eq!(tx.outputs[1].token_id, 130);
    assert_eq!(tx.outputs[1].value, 1234);
    assert_eq!(tx.inputs[1].sequence_number, 0xffff_fffe);
    assert_eq!(tx.to_hex(), TOKEN_TX);
}

#[test]
fn test_bip143_tx_parses_as_version_1() {
    let tx = Transaction::from_hex(BIP143_P2WPKH_TX).unwrap();
    assert_eq!(tx.version, 1);
    assert_eq!(tx.lock_time, 17);
    assert_eq!(tx.to_hex(), BIP143_P2WPKH_TX);
}

#[test]
fn test_trailing_bytes_rejected() {
    let err = Transaction::from_hex(&format!("{}00", TOKEN_TX)).unwrap_err();
    assert!(matches!(err, TransactionError::SerializationError(_)));
}

#[test]
fn test_truncated_tx_rejected() {
    assert!(Transaction::from_hex(&TOKEN_TX[..TOKEN_TX.len() - 4]).is_err());
}

/// A witness switches to the segwit encoding; the txid still covers the
/// legacy encoding only.
#[test]
fn test_segwit_encoding() {
    let mut tx = Transaction::from_hex(TOKEN_TX).unwrap();
    let legacy_id = tx.tx_id();
    assert_eq!(tx.wtx_id(), legacy_id);

    tx.inputs[0].witness = vec![vec![0x30; 71], vec![0x02; 33]];
    let bytes = tx.to_bytes();
    assert_eq!(&bytes[4..6], &[0x00, 0x01], "marker and flag follow the version");
    assert!(tx.has_witness());
    assert_eq!(tx.tx_id(), legacy_id);
    assert_ne!(tx.wtx_id(), legacy_id);

    let parsed = Transaction::from_bytes(&bytes).unwrap();
    assert_eq!(parsed.inputs[0].witness, tx.inputs[0].witness);
    assert!(parsed.inputs[1].witness.is_empty());
    assert_eq!(parsed.to_bytes(), bytes);

    let witness_bytes = 1 + (1 + 71) + (1 + 33) + 1;
    assert_eq!(tx.size(), tx.to_bytes_legacy().len() + 2 + witness_bytes);
    assert!(tx.vsize() < tx.size());
}

#[test]
fn test_tx_id_hex_is_reversed() {
    let tx = Transaction::from_hex(TOKEN_TX).unwrap();
    let mut internal = *tx.tx_id().as_bytes();
    internal.reverse();
    assert_eq!(tx.tx_id_hex(), hex::encode(internal));
}

#[test]
fn test_add_input_from_and_totals() {
    let mut tx = Transaction::new();
    let txid = "aa".repeat(32);
    tx.add_input_from(&txid, 3, &Script::p2pkh(&[1; 20]).to_hex(), 700).unwrap();
    tx.add_input_from(&txid, 4, &Script::p2pkh(&[1; 20]).to_hex(), 300).unwrap();
    tx.add_output(TransactionOutput::new(900, Script::p2pkh(&[2; 20])));
    assert_eq!(tx.total_input_value().unwrap(), 1000);
    assert_eq!(tx.total_output_value(), 900);
    assert_eq!(tx.inputs[0].source_txid_hex(), txid);

    tx.add_input(TransactionInput::new());
    assert!(tx.total_input_value().is_err());
}

// -----------------------------------------------------------------------
// Signature hashes
// -----------------------------------------------------------------------

#[test]
fn test_legacy_sighash_vectors() {
    let tx = Transaction::from_hex(TOKEN_TX).unwrap();
    let code = Script::p2pkh(&[0x33; 20]);
    let cases = [
        (0, SIGHASH_ALL, "5c0480e017239df617acd1844d953e39fd1a2131569d84d459e6547b9520c2c3"),
        (1, SIGHASH_ALL, "14d30df8b0dd6eb92023e1b7202b7e28c137c714d45a6093a492c9c0e3e28167"),
        (1, SIGHASH_NONE, "e7a2b994eeb365d3ea3652d2558f3ba0661caad6dd63572e2f186b9ffc1d90b9"),
        (1, SIGHASH_SINGLE, "178f937ba416930b91ad03c86caf7d85f8b43e7974def0da80430544a3956a8e"),
        (
            0,
            SIGHASH_ALL | SIGHASH_ANYONECANPAY,
            "ea306d4209e2fb7a90d14cdb24b50bbb50e3a91ad7bd77620c8a1963f4cb1bed",
        ),
        (
            0,
            SIGHASH_SINGLE | SIGHASH_ANYONECANPAY,
            "fb8118a3257c2c5685d20f6b2b9adf82cc5d6cd03cd569682d33426f5fe83a3c",
        ),
    ];
    for (idx, flag, expected) in cases {
        let digest = sighash::legacy_signature_hash(&tx, idx, code.to_bytes(), flag).unwrap();
        assert_eq!(hex::encode(digest), expected, "input {} flag {:#x}", idx, flag);
    }
}

/// SIGHASH_SINGLE without a matching output signs the integer one.
#[test]
fn test_legacy_sighash_single_without_output() {
    let mut tx = Transaction::from_hex(TOKEN_TX).unwrap();
    tx.outputs.truncate(1);
    let digest =
        sighash::legacy_signature_hash(&tx, 1, &[], SIGHASH_SINGLE).unwrap();
    assert_eq!(digest, sighash::SIGHASH_SINGLE_BUG);
}

#[test]
fn test_sighash_index_out_of_range() {
    let tx = Transaction::from_hex(TOKEN_TX).unwrap();
    assert!(sighash::legacy_signature_hash(&tx, 2, &[], SIGHASH_ALL).is_err());
    assert!(sighash::witness_v0_signature_hash(&tx, 5, &[], 0, SIGHASH_ALL).is_err());
}

/// Changing a token id changes the digest.
#[test]
fn test_sighash_commits_to_token_id() {
    let tx = Transaction::from_hex(TOKEN_TX).unwrap();
    let mut other = tx.clone();
    other.outputs[1].token_id = 131;
    let code = Script::p2pkh(&[0x33; 20]);
    assert_ne!(
        sighash::legacy_signature_hash(&tx, 0, code.to_bytes(), SIGHASH_ALL).unwrap(),
        sighash::legacy_signature_hash(&other, 0, code.to_bytes(), SIGHASH_ALL).unwrap()
    );
    assert_ne!(
        sighash::witness_v0_signature_hash(&tx, 0, code.to_bytes(), 1, SIGHASH_ALL).unwrap(),
        sighash::witness_v0_signature_hash(&other, 0, code.to_bytes(), 1, SIGHASH_ALL).unwrap()
    );
}

#[test]
fn test_bip143_native_p2wpkh() {
    let mut tx = Transaction::from_hex(BIP143_P2WPKH_TX).unwrap();
    let key = PrivateKey::from_hex(BIP143_P2WPKH_KEY).unwrap();
    let pkh = key.pub_key().hash160();
    assert_eq!(hex::encode(pkh), "1d0f172a0ecb48aee1be1f2687d2963ae33f71a1");

    tx.inputs[1].set_source_output(Some(TransactionOutput::new(
        600_000_000,
        Script::witness_v0(&pkh).unwrap(),
    )));
    let digest = tx.calc_witness_signature_hash(1, &pkh, SIGHASH_ALL).unwrap();
    assert_eq!(
        hex::encode(digest),
        "c37af31116d1b27caf68aae9e3ac82f1477929014d5b917657d0eb49478cb670"
    );

    let unlock = p2wpkh::unlock(key.clone(), None).sign(&tx, 1).unwrap();
    assert!(unlock.unlocking_script.is_none());
    assert_eq!(
        hex::encode(&unlock.witness[0]),
        "304402203609e17b84f6a7d30c80bfa610b5b4542f32a8a0d5447a12fb1366d7f01cc44a0220573a954c4518331561406f90300e8f3358f51928d43c212a8caed02de67eebee01"
    );
    assert_eq!(
        hex::encode(&unlock.witness[1]),
        "025476c2e83188368da1ff3e292e7acafcdb3566bb0ad253f62fc70f07aeee6357"
    );
}

#[test]
fn test_bip143_p2sh_p2wpkh() {
    let mut tx = Transaction::from_hex(BIP143_P2SH_P2WPKH_TX).unwrap();
    let key = PrivateKey::from_hex(BIP143_P2SH_P2WPKH_KEY).unwrap();
    let lock = p2sh_p2wpkh::lock(&key).unwrap();
    assert_eq!(lock.to_hex(), "a9144733f37cf4db86fbc2efed2500b4f4e49f31202387");

    tx.inputs[0].set_source_output(Some(TransactionOutput::new(1_000_000_000, lock)));
    let digest =
        tx.calc_witness_signature_hash(0, &key.pub_key().hash160(), SIGHASH_ALL).unwrap();
    assert_eq!(
        hex::encode(digest),
        "64f3b0f4dd2bb3aa1ce8566d220cc74dda9df97d8490cc81d89d735c92e59fb6"
    );

    signer::sign(&mut tx, &[key]).unwrap();
    assert_eq!(
        tx.inputs[0].unlocking_script.as_ref().unwrap().to_hex(),
        "16001479091972186c449eb1ded22b78e40d009bdf0089"
    );
    assert_eq!(
        hex::encode(&tx.inputs[0].witness[0]),
        "3044022047ac8e878352d3ebbde1c94ce3a10d057c24175747116f8288e5d794d12d482f0220217f36a485cae903c713331d877c1f64677e3622ad4010726870540656fe9dcb01"
    );
    assert!(tx.to_hex().starts_with("01000000000101"));
}

// -----------------------------------------------------------------------
// Signer
// -----------------------------------------------------------------------

fn funded_tx(key: &PrivateKey) -> Transaction {
    let mut tx = Transaction::new();
    let scripts = [
        p2pkh::lock(key),
        p2wpkh::lock(key).unwrap(),
        p2sh_p2wpkh::lock(key).unwrap(),
    ];
    for (i, script) in scripts.into_iter().enumerate() {
        tx.add_input(TransactionInput::spending(
            Hash::new([i as u8 + 1; 32]),
            i as u32,
            TransactionOutput::new(10_000 * (i as u64 + 1), script),
        ));
    }
    tx.add_output(TransactionOutput::new(55_000, Script::p2pkh(&[0x44; 20])));
    tx
}

#[test]
fn test_spend_kind_detection() {
    let key = key_one();
    let tx = funded_tx(&key);
    let kinds: Vec<_> = tx
        .inputs
        .iter()
        .map(|i| signer::spend_kind(&key, i.source_tx_script().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![Some(SpendKind::P2pkh), Some(SpendKind::P2wpkh), Some(SpendKind::P2shP2wpkh)]
    );
    assert_eq!(signer::spend_kind(&PrivateKey::new(), tx.inputs[0].source_tx_script().unwrap()), None);
}

/// Every signature the signer produces verifies against the digest the
/// input type requires.
#[test]
fn test_signer_signatures_verify() {
    let other = PrivateKey::new();
    let key = key_one();
    let mut tx = funded_tx(&key);
    signer::sign(&mut tx, &[other, key.clone()]).unwrap();

    // P2PKH: <sig> <pubkey> in the unlocking script, no witness.
    let chunks = tx.inputs[0].unlocking_script.as_ref().unwrap().chunks().unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(tx.inputs[0].witness.is_empty());
    let digest = tx.calc_legacy_signature_hash(0, SIGHASH_ALL).unwrap();
    assert_signature_valid(chunks[0].data.as_ref().unwrap(), &digest, &key);
    assert_eq!(chunks[1].data.as_deref(), Some(&key.pub_key().to_compressed()[..]));

    // P2WPKH: empty unlocking script, [sig, pubkey] witness.
    let pkh = key.pub_key().hash160();
    assert!(tx.inputs[1].unlocking_script.is_none());
    let digest = tx.calc_witness_signature_hash(1, &pkh, SIGHASH_ALL).unwrap();
    assert_signature_valid(&tx.inputs[1].witness[0], &digest, &key);

    // P2SH-P2WPKH: redeem script push plus the same witness shape.
    let redeem = p2sh_p2wpkh::redeem_script(&key).unwrap();
    let chunks = tx.inputs[2].unlocking_script.as_ref().unwrap().chunks().unwrap();
    assert_eq!(chunks[0].data.as_deref(), Some(redeem.to_bytes()));
    let digest = tx.calc_witness_signature_hash(2, &pkh, SIGHASH_ALL).unwrap();
    assert_signature_valid(&tx.inputs[2].witness[0], &digest, &key);

    let reparsed = Transaction::from_hex(&tx.to_hex()).unwrap();
    assert_eq!(reparsed.tx_id(), tx.tx_id());
}

#[test]
fn test_signer_fails_without_matching_key() {
    let key = key_one();
    let mut tx = funded_tx(&key);
    let err = signer::sign(&mut tx, &[PrivateKey::new()]).unwrap_err();
    assert!(matches!(err, TransactionError::SigningError(_)));
}

#[test]
fn test_signer_fails_without_source_output() {
    let mut tx = Transaction::new();
    tx.add_input(TransactionInput::new());
    let err = signer::sign(&mut tx, &[key_one()]).unwrap_err();
    assert!(matches!(err, TransactionError::SigningError(_)));
}

/// The real P2PKH unlocking script never exceeds the fee allowance.
#[test]
fn test_p2pkh_unlocking_fits_estimate() {
    let key = key_one();
    let mut tx = funded_tx(&key);
    tx.inputs.truncate(1);
    let template = p2pkh::unlock(key, None);
    let unlock = template.sign(&tx, 0).unwrap();
    let len = unlock.unlocking_script.unwrap().len();
    assert!(len <= fee::ESTIMATED_UNLOCKING_SIZE);
}
