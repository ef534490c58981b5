//! The node collaborator.
//!
//! The builder needs three things from a node: the unspent outputs of an
//! address, a way to broadcast a signed transaction, and optionally a fee
//! estimate. [`NodeClient`] is that seam; [`rpc::RpcNode`] implements it
//! over any JSON-RPC transport.

pub mod rpc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use dfi_transaction::FeeRate;

/// Smallest units per coin.
pub const COIN: u64 = 100_000_000;

/// Errors reported by the node or the transport in front of it.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The request never reached the node.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The node's answer could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// An unspent output as reported by `listunspent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Display-order txid hex.
    pub txid: String,
    pub vout: u32,
    /// Amount in smallest units; the node reports coins.
    #[serde(with = "coin_amount")]
    pub amount: u64,
    pub address: String,
    #[serde(default = "spendable_default")]
    pub spendable: bool,
    /// Locking script hex, when the node includes it.
    #[serde(rename = "scriptPubKey", default, skip_serializing_if = "Option::is_none")]
    pub script_pub_key: Option<String>,
}

impl UnspentOutput {
    pub fn new(txid: impl Into<String>, vout: u32, amount: u64, address: impl Into<String>) -> Self {
        UnspentOutput {
            txid: txid.into(),
            vout,
            amount,
            address: address.into(),
            spendable: true,
            script_pub_key: None,
        }
    }
}

fn spendable_default() -> bool {
    true
}

/// Coin-denominated JSON numbers to and from smallest units.
mod coin_amount {
    use super::*;

    pub fn serialize<S: Serializer>(amount: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*amount as f64 / COIN as f64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let coins = f64::deserialize(deserializer)?;
        if !coins.is_finite() || coins < 0.0 {
            return Err(serde::de::Error::custom(format!("invalid amount {}", coins)));
        }
        Ok((coins * COIN as f64).round() as u64)
    }
}

/// Access to a DeFiChain node.
pub trait NodeClient {
    /// Unspent outputs paying to `address`, in node order.
    fn list_unspent(&self, address: &str) -> Result<Vec<UnspentOutput>, NodeError>;

    /// Broadcast a signed transaction and return its txid.
    fn broadcast(&self, signed_hex: &str) -> Result<String, NodeError>;

    /// The node's current fee rate, if it offers one.
    fn estimate_fee_rate(&self) -> Result<Option<FeeRate>, NodeError> {
        Ok(None)
    }
}

impl<T: NodeClient + ?Sized> NodeClient for &T {
    fn list_unspent(&self, address: &str) -> Result<Vec<UnspentOutput>, NodeError> {
        (**self).list_unspent(address)
    }

    fn broadcast(&self, signed_hex: &str) -> Result<String, NodeError> {
        (**self).broadcast(signed_hex)
    }

    fn estimate_fee_rate(&self) -> Result<Option<FeeRate>, NodeError> {
        (**self).estimate_fee_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unspent_from_listunspent_json() {
        let json = r#"[{
            "txid": "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "vout": 1,
            "address": "8Ge6f2eohG3EJu42qr5thGPHEnFmyox4Wy",
            "scriptPubKey": "76a914111111111111111111111111111111111111111188ac",
            "amount": 1.23456789,
            "confirmations": 12,
            "spendable": true,
            "solvable": true,
            "safe": true
        }]"#;
        let utxos: Vec<UnspentOutput> = serde_json::from_str(json).unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].amount, 123_456_789);
        assert_eq!(utxos[0].vout, 1);
        assert!(utxos[0].spendable);
        assert_eq!(
            utxos[0].script_pub_key.as_deref(),
            Some("76a914111111111111111111111111111111111111111188ac")
        );
    }

    #[test]
    fn test_unspent_defaults_and_rejects_negative() {
        let json = r#"{"txid": "00", "vout": 0, "address": "x", "amount": 0.5}"#;
        let utxo: UnspentOutput = serde_json::from_str(json).unwrap();
        assert!(utxo.spendable);
        assert_eq!(utxo.amount, COIN / 2);
        assert!(utxo.script_pub_key.is_none());

        let json = r#"{"txid": "00", "vout": 0, "address": "x", "amount": -1}"#;
        assert!(serde_json::from_str::<UnspentOutput>(json).is_err());
    }

    #[test]
    fn test_unspent_serializes_coins() {
        let utxo = UnspentOutput::new("00", 0, 150_000_000, "x");
        let value = serde_json::to_value(&utxo).unwrap();
        assert_eq!(value["amount"], 1.5);
        assert!(value.get("scriptPubKey").is_none());
    }
}
