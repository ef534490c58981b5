//! The payload enum: one case per supported operation.

use std::fmt;

use serde::Serialize;

use dfi_script::{Network, Script};

use crate::marker::{self, DefiTxType};
use crate::pool::{AddPoolLiquidity, PoolSwap};
use crate::DefiTxError;

/// A validated DeFi transaction payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum DefiTxPayload {
    PoolSwap(PoolSwap),
    AddPoolLiquidity(AddPoolLiquidity),
}

impl DefiTxPayload {
    pub fn tx_type(&self) -> DefiTxType {
        match self {
            DefiTxPayload::PoolSwap(_) => DefiTxType::PoolSwap,
            DefiTxPayload::AddPoolLiquidity(_) => DefiTxType::AddPoolLiquidity,
        }
    }

    /// The `OP_RETURN "DfTx"` locking script for the zero-value output.
    pub fn to_script(&self) -> Result<Script, DefiTxError> {
        let record = match self {
            DefiTxPayload::PoolSwap(p) => p.record_bytes()?,
            DefiTxPayload::AddPoolLiquidity(p) => p.record_bytes()?,
        };
        marker::wrap(self.tx_type(), &record)
    }

    /// Raw bytes of [`to_script`](Self::to_script).
    pub fn to_bytes(&self) -> Result<Vec<u8>, DefiTxError> {
        Ok(self.to_script()?.into_bytes())
    }

    /// Decode a DfTx locking script, mapping embedded scripts to addresses
    /// on `network`.
    ///
    /// Known operations without an implemented record layout are reported
    /// as malformed rather than guessed at.
    pub fn decode(script: &[u8], network: Network) -> Result<Self, DefiTxError> {
        let (tx_type, record) = marker::unwrap(script)?;
        match tx_type {
            DefiTxType::PoolSwap => Ok(PoolSwap::from_record(record, network)?.into()),
            DefiTxType::AddPoolLiquidity => {
                Ok(AddPoolLiquidity::from_record(record, network)?.into())
            }
            other => Err(DefiTxError::malformed(format!("{} is not supported", other))),
        }
    }
}

impl From<PoolSwap> for DefiTxPayload {
    fn from(p: PoolSwap) -> Self {
        DefiTxPayload::PoolSwap(p)
    }
}

impl From<AddPoolLiquidity> for DefiTxPayload {
    fn from(p: AddPoolLiquidity) -> Self {
        DefiTxPayload::AddPoolLiquidity(p)
    }
}

impl fmt::Display for DefiTxPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefiTxPayload::PoolSwap(p) => p.fmt(f),
            DefiTxPayload::AddPoolLiquidity(p) => p.fmt(f),
        }
    }
}
