//! PoolSwap: exchange one token for another through a liquidity pool.

use std::fmt;

use serde::Serialize;

use dfi_primitives::util::{DfiReader, DfiWriter};
use dfi_script::{Address, Network};

use super::{read_address_script, read_amount, validate_address, validate_amount, write_address_script};
use crate::DefiTxError;

/// Highest token id a PoolSwap record can carry in its one-byte fields.
pub const MAX_SWAP_TOKEN_ID: u32 = 0x7f;

/// A validated pool swap.
///
/// Record layout:
///
/// ```text
/// u8    from script length | from script
/// u8    from token id
/// i64   from amount (LE)
/// u8    to script length   | to script
/// u8    to token id
/// [8]   reserved, zero
/// i64   max price (LE)
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSwap {
    address_from: Address,
    token_from: u32,
    amount_from: i64,
    address_to: Address,
    token_to: u32,
    max_price: i64,
}

impl PoolSwap {
    pub fn builder(network: Network) -> PoolSwapBuilder {
        PoolSwapBuilder::new(network)
    }

    pub fn address_from(&self) -> &Address {
        &self.address_from
    }

    pub fn token_from(&self) -> u32 {
        self.token_from
    }

    pub fn amount_from(&self) -> i64 {
        self.amount_from
    }

    pub fn address_to(&self) -> &Address {
        &self.address_to
    }

    pub fn token_to(&self) -> u32 {
        self.token_to
    }

    pub fn max_price(&self) -> i64 {
        self.max_price
    }

    /// Encode the operation record (without marker or type byte).
    pub fn record_bytes(&self) -> Result<Vec<u8>, DefiTxError> {
        let mut writer = DfiWriter::with_capacity(80);
        write_address_script(&mut writer, &self.address_from)?;
        writer.write_u8(self.token_from as u8);
        writer.write_i64_le(self.amount_from);
        write_address_script(&mut writer, &self.address_to)?;
        writer.write_u8(self.token_to as u8);
        writer.write_u64_le(0);
        writer.write_i64_le(self.max_price);
        Ok(writer.into_bytes())
    }

    /// Decode an operation record, resolving scripts on `network`.
    pub fn from_record(record: &[u8], network: Network) -> Result<Self, DefiTxError> {
        let mut reader = DfiReader::new(record);
        let address_from = read_address_script(&mut reader, network, "addressFrom")?;
        let token_from = read_token(&mut reader, "tokenFrom")?;
        let amount_from = read_amount(&mut reader, "amountFrom")?;
        let address_to = read_address_script(&mut reader, network, "addressTo")?;
        let token_to = read_token(&mut reader, "tokenTo")?;
        let reserved = reader.read_u64_le()?;
        if reserved != 0 {
            return Err(DefiTxError::malformed(format!(
                "reserved field is not zero: {:#018x}",
                reserved
            )));
        }
        let max_price = read_amount(&mut reader, "maxPrice")?;
        if reader.remaining() != 0 {
            return Err(DefiTxError::malformed(format!(
                "{} trailing bytes after PoolSwap record",
                reader.remaining()
            )));
        }
        Ok(PoolSwap { address_from, token_from, amount_from, address_to, token_to, max_price })
    }
}

fn read_token(reader: &mut DfiReader, field: &str) -> Result<u32, DefiTxError> {
    let id = reader.read_u8()? as u32;
    if id > MAX_SWAP_TOKEN_ID {
        return Err(DefiTxError::malformed(format!("{} 0x{:02x} is not a single-byte token id", field, id)));
    }
    Ok(id)
}

fn validate_token(field: &str, value: Option<u32>) -> Result<u32, DefiTxError> {
    match value {
        None => Err(DefiTxError::invalid(field, "required")),
        Some(id) if id > MAX_SWAP_TOKEN_ID => Err(DefiTxError::invalid(
            field,
            format!("token id {} exceeds {}", id, MAX_SWAP_TOKEN_ID),
        )),
        Some(id) => Ok(id),
    }
}

impl fmt::Display for PoolSwap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoolSwap {}@{} from {} to token {} at {} (max price {})",
            self.amount_from,
            self.token_from,
            self.address_from,
            self.token_to,
            self.address_to,
            self.max_price
        )
    }
}

/// Collects PoolSwap fields; nothing is checked until [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct PoolSwapBuilder {
    network: Network,
    address_from: Option<String>,
    token_from: Option<u32>,
    amount_from: Option<i64>,
    address_to: Option<String>,
    token_to: Option<u32>,
    max_price: Option<i64>,
}

impl PoolSwapBuilder {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            address_from: None,
            token_from: None,
            amount_from: None,
            address_to: None,
            token_to: None,
            max_price: None,
        }
    }

    pub fn address_from(mut self, address: impl Into<String>) -> Self {
        self.address_from = Some(address.into());
        self
    }

    pub fn token_from(mut self, token_id: u32) -> Self {
        self.token_from = Some(token_id);
        self
    }

    pub fn amount_from(mut self, amount: i64) -> Self {
        self.amount_from = Some(amount);
        self
    }

    pub fn address_to(mut self, address: impl Into<String>) -> Self {
        self.address_to = Some(address.into());
        self
    }

    pub fn token_to(mut self, token_id: u32) -> Self {
        self.token_to = Some(token_id);
        self
    }

    pub fn max_price(mut self, max_price: i64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    /// Validate every field, in record order, and produce the payload.
    pub fn build(self) -> Result<PoolSwap, DefiTxError> {
        Ok(PoolSwap {
            address_from: validate_address("addressFrom", self.address_from.as_deref(), self.network)?,
            token_from: validate_token("tokenFrom", self.token_from)?,
            amount_from: validate_amount("amountFrom", self.amount_from)?,
            address_to: validate_address("addressTo", self.address_to.as_deref(), self.network)?,
            token_to: validate_token("tokenTo", self.token_to)?,
            max_price: validate_amount("maxPrice", self.max_price)?,
        })
    }
}
