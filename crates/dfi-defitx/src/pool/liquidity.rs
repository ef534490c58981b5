//! AddPoolLiquidity: deposit token pairs into a pool for shares.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use dfi_primitives::util::{DfiReader, DfiWriter};
use dfi_script::{Address, Network};

use super::{read_address_script, read_amount, validate_address, write_address_script};
use crate::DefiTxError;

/// An amount of one token, written `amount@token` by the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    pub token_id: u32,
    pub amount: i64,
}

impl TokenAmount {
    pub fn new(token_id: u32, amount: i64) -> Self {
        TokenAmount { token_id, amount }
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.amount, self.token_id)
    }
}

impl FromStr for TokenAmount {
    type Err = DefiTxError;

    /// Parse `amount@token`, both parts integers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, token) = s
            .split_once('@')
            .ok_or_else(|| DefiTxError::invalid("amounts", format!("'{}' is not amount@token", s)))?;
        let amount = amount
            .trim()
            .parse::<i64>()
            .map_err(|e| DefiTxError::invalid("amounts", format!("'{}': {}", s, e)))?;
        let token_id = token
            .trim()
            .parse::<u32>()
            .map_err(|e| DefiTxError::invalid("amounts", format!("'{}': {}", s, e)))?;
        Ok(TokenAmount { token_id, amount })
    }
}

/// One contributor and the token amounts it adds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LiquidityEntry {
    address: Address,
    amounts: Vec<TokenAmount>,
}

impl LiquidityEntry {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn amounts(&self) -> &[TokenAmount] {
        &self.amounts
    }
}

/// A validated liquidity deposit.
///
/// Record layout:
///
/// ```text
/// u8    entry count
/// per entry:
///   u8    script length | script
///   u8    amount count
///   per amount: u32 token id (LE), i64 amount (LE)
/// u8    share script length | share script
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPoolLiquidity {
    entries: Vec<LiquidityEntry>,
    share_address: Address,
}

impl AddPoolLiquidity {
    pub fn builder(network: Network) -> AddPoolLiquidityBuilder {
        AddPoolLiquidityBuilder::new(network)
    }

    pub fn entries(&self) -> &[LiquidityEntry] {
        &self.entries
    }

    pub fn share_address(&self) -> &Address {
        &self.share_address
    }

    /// Encode the operation record (without marker or type byte).
    pub fn record_bytes(&self) -> Result<Vec<u8>, DefiTxError> {
        let mut writer = DfiWriter::new();
        writer.write_u8(self.entries.len() as u8);
        for entry in &self.entries {
            write_address_script(&mut writer, &entry.address)?;
            writer.write_u8(entry.amounts.len() as u8);
            for amount in &entry.amounts {
                writer.write_u32_le(amount.token_id);
                writer.write_i64_le(amount.amount);
            }
        }
        write_address_script(&mut writer, &self.share_address)?;
        Ok(writer.into_bytes())
    }

    /// Decode an operation record, resolving scripts on `network`.
    pub fn from_record(record: &[u8], network: Network) -> Result<Self, DefiTxError> {
        let mut reader = DfiReader::new(record);
        let entry_count = reader.read_u8()?;
        if entry_count == 0 {
            return Err(DefiTxError::malformed("AddPoolLiquidity has no entries"));
        }
        let mut entries = Vec::with_capacity(entry_count as usize);
        for i in 0..entry_count {
            let address = read_address_script(&mut reader, network, &format!("entries[{}]", i))?;
            let amount_count = reader.read_u8()?;
            if amount_count == 0 {
                return Err(DefiTxError::malformed(format!("entries[{}] has no amounts", i)));
            }
            let mut amounts = Vec::with_capacity(amount_count as usize);
            for _ in 0..amount_count {
                let token_id = reader.read_u32_le()?;
                let amount = read_amount(&mut reader, "amount")?;
                amounts.push(TokenAmount { token_id, amount });
            }
            entries.push(LiquidityEntry { address, amounts });
        }
        let share_address = read_address_script(&mut reader, network, "shareAddress")?;
        if reader.remaining() != 0 {
            return Err(DefiTxError::malformed(format!(
                "{} trailing bytes after AddPoolLiquidity record",
                reader.remaining()
            )));
        }
        Ok(AddPoolLiquidity { entries, share_address })
    }
}

impl fmt::Display for AddPoolLiquidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddPoolLiquidity")?;
        for entry in &self.entries {
            let amounts: Vec<String> = entry.amounts.iter().map(|a| a.to_string()).collect();
            write!(f, " {} [{}]", entry.address, amounts.join(", "))?;
        }
        write!(f, " shares to {}", self.share_address)
    }
}

/// Collects AddPoolLiquidity fields; nothing is checked until
/// [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct AddPoolLiquidityBuilder {
    network: Network,
    entries: Vec<(String, Vec<TokenAmount>)>,
    share_address: Option<String>,
}

impl AddPoolLiquidityBuilder {
    pub fn new(network: Network) -> Self {
        Self { network, entries: Vec::new(), share_address: None }
    }

    /// Add a contributing address and its amounts.
    pub fn entry(
        mut self,
        address: impl Into<String>,
        amounts: impl IntoIterator<Item = TokenAmount>,
    ) -> Self {
        self.entries.push((address.into(), amounts.into_iter().collect()));
        self
    }

    pub fn share_address(mut self, address: impl Into<String>) -> Self {
        self.share_address = Some(address.into());
        self
    }

    /// Validate every entry and the share address, and produce the payload.
    pub fn build(self) -> Result<AddPoolLiquidity, DefiTxError> {
        if self.entries.is_empty() {
            return Err(DefiTxError::invalid("entries", "at least one entry is required"));
        }
        if self.entries.len() > u8::MAX as usize {
            return Err(DefiTxError::invalid(
                "entries",
                format!("{} entries exceed {}", self.entries.len(), u8::MAX),
            ));
        }

        let mut entries = Vec::with_capacity(self.entries.len());
        for (i, (address, amounts)) in self.entries.iter().enumerate() {
            let field = format!("entries[{}].address", i);
            let address = validate_address(&field, Some(address.as_str()), self.network)?;
            let field = format!("entries[{}].amounts", i);
            if amounts.is_empty() {
                return Err(DefiTxError::invalid(field, "at least one amount is required"));
            }
            if amounts.len() > u8::MAX as usize {
                return Err(DefiTxError::invalid(
                    field,
                    format!("{} amounts exceed {}", amounts.len(), u8::MAX),
                ));
            }
            if let Some(bad) = amounts.iter().find(|a| a.amount < 0) {
                return Err(DefiTxError::invalid(field, format!("{} is negative", bad)));
            }
            entries.push(LiquidityEntry { address, amounts: amounts.clone() });
        }

        let share_address =
            validate_address("shareAddress", self.share_address.as_deref(), self.network)?;
        Ok(AddPoolLiquidity { entries, share_address })
    }
}
