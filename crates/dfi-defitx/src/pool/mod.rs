//! Pool operation records.

mod liquidity;
mod swap;

pub use liquidity::{AddPoolLiquidity, AddPoolLiquidityBuilder, LiquidityEntry, TokenAmount};
pub use swap::{PoolSwap, PoolSwapBuilder};

use dfi_primitives::util::{DfiReader, DfiWriter};
use dfi_script::{address_for, Address, Network, Script};

use crate::DefiTxError;

/// Check an address string for `network` and resolve it to an address
/// with a locking script that fits a one-byte length prefix.
pub(crate) fn validate_address(
    field: &str,
    value: Option<&str>,
    network: Network,
) -> Result<Address, DefiTxError> {
    let value = value.ok_or_else(|| DefiTxError::invalid(field, "required"))?;
    let address =
        Address::parse(value, network).map_err(|e| DefiTxError::invalid(field, e.to_string()))?;
    let script = address.locking_script().map_err(|e| DefiTxError::invalid(field, e.to_string()))?;
    // Re-derive so the stored string is canonical.
    address_for(&script, network).map_err(|e| DefiTxError::invalid(field, e.to_string()))
}

/// Reject negative amounts and prices.
pub(crate) fn validate_amount(field: &str, value: Option<i64>) -> Result<i64, DefiTxError> {
    match value {
        None => Err(DefiTxError::invalid(field, "required")),
        Some(v) if v < 0 => Err(DefiTxError::invalid(field, format!("must not be negative, got {}", v))),
        Some(v) => Ok(v),
    }
}

/// Write a locking script with its one-byte length.
pub(crate) fn write_address_script(writer: &mut DfiWriter, address: &Address) -> Result<(), DefiTxError> {
    let script = address.locking_script()?;
    let len = u8::try_from(script.len()).map_err(|_| {
        DefiTxError::invalid("address", format!("script of {} bytes is too long", script.len()))
    })?;
    writer.write_u8(len);
    writer.write_bytes(script.to_bytes());
    Ok(())
}

/// Read a length-prefixed locking script and map it to an address.
pub(crate) fn read_address_script(
    reader: &mut DfiReader,
    network: Network,
    field: &str,
) -> Result<Address, DefiTxError> {
    let len = reader.read_u8()? as usize;
    let script = Script::from_bytes(reader.read_bytes(len)?);
    address_for(&script, network)
        .map_err(|e| DefiTxError::malformed(format!("{}: {}", field, e)))
}

pub(crate) fn read_amount(reader: &mut DfiReader, field: &str) -> Result<i64, DefiTxError> {
    let value = reader.read_i64_le()?;
    if value < 0 {
        return Err(DefiTxError::malformed(format!("{} is negative: {}", field, value)));
    }
    Ok(value)
}
