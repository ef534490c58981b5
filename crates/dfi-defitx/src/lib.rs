/// DeFiChain SDK - DeFi transaction payloads.
///
/// Application operations travel inside the first, zero-value output of a
/// transaction as `OP_RETURN <"DfTx" type record>`. This crate provides the
/// marker framing, the operation records for pool swaps and liquidity
/// provision, builders that validate every field before a payload exists,
/// and the decoder that reads a payload back out of a locking script.

pub mod marker;
pub mod pool;
pub mod payload;

mod error;
pub use error::DefiTxError;
pub use marker::DefiTxType;
pub use payload::DefiTxPayload;
pub use pool::{
    AddPoolLiquidity, AddPoolLiquidityBuilder, LiquidityEntry, PoolSwap, PoolSwapBuilder,
    TokenAmount,
};

#[cfg(test)]
mod tests;
