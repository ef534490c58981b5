/// DeFiChain SDK - Transaction building, signing, and serialization.
///
/// Provides the Transaction type with token-aware outputs, legacy and
/// segwit serialization, legacy and BIP-143 signature hashes, the
/// size-based fee estimator, unlocking templates, and the signer.

pub mod transaction;
pub mod input;
pub mod output;
pub mod sighash;
pub mod fee;
pub mod template;
pub mod signer;

mod error;
pub use error::TransactionError;
pub use fee::FeeRate;
pub use transaction::Transaction;
pub use input::TransactionInput;
pub use output::TransactionOutput;

#[cfg(test)]
mod tests;
