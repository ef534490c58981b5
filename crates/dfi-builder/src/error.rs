use dfi_defitx::DefiTxError;
use dfi_primitives::PrimitivesError;
use dfi_script::ScriptError;
use dfi_transaction::TransactionError;

use crate::node::NodeError;

/// Errors that can occur while building or broadcasting a transaction.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Inputs cannot cover the outputs plus fee.
    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds {
        /// Amount needed.
        needed: u64,
        /// Amount available.
        available: u64,
    },

    /// The node could not be reached or rejected the request.
    #[error("node transport error: {0}")]
    Transport(#[from] NodeError),

    /// Builder configuration could not be loaded or is inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    DefiTx(#[from] DefiTxError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Primitives(#[from] PrimitivesError),
}
