/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction structure is invalid (e.g. input index out of range).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// Signing failed (e.g. no key matches an input or source output missing).
    #[error("signing error: {0}")]
    SigningError(String),
    /// Binary/hex serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// Invalid fee rate.
    #[error("fee error: {0}")]
    FeeError(String),
    #[error("script error: {0}")]
    Script(#[from] dfi_script::ScriptError),
    #[error("primitives error: {0}")]
    Primitives(#[from] dfi_primitives::PrimitivesError),
}
