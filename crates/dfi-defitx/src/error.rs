/// Errors from building or decoding DeFi transaction payloads.
#[derive(Debug, thiserror::Error)]
pub enum DefiTxError {
    /// A builder field is missing or out of range.
    #[error("invalid {field}: {reason}")]
    ValidationError { field: String, reason: String },

    /// Script bytes do not hold a well-formed payload.
    #[error("malformed DfTx: {0}")]
    MalformedDefiTx(String),

    #[error(transparent)]
    Script(#[from] dfi_script::ScriptError),
}

impl DefiTxError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DefiTxError::ValidationError { field: field.into(), reason: reason.into() }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DefiTxError::MalformedDefiTx(reason.into())
    }
}

impl From<dfi_primitives::PrimitivesError> for DefiTxError {
    fn from(e: dfi_primitives::PrimitivesError) -> Self {
        DefiTxError::MalformedDefiTx(e.to_string())
    }
}
