/// Error types for script and address operations.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Generic invalid script error.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// Attempted to append a push opcode through `append_opcodes`.
    #[error("use append_push_data for push data opcodes: {0}")]
    InvalidOpcodeType(String),

    /// Address failed checksum, prefix, HRP, or length validation for the
    /// expected network.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Address decoded correctly but has no locking-script mapping.
    #[error("unsupported address type: {0}")]
    UnsupportedAddressType(String),

    /// Locking script matches none of the address patterns.
    #[error("unrecognized script: {0}")]
    UnrecognizedScript(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Not enough data in script to complete a push operation.
    #[error("not enough data")]
    DataTooSmall,

    /// Push data exceeds the maximum encodable size.
    #[error("data too big")]
    DataTooBig,

    #[error("primitives error: {0}")]
    Primitives(#[from] dfi_primitives::PrimitivesError),
}

impl ScriptError {
    pub(crate) fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        ScriptError::InvalidAddress { address: address.to_string(), reason: reason.into() }
    }
}
