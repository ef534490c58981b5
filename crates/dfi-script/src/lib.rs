/// DeFiChain SDK - Script construction and the address codec.
///
/// Provides the `Script` type, opcode constants, script chunk parsing,
/// network parameters, and conversion between addresses and locking
/// scripts for P2PKH, P2SH, and segwit v0 outputs.

pub mod script;
pub mod opcodes;
pub mod chunk;
pub mod address;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use address::{address_for, script_for, Address, AddressKind, AddressPayload, Network};
pub use chunk::ScriptChunk;
