/// DeFiChain SDK - Raw transaction builder.
///
/// Selects unspent outputs, assembles payment and DeFi transactions,
/// deducts the size-based fee from the change output, and signs every
/// input. The node is reached through the [`NodeClient`] trait.

pub mod builder;
pub mod config;
pub mod node;
pub mod selector;

mod error;
pub use builder::{Account, RawTransactionBuilder};
pub use config::BuilderConfig;
pub use error::BuildError;
pub use node::{NodeClient, NodeError, UnspentOutput};
pub use selector::Selection;
