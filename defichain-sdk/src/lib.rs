#![deny(missing_docs)]

//! DeFiChain SDK - Complete SDK.
//!
//! Re-exports all DeFiChain SDK components for convenient single-crate usage.

pub use dfi_primitives as primitives;
pub use dfi_script as script;
pub use dfi_transaction as transaction;
pub use dfi_defitx as defitx;
pub use dfi_builder as builder;
