//! Raw transaction builder.
//!
//! Every build follows the same steps: choose inputs, lay out outputs,
//! estimate the fee on the unsigned transaction, take it from the change
//! (or sole) output, then sign every input with the account key. A failed
//! build returns no transaction.

use tracing::{debug, info};

use dfi_defitx::{AddPoolLiquidity, DefiTxPayload, PoolSwap, TokenAmount};
use dfi_primitives::chainhash::Hash;
use dfi_primitives::ec::PrivateKey;
use dfi_primitives::PrimitivesError;
use dfi_script::{Address, AddressKind, Network, Script};
use dfi_transaction::{
    fee, signer, FeeRate, Transaction, TransactionError, TransactionInput, TransactionOutput,
};

use crate::node::{NodeClient, UnspentOutput};
use crate::selector::{self, Selection};
use crate::{BuildError, BuilderConfig};

/// A signing key and the address its outputs are paid to.
#[derive(Debug, Clone)]
pub struct Account {
    key: PrivateKey,
    address: Address,
}

impl Account {
    pub fn new(key: PrivateKey, kind: AddressKind, network: Network) -> Result<Self, BuildError> {
        let address = Address::from_public_key(&key.pub_key(), kind, network)?;
        Ok(Account { key, address })
    }

    /// Import a WIF key; its prefix must match `network`.
    pub fn from_wif(wif: &str, kind: AddressKind, network: Network) -> Result<Self, BuildError> {
        let (key, prefix) = PrivateKey::from_wif_with_prefix(wif)?;
        if prefix != network.wif_prefix() {
            return Err(PrimitivesError::InvalidWif(format!(
                "prefix 0x{:02x} does not belong to {}",
                prefix, network
            ))
            .into());
        }
        Self::new(key, kind, network)
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Builds signed transactions for one account.
pub struct RawTransactionBuilder<N> {
    account: Account,
    node: N,
    config: BuilderConfig,
}

impl<N: NodeClient> RawTransactionBuilder<N> {
    /// Fails with `InvalidConfig` when the account belongs to another
    /// network than `config`.
    pub fn new(account: Account, node: N, config: BuilderConfig) -> Result<Self, BuildError> {
        if account.address.network() != config.network {
            return Err(BuildError::InvalidConfig(format!(
                "account address {} is not on {}",
                account.address, config.network
            )));
        }
        Ok(RawTransactionBuilder { account, node, config })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    /// The configured rate, or the node's estimate when enabled and offered.
    pub fn fee_rate(&self) -> Result<FeeRate, BuildError> {
        if self.config.use_node_fee_rate {
            if let Some(rate) = self.node.estimate_fee_rate()? {
                debug!(%rate, "using node fee rate");
                return Ok(rate);
            }
        }
        Ok(self.config.fee_per_byte)
    }

    // -----------------------------------------------------------------
    // Payments
    // -----------------------------------------------------------------

    /// Pay `value` to `address_to`, returning the rest to `change_address`
    /// (the account address when `None`).
    ///
    /// Sending to the account or change address itself is a sweep and is
    /// delegated to [`sendall`](Self::sendall).
    ///
    /// Inputs are selected to cover `value` only. When they cover `value`
    /// but not `value + fee` the build fails with `InsufficientFunds`, even
    /// if the rest of the pool could pay the fee; pass explicit `inputs`
    /// to spend more.
    pub fn send(
        &self,
        value: u64,
        address_to: &str,
        change_address: Option<&str>,
        inputs: Option<&[UnspentOutput]>,
    ) -> Result<Transaction, BuildError> {
        let to = self.parse_address(address_to)?;
        let change = self.change_address(change_address)?;
        if to == self.account.address || to == change {
            debug!(address = %to, "send to own address, sweeping");
            return self.sendall(address_to, inputs);
        }

        let selection = self.select(value, inputs)?;
        let change_value = selection.total.checked_sub(value).ok_or(
            BuildError::InsufficientFunds { needed: value, available: selection.total },
        )?;

        let mut tx = self.transaction_from(&selection)?;
        tx.add_output(TransactionOutput::new(value, to.locking_script()?));
        tx.add_output(TransactionOutput::change(change_value, change.locking_script()?));

        let fee = fee::fee(&tx, self.fee_rate()?);
        let change_value = deduct_fee(&mut tx, fee, value, selection.total)?;

        debug!(value, fee, change = change_value, inputs = tx.input_count(), "built send");
        self.finish(tx)
    }

    /// Sweep every input to `address_to` in a single output.
    pub fn sendall(
        &self,
        address_to: &str,
        inputs: Option<&[UnspentOutput]>,
    ) -> Result<Transaction, BuildError> {
        let to = self.parse_address(address_to)?;
        let selection = self.select_all(inputs)?;

        let mut tx = self.transaction_from(&selection)?;
        tx.add_output(TransactionOutput::change(selection.total, to.locking_script()?));

        let fee = fee::fee(&tx, self.fee_rate()?);
        deduct_fee(&mut tx, fee, 0, selection.total)?;

        debug!(total = selection.total, fee, inputs = tx.input_count(), "built sendall");
        self.finish(tx)
    }

    // -----------------------------------------------------------------
    // DeFi transactions
    // -----------------------------------------------------------------

    /// Embed `payload` in a zero-value first output and return all input
    /// value, less the fee, to `change_address`.
    pub fn defi_tx(
        &self,
        payload: &DefiTxPayload,
        change_address: Option<&str>,
        inputs: Option<&[UnspentOutput]>,
    ) -> Result<Transaction, BuildError> {
        let change = self.change_address(change_address)?;
        let selection = self.select_all(inputs)?;

        let mut tx = self.transaction_from(&selection)?;
        tx.add_output(TransactionOutput::new(0, payload.to_script()?));
        tx.add_output(TransactionOutput::change(selection.total, change.locking_script()?));

        let fee = fee::fee(&tx, self.fee_rate()?);
        deduct_fee(&mut tx, fee, 0, selection.total)?;

        debug!(kind = %payload.tx_type(), fee, inputs = tx.input_count(), "built defi tx");
        self.finish(tx)
    }

    /// Swap `amount_from` of `token_from` held by the account into
    /// `token_to`, delivered to `address_to`.
    pub fn pool_swap(
        &self,
        token_from: u32,
        amount_from: i64,
        address_to: &str,
        token_to: u32,
        max_price: i64,
        inputs: Option<&[UnspentOutput]>,
    ) -> Result<Transaction, BuildError> {
        let swap = PoolSwap::builder(self.network())
            .address_from(self.account.address.as_str())
            .token_from(token_from)
            .amount_from(amount_from)
            .address_to(address_to)
            .token_to(token_to)
            .max_price(max_price)
            .build()?;
        self.defi_tx(&swap.into(), None, inputs)
    }

    /// Add the account's `amounts` to a pool, crediting shares to
    /// `share_address`.
    pub fn add_pool_liquidity(
        &self,
        amounts: &[TokenAmount],
        share_address: &str,
        inputs: Option<&[UnspentOutput]>,
    ) -> Result<Transaction, BuildError> {
        let liquidity = AddPoolLiquidity::builder(self.network())
            .entry(self.account.address.as_str(), amounts.iter().copied())
            .share_address(share_address)
            .build()?;
        self.defi_tx(&liquidity.into(), None, inputs)
    }

    // -----------------------------------------------------------------
    // Build and broadcast
    // -----------------------------------------------------------------

    /// [`send`](Self::send), then broadcast. Returns the txid.
    pub fn send_payment(
        &self,
        value: u64,
        address_to: &str,
        change_address: Option<&str>,
        inputs: Option<&[UnspentOutput]>,
    ) -> Result<String, BuildError> {
        let tx = self.send(value, address_to, change_address, inputs)?;
        self.broadcast(&tx)
    }

    /// [`defi_tx`](Self::defi_tx), then broadcast. Returns the txid.
    pub fn send_defi_tx(
        &self,
        payload: &DefiTxPayload,
        change_address: Option<&str>,
        inputs: Option<&[UnspentOutput]>,
    ) -> Result<String, BuildError> {
        let tx = self.defi_tx(payload, change_address, inputs)?;
        self.broadcast(&tx)
    }

    pub fn broadcast(&self, tx: &Transaction) -> Result<String, BuildError> {
        let txid = self.node.broadcast(&tx.to_hex())?;
        info!(%txid, size = tx.size(), "broadcast transaction");
        Ok(txid)
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    fn parse_address(&self, address: &str) -> Result<Address, BuildError> {
        Ok(Address::parse(address, self.network())?)
    }

    fn change_address(&self, change_address: Option<&str>) -> Result<Address, BuildError> {
        match change_address {
            Some(a) => self.parse_address(a),
            None => Ok(self.account.address.clone()),
        }
    }

    fn select(&self, target: u64, inputs: Option<&[UnspentOutput]>) -> Result<Selection, BuildError> {
        let selection = match inputs {
            Some(explicit) => selector::select(&[], target, Some(explicit))?,
            None => {
                let pool = self.node.list_unspent(self.account.address.as_str())?;
                selector::select(&pool, target, None)?
            }
        };
        if selection.is_empty() {
            return Err(BuildError::InsufficientFunds { needed: target, available: 0 });
        }
        Ok(selection)
    }

    fn select_all(&self, inputs: Option<&[UnspentOutput]>) -> Result<Selection, BuildError> {
        let selection = match inputs {
            Some(explicit) => selector::select(&[], 0, Some(explicit))?,
            None => selector::select_all(&self.node.list_unspent(self.account.address.as_str())?)?,
        };
        if selection.is_empty() {
            return Err(BuildError::InsufficientFunds { needed: 0, available: 0 });
        }
        Ok(selection)
    }

    /// An unsigned transaction spending `selection`, with no outputs yet.
    fn transaction_from(&self, selection: &Selection) -> Result<Transaction, BuildError> {
        let mut tx = Transaction::new();
        for utxo in &selection.utxos {
            let script = match &utxo.script_pub_key {
                Some(hex) => Script::from_hex(hex)?,
                None => Address::parse(&utxo.address, self.network())?.locking_script()?,
            };
            tx.add_input(TransactionInput::spending(
                Hash::from_hex(&utxo.txid)?,
                utxo.vout,
                TransactionOutput::new(utxo.amount, script),
            ));
        }
        Ok(tx)
    }

    fn finish(&self, mut tx: Transaction) -> Result<Transaction, BuildError> {
        signer::sign(&mut tx, std::slice::from_ref(&self.account.key))?;
        debug!(txid = %tx.tx_id_hex(), size = tx.size(), "signed transaction");
        Ok(tx)
    }
}

/// Take `fee` from the output flagged as change and return what is left
/// there. `committed` is the value already paid to other outputs; it is
/// reported together with the fee when the change cannot absorb it.
pub(crate) fn deduct_fee(
    tx: &mut Transaction,
    fee: u64,
    committed: u64,
    available: u64,
) -> Result<u64, BuildError> {
    let index = tx.change_output_index().ok_or_else(|| {
        TransactionError::InvalidTransaction("no change output to take the fee from".to_string())
    })?;
    let change = &mut tx.outputs[index];
    if fee > change.value {
        return Err(BuildError::InsufficientFunds {
            needed: committed.saturating_add(fee),
            available,
        });
    }
    change.value -= fee;
    Ok(change.value)
}
