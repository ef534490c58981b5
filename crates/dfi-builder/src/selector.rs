//! UTXO selection.
//!
//! Accumulates spendable outputs in node order until the target is
//! covered. No reordering, no change minimization.

use dfi_transaction::TransactionError;

use crate::node::UnspentOutput;
use crate::BuildError;

/// Outputs chosen to fund a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub utxos: Vec<UnspentOutput>,
    pub total: u64,
}

impl Selection {
    fn from_utxos(utxos: Vec<UnspentOutput>) -> Result<Self, BuildError> {
        let total = sum_amounts(&utxos)?;
        Ok(Selection { utxos, total })
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}

fn sum_amounts(utxos: &[UnspentOutput]) -> Result<u64, BuildError> {
    utxos.iter().try_fold(0u64, |acc, u| {
        acc.checked_add(u.amount).ok_or_else(|| {
            TransactionError::InvalidTransaction("unspent output amounts overflow".to_string())
                .into()
        })
    })
}

/// Choose outputs covering `target`.
///
/// An explicit list is used verbatim. Otherwise spendable outputs from
/// `pool` are taken in order until their sum reaches `target`; fails with
/// `InsufficientFunds` when the whole spendable pool falls short.
pub fn select(
    pool: &[UnspentOutput],
    target: u64,
    explicit: Option<&[UnspentOutput]>,
) -> Result<Selection, BuildError> {
    if let Some(explicit) = explicit {
        return Selection::from_utxos(explicit.to_vec());
    }

    let mut selection = Selection::default();
    for utxo in pool.iter().filter(|u| u.spendable) {
        if selection.total >= target && !selection.is_empty() {
            break;
        }
        selection.total = selection.total.saturating_add(utxo.amount);
        selection.utxos.push(utxo.clone());
    }

    if selection.total < target || selection.is_empty() {
        return Err(BuildError::InsufficientFunds {
            needed: target,
            available: selection.total,
        });
    }
    Ok(selection)
}

/// Every spendable output in `pool`.
pub fn select_all(pool: &[UnspentOutput]) -> Result<Selection, BuildError> {
    Selection::from_utxos(pool.iter().filter(|u| u.spendable).cloned().collect())
}
