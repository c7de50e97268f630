//! Downstream transaction builder interface
//!
//! The planner decides *what* goes into a transaction; proving, signing and
//! serialization belong to a [`TransactionBuilder`] supplied by the caller.

use crate::address::{ShieldedAddress, TransparentAddress};
use crate::keys::OutgoingViewingKey;
use crate::notes::{Anchor, Note, Voucher};
use std::fmt;

/// Assembly progress, used to report where a build stopped.
///
/// Stages only move forward: `Validated → InputsSelected? → SpendsAttached?
/// → OutputsAttached → Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssemblyStage {
    /// Plan validated, nothing handed to the builder yet
    Validated,
    /// Transparent input set or notes selected
    InputsSelected,
    /// All note spends attached
    SpendsAttached,
    /// All outputs attached
    OutputsAttached,
    /// Builder returned the finished transaction
    Finalized,
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyStage::Validated => write!(f, "validated"),
            AssemblyStage::InputsSelected => write!(f, "inputs selected"),
            AssemblyStage::SpendsAttached => write!(f, "spends attached"),
            AssemblyStage::OutputsAttached => write!(f, "outputs attached"),
            AssemblyStage::Finalized => write!(f, "finalized"),
        }
    }
}

/// Transaction builder owning the cryptography.
///
/// `K` is the wallet's spending key handle. Errors are opaque to the planner
/// and surface unchanged inside [`Error::AssemblyFailed`](crate::Error::AssemblyFailed).
pub trait TransactionBuilder<K> {
    /// Finished transaction
    type Transaction;
    /// Builder failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// Spend from a transparent address (shielding transfer)
    fn set_transparent_input(
        &mut self,
        address: &TransparentAddress,
        value: u64,
    ) -> Result<(), Self::Error>;

    /// Spend a shielded note
    fn add_spend(
        &mut self,
        spending_key: &K,
        note: &Note,
        anchor: &Anchor,
        voucher: &Voucher,
    ) -> Result<(), Self::Error>;

    /// Pay a transparent address
    fn set_transparent_output(
        &mut self,
        address: &TransparentAddress,
        value: u64,
    ) -> Result<(), Self::Error>;

    /// Pay a shielded address, encrypting outgoing metadata to `ovk`
    fn add_shielded_output(
        &mut self,
        ovk: &OutgoingViewingKey,
        address: &ShieldedAddress,
        value: u64,
        memo: &[u8],
    ) -> Result<(), Self::Error>;

    /// Prove, sign and serialize
    fn finalize(self) -> Result<Self::Transaction, Self::Error>;
}
