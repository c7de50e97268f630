//! Transfer assembly
//!
//! Feeds a validated [`TransferPlan`] and its selected notes into a
//! [`TransactionBuilder`]. Every selected note must have a voucher before the
//! first spend is attached, so a failed assembly never leaves a partial spend
//! list behind.

use crate::address::{AddressCodec, ClassifiedAddress};
use crate::builder::{AssemblyStage, TransactionBuilder};
use crate::keys::{KeyStore, OutgoingViewingKey, SpendingKeyHandle};
use crate::notes::{NoteStore, Voucher};
use crate::request::{Recipient, TransferPlan};
use crate::selection::SelectedInputSet;
use crate::{Error, Result};

/// Assembles transactions from validated plans.
pub struct TransferAssembler<'a, C, K, N> {
    codec: &'a C,
    keys: &'a K,
    notes: &'a N,
}

impl<'a, C, K, N> TransferAssembler<'a, C, K, N>
where
    C: AddressCodec,
    K: KeyStore,
    N: NoteStore,
{
    /// Create an assembler over the wallet collaborators
    pub fn new(codec: &'a C, keys: &'a K, notes: &'a N) -> Self {
        Self { codec, keys, notes }
    }

    /// Hand `plan` to `builder` and finalize.
    ///
    /// `selection` must be present for shielded origins and absent for
    /// transparent ones.
    pub fn assemble<B>(
        &self,
        plan: &TransferPlan<K::SpendingKey>,
        selection: Option<&SelectedInputSet>,
        mut builder: B,
    ) -> Result<B::Transaction>
    where
        B: TransactionBuilder<K::SpendingKey>,
    {
        let mut stage = AssemblyStage::Validated;
        let ovk = self.outgoing_viewing_key(plan)?;

        match (plan.origin(), selection) {
            (ClassifiedAddress::Transparent(address), None) => {
                builder
                    .set_transparent_input(address, plan.target_amount())
                    .map_err(|e| Error::assembly_failed(stage, e))?;
                stage = AssemblyStage::InputsSelected;
                tracing::debug!("Attached transparent input for shielding transfer");
            }
            (
                ClassifiedAddress::Shielded {
                    spending_key: Some(spending_key),
                    ..
                },
                Some(selection),
            ) => {
                if selection.sum() < plan.target_amount() {
                    return Err(Error::InconsistentPlan(format!(
                        "selection covers {} of {}",
                        selection.sum(),
                        plan.target_amount()
                    )));
                }
                stage = AssemblyStage::InputsSelected;

                let (anchor, vouchers) = self.notes.vouchers_and_anchor_for(selection.outpoints())?;
                let vouchers = Self::require_vouchers(selection, vouchers)?;

                for ((_, note), voucher) in selection.iter().zip(vouchers) {
                    builder
                        .add_spend(spending_key, note, &anchor, &voucher)
                        .map_err(|e| Error::assembly_failed(stage, e))?;
                }
                stage = AssemblyStage::SpendsAttached;
                tracing::debug!("Attached {} spends", selection.len());
            }
            (ClassifiedAddress::Transparent(_), Some(_)) => {
                return Err(Error::InconsistentPlan(
                    "note selection supplied for a transparent origin".to_string(),
                ));
            }
            (ClassifiedAddress::Shielded { .. }, _) => {
                return Err(Error::InconsistentPlan(
                    "shielded origin without note selection".to_string(),
                ));
            }
        }

        for recipient in plan.transparent_outputs() {
            let address = self.codec.decode_transparent(&recipient.address).ok_or_else(|| {
                Error::InconsistentPlan(format!("undecodable output {}", recipient.address))
            })?;
            builder
                .set_transparent_output(&address, output_value(recipient)?)
                .map_err(|e| Error::assembly_failed(stage, e))?;
        }

        for recipient in plan.shielded_outputs() {
            let address = self.codec.decode_shielded(&recipient.address).ok_or_else(|| {
                Error::InconsistentPlan(format!("undecodable output {}", recipient.address))
            })?;
            let memo = memo_bytes(recipient)?;
            builder
                .add_shielded_output(&ovk, &address, output_value(recipient)?, &memo)
                .map_err(|e| Error::assembly_failed(stage, e))?;
        }
        stage = AssemblyStage::OutputsAttached;
        tracing::debug!("Attached {} outputs", plan.output_count());

        let transaction = builder
            .finalize()
            .map_err(|e| Error::assembly_failed(stage, e))?;

        tracing::info!(
            "Assembled transfer: {} outputs, amount={}, fee={}",
            plan.output_count(),
            plan.output_amount(),
            plan.fee()
        );
        Ok(transaction)
    }

    /// OVK for the outputs: the shielding OVK for transparent origins, the
    /// origin's own OVK otherwise.
    fn outgoing_viewing_key(
        &self,
        plan: &TransferPlan<K::SpendingKey>,
    ) -> Result<OutgoingViewingKey> {
        match plan.origin() {
            ClassifiedAddress::Transparent(_) => Ok(self.keys.shielding_ovk()),
            ClassifiedAddress::Shielded {
                spending_key: Some(spending_key),
                ..
            } => Ok(spending_key.outgoing_viewing_key()),
            ClassifiedAddress::Shielded { spending_key: None, .. } => Err(
                Error::InconsistentPlan("shielded origin without spending key".to_string()),
            ),
        }
    }

    /// All vouchers or the first missing one.
    fn require_vouchers(
        selection: &SelectedInputSet,
        vouchers: Vec<Option<Voucher>>,
    ) -> Result<Vec<Voucher>> {
        if vouchers.len() != selection.len() {
            return Err(Error::InconsistentPlan(format!(
                "note store returned {} vouchers for {} notes",
                vouchers.len(),
                selection.len()
            )));
        }

        selection
            .outpoints()
            .iter()
            .zip(vouchers)
            .map(|(outpoint, voucher)| {
                voucher.ok_or(Error::MissingVoucher {
                    outpoint: *outpoint,
                })
            })
            .collect()
    }
}

fn output_value(recipient: &Recipient) -> Result<u64> {
    recipient.amount().ok_or_else(|| {
        Error::InconsistentPlan(format!("negative output for {}", recipient.address))
    })
}

fn memo_bytes(recipient: &Recipient) -> Result<Vec<u8>> {
    hex::decode(recipient.memo.as_deref().unwrap_or_default())
        .map_err(|e| Error::InconsistentPlan(format!("memo for {}: {}", recipient.address, e)))
}
