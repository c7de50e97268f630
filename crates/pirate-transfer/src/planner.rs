//! Transfer planner
//!
//! Ties validation, note selection and assembly together over injected
//! wallet collaborators. One build runs synchronously to completion or fails
//! as a whole.

use crate::address::{AddressCodec, PirateAddressCodec};
use crate::assembler::TransferAssembler;
use crate::builder::TransactionBuilder;
use crate::config::PlannerConfig;
use crate::fees::FeeCalculator;
use crate::keys::KeyStore;
use crate::notes::NoteStore;
use crate::request::{Recipient, TransferPlan, TransferRequestValidator};
use crate::selection::{NoteSelector, SelectedInputSet};
use crate::Result;

/// Plans and builds shielded transfers for one wallet.
pub struct TransferPlanner<C, K, N> {
    config: PlannerConfig,
    fees: FeeCalculator,
    selector: NoteSelector,
    codec: C,
    keys: K,
    notes: N,
}

impl<K: KeyStore, N: NoteStore> TransferPlanner<PirateAddressCodec, K, N> {
    /// Planner using the Pirate address formats of the configured network
    pub fn for_network(config: PlannerConfig, keys: K, notes: N) -> Result<Self> {
        let codec = PirateAddressCodec::new(config.network);
        Self::new(config, codec, keys, notes)
    }
}

impl<C: AddressCodec, K: KeyStore, N: NoteStore> TransferPlanner<C, K, N> {
    /// Create a planner; fails if the configured fee is out of bounds
    pub fn new(config: PlannerConfig, codec: C, keys: K, notes: N) -> Result<Self> {
        let fees = config.fee_calculator()?;
        Ok(Self::with_fees(config, fees, codec, keys, notes))
    }

    /// Create a planner charging exactly `fees`
    pub fn with_fees(
        config: PlannerConfig,
        fees: FeeCalculator,
        codec: C,
        keys: K,
        notes: N,
    ) -> Self {
        tracing::debug!(
            "Transfer planner: network={}, fee={}, strategy={:?}",
            config.network,
            fees.fee(),
            config.selection_strategy
        );
        Self {
            selector: NoteSelector::new(config.selection_strategy),
            config,
            fees,
            codec,
            keys,
            notes,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Fixed fee charged per transfer
    pub fn fee(&self) -> u64 {
        self.fees.fee()
    }

    /// Validate a request into a plan
    pub fn plan(
        &self,
        origin: &str,
        recipients: Vec<Recipient>,
    ) -> Result<TransferPlan<K::SpendingKey>> {
        TransferRequestValidator::new(&self.codec, &self.keys, self.fees)
            .validate(origin, recipients)
    }

    /// Select notes for `plan`; `None` for transparent origins
    pub fn select(&self, plan: &TransferPlan<K::SpendingKey>) -> Result<Option<SelectedInputSet>> {
        match plan.origin().as_shielded() {
            Some(origin) => self
                .selector
                .select(&self.notes, origin, plan.target_amount())
                .map(Some),
            None => Ok(None),
        }
    }

    /// Select inputs and assemble `plan` with `builder`
    pub fn build<B>(
        &self,
        plan: &TransferPlan<K::SpendingKey>,
        builder: B,
    ) -> Result<B::Transaction>
    where
        B: TransactionBuilder<K::SpendingKey>,
    {
        let selection = self.select(plan)?;
        TransferAssembler::new(&self.codec, &self.keys, &self.notes).assemble(
            plan,
            selection.as_ref(),
            builder,
        )
    }

    /// Validate, select and assemble in one call
    pub fn transfer<B>(
        &self,
        origin: &str,
        recipients: Vec<Recipient>,
        builder: B,
    ) -> Result<B::Transaction>
    where
        B: TransactionBuilder<K::SpendingKey>,
    {
        let plan = self.plan(origin, recipients)?;
        self.build(&plan, builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        note_entry, shielded_address, transparent_address, BuilderCall, MemoryNoteStore,
        RecordingBuilder, TestKeyStore,
    };
    use crate::Error;
    use pirate_params::NetworkType;

    fn planner(
        values: &[u64],
    ) -> TransferPlanner<PirateAddressCodec, TestKeyStore, MemoryNoteStore> {
        let mut keys = TestKeyStore::new();
        keys.insert(shielded_address(1), 1);
        let mut notes = MemoryNoteStore::new();
        for (i, value) in values.iter().enumerate() {
            notes.add_note(shielded_address(1), note_entry(i as u8, *value));
        }
        TransferPlanner::for_network(PlannerConfig::default(), keys, notes).unwrap()
    }

    fn z(seed: u8) -> String {
        PirateAddressCodec::mainnet()
            .encode_shielded(&shielded_address(seed))
            .unwrap()
    }

    #[test]
    fn test_rejects_bad_fee() {
        let config = PlannerConfig {
            fee: 0,
            ..PlannerConfig::default()
        };
        let result =
            TransferPlanner::for_network(config, TestKeyStore::new(), MemoryNoteStore::new());
        assert!(matches!(result, Err(Error::FeeTooLow(_))));
    }

    #[test]
    fn test_transfer_with_default_fee() {
        let planner = planner(&[30_000, 50_000]);
        assert_eq!(planner.fee(), 10_000);

        let mut builder = RecordingBuilder::new();
        let tx = planner
            .transfer(&z(1), vec![Recipient::new(z(2), 25_000)], &mut builder)
            .unwrap();

        // 35,000 target is covered by the 50,000 note alone.
        assert_eq!(builder.spend_count(), 1);
        assert!(matches!(
            tx.last(),
            Some(BuilderCall::ShieldedOutput { value: 25_000, .. })
        ));
    }

    #[test]
    fn test_select_skipped_for_transparent_origin() {
        let planner = planner(&[]);
        let t = PirateAddressCodec::mainnet().encode_transparent(&transparent_address(3));
        let plan = planner.plan(&t, vec![Recipient::new(z(2), 1)]).unwrap();
        assert_eq!(planner.select(&plan).unwrap(), None);
    }

    #[test]
    fn test_insufficient_funds_before_assembly() {
        let planner = planner(&[5_000]);
        let mut builder = RecordingBuilder::new();
        let err = planner
            .transfer(&z(1), vec![Recipient::new(z(2), 1_000)], &mut builder)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientFunds {
                required: 11_000,
                available: 5_000
            }
        ));
        assert!(builder.calls().is_empty());
    }

    #[test]
    fn test_storage_error_propagates() {
        let mut keys = TestKeyStore::new();
        keys.insert(shielded_address(1), 1);
        let mut notes = MemoryNoteStore::new();
        notes.set_unavailable(true);
        let planner = TransferPlanner::for_network(
            PlannerConfig::for_network(NetworkType::Mainnet),
            keys,
            notes,
        )
        .unwrap();

        let err = planner
            .transfer(&z(1), vec![Recipient::new(z(2), 1)], &mut RecordingBuilder::new())
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
