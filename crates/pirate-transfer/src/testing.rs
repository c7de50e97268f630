//! In-memory collaborators for tests
//!
//! Deterministic stand-ins for the wallet key store, the note store and the
//! transaction builder. Only compiled for tests or with the `test-helpers`
//! feature.

use crate::address::{ShieldedAddress, TransparentAddress};
use crate::builder::TransactionBuilder;
use crate::keys::{KeyStore, OutgoingViewingKey, SpendingKeyHandle};
use crate::notes::{Anchor, Note, NoteEntry, NoteStore, NoteValue, Nullifier, OutPoint, Voucher};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

/// OVK returned by [`TestKeyStore::shielding_ovk`]
pub const TEST_SHIELDING_OVK: OutgoingViewingKey = OutgoingViewingKey([0xEE; 32]);

/// Anchor returned by [`MemoryNoteStore`] unless overridden
pub const TEST_ANCHOR: Anchor = Anchor([0xAA; 32]);

/// Deterministic shielded address
pub fn shielded_address(seed: u8) -> ShieldedAddress {
    ShieldedAddress::new([seed; 11], [seed; 32])
}

/// Deterministic P2PKH address
pub fn transparent_address(seed: u8) -> TransparentAddress {
    TransparentAddress::public_key_hash([seed; 20])
}

/// Note entry with a txid derived from `seed`
pub fn note_entry(seed: u8, value: NoteValue) -> NoteEntry {
    let mut txid = [0u8; 32];
    txid[0] = seed;
    NoteEntry::new(
        OutPoint::new(txid, u32::from(seed)),
        Note::new(value, shielded_address(seed), [seed; 32], Nullifier([seed; 32])),
    )
}

/// Spending key stand-in identified by a small integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TestSpendingKey {
    id: u8,
}

impl TestSpendingKey {
    /// Key with the given id
    pub fn new(id: u8) -> Self {
        Self { id }
    }

    /// Key id
    pub fn id(&self) -> u8 {
        self.id
    }
}

impl SpendingKeyHandle for TestSpendingKey {
    fn outgoing_viewing_key(&self) -> OutgoingViewingKey {
        OutgoingViewingKey([self.id; 32])
    }
}

/// Key store over a fixed address → key id map
#[derive(Debug, Default, Clone)]
pub struct TestKeyStore {
    keys: HashMap<ShieldedAddress, TestSpendingKey>,
}

impl TestKeyStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the wallet the key `id` for `address`
    pub fn insert(&mut self, address: ShieldedAddress, id: u8) {
        self.keys.insert(address, TestSpendingKey::new(id));
    }
}

impl KeyStore for TestKeyStore {
    type SpendingKey = TestSpendingKey;

    fn spending_key_for(&self, address: &ShieldedAddress) -> Option<TestSpendingKey> {
        self.keys.get(address).copied()
    }

    fn shielding_ovk(&self) -> OutgoingViewingKey {
        TEST_SHIELDING_OVK
    }
}

/// Note store kept in memory.
///
/// Every note gets a voucher on insertion; [`drop_voucher`](Self::drop_voucher)
/// simulates a witness the store cannot produce.
#[derive(Debug, Clone)]
pub struct MemoryNoteStore {
    notes: HashMap<ShieldedAddress, Vec<NoteEntry>>,
    vouchers: HashMap<OutPoint, Voucher>,
    anchor: Anchor,
    unavailable: bool,
}

impl Default for MemoryNoteStore {
    fn default() -> Self {
        Self {
            notes: HashMap::new(),
            vouchers: HashMap::new(),
            anchor: TEST_ANCHOR,
            unavailable: false,
        }
    }
}

impl MemoryNoteStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unspent note for `owner`, with a voucher
    pub fn add_note(&mut self, owner: ShieldedAddress, entry: NoteEntry) {
        let voucher = Voucher(entry.outpoint.txid.to_vec());
        self.vouchers.insert(entry.outpoint, voucher);
        self.notes.entry(owner).or_default().push(entry);
    }

    /// Forget the voucher of `outpoint`
    pub fn drop_voucher(&mut self, outpoint: &OutPoint) {
        self.vouchers.remove(outpoint);
    }

    /// Override the anchor
    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
    }

    /// Make every call fail with [`Error::Storage`]
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::Storage("note store unavailable".to_string()));
        }
        Ok(())
    }
}

impl NoteStore for MemoryNoteStore {
    fn unspent_notes_for(&self, address: &ShieldedAddress) -> Result<Vec<NoteEntry>> {
        self.check_available()?;
        Ok(self.notes.get(address).cloned().unwrap_or_default())
    }

    fn vouchers_and_anchor_for(
        &self,
        outpoints: &[OutPoint],
    ) -> Result<(Anchor, Vec<Option<Voucher>>)> {
        self.check_available()?;
        let vouchers = outpoints
            .iter()
            .map(|op| self.vouchers.get(op).cloned())
            .collect();
        Ok((self.anchor, vouchers))
    }
}

/// One call received by [`RecordingBuilder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderCall {
    /// `set_transparent_input`
    TransparentInput {
        /// Input address
        address: TransparentAddress,
        /// Input value
        value: u64,
    },
    /// `add_spend`
    Spend {
        /// Id of the spending key used
        key_id: u8,
        /// Note value
        value: u64,
        /// Anchor
        anchor: Anchor,
        /// Witness
        voucher: Voucher,
    },
    /// `set_transparent_output`
    TransparentOutput {
        /// Output address
        address: TransparentAddress,
        /// Output value
        value: u64,
    },
    /// `add_shielded_output`
    ShieldedOutput {
        /// OVK
        ovk: OutgoingViewingKey,
        /// Output address
        address: ShieldedAddress,
        /// Output value
        value: u64,
        /// Memo bytes
        memo: Vec<u8>,
    },
}

/// Builder operation, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderOp {
    /// `set_transparent_input`
    TransparentInput,
    /// `add_spend`
    Spend,
    /// `set_transparent_output`
    TransparentOutput,
    /// `add_shielded_output`
    ShieldedOutput,
    /// `finalize`
    Finalize,
}

/// Failure raised by [`RecordingBuilder`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("builder rejected {0:?}")]
pub struct BuilderError(pub BuilderOp);

/// Transaction builder that records calls instead of proving.
///
/// Implemented for `&mut RecordingBuilder` so the calls stay inspectable
/// after a failed build.
#[derive(Debug, Default, Clone)]
pub struct RecordingBuilder {
    calls: Vec<BuilderCall>,
    fail_on: HashSet<BuilderOp>,
    finalized: bool,
}

impl RecordingBuilder {
    /// Builder that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that fails on `op`
    pub fn failing_on(op: BuilderOp) -> Self {
        let mut builder = Self::default();
        builder.fail_on.insert(op);
        builder
    }

    /// Calls received so far
    pub fn calls(&self) -> &[BuilderCall] {
        &self.calls
    }

    /// Number of spends received
    pub fn spend_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BuilderCall::Spend { .. }))
            .count()
    }

    /// True once `finalize` succeeded
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn record(
        &mut self,
        op: BuilderOp,
        call: BuilderCall,
    ) -> std::result::Result<(), BuilderError> {
        if self.fail_on.contains(&op) {
            return Err(BuilderError(op));
        }
        self.calls.push(call);
        Ok(())
    }
}

impl TransactionBuilder<TestSpendingKey> for &mut RecordingBuilder {
    type Transaction = Vec<BuilderCall>;
    type Error = BuilderError;

    fn set_transparent_input(
        &mut self,
        address: &TransparentAddress,
        value: u64,
    ) -> std::result::Result<(), BuilderError> {
        self.record(
            BuilderOp::TransparentInput,
            BuilderCall::TransparentInput {
                address: *address,
                value,
            },
        )
    }

    fn add_spend(
        &mut self,
        spending_key: &TestSpendingKey,
        note: &Note,
        anchor: &Anchor,
        voucher: &Voucher,
    ) -> std::result::Result<(), BuilderError> {
        self.record(
            BuilderOp::Spend,
            BuilderCall::Spend {
                key_id: spending_key.id(),
                value: note.value,
                anchor: *anchor,
                voucher: voucher.clone(),
            },
        )
    }

    fn set_transparent_output(
        &mut self,
        address: &TransparentAddress,
        value: u64,
    ) -> std::result::Result<(), BuilderError> {
        self.record(
            BuilderOp::TransparentOutput,
            BuilderCall::TransparentOutput {
                address: *address,
                value,
            },
        )
    }

    fn add_shielded_output(
        &mut self,
        ovk: &OutgoingViewingKey,
        address: &ShieldedAddress,
        value: u64,
        memo: &[u8],
    ) -> std::result::Result<(), BuilderError> {
        self.record(
            BuilderOp::ShieldedOutput,
            BuilderCall::ShieldedOutput {
                ovk: *ovk,
                address: *address,
                value,
                memo: memo.to_vec(),
            },
        )
    }

    fn finalize(self) -> std::result::Result<Vec<BuilderCall>, BuilderError> {
        if self.fail_on.contains(&BuilderOp::Finalize) {
            return Err(BuilderError(BuilderOp::Finalize));
        }
        self.finalized = true;
        Ok(self.calls.clone())
    }
}
