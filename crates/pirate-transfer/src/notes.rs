//! Note management
//!
//! Notes, outpoints and witnesses as seen by the planner. The authoritative
//! note set and the commitment tree live behind [`NoteStore`].

use crate::address::ShieldedAddress;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Note value (arrrtoshis)
pub type NoteValue = u64;

/// Position of a note: the transaction that created it and the output index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction ID
    pub txid: [u8; 32],
    /// Output index within the transaction
    pub index: u32,
}

impl OutPoint {
    /// Create new outpoint
    pub fn new(txid: [u8; 32], index: u32) -> Self {
        Self { txid, index }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.txid), self.index)
    }
}

/// Nullifier (spent note identifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nullifier(pub [u8; 32]);

/// Sapling note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Value in arrrtoshis
    pub value: NoteValue,
    /// Address the note was sent to
    pub recipient: ShieldedAddress,
    /// Note commitment randomness
    pub rcm: [u8; 32],
    /// Nullifier
    pub nullifier: Nullifier,
}

impl Note {
    /// Create new note
    pub fn new(
        value: NoteValue,
        recipient: ShieldedAddress,
        rcm: [u8; 32],
        nullifier: Nullifier,
    ) -> Self {
        Self {
            value,
            recipient,
            rcm,
            nullifier,
        }
    }
}

/// One spendable note owned by the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    /// Where the note sits on chain
    pub outpoint: OutPoint,
    /// The note itself
    pub note: Note,
}

impl NoteEntry {
    /// Create new entry
    pub fn new(outpoint: OutPoint, note: Note) -> Self {
        Self { outpoint, note }
    }

    /// Note value
    pub fn value(&self) -> NoteValue {
        self.note.value
    }
}

/// Commitment tree root the spends are proven against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor(pub [u8; 32]);

/// Serialized incremental witness of a note in the commitment tree
#[derive(Clone, PartialEq, Eq)]
pub struct Voucher(pub Vec<u8>);

impl fmt::Debug for Voucher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Voucher({} bytes)", self.0.len())
    }
}

/// Wallet note store.
///
/// A store must answer one `unspent_notes_for` call and the following
/// `vouchers_and_anchor_for` call from the same unspent-state snapshot.
pub trait NoteStore {
    /// Unspent notes controlled by `address`, in the store's enumeration order
    fn unspent_notes_for(&self, address: &ShieldedAddress) -> Result<Vec<NoteEntry>>;

    /// Common anchor and one optional voucher per outpoint, in input order
    fn vouchers_and_anchor_for(
        &self,
        outpoints: &[OutPoint],
    ) -> Result<(Anchor, Vec<Option<Voucher>>)>;
}

impl<N: NoteStore + ?Sized> NoteStore for &N {
    fn unspent_notes_for(&self, address: &ShieldedAddress) -> Result<Vec<NoteEntry>> {
        (**self).unspent_notes_for(address)
    }

    fn vouchers_and_anchor_for(
        &self,
        outpoints: &[OutPoint],
    ) -> Result<(Anchor, Vec<Option<Voucher>>)> {
        (**self).vouchers_and_anchor_for(outpoints)
    }
}
