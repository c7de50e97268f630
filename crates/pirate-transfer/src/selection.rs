//! Note selection for shielded transfers
//!
//! Picks the notes that fund a transfer from a shielded origin. The default
//! strategy spends the largest notes first so a transfer needs as few spends
//! (and proofs) as possible.

use crate::address::ShieldedAddress;
use crate::notes::{Note, NoteEntry, NoteStore, NoteValue, OutPoint};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Note selection strategy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Select largest notes first (minimize inputs)
    #[default]
    #[serde(rename = "largest_first")]
    LargestFirst,
    /// Select smallest notes first (consolidate dust)
    #[serde(rename = "smallest_first")]
    SmallestFirst,
    /// Select notes in the store's enumeration order
    #[serde(rename = "first_fit")]
    FirstFit,
}

/// Notes chosen to fund one transfer.
///
/// `outpoints` and `notes` are parallel; `sum` is at least the target the
/// set was selected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedInputSet {
    outpoints: Vec<OutPoint>,
    notes: Vec<Note>,
    sum: NoteValue,
    target: NoteValue,
}

impl SelectedInputSet {
    /// Outpoints of the selected notes, in spend order
    pub fn outpoints(&self) -> &[OutPoint] {
        &self.outpoints
    }

    /// Selected notes, parallel to [`outpoints`](Self::outpoints)
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Total value of the selected notes
    pub fn sum(&self) -> NoteValue {
        self.sum
    }

    /// Target the selection covers
    pub fn target(&self) -> NoteValue {
        self.target
    }

    /// Value selected beyond the target
    pub fn excess(&self) -> NoteValue {
        self.sum - self.target
    }

    /// Number of selected notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// True if nothing was selected (only possible for a zero target)
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Iterate `(outpoint, note)` pairs in spend order
    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &Note)> {
        self.outpoints.iter().zip(self.notes.iter())
    }
}

/// Note selector
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteSelector {
    strategy: SelectionStrategy,
}

impl NoteSelector {
    /// Create selector with strategy
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self { strategy }
    }

    /// Strategy in use
    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Select notes of `origin` from `store` covering `target_amount`.
    pub fn select<N: NoteStore>(
        &self,
        store: &N,
        origin: &ShieldedAddress,
        target_amount: NoteValue,
    ) -> Result<SelectedInputSet> {
        let entries = store.unspent_notes_for(origin)?;
        if entries.is_empty() {
            return Err(Error::InsufficientFunds {
                required: target_amount,
                available: 0,
            });
        }
        self.select_from(entries, target_amount)
    }

    /// Select from an already fetched set of notes.
    ///
    /// Either returns a set whose sum covers `target_amount` or fails with
    /// [`Error::InsufficientFunds`]; never a partial set.
    pub fn select_from(
        &self,
        mut available_notes: Vec<NoteEntry>,
        target_amount: NoteValue,
    ) -> Result<SelectedInputSet> {
        tracing::debug!(
            "Selecting notes: strategy={:?}, available={}, target={}",
            self.strategy,
            available_notes.len(),
            target_amount
        );

        let available = Self::total_available(&available_notes)?;
        if available < target_amount {
            return Err(Error::InsufficientFunds {
                required: target_amount,
                available,
            });
        }

        self.sort_notes(&mut available_notes);

        let mut outpoints = Vec::new();
        let mut notes = Vec::new();
        let mut sum: NoteValue = 0;

        for entry in available_notes {
            if sum >= target_amount {
                break;
            }
            // Cannot overflow: bounded by `available`.
            sum += entry.note.value;
            outpoints.push(entry.outpoint);
            notes.push(entry.note);
        }

        tracing::info!(
            "Selected {} notes, total={}, excess={}",
            notes.len(),
            sum,
            sum - target_amount
        );

        Ok(SelectedInputSet {
            outpoints,
            notes,
            sum,
            target: target_amount,
        })
    }

    fn sort_notes(&self, notes: &mut [NoteEntry]) {
        // Stable sorts: equal values keep store order.
        match self.strategy {
            SelectionStrategy::LargestFirst => {
                notes.sort_by(|a, b| b.note.value.cmp(&a.note.value));
            }
            SelectionStrategy::SmallestFirst => {
                notes.sort_by(|a, b| a.note.value.cmp(&b.note.value));
            }
            SelectionStrategy::FirstFit => {}
        }
    }

    /// Check if notes are sufficient without selecting
    pub fn check_sufficient(available_notes: &[NoteEntry], required_amount: NoteValue) -> bool {
        Self::total_available(available_notes).map_or(true, |total| total >= required_amount)
    }

    /// Get total available value
    pub fn total_available(available_notes: &[NoteEntry]) -> Result<NoteValue> {
        available_notes.iter().try_fold(0u64, |acc, entry| {
            acc.checked_add(entry.note.value)
                .ok_or_else(|| Error::AmountOverflow("Note values overflow".to_string()))
        })
    }
}
