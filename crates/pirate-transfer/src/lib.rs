//! Pirate Chain shielded transfer planner
//!
//! Validates a transfer request (origin plus recipients), selects the
//! shielded notes that fund it and drives a caller-supplied transaction
//! builder through spends, outputs and finalization. Keys, notes and the
//! cryptography stay behind injected traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod assembler;
pub mod builder;
pub mod config;
pub mod error;
pub mod fees;
pub mod keys;
pub mod notes;
pub mod planner;
pub mod request;
pub mod selection;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use address::{
    AddressClassifier, AddressCodec, ClassifiedAddress, PirateAddressCodec, ShieldedAddress,
    TransparentAddress, TransparentKind,
};
pub use assembler::TransferAssembler;
pub use builder::{AssemblyStage, TransactionBuilder};
pub use config::PlannerConfig;
pub use error::{BoxError, Error, ErrorCategory, Result};
pub use fees::{FeeCalculator, DEFAULT_FEE, MAX_FEE, MIN_FEE};
pub use keys::{
    ovk_for_shielding_from_taddr, KeyStore, OutgoingViewingKey, SeedKeyStore, SpendingKeyHandle,
};
pub use notes::{Anchor, Note, NoteEntry, NoteStore, NoteValue, Nullifier, OutPoint, Voucher};
pub use pirate_params::NetworkType;
pub use planner::TransferPlanner;
pub use request::{Recipient, TransferPlan, TransferRequestValidator};
pub use selection::{NoteSelector, SelectedInputSet, SelectionStrategy};
