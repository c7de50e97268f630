//! Error types for the transfer planner
//!
//! Every failure is terminal for the build that raised it. Validation errors
//! carry the offending address so the caller can point the user at it.

use crate::builder::AssemblyStage;
use crate::notes::OutPoint;
use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed collaborator error carried by [`Error::AssemblyFailed`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Transfer planner errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Address decodes as neither transparent nor shielded
    #[error("Unknown address format: {address}")]
    UnknownAddressFormat {
        /// The rejected address string
        address: String,
    },

    /// Shielded origin without a spending key in this wallet
    #[error("From address does not belong to this wallet, spending key not found: {address}")]
    OriginNotOwned {
        /// The origin address
        address: String,
    },

    /// Empty recipient list
    #[error("No recipients")]
    NoRecipients,

    /// Same address listed more than once
    #[error("Duplicate recipient address: {address}")]
    DuplicateRecipient {
        /// The repeated address
        address: String,
    },

    /// A recipient carried a memo
    #[error("Memo not supported for recipient {address}")]
    MemoNotSupported {
        /// Recipient that carried the memo
        address: String,
    },

    /// A recipient value below zero
    #[error("Invalid amount {value} for recipient {address}, amount must be non-negative")]
    NegativeAmount {
        /// Recipient address
        address: String,
        /// The rejected value
        value: i64,
    },

    /// Transparent and shielded recipients in one request
    #[error(
        "Transferring to two kinds of addresses at the same time is not supported \
         ({transparent} transparent, {shielded} shielded)"
    )]
    MixedOutputKinds {
        /// Number of transparent recipients
        transparent: usize,
        /// Number of shielded recipients
        shielded: usize,
    },

    /// Transparent origin paying transparent recipients
    #[error("Transparent to transparent transfer is not supported")]
    TransparentToTransparentUnsupported,

    /// Available notes cannot cover the target amount
    #[error("Insufficient funds: required {required} arrrtoshis, have {available} arrrtoshis")]
    InsufficientFunds {
        /// Outputs plus fee
        required: u64,
        /// Total of all unspent notes for the origin
        available: u64,
    },

    /// Selected note has no witness in the commitment tree
    #[error("Missing voucher for shielded note {outpoint}")]
    MissingVoucher {
        /// Outpoint of the note without a voucher
        outpoint: OutPoint,
    },

    /// Downstream builder failure, passed through unchanged
    #[error("Transaction assembly failed after stage '{stage}': {source}")]
    AssemblyFailed {
        /// Last stage completed before the builder failed
        stage: AssemblyStage,
        /// Builder error
        #[source]
        source: BoxError,
    },

    /// Plan and selection disagree (e.g. shielded origin without inputs)
    #[error("Inconsistent transfer plan: {0}")]
    InconsistentPlan(String),

    /// Amount overflow
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    /// Fee too low
    #[error("Fee too low: {0}")]
    FeeTooLow(String),

    /// Fee too high
    #[error("Fee too high: {0}")]
    FeeTooHigh(String),

    /// Invalid planner configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Note store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a builder error raised during `stage`.
    pub fn assembly_failed<E>(stage: AssemblyStage, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::AssemblyFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownAddressFormat { .. }
                | Error::OriginNotOwned { .. }
                | Error::NoRecipients
                | Error::DuplicateRecipient { .. }
                | Error::MemoNotSupported { .. }
                | Error::NegativeAmount { .. }
                | Error::MixedOutputKinds { .. }
                | Error::TransparentToTransparentUnsupported
                | Error::InsufficientFunds { .. }
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::UnknownAddressFormat { address } => {
                format!("The address {} is invalid. Please check and try again.", address)
            }
            Error::OriginNotOwned { .. } => {
                "You can only send from a shielded address held in this wallet.".to_string()
            }
            Error::NoRecipients => "Add at least one recipient.".to_string(),
            Error::DuplicateRecipient { address } => {
                format!("The address {} is listed more than once.", address)
            }
            Error::MemoNotSupported { .. } => {
                "Memos are not supported for this kind of transfer.".to_string()
            }
            Error::NegativeAmount { .. } => {
                "The amount is invalid. Please enter a valid amount.".to_string()
            }
            Error::MixedOutputKinds { .. } => {
                "Send to either transparent or shielded addresses, not both at once.".to_string()
            }
            Error::TransparentToTransparentUnsupported => {
                "Transfers between two transparent addresses are not supported.".to_string()
            }
            Error::InsufficientFunds { .. } => {
                "You don't have enough funds for this transaction. Please check your balance and try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownAddressFormat { .. } | Error::OriginNotOwned { .. } => {
                ErrorCategory::Address
            }
            Error::NoRecipients
            | Error::DuplicateRecipient { .. }
            | Error::MemoNotSupported { .. }
            | Error::MixedOutputKinds { .. }
            | Error::TransparentToTransparentUnsupported => ErrorCategory::Recipient,
            Error::NegativeAmount { .. }
            | Error::InsufficientFunds { .. }
            | Error::AmountOverflow(_) => ErrorCategory::Amount,
            Error::FeeTooLow(_) | Error::FeeTooHigh(_) => ErrorCategory::Fee,
            Error::MissingVoucher { .. } | Error::Storage(_) => ErrorCategory::Notes,
            Error::AssemblyFailed { .. } => ErrorCategory::Transaction,
            Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::InconsistentPlan(_) | Error::Io(_) | Error::Serialization(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Address-related errors
    Address,
    /// Recipient list shape errors
    Recipient,
    /// Amount-related errors
    Amount,
    /// Fee-related errors
    Fee,
    /// Note and witness errors
    Notes,
    /// Transaction builder errors
    Transaction,
    /// Configuration errors
    Config,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Address => write!(f, "Address"),
            ErrorCategory::Recipient => write!(f, "Recipient"),
            ErrorCategory::Amount => write!(f, "Amount"),
            ErrorCategory::Fee => write!(f, "Fee"),
            ErrorCategory::Notes => write!(f, "Notes"),
            ErrorCategory::Transaction => write!(f, "Transaction"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}
