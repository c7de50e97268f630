//! Transfer requests and their validation
//!
//! [`TransferRequestValidator::validate`] turns an origin address and a list
//! of recipients into an immutable [`TransferPlan`], or rejects the request
//! with the first rule it breaks. Rules are checked in this order, each over
//! the whole recipient list:
//!
//! 1. at least one recipient
//! 2. origin decodes, and a shielded origin is spendable by this wallet
//! 3. no duplicate recipient addresses
//! 4. every recipient address decodes
//! 5. no memos
//! 6. no negative values
//! 7. recipients are all transparent or all shielded
//! 8. not transparent to transparent

use crate::address::{AddressClassifier, AddressCodec, ClassifiedAddress};
use crate::fees::FeeCalculator;
use crate::keys::KeyStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A payee and the amount they receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Destination address (transparent or shielded)
    pub address: String,
    /// Amount in arrrtoshis
    pub value: i64,
    /// Memo text; must be absent or empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl Recipient {
    /// Recipient without memo
    pub fn new(address: impl Into<String>, value: i64) -> Self {
        Self {
            address: address.into(),
            value,
            memo: None,
        }
    }

    /// Attach memo text
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// True if a non-empty memo is attached
    pub fn has_memo(&self) -> bool {
        self.memo.as_deref().is_some_and(|m| !m.is_empty())
    }

    /// Value as an unsigned amount; `None` if negative
    pub fn amount(&self) -> Option<u64> {
        u64::try_from(self.value).ok()
    }
}

/// A validated transfer.
///
/// Holds either transparent or shielded outputs, never both, and a
/// transparent origin only ever pays shielded outputs.
#[derive(Debug, Clone)]
pub struct TransferPlan<S> {
    origin_address: String,
    origin: ClassifiedAddress<S>,
    transparent_outputs: Vec<Recipient>,
    shielded_outputs: Vec<Recipient>,
    fee: u64,
    target_amount: u64,
}

impl<S> TransferPlan<S> {
    /// Origin address as supplied
    pub fn origin_address(&self) -> &str {
        &self.origin_address
    }

    /// Classified origin
    pub fn origin(&self) -> &ClassifiedAddress<S> {
        &self.origin
    }

    /// Transparent recipients, in request order
    pub fn transparent_outputs(&self) -> &[Recipient] {
        &self.transparent_outputs
    }

    /// Shielded recipients, in request order
    pub fn shielded_outputs(&self) -> &[Recipient] {
        &self.shielded_outputs
    }

    /// Fixed fee charged
    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Sum of recipient values plus fee
    pub fn target_amount(&self) -> u64 {
        self.target_amount
    }

    /// Sum of recipient values
    pub fn output_amount(&self) -> u64 {
        self.target_amount - self.fee
    }

    /// Number of recipients
    pub fn output_count(&self) -> usize {
        self.transparent_outputs.len() + self.shielded_outputs.len()
    }

    /// Transparent origin paying shielded recipients
    pub fn is_shielding(&self) -> bool {
        self.origin.is_transparent()
    }

    /// Shielded origin paying transparent recipients
    pub fn is_deshielding(&self) -> bool {
        self.origin.is_shielded() && !self.transparent_outputs.is_empty()
    }
}

/// Validates transfer requests against the wallet's keys and address formats.
pub struct TransferRequestValidator<'a, C, K> {
    classifier: AddressClassifier<'a, C, K>,
    fees: FeeCalculator,
}

impl<'a, C: AddressCodec, K: KeyStore> TransferRequestValidator<'a, C, K> {
    /// Create a validator
    pub fn new(codec: &'a C, keys: &'a K, fees: FeeCalculator) -> Self {
        Self {
            classifier: AddressClassifier::new(codec, keys),
            fees,
        }
    }

    /// Validate a request and build its plan
    pub fn validate(
        &self,
        origin: &str,
        recipients: Vec<Recipient>,
    ) -> Result<TransferPlan<K::SpendingKey>> {
        self.check(origin, recipients).map_err(|err| {
            tracing::warn!("Rejected transfer request ({}): {}", err.category(), kind_of(&err));
            err
        })
    }

    fn check(
        &self,
        origin: &str,
        recipients: Vec<Recipient>,
    ) -> Result<TransferPlan<K::SpendingKey>> {
        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }

        let classified_origin = self.classifier.classify_origin(origin)?;

        let mut seen = HashSet::with_capacity(recipients.len());
        if let Some(dup) = recipients.iter().find(|r| !seen.insert(r.address.as_str())) {
            return Err(Error::DuplicateRecipient {
                address: dup.address.clone(),
            });
        }

        let is_transparent = recipients
            .iter()
            .map(|r| {
                self.classifier
                    .classify(&r.address)
                    .map(|c| c.is_transparent())
            })
            .collect::<Result<Vec<bool>>>()?;

        if let Some(r) = recipients.iter().find(|r| r.has_memo()) {
            return Err(Error::MemoNotSupported {
                address: r.address.clone(),
            });
        }

        if let Some(r) = recipients.iter().find(|r| r.value < 0) {
            return Err(Error::NegativeAmount {
                address: r.address.clone(),
                value: r.value,
            });
        }

        let transparent = is_transparent.iter().filter(|t| **t).count();
        let shielded = recipients.len() - transparent;
        if transparent > 0 && shielded > 0 {
            return Err(Error::MixedOutputKinds {
                transparent,
                shielded,
            });
        }

        if classified_origin.is_transparent() && transparent > 0 {
            return Err(Error::TransparentToTransparentUnsupported);
        }

        let output_sum = recipients.iter().try_fold(0u64, |acc, r| {
            // Values are non-negative past rule 6.
            acc.checked_add(r.value as u64).ok_or_else(|| {
                Error::AmountOverflow(format!("Recipient total overflows at {}", r.address))
            })
        })?;
        let target_amount = self.fees.target_amount(output_sum)?;

        let (transparent_outputs, shielded_outputs) = if transparent > 0 {
            (recipients, Vec::new())
        } else {
            (Vec::new(), recipients)
        };

        tracing::debug!(
            "Validated transfer: {} transparent outputs, {} shielded outputs, target={}",
            transparent_outputs.len(),
            shielded_outputs.len(),
            target_amount
        );

        Ok(TransferPlan {
            origin_address: origin.to_string(),
            origin: classified_origin,
            transparent_outputs,
            shielded_outputs,
            fee: self.fees.fee(),
            target_amount,
        })
    }
}

/// Variant name without payload, so logs carry no addresses or amounts.
fn kind_of(err: &Error) -> &'static str {
    match err {
        Error::NoRecipients => "NoRecipients",
        Error::UnknownAddressFormat { .. } => "UnknownAddressFormat",
        Error::OriginNotOwned { .. } => "OriginNotOwned",
        Error::DuplicateRecipient { .. } => "DuplicateRecipient",
        Error::MemoNotSupported { .. } => "MemoNotSupported",
        Error::NegativeAmount { .. } => "NegativeAmount",
        Error::MixedOutputKinds { .. } => "MixedOutputKinds",
        Error::TransparentToTransparentUnsupported => "TransparentToTransparentUnsupported",
        Error::AmountOverflow(_) => "AmountOverflow",
        _ => "Other",
    }
}
