//! Transaction fee policy
//!
//! Transfers pay a fixed fee (0.0001 ARRR = 10,000 arrrtoshis by default),
//! aligned with current chain policy. The fee is set once per planner and is
//! never negotiated per request.

use crate::{Error, Result};

/// Default fixed fee (in arrrtoshis)
pub const DEFAULT_FEE: u64 = 10_000;

/// Minimum fee (in arrrtoshis)
pub const MIN_FEE: u64 = DEFAULT_FEE;

/// Maximum fee (safety limit, in arrrtoshis)
/// 0.01 ARRR = 1,000,000 arrrtoshis
pub const MAX_FEE: u64 = 1_000_000;

/// Fixed-fee calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCalculator {
    fee: u64,
}

impl FeeCalculator {
    /// Create a calculator charging [`DEFAULT_FEE`].
    pub fn new() -> Self {
        Self { fee: DEFAULT_FEE }
    }

    /// Create a calculator charging `fee`, which must lie within
    /// [`MIN_FEE`]..=[`MAX_FEE`].
    pub fn with_fee(fee: u64) -> Result<Self> {
        Self::validate_fee(fee)?;
        Ok(Self { fee })
    }

    /// Create a calculator without range checks.
    ///
    /// Only for tests that need small round numbers.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn unchecked(fee: u64) -> Self {
        Self { fee }
    }

    /// The fixed fee in arrrtoshis.
    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Amount the inputs must cover: `output_sum + fee`.
    pub fn target_amount(&self, output_sum: u64) -> Result<u64> {
        let target = output_sum.checked_add(self.fee).ok_or_else(|| {
            Error::AmountOverflow(format!(
                "Outputs {} plus fee {} overflow",
                output_sum, self.fee
            ))
        })?;

        tracing::debug!(
            "Target amount: outputs={}, fee={}, target={}",
            output_sum,
            self.fee,
            target
        );

        Ok(target)
    }

    /// Validate fee is within acceptable range
    pub fn validate_fee(fee: u64) -> Result<()> {
        if fee < MIN_FEE {
            return Err(Error::FeeTooLow(format!(
                "Fee {} is below minimum {}",
                fee, MIN_FEE
            )));
        }

        if fee > MAX_FEE {
            return Err(Error::FeeTooHigh(format!(
                "Fee {} exceeds maximum {}",
                fee, MAX_FEE
            )));
        }

        Ok(())
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new()
    }
}
