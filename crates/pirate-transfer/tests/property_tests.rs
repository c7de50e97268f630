//! Property-based tests for pirate-transfer
//!
//! Uses proptest to verify plan and selection invariants across randomized
//! inputs

use pirate_transfer::testing::{note_entry, shielded_address, transparent_address, TestKeyStore};
use pirate_transfer::{
    Error, FeeCalculator, NoteEntry, NoteSelector, PirateAddressCodec, Recipient,
    SelectionStrategy, TransferRequestValidator, MAX_FEE, MIN_FEE,
};
use proptest::prelude::*;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Recipient amounts up to 21M ARRR
fn amount_strategy() -> impl Strategy<Value = i64> {
    0i64..=(21_000_000 * 100_000_000)
}

/// Note values, 1 arrrtoshi to 1M ARRR
fn note_values_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..=100_000_000_000_000, 0..12)
}

fn strategy_strategy() -> impl Strategy<Value = SelectionStrategy> {
    prop_oneof![
        Just(SelectionStrategy::LargestFirst),
        Just(SelectionStrategy::SmallestFirst),
        Just(SelectionStrategy::FirstFit),
    ]
}

fn entries(values: &[u64]) -> Vec<NoteEntry> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| note_entry(i as u8, *v))
        .collect()
}

struct Wallet {
    codec: PirateAddressCodec,
    keys: TestKeyStore,
}

impl Wallet {
    fn new() -> Self {
        let mut keys = TestKeyStore::new();
        keys.insert(shielded_address(0), 1);
        Self {
            codec: PirateAddressCodec::mainnet(),
            keys,
        }
    }

    fn validator(
        &self,
        fee: u64,
    ) -> TransferRequestValidator<'_, PirateAddressCodec, TestKeyStore> {
        TransferRequestValidator::new(&self.codec, &self.keys, FeeCalculator::unchecked(fee))
    }

    /// Shielded address for seeds with the low bit clear, transparent otherwise
    fn address(&self, seed: u8) -> String {
        if seed % 2 == 0 {
            self.codec.encode_shielded(&shielded_address(seed)).unwrap()
        } else {
            self.codec.encode_transparent(&transparent_address(seed))
        }
    }
}

// ============================================================================
// Plan Properties
// ============================================================================

proptest! {
    /// Property: a valid plan never mixes transparent and shielded outputs
    #[test]
    fn prop_plan_outputs_homogeneous(
        seeds in prop::collection::btree_set(1u8..=200, 1..8),
        amount in 0i64..1_000_000,
    ) {
        let wallet = Wallet::new();
        let recipients: Vec<Recipient> = seeds
            .iter()
            .map(|s| Recipient::new(wallet.address(*s), amount))
            .collect();

        match wallet.validator(10).validate(&wallet.address(0), recipients) {
            Ok(plan) => prop_assert!(
                plan.transparent_outputs().is_empty() || plan.shielded_outputs().is_empty()
            ),
            Err(err) => prop_assert!(
                matches!(err, Error::MixedOutputKinds { .. }),
                "unexpected error: {:?}",
                err
            ),
        }
    }

    /// Property: target amount = sum of values + fee
    #[test]
    fn prop_target_is_sum_plus_fee(
        amounts in prop::collection::vec(amount_strategy(), 1..10),
        fee in MIN_FEE..=MAX_FEE,
    ) {
        let wallet = Wallet::new();
        let recipients: Vec<Recipient> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| Recipient::new(wallet.address(2 * (i as u8 + 1)), *a))
            .collect();

        let plan = wallet.validator(fee).validate(&wallet.address(0), recipients).unwrap();
        let sum: u64 = amounts.iter().map(|a| *a as u64).sum();

        prop_assert_eq!(plan.target_amount(), sum + fee);
        prop_assert_eq!(plan.fee(), fee);
        prop_assert_eq!(plan.output_count(), amounts.len());
    }

    /// Property: a repeated address is always rejected, whatever the values
    #[test]
    fn prop_duplicates_rejected(
        seed in 1u8..=100,
        first in amount_strategy(),
        second in amount_strategy(),
    ) {
        let wallet = Wallet::new();
        let address = wallet.address(seed);
        let err = wallet
            .validator(10)
            .validate(
                &wallet.address(0),
                vec![Recipient::new(&address, first), Recipient::new(&address, second)],
            )
            .unwrap_err();

        prop_assert!(
            matches!(err, Error::DuplicateRecipient { .. }),
            "unexpected error: {:?}",
            err
        );
    }

    /// Property: any non-empty memo fails the whole request
    #[test]
    fn prop_memo_always_rejected(memo in "[a-z]{1,32}", amount in amount_strategy()) {
        let wallet = Wallet::new();
        let recipients = vec![
            Recipient::new(wallet.address(2), amount),
            Recipient::new(wallet.address(4), amount).with_memo(memo),
        ];

        let err = wallet.validator(10).validate(&wallet.address(0), recipients).unwrap_err();
        prop_assert!(
            matches!(err, Error::MemoNotSupported { .. }),
            "unexpected error: {:?}",
            err
        );
    }
}

// ============================================================================
// Selection Properties
// ============================================================================

proptest! {
    /// Property: selection covers the target or fails, never a partial set
    #[test]
    fn prop_selection_covers_target(
        values in note_values_strategy(),
        target in 0u64..=200_000_000_000_000,
        strategy in strategy_strategy(),
    ) {
        let available: u64 = values.iter().sum();
        let selector = NoteSelector::new(strategy);

        match selector.select_from(entries(&values), target) {
            Ok(selection) => {
                prop_assert!(selection.sum() >= target);
                prop_assert_eq!(selection.outpoints().len(), selection.notes().len());
                prop_assert_eq!(
                    selection.sum(),
                    selection.notes().iter().map(|n| n.value).sum::<u64>()
                );
            }
            Err(Error::InsufficientFunds { required, available: reported }) => {
                prop_assert!(available < target);
                prop_assert_eq!(required, target);
                prop_assert_eq!(reported, available);
            }
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    /// Property: largest-first takes a descending prefix and stops as soon
    /// as the target is reached
    #[test]
    fn prop_largest_first_minimal_prefix(
        values in prop::collection::vec(1u64..=1_000_000, 1..12),
        numerator in 1u64..=100,
    ) {
        let available: u64 = values.iter().sum();
        let target = available * numerator / 100;

        let selection = NoteSelector::default()
            .select_from(entries(&values), target)
            .unwrap();
        let picked: Vec<u64> = selection.notes().iter().map(|n| n.value).collect();

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        prop_assert_eq!(&picked[..], &sorted[..picked.len()]);

        if let Some((_, without_last)) = picked.split_last() {
            prop_assert!(without_last.iter().sum::<u64>() < target);
        }
    }
}
