//! Integration tests for the transfer planning flow
//!
//! Runs requests through validation, note selection and assembly against the
//! in-memory collaborators.

use pirate_transfer::testing::{
    note_entry, shielded_address, transparent_address, BuilderCall, BuilderError, BuilderOp,
    MemoryNoteStore, RecordingBuilder, TestKeyStore, TestSpendingKey, TEST_SHIELDING_OVK,
};
use pirate_transfer::{
    AssemblyStage, Error, FeeCalculator, NetworkType, PirateAddressCodec, PlannerConfig,
    Recipient, SeedKeyStore, SelectionStrategy, SpendingKeyHandle, TransferPlanner,
};
use std::error::Error as _;

type Planner = TransferPlanner<PirateAddressCodec, TestKeyStore, MemoryNoteStore>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Wallet owning `shielded_address(1)` with the given note values, fee 10.
fn wallet(values: &[u64]) -> Planner {
    init_tracing();
    let mut keys = TestKeyStore::new();
    keys.insert(shielded_address(1), 1);

    let mut notes = MemoryNoteStore::new();
    for (i, value) in values.iter().enumerate() {
        notes.add_note(shielded_address(1), note_entry(i as u8 + 1, *value));
    }

    TransferPlanner::with_fees(
        PlannerConfig::default(),
        FeeCalculator::unchecked(10),
        PirateAddressCodec::mainnet(),
        keys,
        notes,
    )
}

fn z(seed: u8) -> String {
    PirateAddressCodec::mainnet()
        .encode_shielded(&shielded_address(seed))
        .unwrap()
}

fn t(seed: u8) -> String {
    PirateAddressCodec::mainnet().encode_transparent(&transparent_address(seed))
}

#[test]
fn test_shielded_transfer_end_to_end() {
    let planner = wallet(&[40, 40]);

    let plan = planner
        .plan(&z(1), vec![Recipient::new(z(2), 60).with_memo("")])
        .unwrap();
    assert_eq!(plan.target_amount(), 70);

    let selection = planner.select(&plan).unwrap().unwrap();
    assert_eq!(selection.sum(), 80);
    assert_eq!(
        selection.outpoints(),
        &[note_entry(1, 40).outpoint, note_entry(2, 40).outpoint]
    );

    let mut builder = RecordingBuilder::new();
    let tx = planner.build(&plan, &mut builder).unwrap();

    let outputs: Vec<&BuilderCall> = tx
        .iter()
        .filter(|c| !matches!(c, BuilderCall::Spend { .. }))
        .collect();
    assert_eq!(
        outputs,
        vec![&BuilderCall::ShieldedOutput {
            ovk: TestSpendingKey::new(1).outgoing_viewing_key(),
            address: shielded_address(2),
            value: 60,
            memo: Vec::new(),
        }]
    );
    assert_eq!(builder.spend_count(), 2);
    assert!(builder.is_finalized());
}

#[test]
fn test_largest_notes_spent_first() {
    let planner = wallet(&[20, 5, 50, 30]);
    let plan = planner.plan(&z(1), vec![Recipient::new(z(2), 55)]).unwrap();

    let selection = planner.select(&plan).unwrap().unwrap();
    let values: Vec<u64> = selection.notes().iter().map(|n| n.value).collect();
    assert_eq!(values, vec![50, 30]);
}

#[test]
fn test_shielding_transfer() {
    let planner = wallet(&[]);
    let mut builder = RecordingBuilder::new();

    let tx = planner
        .transfer(
            &t(7),
            vec![Recipient::new(z(2), 15), Recipient::new(z(3), 25)],
            &mut builder,
        )
        .unwrap();

    assert_eq!(
        tx[0],
        BuilderCall::TransparentInput {
            address: transparent_address(7),
            value: 50
        }
    );
    assert_eq!(tx.len(), 3);
    for call in &tx[1..] {
        assert!(matches!(
            call,
            BuilderCall::ShieldedOutput { ovk, .. } if *ovk == TEST_SHIELDING_OVK
        ));
    }
}

#[test]
fn test_deshielding_transfer() {
    let planner = wallet(&[100]);
    let mut builder = RecordingBuilder::new();

    let tx = planner
        .transfer(&z(1), vec![Recipient::new(t(4), 90)], &mut builder)
        .unwrap();

    assert_eq!(builder.spend_count(), 1);
    assert_eq!(
        tx.last(),
        Some(&BuilderCall::TransparentOutput {
            address: transparent_address(4),
            value: 90
        })
    );
}

#[test]
fn test_validation_errors_reach_caller() {
    let planner = wallet(&[100]);

    let err = planner
        .transfer(&t(7), vec![Recipient::new(t(8), 1)], &mut RecordingBuilder::new())
        .unwrap_err();
    assert!(matches!(err, Error::TransparentToTransparentUnsupported));
    assert!(err.is_user_error());

    let err = planner
        .transfer(
            &z(1),
            vec![Recipient::new(z(2), 5), Recipient::new(z(2), 3)],
            &mut RecordingBuilder::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateRecipient { .. }));

    let err = planner
        .transfer(
            &z(1),
            vec![Recipient::new(z(2), 5).with_memo("thanks")],
            &mut RecordingBuilder::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::MemoNotSupported { .. }));
}

#[test]
fn test_missing_voucher_fails_whole_build() {
    init_tracing();
    let mut keys = TestKeyStore::new();
    keys.insert(shielded_address(1), 1);
    let mut notes = MemoryNoteStore::new();
    notes.add_note(shielded_address(1), note_entry(1, 40));
    notes.add_note(shielded_address(1), note_entry(2, 40));
    notes.drop_voucher(&note_entry(2, 40).outpoint);

    let planner = TransferPlanner::with_fees(
        PlannerConfig::default(),
        FeeCalculator::unchecked(10),
        PirateAddressCodec::mainnet(),
        keys,
        notes,
    );

    let mut builder = RecordingBuilder::new();
    let err = planner
        .transfer(&z(1), vec![Recipient::new(z(2), 60)], &mut builder)
        .unwrap_err();

    assert!(matches!(err, Error::MissingVoucher { .. }));
    assert_eq!(builder.spend_count(), 0);
    assert!(builder.calls().is_empty());
}

#[test]
fn test_builder_error_passed_through() {
    let planner = wallet(&[100]);
    let mut builder = RecordingBuilder::failing_on(BuilderOp::ShieldedOutput);

    let err = planner
        .transfer(&z(1), vec![Recipient::new(z(2), 60)], &mut builder)
        .unwrap_err();

    match &err {
        Error::AssemblyFailed { stage, .. } => assert_eq!(*stage, AssemblyStage::SpendsAttached),
        other => panic!("unexpected error: {:?}", other),
    }
    let source = err.source().unwrap();
    assert_eq!(
        source.downcast_ref::<BuilderError>(),
        Some(&BuilderError(BuilderOp::ShieldedOutput))
    );
}

#[test]
fn test_testnet_planner_rejects_mainnet_addresses() {
    init_tracing();
    let mut keys = TestKeyStore::new();
    keys.insert(shielded_address(1), 1);
    let config = PlannerConfig::for_network(NetworkType::Testnet);
    let planner = TransferPlanner::for_network(config, keys, MemoryNoteStore::new()).unwrap();

    let err = planner.plan(&z(1), vec![Recipient::new(z(2), 1)]).unwrap_err();
    assert!(matches!(err, Error::UnknownAddressFormat { .. }));

    let testnet = PirateAddressCodec::new(NetworkType::Testnet);
    let origin = testnet.encode_shielded(&shielded_address(1)).unwrap();
    let to = testnet.encode_shielded(&shielded_address(2)).unwrap();
    let plan = planner.plan(&origin, vec![Recipient::new(to, 1)]).unwrap();
    assert_eq!(plan.fee(), pirate_transfer::DEFAULT_FEE);
}

#[test]
fn test_seed_key_store_shielding_ovk() {
    init_tracing();
    let seed = vec![0x5Au8; 32];
    let mut keys = SeedKeyStore::new(seed.clone());
    keys.register(shielded_address(1), TestSpendingKey::new(1));

    let config = PlannerConfig {
        selection_strategy: SelectionStrategy::FirstFit,
        ..PlannerConfig::default()
    };
    let planner = TransferPlanner::for_network(config, &keys, MemoryNoteStore::new()).unwrap();

    let mut builder = RecordingBuilder::new();
    let tx = planner
        .transfer(&t(7), vec![Recipient::new(z(2), 1_000)], &mut builder)
        .unwrap();

    assert!(matches!(
        &tx[1],
        BuilderCall::ShieldedOutput { ovk, .. }
            if *ovk == pirate_transfer::ovk_for_shielding_from_taddr(&seed)
    ));
}
