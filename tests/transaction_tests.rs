//! End-to-end building, signing and validation of P2PKH transactions

use btc_primitives::transaction::{signature_hash, txid_to_hash, validate_transaction};
use btc_primitives::*;

const ONE_BTC: i64 = 100_000_000;

fn key(d: u64) -> PrivateKey {
    PrivateKey::new(U256::from_u64(d)).unwrap()
}

fn p2pkh_utxo(tag: u8, value: i64, owner: &PrivateKey) -> Utxo {
    let address = Address::p2pkh(&owner.public_key().unwrap(), Network::Mainnet);
    Utxo::new([tag; 32], 0, value, address.script_pubkey())
}

fn recipient() -> String {
    Address::p2pkh(&key(99).public_key().unwrap(), Network::Mainnet).to_string()
}

#[test]
fn test_half_bitcoin_payment_with_change() {
    let sender = key(0xc0ffee);
    let utxo = p2pkh_utxo(0xab, ONE_BTC, &sender);
    let mut builder = TransactionBuilder::default();
    builder
        .add_input(utxo.outpoint.hash, 0, utxo.clone())
        .unwrap()
        .add_output(&recipient(), ONE_BTC / 2)
        .unwrap()
        .set_fee(10_000)
        .unwrap();
    assert_eq!(builder.state(), BuilderState::FeeSet);

    let tx = builder.sign(&[sender]).unwrap();
    assert_eq!(builder.state(), BuilderState::Signed);
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0].value, 50_000_000);
    assert_eq!(tx.outputs[1].value, 49_990_000);
    assert_eq!(tx.outputs[1].script_pubkey, utxo.script_pubkey);

    let fee = validate_transaction(&tx, &[utxo]).unwrap();
    assert_eq!(fee, 10_000);

    let bytes = builder.serialize().unwrap();
    assert_eq!(builder.state(), BuilderState::Serialized);
    assert_eq!(Transaction::deserialize(&bytes).unwrap(), tx);
    assert_eq!(Transaction::from_bytes(&bytes).unwrap(), tx);
    assert_eq!(txid_to_hash(&tx.txid()).unwrap(), tx.hash());
}

#[test]
fn test_tampered_output_invalidates_signature() {
    let sender = key(7);
    let utxo = p2pkh_utxo(0x01, ONE_BTC, &sender);
    let mut builder = TransactionBuilder::default();
    builder
        .add_utxo(utxo.clone())
        .unwrap()
        .add_output(&recipient(), 40_000_000)
        .unwrap()
        .set_fee(5_000)
        .unwrap();
    let mut tx = builder.sign(&[sender]).unwrap();
    tx.outputs[0].value += 1;
    assert_eq!(
        validate_transaction(&tx, &[utxo]),
        Err(BitcoinError::SignatureInvalid { input: 0 })
    );
}

#[test]
fn test_validation_requires_matching_utxos() {
    let sender = key(11);
    let utxo = p2pkh_utxo(0x02, ONE_BTC, &sender);
    let mut builder = TransactionBuilder::default();
    builder
        .add_utxo(utxo.clone())
        .unwrap()
        .add_output(&recipient(), 1_000_000)
        .unwrap()
        .set_fee(1_000)
        .unwrap();
    let tx = builder.sign(&[sender]).unwrap();

    // missing from the set
    assert!(matches!(validate_transaction(&tx, &[]), Err(BitcoinError::UtxoMismatch(_))));

    // same outpoint, locked to someone else
    let foreign = Utxo {
        script_pubkey: p2pkh_utxo(0x02, ONE_BTC, &key(12)).script_pubkey,
        ..utxo
    };
    assert!(matches!(
        validate_transaction(&tx, &[foreign]),
        Err(BitcoinError::UtxoMismatch(_))
    ));
}

#[test]
fn test_add_input_rejects_mismatched_outpoint() {
    let utxo = p2pkh_utxo(0x03, ONE_BTC, &key(3));
    let mut builder = TransactionBuilder::default();
    assert!(matches!(
        builder.add_input([0x04; 32], 0, utxo.clone()),
        Err(BitcoinError::UtxoMismatch(_))
    ));
    assert!(matches!(
        builder.add_input([0x03; 32], 1, utxo),
        Err(BitcoinError::UtxoMismatch(_))
    ));
    assert_eq!(builder.state(), BuilderState::Empty);
}

#[test]
fn test_insufficient_funds() {
    let sender = key(5);
    let mut builder = TransactionBuilder::default();
    builder
        .add_utxo(p2pkh_utxo(0x05, 1_000, &sender))
        .unwrap()
        .add_output(&recipient(), 1_000)
        .unwrap()
        .set_fee(1)
        .unwrap();
    assert_eq!(
        builder.sign(&[sender]).unwrap_err(),
        BitcoinError::InsufficientFunds {
            available: 1_000,
            required: 1_001
        }
    );
}

#[test]
fn test_missing_key_reports_input() {
    let mut builder = TransactionBuilder::default();
    builder
        .add_utxo(p2pkh_utxo(0x06, ONE_BTC, &key(6)))
        .unwrap()
        .add_output(&recipient(), 1_000)
        .unwrap()
        .set_fee(1_000)
        .unwrap();
    assert_eq!(
        builder.sign(&[key(8)]).unwrap_err(),
        BitcoinError::MissingPrivateKey { input: 0 }
    );
}

#[test]
fn test_dust_change_goes_to_fee() {
    let sender = key(21);
    let utxo = p2pkh_utxo(0x07, ONE_BTC, &sender);
    let mut builder = TransactionBuilder::default();
    builder
        .add_utxo(utxo.clone())
        .unwrap()
        .add_output(&recipient(), ONE_BTC - 10_400)
        .unwrap()
        .set_fee(10_000)
        .unwrap();
    let tx = builder.sign(&[sender]).unwrap();
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(validate_transaction(&tx, &[utxo]).unwrap(), 10_400);
}

#[test]
fn test_two_inputs_mixed_key_encodings() {
    let alice = key(31);
    let bob = key(32);
    let alice_utxo = p2pkh_utxo(0x08, 30_000_000, &alice);
    let bob_address = Address::p2pkh_uncompressed(&bob.public_key().unwrap(), Network::Mainnet);
    let bob_utxo = Utxo::new([0x09; 32], 3, 20_000_000, bob_address.script_pubkey());
    let change = Address::p2pkh(&key(33).public_key().unwrap(), Network::Mainnet);

    let mut builder = TransactionBuilder::default();
    builder
        .add_utxo(alice_utxo.clone())
        .unwrap()
        .add_utxo(bob_utxo.clone())
        .unwrap()
        .add_output(&recipient(), 45_000_000)
        .unwrap()
        .set_fee(20_000)
        .unwrap()
        .set_change_address(&change.to_string())
        .unwrap();
    let tx = builder.sign(&[bob, alice]).unwrap();

    assert_eq!(tx.inputs.len(), 2);
    assert_eq!(tx.outputs[1].script_pubkey, change.script_pubkey());
    assert_eq!(tx.outputs[1].value, 4_980_000);
    assert_eq!(validate_transaction(&tx, &[bob_utxo, alice_utxo]).unwrap(), 20_000);
}

#[test]
fn test_builder_locked_after_signing() {
    let sender = key(41);
    let mut builder = TransactionBuilder::default();
    builder
        .add_utxo(p2pkh_utxo(0x0a, ONE_BTC, &sender))
        .unwrap()
        .add_output(&recipient(), 1_000_000)
        .unwrap()
        .set_fee(1_000)
        .unwrap();
    builder.sign(&[sender]).unwrap();
    assert!(matches!(builder.set_fee(2_000), Err(BitcoinError::InvalidState(_))));
    assert!(matches!(
        builder.add_output(&recipient(), 1),
        Err(BitcoinError::InvalidState(_))
    ));
    assert!(matches!(builder.sign(&[key(41)]), Err(BitcoinError::InvalidState(_))));
}

#[test]
fn test_serialize_requires_signature() {
    let mut builder = TransactionBuilder::default();
    assert!(matches!(builder.serialize(), Err(BitcoinError::InvalidState(_))));
}

#[test]
fn test_output_network_must_match() {
    let mut builder = TransactionBuilder::new(BuilderConfig::testnet());
    assert!(matches!(
        builder.add_output(&recipient(), 1_000),
        Err(BitcoinError::InvalidAddress(_))
    ));
    assert!(matches!(
        builder.add_output("not-an-address", 1_000),
        Err(BitcoinError::InvalidAddress(_))
    ));
}

#[test]
fn test_select_utxos_largest_first() {
    let sender = key(51);
    let pool = vec![
        p2pkh_utxo(0x10, 10_000, &sender),
        p2pkh_utxo(0x11, 70_000, &sender),
        p2pkh_utxo(0x12, 40_000, &sender),
    ];
    let mut builder = TransactionBuilder::default();
    builder
        .add_output(&recipient(), 100_000)
        .unwrap()
        .set_fee(1_000)
        .unwrap()
        .select_utxos(&pool)
        .unwrap();
    let values: Vec<i64> = builder.inputs().iter().map(|u| u.value).collect();
    assert_eq!(values, vec![70_000, 40_000]);

    let tx = builder.sign(&[sender]).unwrap();
    assert_eq!(tx.outputs[1].value, 9_000);
    assert_eq!(validate_transaction(&tx, &pool).unwrap(), 1_000);
}

#[test]
fn test_sighash_depends_on_input_index() {
    let sender = key(61);
    let a = p2pkh_utxo(0x20, 50_000, &sender);
    let b = p2pkh_utxo(0x21, 50_000, &sender);
    let mut builder = TransactionBuilder::default();
    builder
        .add_utxo(a.clone())
        .unwrap()
        .add_utxo(b)
        .unwrap()
        .add_output(&recipient(), 90_000)
        .unwrap()
        .set_fee(10_000)
        .unwrap();
    let tx = builder.sign(&[sender]).unwrap();
    let h0 = signature_hash(&tx, 0, &a.script_pubkey, 0x01).unwrap();
    let h1 = signature_hash(&tx, 1, &a.script_pubkey, 0x01).unwrap();
    assert_ne!(h0, h1);
    assert!(signature_hash(&tx, 2, &a.script_pubkey, 0x01).is_err());
}

#[test]
fn test_wide_payout_decodes_and_validates() {
    let sender = key(71);
    let utxo = p2pkh_utxo(0x30, ONE_BTC, &sender);
    let payee = recipient();
    let mut builder = TransactionBuilder::default();
    builder.add_utxo(utxo.clone()).unwrap();
    for _ in 0..1001 {
        builder.add_output(&payee, 1_000).unwrap();
    }
    builder.set_fee(10_000).unwrap();
    let tx = builder.sign(&[sender]).unwrap();
    assert_eq!(tx.outputs.len(), 1002);

    let bytes = builder.serialize().unwrap();
    assert_eq!(Transaction::deserialize(&bytes).unwrap(), tx);
    assert_eq!(validate_transaction(&tx, &[utxo]).unwrap(), 10_000);
}
