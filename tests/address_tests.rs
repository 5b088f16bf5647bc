//! Address derivation, parsing and multisig construction

use btc_primitives::script::{classify_script, ScriptTemplate};
use btc_primitives::*;

fn public_key(hex: &str) -> PublicKey {
    PrivateKey::from_bytes(&hex::decode(hex).unwrap())
        .unwrap()
        .public_key()
        .unwrap()
}

fn small_key(d: u64) -> PublicKey {
    PrivateKey::new(U256::from_u64(d)).unwrap().public_key().unwrap()
}

#[test]
fn test_known_key_addresses() {
    let key = public_key("18e14a7b6a307f426a94f8114701e7c8e774e7f9a47e2c2035db29a206321725");
    assert_eq!(
        Address::p2pkh(&key, Network::Mainnet).to_string(),
        "1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs"
    );
    assert_eq!(
        Address::p2pkh_uncompressed(&key, Network::Mainnet).to_string(),
        "16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM"
    );
    assert_eq!(
        Address::p2pkh(&key, Network::Testnet).to_string(),
        "n3svudhm7bt6j3nTT9uu1A57Cs9pKK3iXW"
    );
}

#[test]
fn test_parse_recovers_kind_and_network() {
    let cases = [
        ("1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs", AddressKind::P2pkh, Network::Mainnet),
        ("mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r", AddressKind::P2pkh, Network::Testnet),
        ("33hG2q39jRi2NqicRJB4ggY1J8EJm97Szz", AddressKind::P2sh, Network::Mainnet),
        ("2MuFU6ZyBLtDNadMA6RnwJdXGWUSUaoKLeS", AddressKind::P2sh, Network::Testnet),
    ];
    for (text, kind, network) in cases {
        let address: Address = text.parse().unwrap();
        assert_eq!(address.kind(), kind, "{}", text);
        assert_eq!(address.network(), network, "{}", text);
        assert_eq!(address.to_string(), text);
    }
}

#[test]
fn test_two_of_three_multisig_vector() {
    let keys = [small_key(1), small_key(2), small_key(3)];
    let mainnet = address::create_multisig_address(&keys, 2, Network::Mainnet).unwrap();
    assert_eq!(mainnet.to_string(), "33hG2q39jRi2NqicRJB4ggY1J8EJm97Szz");
    assert_eq!(
        hex::encode(mainnet.redeem_script().unwrap()),
        "52210279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
         2102c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5\
         2102f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f953ae"
    );

    let testnet = address::create_multisig_address(&keys, 2, Network::Testnet).unwrap();
    assert_eq!(testnet.to_string(), "2MuFU6ZyBLtDNadMA6RnwJdXGWUSUaoKLeS");

    let info = mainnet.multisig_info().unwrap();
    assert_eq!(info.threshold, 2);
    assert_eq!(info.public_keys.len(), 3);
}

#[test]
fn test_redeem_script_classifies_as_multisig() {
    let keys = [small_key(4), small_key(5)];
    let address = address::create_multisig_address(&keys, 1, Network::Mainnet).unwrap();
    match classify_script(&address.redeem_script().unwrap()) {
        ScriptTemplate::Multisig { threshold, public_keys } => {
            assert_eq!(threshold, 1);
            assert_eq!(public_keys.len(), 2);
            assert_eq!(public_keys[0], keys[0].to_sec_compressed().to_vec());
        }
        other => panic!("expected multisig, got {:?}", other),
    }
    assert!(matches!(
        classify_script(&address.script_pubkey()),
        ScriptTemplate::P2sh { .. }
    ));
}

#[test]
fn test_multisig_threshold_bounds() {
    let keys: Vec<PublicKey> = (1..=17).map(small_key).collect();
    assert!(matches!(
        address::create_multisig_address(&keys, 2, Network::Mainnet),
        Err(BitcoinError::InvalidThreshold { .. })
    ));
    assert!(address::create_multisig_address(&keys[..16], 16, Network::Mainnet).is_ok());
    assert!(matches!(
        address::create_multisig_address(&[], 1, Network::Mainnet),
        Err(BitcoinError::InvalidThreshold { .. })
    ));
}

#[test]
fn test_invalid_addresses() {
    assert_eq!(
        Address::parse("1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAt"),
        Err(BitcoinError::ChecksumMismatch)
    );
    assert!(matches!(Address::parse(""), Err(BitcoinError::InvalidAddress(_))));
    assert!(matches!(Address::parse("1PMyc0"), Err(BitcoinError::InvalidAddress(_))));
    // a WIF string is valid Base58Check but not an address
    assert!(matches!(
        Address::parse("KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"),
        Err(BitcoinError::InvalidAddress(_))
    ));
}

#[test]
fn test_facade_network_checks() {
    let testnet = BitcoinPrimitives::new(Network::Testnet);
    assert!(testnet.validate_address("mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r").is_ok());
    assert!(testnet.validate_address("1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs").is_err());
    let multisig = testnet
        .create_multisig_address(&[small_key(1), small_key(2), small_key(3)], 2)
        .unwrap();
    assert!(multisig.to_string().starts_with('2'));
}
