//! ECDSA signing and verification, cross-checked with libsecp256k1

use btc_primitives::der::{decode_der, encode_der};
use btc_primitives::ecdsa::{sign, sign_digest, sign_digest_with_nonce, verify, verify_digest};
use btc_primitives::hash::sha256;
use btc_primitives::*;
use proptest::prelude::*;
use secp256k1::ecdsa::Signature as LibSignature;
use secp256k1::{Message, Secp256k1, SecretKey};

fn key(hex: &str) -> PrivateKey {
    PrivateKey::from_bytes(&hex::decode(hex).unwrap()).unwrap()
}

#[test]
fn test_rfc6979_signatures_match_libsecp256k1() {
    let secp = Secp256k1::new();
    let keys = [
        "0000000000000000000000000000000000000000000000000000000000000001",
        "18e14a7b6a307f426a94f8114701e7c8e774e7f9a47e2c2035db29a206321725",
        "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140",
    ];
    for key_hex in keys {
        let ours_key = key(key_hex);
        let sk = SecretKey::from_slice(&ours_key.to_bytes()).unwrap();
        for message in [&b"hello"[..], b"", b"Satoshi Nakamoto"] {
            let digest = sha256(message);
            let ours = sign_digest(&ours_key, &digest).unwrap();
            let msg = Message::from_digest_slice(&digest).unwrap();
            let theirs = secp.sign_ecdsa(&msg, &sk);
            assert_eq!(ours.to_compact(), theirs.serialize_compact(), "key {}", key_hex);
            assert_eq!(ours.to_der(), theirs.serialize_der().to_vec());
        }
    }
}

#[test]
fn test_libsecp256k1_verifies_our_der() {
    let secp = Secp256k1::new();
    let ours_key = key("18e14a7b6a307f426a94f8114701e7c8e774e7f9a47e2c2035db29a206321725");
    let digest = sha256(b"pay to the order of");
    let der = sign_digest(&ours_key, &digest).unwrap().to_der();

    let sig = LibSignature::from_der(&der).unwrap();
    let msg = Message::from_digest_slice(&digest).unwrap();
    let sec = ours_key.public_key().unwrap().to_sec_compressed();
    let pk = secp256k1::PublicKey::from_slice(&sec).unwrap();
    assert!(secp.verify_ecdsa(&msg, &sig, &pk).is_ok());
}

#[test]
fn test_we_verify_libsecp256k1_signatures() {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&[0x42; 32]).unwrap();
    let pk = secp256k1::PublicKey::from_secret_key(&secp, &sk);
    let digest = sha256(b"interop");
    let msg = Message::from_digest_slice(&digest).unwrap();
    let der = secp.sign_ecdsa(&msg, &sk).serialize_der();

    let public_key = PublicKey::from_sec(&pk.serialize()).unwrap();
    let signature = decode_der(&der).unwrap();
    assert!(verify_digest(&public_key, &digest, &signature).unwrap());
    assert!(!verify_digest(&public_key, &sha256(b"other"), &signature).unwrap());
}

#[test]
fn test_high_s_is_normalized() {
    let k = key("0000000000000000000000000000000000000000000000000000000000000007");
    let digest = sha256(b"low s");
    for nonce in 1..20u64 {
        let sig = sign_digest_with_nonce(&k, &digest, &U256::from_u64(nonce)).unwrap();
        assert!(sig.is_low_s());
        assert!(verify_digest(&k.public_key().unwrap(), &digest, &sig).unwrap());
    }
}

#[test]
fn test_wrong_key_fails() {
    let signer = key("0000000000000000000000000000000000000000000000000000000000000003");
    let other = key("0000000000000000000000000000000000000000000000000000000000000004");
    let sig = sign(&signer, b"message").unwrap();
    assert!(verify(&signer.public_key().unwrap(), b"message", &sig).unwrap());
    assert!(!verify(&other.public_key().unwrap(), b"message", &sig).unwrap());
}

#[test]
fn test_out_of_range_signature_rejected() {
    let k = key("0000000000000000000000000000000000000000000000000000000000000005");
    let n = *Curve::secp256k1().order();
    let public_key = k.public_key().unwrap();
    let digest = sha256(b"range");
    assert!(!verify_digest(&public_key, &digest, &Signature::new(U256::ZERO, U256::ONE)).unwrap());
    assert!(!verify_digest(&public_key, &digest, &Signature::new(U256::ONE, n)).unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn prop_sign_verify_roundtrip(
        secret in any::<[u8; 32]>(),
        message in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        if let Ok(private_key) = PrivateKey::from_bytes(&secret) {
            let public_key = private_key.public_key().unwrap();
            let sig = sign(&private_key, &message).unwrap();
            prop_assert!(sig.is_low_s());
            prop_assert!(verify(&public_key, &message, &sig).unwrap());
            let decoded = decode_der(&encode_der(&sig)).unwrap();
            prop_assert_eq!(decoded, sig);
        }
    }
}
