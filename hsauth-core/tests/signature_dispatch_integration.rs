//! Version dispatch of the handshake signature engine, observed through a
//! recording RSA/DSA provider.

mod common;

use std::sync::{Arc, Mutex};

use common::{hash, RecordingProvider, Signed};
use hsauth_core::hsauth_crypto::{
    CryptoProvider, HashAlgorithm, PublicKeyAlgorithm, SignatureAlgorithm, SigningKey,
    VerifyingKey,
};
use hsauth_core::prf::ssl3_handshake_mac;
use hsauth_core::signature::{
    sign_cert_verify, sign_handshake_data, verify_cert_verify, verify_handshake_data,
    CertificateKey, KeyUsage, PrivateKey,
};
use hsauth_core::{Config, Error, ProtocolVersion, Role, SecurityState};
use zeroize::Zeroizing;

const KEY: [u8; 16] = [0x4b; 16];
const TRANSCRIPT: &[u8] = b"ClientHello ServerHello Certificate CertificateRequest ServerHelloDone Certificate ClientKeyExchange";

fn credential(algorithm: PublicKeyAlgorithm, usage: KeyUsage) -> (CertificateKey, PrivateKey) {
    (
        CertificateKey::new(algorithm, VerifyingKey::from_bytes(KEY.to_vec()), usage),
        PrivateKey::new(algorithm, SigningKey::from_bytes(KEY.to_vec())),
    )
}

fn session(role: Role, version: ProtocolVersion, config: Config) -> SecurityState {
    let mut state = SecurityState::new(role, version, config);
    state.client_random = [0xc1; 32];
    state.server_random = [0x5e; 32];
    state.premaster_secret = Zeroizing::new(vec![0x03; 48]);
    state.peer_signature_algorithms = vec![
        SignatureAlgorithm::EcdsaSecp256r1Sha256,
        SignatureAlgorithm::RsaPkcs1Sha256,
        SignatureAlgorithm::RsaPkcs1Sha1,
    ];
    state.transcript.append(TRANSCRIPT);
    state
}

fn peer_of(signer: &SecurityState) -> SecurityState {
    let role = match signer.role() {
        Role::Client => Role::Server,
        Role::Server => Role::Client,
    };
    let mut peer = session(role, signer.version, Config::default());
    peer.transcript.append(b"CertificateVerify");
    peer
}

#[test]
fn test_tls12_signs_transcript_with_negotiated_scheme() {
    let provider = RecordingProvider::new();
    let (cert, key) = credential(PublicKeyAlgorithm::Rsa, KeyUsage::unrestricted());
    let mut client = session(Role::Client, ProtocolVersion::Tls12, Config::default());

    let signed = sign_cert_verify(&mut client, &provider, &cert, &key).unwrap();
    assert_eq!(signed.algorithm, Some(SignatureAlgorithm::RsaPkcs1Sha256));
    assert_eq!(
        provider.signed(),
        vec![Signed::Message(
            SignatureAlgorithm::RsaPkcs1Sha256,
            TRANSCRIPT.to_vec()
        )]
    );
    assert_eq!(client.master_secret_generation(), 0);

    let mut server = peer_of(&client);
    verify_cert_verify(&mut server, &provider, Some(&cert), &signed.signature, signed.algorithm)
        .unwrap();
}

#[test]
fn test_tls10_rsa_signs_md5_sha1_digest() {
    let provider = RecordingProvider::new();
    let (cert, key) = credential(PublicKeyAlgorithm::Rsa, KeyUsage::unrestricted());
    let mut client = session(Role::Client, ProtocolVersion::Tls10, Config::default());

    let signed = sign_cert_verify(&mut client, &provider, &cert, &key).unwrap();
    assert_eq!(signed.algorithm, None);

    let expected = [
        hash(&provider, HashAlgorithm::Md5, TRANSCRIPT),
        hash(&provider, HashAlgorithm::Sha1, TRANSCRIPT),
    ]
    .concat();
    assert_eq!(expected.len(), 36);
    assert_eq!(
        provider.signed(),
        vec![Signed::Digest(PublicKeyAlgorithm::Rsa, expected)]
    );

    let mut server = peer_of(&client);
    verify_cert_verify(&mut server, &provider, Some(&cert), &signed.signature, None).unwrap();
}

#[test]
fn test_tls11_dsa_signs_sha1_digest() {
    let provider = RecordingProvider::new();
    let (cert, key) = credential(PublicKeyAlgorithm::Dsa, KeyUsage::unrestricted());
    let mut client = session(Role::Client, ProtocolVersion::Tls11, Config::default());

    sign_cert_verify(&mut client, &provider, &cert, &key).unwrap();
    assert_eq!(
        provider.signed(),
        vec![Signed::Digest(
            PublicKeyAlgorithm::Dsa,
            hash(&provider, HashAlgorithm::Sha1, TRANSCRIPT)
        )]
    );
}

#[test]
fn test_ssl3_regenerates_master_secret_before_signing() {
    let provider = RecordingProvider::new();
    let (cert, key) = credential(PublicKeyAlgorithm::Rsa, KeyUsage::unrestricted());
    let mut client = session(Role::Client, ProtocolVersion::Ssl30, Config::default());
    assert_eq!(client.master_secret_generation(), 0);

    let signed = sign_cert_verify(&mut client, &provider, &cert, &key).unwrap();
    assert_eq!(client.master_secret_generation(), 1);
    assert_eq!(client.master_secret.len(), 48);

    let expected = [
        ssl3_handshake_mac(&provider, HashAlgorithm::Md5, TRANSCRIPT, &client.master_secret).unwrap(),
        ssl3_handshake_mac(&provider, HashAlgorithm::Sha1, TRANSCRIPT, &client.master_secret)
            .unwrap(),
    ]
    .concat();
    assert_eq!(
        provider.signed(),
        vec![Signed::Digest(PublicKeyAlgorithm::Rsa, expected)]
    );

    sign_cert_verify(&mut client, &provider, &cert, &key).unwrap();
    assert_eq!(client.master_secret_generation(), 2);

    let mut server = peer_of(&client);
    verify_cert_verify(&mut server, &provider, Some(&cert), &signed.signature, None).unwrap();
    assert_eq!(server.master_secret_generation(), 1);
}

#[test]
fn test_legacy_server_key_exchange_digest() {
    let provider = RecordingProvider::new();
    let (cert, key) = credential(PublicKeyAlgorithm::Rsa, KeyUsage::unrestricted());
    let mut server = session(Role::Server, ProtocolVersion::Tls11, Config::default());
    server.server_sign_algo = Some(SignatureAlgorithm::RsaPkcs1Sha1);

    let params = b"dh_p dh_g dh_Ys";
    let signature = sign_handshake_data(&server, &provider, &cert, &key, params).unwrap();

    let data = [&[0xc1u8; 32][..], &[0x5eu8; 32][..], &params[..]].concat();
    let expected = [
        hash(&provider, HashAlgorithm::Md5, &data),
        hash(&provider, HashAlgorithm::Sha1, &data),
    ]
    .concat();
    assert_eq!(
        provider.signed(),
        vec![Signed::Digest(PublicKeyAlgorithm::Rsa, expected)]
    );

    let mut client = session(Role::Client, ProtocolVersion::Tls11, Config::default());
    verify_handshake_data(&mut client, &provider, Some(&cert), params, &signature, None).unwrap();
    assert!(matches!(
        verify_handshake_data(&mut client, &provider, Some(&cert), b"other", &signature, None),
        Err(Error::SignatureVerificationFailed)
    ));
}

#[test]
fn test_tls12_server_key_exchange_signs_randoms_and_params() {
    let provider = RecordingProvider::new();
    let (cert, key) = credential(PublicKeyAlgorithm::Rsa, KeyUsage::unrestricted());
    let mut server = session(Role::Server, ProtocolVersion::Tls12, Config::default());
    server.server_sign_algo = Some(SignatureAlgorithm::RsaPkcs1Sha256);

    let signature = sign_handshake_data(&server, &provider, &cert, &key, b"ecdh").unwrap();
    let data = [&[0xc1u8; 32][..], &[0x5eu8; 32][..], &b"ecdh"[..]].concat();
    assert_eq!(
        provider.signed(),
        vec![Signed::Message(SignatureAlgorithm::RsaPkcs1Sha256, data)]
    );

    let mut client = session(Role::Client, ProtocolVersion::Tls12, Config::default());
    verify_handshake_data(
        &mut client,
        &provider,
        Some(&cert),
        b"ecdh",
        &signature,
        Some(SignatureAlgorithm::RsaPkcs1Sha256),
    )
    .unwrap();
}

#[test]
fn test_key_usage_override_signs_and_audits() {
    let provider = RecordingProvider::new();
    let (cert, key) = credential(
        PublicKeyAlgorithm::Rsa,
        KeyUsage::from_bits(KeyUsage::KEY_ENCIPHERMENT),
    );
    let config = Config::builder()
        .with_allow_server_key_usage_violation(true)
        .build()
        .unwrap();
    let audit = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&audit);
    let mut client = session(Role::Client, ProtocolVersion::Tls12, config);
    client.set_audit_hook(Box::new(move |m| sink.lock().unwrap().push(m.to_string())));

    let signed = sign_cert_verify(&mut client, &provider, &cert, &key).unwrap();
    assert!(!signed.signature.is_empty());
    assert_eq!(provider.signed().len(), 1);
    assert_eq!(
        audit.lock().unwrap().as_slice(),
        ["Local certificate does not allow digital signatures. Key usage violation detected (ignored)."
            .to_string()]
    );
}

#[test]
fn test_key_usage_violation_produces_no_signature() {
    let provider = RecordingProvider::new();
    let (cert, key) = credential(
        PublicKeyAlgorithm::Rsa,
        KeyUsage::from_bits(KeyUsage::KEY_ENCIPHERMENT),
    );
    for version in [
        ProtocolVersion::Ssl30,
        ProtocolVersion::Tls10,
        ProtocolVersion::Tls12,
    ] {
        let mut client = session(Role::Client, version, Config::default());
        assert_eq!(
            sign_cert_verify(&mut client, &provider, &cert, &key),
            Err(Error::KeyUsageViolation)
        );
        assert_eq!(client.master_secret_generation(), 0);
    }
    assert!(provider.signed().is_empty());

    let mut server = session(Role::Server, ProtocolVersion::Tls12, Config::default());
    assert_eq!(
        verify_cert_verify(
            &mut server,
            &provider,
            Some(&cert),
            &[0; 32],
            Some(SignatureAlgorithm::RsaPkcs1Sha256)
        ),
        Err(Error::KeyUsageViolation)
    );
}

#[test]
fn test_mismatched_certificate_and_key() {
    let provider = RecordingProvider::new();
    let (cert, _) = credential(PublicKeyAlgorithm::Rsa, KeyUsage::unrestricted());
    let (_, key) = credential(PublicKeyAlgorithm::Dsa, KeyUsage::unrestricted());
    let mut client = session(Role::Client, ProtocolVersion::Tls10, Config::default());
    assert!(matches!(
        sign_cert_verify(&mut client, &provider, &cert, &key),
        Err(Error::IncompatibleSignatureKey(_))
    ));
    assert!(provider.signed().is_empty());
}
