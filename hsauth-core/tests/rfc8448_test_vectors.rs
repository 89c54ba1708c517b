//! Known-answer tests for PSK binders and the TLS 1.2 PRF.
//!
//! The TLS 1.3 values come from the resumed handshake in RFC 8448
//! section 4, which uses the ticket issued in section 3. The PRF vector
//! is the widely published P_SHA256 test for TLS 1.2.

use hex_literal::hex;
use hsauth_core::hsauth_crypto::{CryptoProvider, HashAlgorithm};
use hsauth_core::prf::tls12_prf;
use hsauth_core::secrets::{
    derive_binder_key, derive_resumption_psk, early_secret, finished_mac, hkdf_expand_label,
};
use hsauth_core::session::PskSource;
use hsauth_crypto_rustcrypto::RustCryptoProvider;

const RESUMPTION_MASTER_SECRET: [u8; 32] =
    hex!("7df235f2031d2a051287d02b0241b0bfdaf86cc856231f2d5aba46c434ec196c");
const TICKET_NONCE: [u8; 2] = [0x00, 0x00];
const RESUMPTION_PSK: [u8; 32] =
    hex!("4ecd0eb6ec3b4d87f5d6028f922ca4c5851a277fd41311c9e62d2c9492e1c4f3");

/// RFC 8448 section 3: PSK = HKDF-Expand-Label(RMS, "resumption", nonce, 32)
#[test]
fn test_rfc8448_resumption_psk() {
    let provider = RustCryptoProvider::new();
    let psk = derive_resumption_psk(
        &provider,
        HashAlgorithm::Sha256,
        &RESUMPTION_MASTER_SECRET,
        &TICKET_NONCE,
    )
    .unwrap();
    assert_eq!(&psk[..], &RESUMPTION_PSK[..]);
}

/// RFC 8448 section 4: early secret and binder key of the resumed handshake
#[test]
fn test_rfc8448_early_secret_and_binder_key() {
    let provider = RustCryptoProvider::new();

    let early = early_secret(&provider, HashAlgorithm::Sha256, &RESUMPTION_PSK).unwrap();
    assert_eq!(
        &early[..],
        &hex!("9b2188e9b2fc6d64d71dc329900e20bb41915000f678aa839cbb797cb7d8332c")[..]
    );

    let binder_key = derive_binder_key(
        &provider,
        HashAlgorithm::Sha256,
        &RESUMPTION_PSK,
        PskSource::Resumption,
    )
    .unwrap();
    assert_eq!(
        &binder_key[..],
        &hex!("69fe131a3bbad5d63c64eebcc30e395b9d8107726a13d074e389dbc8a4e47256")[..]
    );
}

/// RFC 8448 section 4: binder over the truncated ClientHello
#[test]
fn test_rfc8448_binder() {
    let provider = RustCryptoProvider::new();
    let binder_key = derive_binder_key(
        &provider,
        HashAlgorithm::Sha256,
        &RESUMPTION_PSK,
        PskSource::Resumption,
    )
    .unwrap();

    let finished_key =
        hkdf_expand_label(&provider, HashAlgorithm::Sha256, &binder_key, b"finished", &[], 32)
            .unwrap();
    assert_eq!(
        &finished_key[..],
        &hex!("5588673e72cb59c87d220caffe94f2dea9a3b1609f7d50e90a48227db9ed7eaa")[..]
    );

    let truncated_hello_hash =
        hex!("63224b2e4573f2d3454ca84b9d009a04f6be9e05711a8396473aefa01e924a14");
    let binder =
        finished_mac(&provider, HashAlgorithm::Sha256, &binder_key, &truncated_hello_hash).unwrap();
    assert_eq!(
        binder,
        hex!("3add4fb2d8fdf822a0ca3cf7678ef5e88dae990141c5924d57bb6fa31b9e5f9d").to_vec()
    );
}

/// An external PSK with the same key must not produce the resumption binder.
#[test]
fn test_external_label_differs_from_resumption() {
    let provider = RustCryptoProvider::new();
    let external =
        derive_binder_key(&provider, HashAlgorithm::Sha256, &RESUMPTION_PSK, PskSource::External)
            .unwrap();
    assert_ne!(
        &external[..],
        &hex!("69fe131a3bbad5d63c64eebcc30e395b9d8107726a13d074e389dbc8a4e47256")[..]
    );
}

/// TLS 1.2 PRF (P_SHA256), 100 bytes of output
#[test]
fn test_tls12_prf_sha256() {
    let provider = RustCryptoProvider::new();
    let out = tls12_prf(
        &provider,
        HashAlgorithm::Sha256,
        &hex!("9bbe436ba940f017b17652849a71db35"),
        b"test label",
        &hex!("a0ba9f936cda311827a6f796ffd5198c"),
        100,
    )
    .unwrap();
    assert_eq!(out.len(), 100);
    assert_eq!(
        &out[..],
        &hex!(
            "e3f229ba727be17b8d122620557cd453c2aab21d07c3d495329b52d4e61edb5a"
            "6b301791e90d35c9c9a46b4e14baf9af0fa022f7077def17abfd3797c0564bab"
            "4fbc91666e9def9b97fce34f796789baa48082d122ee42c5a72e5a5110fff701"
            "87347b66"
        )[..]
    );
}
