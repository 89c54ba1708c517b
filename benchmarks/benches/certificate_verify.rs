//! CertificateVerify signing benchmarks.
//!
//! Compares the per-version constructions over the same transcript using
//! ECDSA P-256, the one key type every version can use with the RustCrypto
//! provider.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hsauth_benchmarks::signing_session;
use hsauth_core::signature::{sign_cert_verify, CertificateKey, KeyUsage, PrivateKey};
use hsauth_core::{ProtocolVersion, Role};
use hsauth_crypto::{CryptoProvider, PublicKeyAlgorithm, SignatureAlgorithm};
use hsauth_crypto_rustcrypto::RustCryptoProvider;

fn benchmark_sign_cert_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("certificate_verify_sign");
    let provider = RustCryptoProvider::new();
    let (sk, vk) = provider
        .signature(SignatureAlgorithm::EcdsaSecp256r1Sha256)
        .unwrap()
        .generate_keypair()
        .unwrap();
    let cert = CertificateKey::new(PublicKeyAlgorithm::Ecdsa, vk, KeyUsage::unrestricted());
    let key = PrivateKey::new(PublicKeyAlgorithm::Ecdsa, sk);

    for version in [
        ProtocolVersion::Ssl30,
        ProtocolVersion::Tls10,
        ProtocolVersion::Tls12,
        ProtocolVersion::Tls13,
    ] {
        group.bench_with_input(BenchmarkId::new("ecdsa", version.name()), &version, |b, &version| {
            b.iter(|| {
                let role = if version == ProtocolVersion::Tls13 {
                    Role::Server
                } else {
                    Role::Client
                };
                let mut session = signing_session(role, version, 4096);
                session.peer_signature_algorithms = vec![SignatureAlgorithm::EcdsaSecp256r1Sha256];
                sign_cert_verify(&mut session, &provider, black_box(&cert), black_box(&key)).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sign_cert_verify);
criterion_main!(benches);
