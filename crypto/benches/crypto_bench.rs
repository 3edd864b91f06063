use attest_types::{Commitment, LedgerAddress, Provider, Timestamp};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn commit_bench(c: &mut Criterion) {
    let fields = ["attest/bench", "humanity-registry", "addr_0123456789", "profile-42"];

    c.bench_function("commit_4_fields", |b| {
        b.iter(|| attest_crypto::commit(black_box(&fields)))
    });
}

fn proof_hash_bench(c: &mut Criterion) {
    let address = LedgerAddress::parse("addr_0123456789").unwrap();

    c.bench_function("proof_hash", |b| {
        b.iter(|| {
            attest_crypto::proof_hash(
                Provider::HumanityRegistry,
                black_box(&address),
                "profile-42",
                Timestamp::new(1_700_000_000),
            )
        })
    });
}

fn nullifier_bench(c: &mut Criterion) {
    let nonce = Commitment::new([7u8; 32]);

    c.bench_function("nullifier", |b| {
        b.iter(|| attest_crypto::nullifier(black_box("proposal-1"), &nonce))
    });
}

fn nonce_bench(c: &mut Criterion) {
    c.bench_function("nonce_os_entropy", |b| {
        b.iter(|| attest_crypto::nonce(&attest_crypto::OsEntropy))
    });
}

fn ed25519_verify_bench(c: &mut Criterion) {
    let kp = attest_crypto::keypair_from_seed(&[9u8; 32]);
    let msg = b"attest:vote:addr_0123456789:proposal-1:yes";
    let sig = attest_crypto::sign_message(msg, &kp.private);

    c.bench_function("ed25519_verify_vote_message", |b| {
        b.iter(|| attest_crypto::verify_signature(black_box(msg), &sig, &kp.public))
    });
}

fn blake2b_256_1kb_bench(c: &mut Criterion) {
    let data = vec![0xCDu8; 1024];

    c.bench_function("blake2b_256_1KB", |b| {
        b.iter(|| attest_crypto::blake2b_256(black_box(&data)))
    });
}

criterion_group!(
    benches,
    commit_bench,
    proof_hash_bench,
    nullifier_bench,
    nonce_bench,
    ed25519_verify_bench,
    blake2b_256_1kb_bench,
);
criterion_main!(benches);
