use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quantum_satlink_qkd::protocol::{run_protocol_with_rng, QkdConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn benchmark_baseline_run(c: &mut Criterion) {
    let config = QkdConfig::default();

    c.bench_function("run_protocol_baseline_256_bits", |b| {
        b.iter(|| {
            let mut rng = ChaCha20Rng::seed_from_u64(1);
            black_box(run_protocol_with_rng(&config, &mut rng).unwrap())
        })
    });
}

fn benchmark_max_size_run(c: &mut Criterion) {
    let config = QkdConfig {
        num_bits: 2048,
        ..QkdConfig::default()
    };

    c.bench_function("run_protocol_max_2048_bits", |b| {
        b.iter(|| {
            let mut rng = ChaCha20Rng::seed_from_u64(2);
            black_box(run_protocol_with_rng(&config, &mut rng).unwrap())
        })
    });
}

fn benchmark_with_eve_intercept_resend(c: &mut Criterion) {
    let config = QkdConfig {
        eve_active: true,
        eve_attack_type: "intercept_resend".to_string(),
        eve_interception_rate: 0.5,
        ..QkdConfig::default()
    };

    c.bench_function("run_protocol_intercept_resend", |b| {
        b.iter(|| {
            let mut rng = ChaCha20Rng::seed_from_u64(3);
            black_box(run_protocol_with_rng(&config, &mut rng).unwrap())
        })
    });
}

criterion_group!(
    benches,
    benchmark_baseline_run,
    benchmark_max_size_run,
    benchmark_with_eve_intercept_resend
);
criterion_main!(benches);
