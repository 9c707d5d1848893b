use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use keyreserve::{
    mutate_declaration, validate_configuration, validate_declaration, AdmissionRuntime,
    ConfigurationObject, Declaration, DeclarationWrite, InMemoryDeclarationStore, RuntimeConfig,
};

/// 64 declarations with 16 keys each, all disjoint.
fn make_namespace() -> Vec<Declaration> {
    (0..64u32)
        .map(|d| {
            let keys: Vec<String> = (0..16u32).map(|k| format!("KEY_{d}_{k}")).collect();
            Declaration::new("bench", format!("decl-{d}"), keys).at_revision(1)
        })
        .collect()
}

fn bench_validate_declaration(c: &mut Criterion) {
    let namespace = make_namespace();
    // No key collides, so every key is tested before accepting.
    let candidate = Declaration::new(
        "bench",
        "candidate",
        (0..32u32).map(|k| format!("FRESH_{k}")),
    );

    c.bench_function("resolution/validate_declaration_64x16", |b| {
        b.iter(|| validate_declaration(&candidate, &namespace));
    });
}

fn bench_mutate_declaration(c: &mut Criterion) {
    let namespace = make_namespace();
    let keys: Vec<String> = (0..32u32)
        .map(|k| if k % 2 == 0 { format!("KEY_{k}_0") } else { format!("FRESH_{k}") })
        .collect();
    let candidate = Declaration::new("bench", "candidate", keys);

    c.bench_function("resolution/mutate_declaration_64x16", |b| {
        b.iter(|| mutate_declaration(candidate.clone(), &namespace));
    });
}

fn bench_configuration_guard(c: &mut Criterion) {
    let namespace = make_namespace();
    let cfg = (0..64u32).fold(ConfigurationObject::new("bench", "cm"), |cfg, k| {
        cfg.with_entry(format!("ENV_{k}"), "value")
    });

    c.bench_function("resolution/configuration_guard_64_keys", |b| {
        b.iter(|| validate_configuration("bench", &cfg, &namespace));
    });
}

fn bench_serialized_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_path");
    group.throughput(Throughput::Elements(1));

    group.bench_function("upsert_single_namespace", |b| {
        b.iter_custom(|iters| {
            // Fresh state per sample so the namespace does not grow across samples.
            let store = Arc::new(InMemoryDeclarationStore::new());
            let runtime = AdmissionRuntime::start(store, RuntimeConfig::default()).unwrap();

            let start = Instant::now();
            for i in 0..iters {
                runtime
                    .write(DeclarationWrite::Upsert(Declaration::new(
                        "bench",
                        format!("d{i}"),
                        [format!("KEY_{i}")],
                    )))
                    .unwrap();
            }
            start.elapsed()
        });
    });

    group.finish();
}

criterion_group!(
    resolution,
    bench_validate_declaration,
    bench_mutate_declaration,
    bench_configuration_guard,
    bench_serialized_writes
);
criterion_main!(resolution);
