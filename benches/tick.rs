//! Benchmarks for the per-frame tick path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use embers::{Emitter, EmitterConfig, Group, GroupConfig};

fn bench_tick(c: &mut Criterion) {
    let mut small = Group::new(GroupConfig::new().with_max_particle_count(1_000));
    small.add_emitter(
        Emitter::new(
            EmitterConfig::new()
                .with_particle_count(1_000)
                .with_max_age(2.0, 0.5),
        )
        .with_seed(1),
    );

    c.bench_function("tick_1k", |b| {
        b.iter(|| small.tick(Some(black_box(0.016))));
    });

    let mut large = Group::new(GroupConfig::new().with_max_particle_count(100_000));
    large.add_emitter(
        Emitter::new(
            EmitterConfig::new()
                .with_particle_count(100_000)
                .with_max_age(2.0, 0.5),
        )
        .with_seed(1),
    );

    c.bench_function("tick_100k", |b| {
        b.iter(|| large.tick(Some(black_box(0.016))));
    });
}

fn bench_add_remove(c: &mut Criterion) {
    c.bench_function("add_remove_1k", |b| {
        let mut group = Group::new(GroupConfig::new().with_max_particle_count(10_000));
        b.iter(|| {
            let id = group.add_emitter(
                Emitter::new(EmitterConfig::new().with_particle_count(1_000)).with_seed(2),
            );
            group.remove_emitter(black_box(id)).unwrap();
        });
    });
}

criterion_group!(benches, bench_tick, bench_add_remove);
criterion_main!(benches);
