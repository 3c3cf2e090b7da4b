use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagearena::Arena;

fn bench_push(c: &mut Criterion) {
    c.bench_function("push_16bytes", |b| {
        let mut arena = Arena::create(4096);
        b.iter(|| {
            let scope = arena.scope();
            for _ in 0..1000 {
                black_box(scope.push(16));
            }
        });
    });

    c.bench_function("push_zero_16000bytes", |b| {
        let mut arena = Arena::create(64);
        let saved = arena.position();
        b.iter(|| {
            black_box(arena.push_zero(16_000));
            arena.set_position(saved);
        });
    });
}

fn bench_create_release(c: &mut Criterion) {
    c.bench_function("create_release_10_pages", |b| {
        b.iter(|| {
            let arena = Arena::create(black_box(10));
            arena.release();
        });
    });
}

criterion_group!(benches, bench_push, bench_create_release);
criterion_main!(benches);
