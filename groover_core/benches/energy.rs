use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use groover_core::beat::{EnergyWindow, block_energy};

// Generate a synthetic mic trace: noise floor around the DC offset with a
// burst in the middle of the block.
fn synth_block(n: usize, offset: u16, seed: u32) -> Vec<u16> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    let mut v = Vec::with_capacity(n);
    for i in 0..n {
        let amp: i32 = if (n / 3..2 * n / 3).contains(&i) { 600 } else { 40 };
        let noise = (next() % (2 * amp + 1) as u32) as i32 - amp;
        v.push((i32::from(offset) + noise).clamp(0, 4_095) as u16);
    }
    v
}

pub fn bench_block_energy(c: &mut Criterion) {
    let block = synth_block(160, 1_523, 0xbeef);
    c.bench_function("block_energy_160", |b| {
        b.iter(|| block_energy(black_box(&block), black_box(1_523)))
    });
}

pub fn bench_window_update(c: &mut Criterion) {
    let energies: Vec<u64> = (0..1_000u64).map(|i| i * 37 % 1_000_000).collect();
    c.bench_function("energy_window_push_1000", |b| {
        b.iter_batched(
            || EnergyWindow::new(50),
            |mut w| {
                for &e in &energies {
                    w.push(black_box(e));
                }
                w.sum()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_block_energy, bench_window_update);
criterion_main!(benches);
