use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8::prelude::*;

const MAZE: &[u8] = include_bytes!("../programs/maze");

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("maze bytecode", |b| {
        let mut vm = Chip8Vm::new(Chip8Conf {
            rng_seed: Some(0),
            ..Default::default()
        });

        b.iter(|| {
            vm.load_bytecode(MAZE).unwrap();
            let step_count = black_box(1000_usize);
            black_box(vm.run_steps(step_count))
        })
    });

    c.bench_function("decode", |b| {
        b.iter(|| {
            for word in 0..=u16::MAX {
                black_box(chip8::decode(black_box(word)));
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
