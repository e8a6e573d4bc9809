use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use gridlife_genome::{gene, Brain, NUM_INPUT_NEURONS};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use std::hint::black_box;

fn bench_brain(c: &mut Criterion) {
    let mut group = c.benchmark_group("brain");
    let mut rng = Xoshiro256StarStar::seed_from_u64(0xBEEF);

    for num_genes in [6_usize, 30, 120] {
        let sequence = gene::random_gene_sequence(num_genes, &mut rng);
        let brain = Brain::from_hex(sequence.clone()).expect("valid sequence");
        let input = [0.25_f32; NUM_INPUT_NEURONS];

        group.bench_function(format!("output_genes{}", num_genes), |b| {
            b.iter(|| black_box(brain.output(black_box(&input))))
        });

        group.bench_function(format!("express_genes{}", num_genes), |b| {
            b.iter_batched(
                || sequence.clone(),
                |sequence| black_box(Brain::from_hex(sequence).expect("valid sequence")),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_brain);
criterion_main!(benches);
