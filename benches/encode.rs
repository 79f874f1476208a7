use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lexelt::{
    features::FeatureConfig,
    index::FeatureIndex,
    types::{Instance, Pos, Token},
};
use std::time::Duration;

fn instances() -> Vec<Instance> {
    let words: Vec<_> = "the central bank raised its interest rates again in 1994 after a long debate"
        .split(' ')
        .collect();

    (0..200)
        .map(|i| {
            let tokens = words
                .iter()
                .enumerate()
                .map(|(j, word)| {
                    Token::new(
                        format!("{}.{}", i, j),
                        format!("{}{}", word, i % 7),
                        Some(word.to_string()),
                        Some("NN".to_string()),
                    )
                })
                .collect();
            Instance::new(
                format!("d.s{}.t2", i),
                "d".to_string(),
                "bank".to_string(),
                Pos::Noun,
                tokens,
                vec![2],
            )
        })
        .collect()
}

fn extract(c: &mut Criterion) {
    let chain = FeatureConfig::default().chain().unwrap();
    let instances = instances();

    c.bench_function("extract features", |b| {
        b.iter(|| {
            for instance in &instances {
                black_box(chain.extract(instance));
            }
        })
    });
}

fn encode(c: &mut Criterion) {
    let chain = FeatureConfig::default().chain().unwrap();
    let features: Vec<_> = instances().iter().map(|x| chain.extract(x)).collect();

    c.bench_function("encode features (training)", |b| {
        b.iter(|| {
            let mut index = FeatureIndex::default();
            for features in &features {
                black_box(index.encode_and_update(features));
            }
        })
    });

    let mut frozen = FeatureIndex::default();
    for features in features.iter().step_by(2) {
        frozen.encode_and_update(features);
    }

    c.bench_function("encode features (inference)", |b| {
        b.iter(|| {
            for features in &features {
                black_box(frozen.encode(features));
            }
        })
    });
}

fn no_warmup_criterion() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .warm_up_time(Duration::from_nanos(1))
}

criterion_group!(
name = features;
config = no_warmup_criterion();
targets =
    extract,
    encode,
);

criterion_main!(features);
