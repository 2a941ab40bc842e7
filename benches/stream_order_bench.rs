use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use line_network::algs::stream_order::{
    StrahlerAlgorithm, StreamOrderConfig, compute_stream_orders,
};
use line_network::data::Feature;
use line_network::geometry::LineString;
use line_network::progress::NoopMonitor;

// Random drainage tree: node i > 0 flows into a random earlier node; a few
// extra links split the flow so the network is not a pure tree.
fn random_network(n: usize, seed: u64) -> Vec<Feature> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let pos = |i: usize| ((i % 1000) as f64, (i / 1000) as f64);
    let mut features = vec![Feature::new(0, LineString::from_xy(&[pos(0), (-1.0, -1.0)]))];
    for i in 1..n {
        let parent = rng.gen_range(0..i);
        features.push(Feature::new(i as u64, LineString::from_xy(&[pos(i), pos(parent)])));
    }
    for k in 0..n / 20 {
        let from = rng.gen_range(1..n);
        let to = rng.gen_range(0..from);
        if rng.r#gen::<f64>() < 0.5 {
            features.push(Feature::new(
                (n + k) as u64,
                LineString::from_xy(&[pos(from), pos(to)]),
            ));
        }
    }
    features
}

fn bench_stream_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_order");
    for &n in &[1_000usize, 10_000] {
        let features = random_network(n, 42);
        for (name, algorithm) in [
            ("segment_origin", StrahlerAlgorithm::SegmentOrigin),
            ("legacy", StrahlerAlgorithm::Legacy),
        ] {
            let cfg = StreamOrderConfig {
                algorithm,
                shreve: true,
                metrics: true,
                horton: true,
                hack: true,
                ..Default::default()
            };
            group.bench_with_input(BenchmarkId::new(name, n), &features, |b, f| {
                b.iter(|| {
                    compute_stream_orders(black_box(f), &cfg, &mut NoopMonitor)
                        .map(|r| r.records.len())
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_stream_order);
criterion_main!(benches);
