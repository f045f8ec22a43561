use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use plum_search::game_state::game_state::Position;
use plum_search::search::board_scoring::MaterialEvaluator;
use plum_search::search::iterative_deepening::{search, SearchLimits};
use plum_search::search::threading::{CacheKind, EngineConfig, SearchContext};

const KIWIPETE_FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn bench_fixed_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_fixed_depth");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(6));
    group.sample_size(10);

    let kiwipete = Position::from_fen(KIWIPETE_FEN).expect("benchmark FEN should parse");
    let cases = [
        ("startpos", Position::new_game(), 5u8),
        ("kiwipete", kiwipete, 4u8),
    ];

    for (name, position, depth) in &cases {
        for cache_kind in [CacheKind::Striped, CacheKind::Lockless] {
            for threads in [1usize, 4] {
                let context = SearchContext::new(EngineConfig {
                    hash_mb: 16,
                    threads,
                    cache_kind,
                    ..EngineConfig::default()
                });
                let limits = SearchLimits::depth(*depth);
                let id = format!("{name}_d{depth}_{cache_kind:?}_t{threads}");

                group.bench_function(BenchmarkId::from_parameter(id), |b| {
                    b.iter(|| {
                        // Each iteration starts cold so runs are comparable.
                        context.new_game();
                        let result = search(
                            &context,
                            black_box(position),
                            &limits,
                            &MaterialEvaluator,
                            |_| {},
                        );
                        assert!(result.best_move.is_some());
                        black_box(result.score)
                    });
                });
            }
        }
    }

    group.finish();
}

criterion_group!(search_benches, bench_fixed_depth);
criterion_main!(search_benches);
