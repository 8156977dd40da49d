use std::hint::black_box;

use cardsight::trend::{SessionFilter, TrendReport, fit};
use cardsight::{Card, Rank, Session, Suit};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn points(count: usize) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            // A slowly improving average with some wobble
            (x, 2.5 - 0.02 * x + 0.15 * (x * 0.7).sin())
        })
        .collect()
}

fn history(count: usize) -> Vec<Session> {
    points(count)
        .into_iter()
        .rev()
        .map(|(x, average)| {
            let mut session = Session::new(if x as usize % 3 == 0 { 52 } else { 10 });
            session.record(Card::new(Rank::Seven, Suit::Hearts), average);
            session
        })
        .collect()
}

fn benchmark_polynomial_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("polynomial_fit");

    let test_cases = vec![
        (10, 1),  // Few sessions, straight line
        (50, 2),  // Full history, default degree
        (50, 4),  // Full history, high degree
        (500, 2), // Long history
    ];

    for (count, degree) in test_cases {
        let data = points(count);
        group.bench_with_input(
            BenchmarkId::new("fit", format!("{count}points_degree{degree}")),
            &(data, degree),
            |b, (data, degree)| b.iter(|| fit(black_box(data), black_box(*degree))),
        );
    }

    group.finish();
}

fn benchmark_trend_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend_report");

    let filters = vec![
        ("all", SessionFilter::default()),
        ("full_deck", SessionFilter::default().with_full_deck_only(true)),
        ("range", SessionFilter::default().with_min(5).with_max(20)),
    ];

    let sessions = history(50);
    for (name, filter) in filters {
        group.bench_with_input(BenchmarkId::new("analyze", name), &filter, |b, filter| {
            b.iter(|| TrendReport::analyze(black_box(&sessions), black_box(filter), 2))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_polynomial_fit, benchmark_trend_report);
criterion_main!(benches);
