use std::hint::black_box;

use cardsight::statistics::{CardTiming, Statistics};
use cardsight::{Card, Suit, deck};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};

fn benchmark_deck_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("deck_generation");

    let test_cases = vec![
        (vec![Suit::Spades], 5),  // Single suit, short session
        (vec![Suit::Spades, Suit::Hearts], 20),
        (Suit::all(), 10),        // Default settings
        (Suit::all(), 52),        // Full deck
    ];

    for (suits, count) in test_cases {
        group.bench_with_input(
            BenchmarkId::new("generate", format!("{}suits_{count}cards", suits.len())),
            &(suits, count),
            |b, (suits, count)| {
                let mut rng = StdRng::seed_from_u64(42);
                b.iter(|| deck::generate(black_box(suits), black_box(*count), &mut rng))
            },
        );
    }

    group.finish();
}

fn benchmark_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffle");

    group.bench_function("full_deck", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cards = deck::full_deck();
        b.iter(|| deck::shuffle(black_box(&mut cards), &mut rng))
    });

    group.finish();
}

fn benchmark_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_statistics");

    for count in [10, 52, 520] {
        let cards: Vec<Card> = deck::full_deck().into_iter().cycle().take(count).collect();
        let timings: Vec<CardTiming> = cards
            .into_iter()
            .enumerate()
            .map(|(i, card)| CardTiming::new(card, 0.5 + (i % 7) as f64 * 0.3))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("calculate", format!("{count}cards")),
            &timings,
            |b, timings| b.iter(|| Statistics::calculate(black_box(timings))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_deck_generation,
    benchmark_shuffle,
    benchmark_statistics
);
criterion_main!(benches);
