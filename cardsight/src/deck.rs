//! Deck generation.
//!
//! A session deck is the cross product of the selected suits and all ranks,
//! shuffled with Fisher-Yates and cut down to the session length.

use rand::Rng;
use strum::IntoEnumIterator;

use crate::{Card, Rank, Suit};

/// The ordered 52-card deck
pub fn full_deck() -> Vec<Card> {
    ordered(&Suit::all())
}

/// Builds a shuffled deck of `count` cards drawn from `suits`
///
/// Duplicate suits are ignored. A `count` larger than the available cards
/// yields every available card; clamping the session length is the caller's
/// job.
///
/// ```rust
/// use cardsight::{Suit, deck::generate};
///
/// let deck = generate(&[Suit::Spades, Suit::Hearts], 5, &mut rand::thread_rng());
/// assert_eq!(deck.len(), 5);
/// ```
pub fn generate<R: Rng + ?Sized>(suits: &[Suit], count: usize, rng: &mut R) -> Vec<Card> {
    let mut deck = ordered(suits);
    shuffle(&mut deck, rng);
    deck.truncate(count);
    deck
}

/// Uniform in-place Fisher-Yates shuffle
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

fn ordered(suits: &[Suit]) -> Vec<Card> {
    let mut unique = suits.to_vec();
    unique.sort();
    unique.dedup();

    unique
        .into_iter()
        .flat_map(|suit| Rank::iter().map(move |rank| Card::new(rank, suit)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn test_full_deck_is_unique() {
        let deck = full_deck();
        assert_eq!(deck.len(), crate::FULL_DECK);
        assert_eq!(deck.iter().collect::<HashSet<_>>().len(), crate::FULL_DECK);
    }

    #[test]
    fn test_deck_completeness() {
        let mut rng = StdRng::seed_from_u64(7);
        let suit_sets = [
            vec![Suit::Spades],
            vec![Suit::Hearts, Suit::Clubs],
            vec![Suit::Spades, Suit::Hearts, Suit::Diamonds],
            Suit::all(),
        ];

        for suits in suit_sets {
            let max = crate::max_cards(suits.len());
            for count in [0, 1, max / 2, max] {
                let deck = generate(&suits, count, &mut rng);
                assert_eq!(deck.len(), count);

                let unique: HashSet<_> = deck.iter().collect();
                assert_eq!(unique.len(), count, "deck contains duplicates");
                assert!(deck.iter().all(|card| suits.contains(&card.suit)));
            }
        }
    }

    #[test]
    fn test_count_beyond_bound_yields_whole_deck() {
        let mut rng = StdRng::seed_from_u64(1);
        let deck = generate(&[Suit::Diamonds], 40, &mut rng);
        assert_eq!(deck.len(), 13);
    }

    #[test]
    fn test_duplicate_suits_are_ignored() {
        let mut rng = StdRng::seed_from_u64(3);
        let deck = generate(&[Suit::Clubs, Suit::Clubs], 26, &mut rng);
        assert_eq!(deck.len(), 13);
    }

    #[test]
    fn test_shuffle_changes_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let deck = generate(&Suit::all(), 52, &mut rng);
        assert_ne!(deck, full_deck());
    }

    #[test]
    fn test_shuffle_uniformity() {
        // Position distribution of every card over many shuffles of a
        // 13-card deck, checked with a chi-square statistic per card.
        const TRIALS: usize = 13_000;
        const SIZE: usize = 13;

        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let reference = full_deck()[..SIZE].to_vec();
        let mut counts = [[0usize; SIZE]; SIZE];

        for _ in 0..TRIALS {
            let mut deck = reference.clone();
            shuffle(&mut deck, &mut rng);
            for (position, card) in deck.iter().enumerate() {
                let card_index = reference.iter().position(|c| c == card).unwrap();
                counts[card_index][position] += 1;
            }
        }

        let expected = TRIALS as f64 / SIZE as f64;
        for row in counts {
            let chi_square: f64 = row
                .iter()
                .map(|&observed| {
                    let diff = observed as f64 - expected;
                    diff * diff / expected
                })
                .sum();
            // 12 degrees of freedom, p = 0.0001 critical value is 37.95
            assert!(chi_square < 37.95, "chi-square too high: {chi_square}");
        }
    }
}
