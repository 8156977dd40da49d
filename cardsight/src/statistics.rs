use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Card, Rank, Seconds, Suit};

/// Below this a card counts as recognized quickly
pub const GOOD_THRESHOLD: Seconds = 1.0;

/// Below this (and at or above [`GOOD_THRESHOLD`]) a card counts as medium
pub const MEDIUM_THRESHOLD: Seconds = 2.0;

/// How long a single card took to recognize
///
/// Created when the card is dismissed and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TimingRecord", into = "TimingRecord")]
pub struct CardTiming {
    pub card: Card,
    pub elapsed: Seconds,
    pub timestamp: DateTime<Utc>,
}

impl CardTiming {
    pub fn new(card: Card, elapsed: Seconds) -> Self {
        Self {
            card,
            elapsed: elapsed.max(0.0),
            timestamp: Utc::now(),
        }
    }

    pub fn speed(&self) -> Speed {
        Speed::classify(self.elapsed)
    }
}

/// On-disk shape of a [`CardTiming`]
///
/// `card` is written for readability and ignored on read. The aliases accept
/// records written by older versions of the trainer.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimingRecord {
    #[serde(default, skip_deserializing)]
    card: String,
    #[serde(alias = "value")]
    rank: Rank,
    suit: Suit,
    #[serde(alias = "recognitionTime", alias = "time")]
    elapsed_seconds: Seconds,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl From<TimingRecord> for CardTiming {
    fn from(record: TimingRecord) -> Self {
        Self {
            card: Card::new(record.rank, record.suit),
            elapsed: record.elapsed_seconds.max(0.0),
            timestamp: record.timestamp,
        }
    }
}

impl From<CardTiming> for TimingRecord {
    fn from(timing: CardTiming) -> Self {
        Self {
            card: timing.card.to_string(),
            rank: timing.card.rank,
            suit: timing.card.suit,
            elapsed_seconds: timing.elapsed,
            timestamp: timing.timestamp,
        }
    }
}

/// Speed classification of a recognition time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Speed {
    Good,
    Medium,
    Slow,
}

impl Speed {
    /// Classifies an elapsed time with the fixed 1s / 2s thresholds
    pub fn classify(elapsed: Seconds) -> Self {
        if elapsed < GOOD_THRESHOLD {
            Self::Good
        } else if elapsed < MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Slow
        }
    }
}

/// Aggregate timings of a session
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Statistics {
    /// Sum of all elapsed times
    pub total: Seconds,
    /// `total / count`
    pub average: Seconds,
    /// Fastest card
    pub best: Seconds,
    /// Slowest card
    pub worst: Seconds,
}

impl Statistics {
    /// Calculate statistics over a list of timings
    ///
    /// Always recomputed from the full list, so the result is the same no
    /// matter how the list came to be. Returns `None` for an empty list.
    ///
    /// ```rust
    /// use cardsight::{Card, CardTiming, Rank, Statistics, Suit};
    ///
    /// let card = Card::new(Rank::Ace, Suit::Spades);
    /// let timings = [2.0, 1.0, 3.0].map(|t| CardTiming::new(card, t));
    ///
    /// let stats = Statistics::calculate(&timings).unwrap();
    /// assert_eq!(stats.average, 2.0);
    /// ```
    pub fn calculate(timings: &[CardTiming]) -> Option<Self> {
        Self::from_elapsed(timings.iter().map(|timing| timing.elapsed))
    }

    /// Calculate statistics over raw elapsed times
    pub fn from_elapsed(elapsed: impl IntoIterator<Item = Seconds>) -> Option<Self> {
        let mut count = 0usize;
        let mut total = 0.0;
        let mut best = Seconds::INFINITY;
        let mut worst = Seconds::NEG_INFINITY;

        for value in elapsed {
            count += 1;
            total += value;
            best = best.min(value);
            worst = worst.max(value);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            total,
            average: total / count as Seconds,
            best,
            worst,
        })
    }

    /// Speed class of the session average
    pub fn speed(&self) -> Speed {
        Speed::classify(self.average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timings(elapsed: &[Seconds]) -> Vec<CardTiming> {
        let card = Card::new(Rank::Seven, Suit::Hearts);
        elapsed.iter().map(|&t| CardTiming::new(card, t)).collect()
    }

    #[test]
    fn test_statistics_calculation() {
        let stats = Statistics::calculate(&timings(&[2.0, 1.0, 3.0])).unwrap();
        assert_eq!(stats.total, 6.0);
        assert_eq!(stats.average, 2.0);
        assert_eq!(stats.best, 1.0);
        assert_eq!(stats.worst, 3.0);
    }

    #[test]
    fn test_statistics_empty() {
        assert!(Statistics::calculate(&[]).is_none());
    }

    #[test]
    fn test_statistics_idempotent() {
        let list = timings(&[0.42, 1.7, 0.93, 2.2, 1.01]);
        let first = Statistics::calculate(&list);
        let second = Statistics::calculate(&list);
        assert_eq!(first, second);
    }

    #[test]
    fn test_statistics_invariants() {
        let list = timings(&[0.5, 1.2, 2.1, 0.8, 1.9]);
        let stats = Statistics::calculate(&list).unwrap();

        assert!((stats.average * list.len() as Seconds - stats.total).abs() < 1e-9);
        assert!(stats.best <= stats.average && stats.average <= stats.worst);
    }

    #[test]
    fn test_speed_thresholds() {
        assert_eq!(Speed::classify(0.0), Speed::Good);
        assert_eq!(Speed::classify(0.999), Speed::Good);
        assert_eq!(Speed::classify(1.0), Speed::Medium);
        assert_eq!(Speed::classify(1.999), Speed::Medium);
        assert_eq!(Speed::classify(2.0), Speed::Slow);
        assert_eq!(Speed::classify(7.5), Speed::Slow);
    }

    #[test]
    fn test_negative_elapsed_is_clamped() {
        let timing = CardTiming::new(Card::new(Rank::Two, Suit::Clubs), -0.1);
        assert_eq!(timing.elapsed, 0.0);
    }

    #[test]
    fn test_timing_record_format() {
        let timing = CardTiming::new(Card::new(Rank::Ten, Suit::Diamonds), 1.5);
        let value = serde_json::to_value(&timing).unwrap();

        assert_eq!(value["card"], "10♦");
        assert_eq!(value["rank"], "10");
        assert_eq!(value["suit"], "♦");
        assert_eq!(value["elapsedSeconds"], 1.5);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_timing_record_legacy_fields() {
        let legacy = r#"{
            "card": "As Pik",
            "suit": "♠",
            "value": "A",
            "recognitionTime": 0.87,
            "timestamp": "2025-01-12T10:15:00.000Z",
            "someFutureField": true
        }"#;

        let timing: CardTiming = serde_json::from_str(legacy).unwrap();
        assert_eq!(timing.card, Card::new(Rank::Ace, Suit::Spades));
        assert_eq!(timing.elapsed, 0.87);
    }
}
