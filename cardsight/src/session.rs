//! # Session Module - Drill Sessions and Their Lifecycle
//!
//! This module holds the [`Session`] record, one drill of N cards with every
//! recorded timing, and the [`Drill`] state machine that produces it.
//!
//! ## Session Lifecycle
//!
#![doc = simple_mermaid::mermaid!("../diagrams/session_lifecycle.mmd")]
//!
//! ## Presenting and Dismissing
//!
//! The UI decides when a card is actually visible. It calls
//! [`Drill::present`] at that moment, which starts the card's timer, and
//! [`Drill::dismiss`] when the user signals recognition. Any visual pause
//! between two cards therefore never counts towards a card's time.
//!
//! ```rust
//! use cardsight::{Drill, Progress, Settings, timer::ManualClock};
//!
//! let clock = ManualClock::new();
//! let mut drill = Drill::with_clock(clock.clone());
//!
//! let mut settings = Settings::default();
//! settings.set_card_count(2);
//! drill.start(&settings, &mut rand::thread_rng()).unwrap();
//!
//! drill.present().unwrap();
//! clock.advance_secs(0.5);
//! assert!(matches!(drill.dismiss(), Ok(Progress::Next)));
//!
//! drill.present().unwrap();
//! clock.advance_secs(1.5);
//! let Ok(Progress::Finished(session)) = drill.dismiss() else { panic!() };
//! assert_eq!(session.statistics().unwrap().total, 2.0);
//! ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use web_time::Duration;

use crate::statistics::{CardTiming, Statistics};
use crate::timer::{Clock, Recorder, TimerHandle};
use crate::{Card, Seconds, Settings, deck};

/// One drill of N cards and the time each card took
///
/// The timing list is the source of truth. The cached summary is written
/// when the session finishes so history views don't have to recompute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SessionRecord", into = "SessionRecord")]
pub struct Session {
    pub id: String,
    pub date: DateTime<Utc>,
    pub total_cards: usize,
    pub cards: Vec<CardTiming>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    summary: Option<Statistics>,
}

impl Session {
    /// Creates an empty session expecting `total_cards` timings
    ///
    /// The id is derived from the creation time in milliseconds.
    pub fn new(total_cards: usize) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            date: now,
            total_cards,
            cards: Vec::with_capacity(total_cards),
            start_time: Some(now),
            end_time: None,
            summary: None,
        }
    }

    /// Appends a timing for `card`. Earlier timings are never touched.
    pub fn record(&mut self, card: Card, elapsed: Seconds) -> &CardTiming {
        let index = self.cards.len();
        self.cards.push(CardTiming::new(card, elapsed));
        &self.cards[index]
    }

    /// Statistics computed from the recorded timings
    ///
    /// Falls back to the cached summary for records that carry no timings.
    pub fn statistics(&self) -> Option<Statistics> {
        Statistics::calculate(&self.cards).or(self.summary)
    }

    /// The summary cached when the session finished
    pub const fn cached_statistics(&self) -> Option<Statistics> {
        self.summary
    }

    /// Average recognition time, if any card was recorded
    pub fn average_time(&self) -> Option<Seconds> {
        self.statistics().map(|stats| stats.average)
    }

    pub const fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// True when every expected card has a timing
    pub fn is_complete(&self) -> bool {
        self.cards.len() == self.total_cards
    }

    /// Stamps the end time and caches the summary
    fn finish(&mut self) {
        self.end_time = Some(Utc::now());
        self.summary = Statistics::calculate(&self.cards);
    }
}

/// On-disk shape of a [`Session`]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    #[serde(alias = "sessionId")]
    id: String,
    date: DateTime<Utc>,
    total_cards: usize,
    #[serde(default)]
    cards: Vec<CardTiming>,
    #[serde(default, deserialize_with = "lenient_time")]
    start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_time")]
    end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_time: Option<Seconds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    average_time: Option<Seconds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    best_time: Option<Seconds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    worst_time: Option<Seconds>,
}

/// Older records stored monotonic milliseconds instead of timestamps
fn lenient_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|time| time.with_timezone(&Utc)))
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        let summary = match (
            record.total_time,
            record.average_time,
            record.best_time,
            record.worst_time,
        ) {
            (Some(total), Some(average), Some(best), Some(worst)) => Some(Statistics {
                total,
                average,
                best,
                worst,
            }),
            _ => None,
        };

        Self {
            id: record.id,
            date: record.date,
            total_cards: record.total_cards,
            cards: record.cards,
            start_time: record.start_time,
            end_time: record.end_time,
            summary,
        }
    }
}

impl From<Session> for SessionRecord {
    fn from(session: Session) -> Self {
        let summary = session.summary;
        Self {
            id: session.id,
            date: session.date,
            total_cards: session.total_cards,
            cards: session.cards,
            start_time: session.start_time,
            end_time: session.end_time,
            total_time: summary.map(|s| s.total),
            average_time: summary.map(|s| s.average),
            best_time: summary.map(|s| s.best),
            worst_time: summary.map(|s| s.worst),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DrillError {
    #[error("Select at least one suit")]
    NoSuitsSelected,

    #[error("A session needs at least one card")]
    EmptySession,

    #[error("A session is already running")]
    AlreadyActive,

    #[error("No session is running")]
    NotActive,

    #[error("The current card has not been shown yet")]
    NotPresented,
}

/// Result of dismissing a card
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// More cards remain
    Next,
    /// That was the last card
    Finished(Session),
}

#[derive(Debug)]
struct Active {
    deck: Vec<Card>,
    index: usize,
    session: Session,
    timer: Option<TimerHandle>,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Active(Box<Active>),
    Finished(Box<Session>),
}

/// The drill state machine
///
/// `Idle -> Active -> Finished -> Idle`. All drill state lives here rather
/// than in the UI, which only calls in and renders what it reads back.
#[derive(Debug, Default)]
pub struct Drill {
    state: State,
    recorder: Recorder,
}

impl Drill {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a drill that reads time from `clock`
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            state: State::Idle,
            recorder: Recorder::new(clock),
        }
    }

    /// Starts a new session from the given settings
    ///
    /// Rejected without any state change when no suit is selected, when the
    /// session length is zero, or while another session is running. The card
    /// count is clamped to what the selected suits can provide.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        settings: &Settings,
        rng: &mut R,
    ) -> Result<(), DrillError> {
        if self.is_active() {
            return Err(DrillError::AlreadyActive);
        }

        let suits = settings.selected_suits();
        if suits.is_empty() {
            return Err(DrillError::NoSuitsSelected);
        }

        let count = settings.card_count().min(crate::max_cards(suits.len()));
        if count == 0 {
            return Err(DrillError::EmptySession);
        }

        let deck = deck::generate(&suits, count, rng);
        tracing::info!(cards = deck.len(), suits = suits.len(), "session started");

        self.state = State::Active(Box::new(Active {
            session: Session::new(deck.len()),
            deck,
            index: 0,
            timer: None,
        }));

        Ok(())
    }

    /// Shows the current card and starts its timer
    ///
    /// Presenting an already presented card returns it again without
    /// restarting the timer.
    pub fn present(&mut self) -> Result<Card, DrillError> {
        let State::Active(active) = &mut self.state else {
            return Err(DrillError::NotActive);
        };

        if active.timer.is_none() {
            active.timer = Some(self.recorder.start());
        }

        Ok(active.deck[active.index])
    }

    /// Records the current card's time and moves on
    pub fn dismiss(&mut self) -> Result<Progress, DrillError> {
        let State::Active(active) = &mut self.state else {
            return Err(DrillError::NotActive);
        };

        let timer = active.timer.take().ok_or(DrillError::NotPresented)?;
        let elapsed = self.recorder.stop(timer);
        let card = active.deck[active.index];

        active.session.record(card, elapsed);
        active.index += 1;
        tracing::debug!(%card, elapsed, "card dismissed");

        if active.index < active.deck.len() {
            return Ok(Progress::Next);
        }

        let State::Active(active) = std::mem::take(&mut self.state) else {
            unreachable!("state was checked to be active above");
        };

        let mut session = active.session;
        session.finish();
        tracing::info!(
            id = %session.id,
            cards = session.cards.len(),
            average = session.average_time().unwrap_or_default(),
            "session finished"
        );

        self.state = State::Finished(Box::new(session.clone()));
        Ok(Progress::Finished(session))
    }

    /// Abandons the running session
    ///
    /// The deck and every timing so far are discarded. Returns true if there
    /// was anything to abandon.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }

        if let State::Active(active) = &self.state {
            tracing::info!(
                recorded = active.session.cards.len(),
                total = active.deck.len(),
                "session cancelled"
            );
        }

        self.state = State::Idle;
        true
    }

    /// Leaves the finished screen
    pub fn reset(&mut self) {
        if let State::Finished(_) = self.state {
            self.state = State::Idle;
        }
    }

    /// The last finished session, while it is still on screen
    pub fn finished(&self) -> Option<&Session> {
        match &self.state {
            State::Finished(session) => Some(session),
            _ => None,
        }
    }

    pub const fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    pub const fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// True while the current card's timer is running
    pub fn is_presented(&self) -> bool {
        matches!(&self.state, State::Active(active) if active.timer.is_some())
    }

    /// The card awaiting recognition
    pub fn current_card(&self) -> Option<Card> {
        match &self.state {
            State::Active(active) => active.deck.get(active.index).copied(),
            _ => None,
        }
    }

    /// Zero-based index of the current card and the deck size
    pub fn position(&self) -> Option<(usize, usize)> {
        match &self.state {
            State::Active(active) => Some((active.index, active.deck.len())),
            _ => None,
        }
    }

    /// Cards in the running or finished session
    pub fn total(&self) -> Option<usize> {
        match &self.state {
            State::Active(active) => Some(active.deck.len()),
            State::Finished(session) => Some(session.total_cards),
            State::Idle => None,
        }
    }

    /// Timings recorded in the running or finished session
    pub fn timings(&self) -> &[CardTiming] {
        match &self.state {
            State::Active(active) => &active.session.cards,
            State::Finished(session) => &session.cards,
            State::Idle => &[],
        }
    }

    /// Statistics over the timings recorded so far
    pub fn live_statistics(&self) -> Option<Statistics> {
        Statistics::calculate(self.timings())
    }

    /// How long the current card has been on screen
    pub fn current_elapsed(&self) -> Option<Duration> {
        match &self.state {
            State::Active(active) => active
                .timer
                .as_ref()
                .map(|timer| self.recorder.elapsed(timer)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Suit;
    use crate::timer::ManualClock;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn settings(suits: &[Suit], count: usize) -> Settings {
        let mut settings = Settings::default();
        for suit in Suit::all() {
            if settings.is_selected(suit) != suits.contains(&suit) {
                settings.toggle_suit(suit);
            }
        }
        settings.set_card_count(count);
        settings
    }

    fn run(drill: &mut Drill, clock: &ManualClock, times: &[Seconds]) -> Option<Session> {
        for &time in times {
            drill.present().unwrap();
            clock.advance_secs(time);
            if let Progress::Finished(session) = drill.dismiss().unwrap() {
                return Some(session);
            }
        }
        None
    }

    #[test]
    fn test_full_session() {
        let clock = ManualClock::new();
        let mut drill = Drill::with_clock(clock.clone());
        let mut rng = StdRng::seed_from_u64(5);

        drill
            .start(&settings(&[Suit::Spades, Suit::Hearts], 5), &mut rng)
            .unwrap();
        assert!(drill.is_active());
        assert_eq!(drill.position(), Some((0, 5)));

        let session = run(&mut drill, &clock, &[0.5, 1.2, 2.1, 0.8, 1.9]).unwrap();

        let cards: HashSet<_> = session.cards.iter().map(|t| t.card).collect();
        assert_eq!(cards.len(), 5);
        assert!(
            cards
                .iter()
                .all(|c| matches!(c.suit, Suit::Spades | Suit::Hearts))
        );

        let stats = session.statistics().unwrap();
        assert!((stats.total - 6.5).abs() < 1e-6);
        assert!((stats.average - 1.3).abs() < 1e-6);
        assert!((stats.best - 0.5).abs() < 1e-6);
        assert!((stats.worst - 2.1).abs() < 1e-6);

        assert!(session.is_finished());
        assert!(session.is_complete());
        assert_eq!(session.cached_statistics(), Some(stats));
        assert_eq!(drill.finished(), Some(&session));
    }

    #[test]
    fn test_start_rejects_empty_suits() {
        let mut drill = Drill::new();
        let result = drill.start(&settings(&[], 5), &mut StdRng::seed_from_u64(1));
        assert_eq!(result, Err(DrillError::NoSuitsSelected));
        assert!(drill.is_idle());
    }

    #[test]
    fn test_start_rejects_while_active() {
        let mut drill = Drill::new();
        let mut rng = StdRng::seed_from_u64(1);
        drill.start(&Settings::default(), &mut rng).unwrap();
        assert_eq!(
            drill.start(&Settings::default(), &mut rng),
            Err(DrillError::AlreadyActive)
        );
    }

    #[test]
    fn test_dismiss_requires_presented_card() {
        let mut drill = Drill::new();
        assert_eq!(drill.dismiss(), Err(DrillError::NotActive));

        drill
            .start(&Settings::default(), &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert_eq!(drill.dismiss(), Err(DrillError::NotPresented));
        assert!(drill.timings().is_empty());
    }

    #[test]
    fn test_transition_delay_is_not_timed() {
        let clock = ManualClock::new();
        let mut drill = Drill::with_clock(clock.clone());
        drill
            .start(&settings(&[Suit::Clubs], 2), &mut StdRng::seed_from_u64(3))
            .unwrap();

        drill.present().unwrap();
        clock.advance_secs(1.0);
        drill.dismiss().unwrap();

        // Pause before the next card becomes visible
        clock.advance_secs(0.3);

        drill.present().unwrap();
        clock.advance_secs(0.25);
        drill.present().unwrap();
        clock.advance_secs(0.25);
        drill.dismiss().unwrap();

        let times: Vec<_> = drill.timings().iter().map(|t| t.elapsed).collect();
        assert_eq!(times, vec![1.0, 0.5]);
    }

    #[test]
    fn test_cancel_discards_session() {
        let clock = ManualClock::new();
        let mut drill = Drill::with_clock(clock.clone());
        drill
            .start(&settings(&[Suit::Diamonds], 3), &mut StdRng::seed_from_u64(4))
            .unwrap();

        assert!(run(&mut drill, &clock, &[0.7]).is_none());
        assert!(drill.cancel());
        assert!(drill.is_idle());
        assert!(drill.timings().is_empty());
        assert!(drill.finished().is_none());
        assert!(!drill.cancel());
    }

    #[test]
    fn test_restart_from_finished() {
        let clock = ManualClock::new();
        let mut drill = Drill::with_clock(clock.clone());
        let mut rng = StdRng::seed_from_u64(9);
        let settings = settings(&[Suit::Hearts], 1);

        drill.start(&settings, &mut rng).unwrap();
        run(&mut drill, &clock, &[0.4]).unwrap();
        assert!(drill.finished().is_some());

        drill.start(&settings, &mut rng).unwrap();
        assert!(drill.is_active());
        assert!(drill.timings().is_empty());

        drill.cancel();
        drill.reset();
        assert!(drill.is_idle());
    }

    #[test]
    fn test_live_statistics() {
        let clock = ManualClock::new();
        let mut drill = Drill::with_clock(clock.clone());
        drill
            .start(&settings(&[Suit::Spades], 4), &mut StdRng::seed_from_u64(8))
            .unwrap();

        assert!(drill.live_statistics().is_none());
        run(&mut drill, &clock, &[1.0, 3.0]);
        let stats = drill.live_statistics().unwrap();
        assert_eq!(stats.average, 2.0);
        assert_eq!(drill.position(), Some((2, 4)));
    }

    #[test]
    fn test_record_returns_new_timing() {
        let mut session = Session::new(2);
        session.record(Card::new(crate::Rank::Two, Suit::Clubs), 0.7);

        let queen = Card::new(crate::Rank::Queen, Suit::Diamonds);
        let timing = session.record(queen, 1.9);
        assert_eq!(timing.card, queen);
        assert_eq!(timing.elapsed, 1.9);
        assert_eq!(session.cards.len(), 2);
    }

    #[test]
    fn test_session_record_format() {
        let mut session = Session::new(2);
        session.record(Card::new(crate::Rank::Ace, Suit::Spades), 0.5);
        session.record(Card::new(crate::Rank::King, Suit::Hearts), 1.5);
        session.finish();

        let value = serde_json::to_value(&session).unwrap();
        for key in [
            "id",
            "date",
            "totalCards",
            "cards",
            "startTime",
            "endTime",
            "totalTime",
            "averageTime",
            "bestTime",
            "worstTime",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["averageTime"], 1.0);

        let parsed: Session = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_session_record_legacy() {
        let legacy = r#"{
            "sessionId": "1736676900000",
            "date": "2025-01-12T10:15:00.000Z",
            "totalCards": 1,
            "cards": [{"suit": "♥", "value": "Q", "time": 1.25}],
            "startTime": 10342.5,
            "endTime": null,
            "averageTime": 1.25
        }"#;

        let session: Session = serde_json::from_str(legacy).unwrap();
        assert_eq!(session.id, "1736676900000");
        assert_eq!(session.start_time, None);
        assert_eq!(session.cached_statistics(), None);
        assert_eq!(session.average_time(), Some(1.25));
    }
}
