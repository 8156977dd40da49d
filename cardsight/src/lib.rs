//! # cardsight - Playing Card Recognition Analytics
//!
//! The engine behind a flash-card drill for recognizing playing cards quickly.
//! It builds shuffled decks, times every card shown, aggregates per-session
//! statistics, keeps a bounded history of finished sessions, and fits a trend
//! line over that history.
//!
//! ## Quick Start
//!
//! ```rust
//! use cardsight::{Progress, Settings, Suit, Trainer, storage::MemoryStorage};
//!
//! let mut settings = Settings::default();
//! settings.set_card_count(3);
//!
//! let mut trainer = Trainer::new(MemoryStorage::default(), settings).unwrap();
//! trainer.start(&mut rand::thread_rng()).unwrap();
//!
//! loop {
//!     let card = trainer.present().unwrap();
//!     println!("Showing {card}");
//!     if let Progress::Finished(session) = trainer.dismiss().unwrap() {
//!         println!("Average: {:.2}s", session.statistics().unwrap().average);
//!         break;
//!     }
//! }
//!
//! assert_eq!(trainer.history().len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`card`]: suits, ranks and cards
//! - [`deck`]: deck generation and shuffling
//! - [`timer`]: monotonic per-card timing
//! - [`statistics`]: per-card timings and session aggregates
//! - [`session`]: session records and the drill state machine
//! - [`history`]: bounded, persisted session history
//! - [`trend`]: polynomial trend fitting over the history
//! - [`settings`]: persisted user settings
//! - [`storage`]: the key-value store everything persists through
//! - [`export`]: JSON export artifacts

pub mod card;
pub mod config;
pub mod deck;
pub mod export;
pub mod history;
pub mod session;
pub mod settings;
pub mod statistics;
pub mod storage;
pub mod timer;
pub mod trainer;
pub mod trend;

pub use card::{Card, Rank, Suit};
pub use config::Configuration;
pub use history::History;
pub use session::{Drill, DrillError, Progress, Session};
pub use settings::Settings;
pub use statistics::{CardTiming, Speed, Statistics};
pub use trainer::{Trainer, TrainerError};
pub use trend::{Polynomial, SessionFilter, TrendError, TrendReport};

/// Elapsed time in seconds
pub type Seconds = f64;

/// Number of ranks in a single suit
pub const RANKS_PER_SUIT: usize = 13;

/// Number of cards in a full deck
pub const FULL_DECK: usize = 52;

/// Largest session length possible with the given amount of suits
pub const fn max_cards(suit_count: usize) -> usize {
    suit_count * RANKS_PER_SUIT
}
