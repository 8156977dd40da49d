//! Suits, ranks and cards.
//!
//! Cards serialize to the same compact strings users see on screen: ranks by
//! their label (`"A"`, `"10"`, `"K"`) and suits by their symbol (`"♠"`).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// One of the four French suits
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum Suit {
    #[serde(rename = "♠")]
    #[strum(serialize = "♠")]
    Spades,
    #[serde(rename = "♥")]
    #[strum(serialize = "♥")]
    Hearts,
    #[serde(rename = "♦")]
    #[strum(serialize = "♦")]
    Diamonds,
    #[serde(rename = "♣")]
    #[strum(serialize = "♣")]
    Clubs,
}

impl Suit {
    /// All suits, in display order
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// Hearts and diamonds are red
    pub const fn is_red(self) -> bool {
        matches!(self, Self::Hearts | Self::Diamonds)
    }

    /// Spoken name of the suit
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spades => "Spades",
            Self::Hearts => "Hearts",
            Self::Diamonds => "Diamonds",
            Self::Clubs => "Clubs",
        }
    }
}

/// One of the thirteen ranks, ace low
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum Rank {
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    Ace,
    #[serde(rename = "2")]
    #[strum(serialize = "2")]
    Two,
    #[serde(rename = "3")]
    #[strum(serialize = "3")]
    Three,
    #[serde(rename = "4")]
    #[strum(serialize = "4")]
    Four,
    #[serde(rename = "5")]
    #[strum(serialize = "5")]
    Five,
    #[serde(rename = "6")]
    #[strum(serialize = "6")]
    Six,
    #[serde(rename = "7")]
    #[strum(serialize = "7")]
    Seven,
    #[serde(rename = "8")]
    #[strum(serialize = "8")]
    Eight,
    #[serde(rename = "9")]
    #[strum(serialize = "9")]
    Nine,
    #[serde(rename = "10")]
    #[strum(serialize = "10")]
    Ten,
    #[serde(rename = "J")]
    #[strum(serialize = "J")]
    Jack,
    #[serde(rename = "Q")]
    #[strum(serialize = "Q")]
    Queen,
    #[serde(rename = "K")]
    #[strum(serialize = "K")]
    King,
}

/// A single playing card
///
/// Identity is the `(rank, suit)` pair. Displays as rank followed by suit,
/// e.g. `10♥`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn is_red(&self) -> bool {
        self.suit.is_red()
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}
