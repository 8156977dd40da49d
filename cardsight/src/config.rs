//! # Configuration Module - Runtime Behavior Settings
//!
//! Options that shape how the engine keeps history and analyzes trends. These
//! are application-level choices, as opposed to [`Settings`](crate::Settings),
//! which the user changes from the menu.
//!
//! ## Usage
//!
//! ```rust
//! use cardsight::config::Configuration;
//!
//! // Use default configuration
//! let config = Configuration::default();
//! assert_eq!(config.history_capacity, 50);
//!
//! // Keep a shorter history and fit straight lines
//! let config = Configuration {
//!     history_capacity: 20,
//!     trend_degree: 1,
//!     ..Configuration::default()
//! };
//! ```

use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Default upper bound on the amount of stored sessions
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Default delay between dismissing a card and showing the next
pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(300);

/// Runtime configuration for the drill engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Maximum amount of sessions kept in the history
    ///
    /// Appending beyond this evicts the oldest sessions.
    ///
    /// **Default**: 50
    pub history_capacity: usize,

    /// Degree of the polynomial fitted over session averages
    ///
    /// **Default**: 2 (a parabola)
    pub trend_degree: usize,

    /// Pause between dismissing a card and presenting the next one
    ///
    /// Purely visual. The timer for a card only starts once it is presented,
    /// so this never counts towards the measured time.
    ///
    /// **Default**: 300ms
    #[serde(with = "millis")]
    pub transition_delay: Duration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            trend_degree: 2,
            transition_delay: DEFAULT_TRANSITION_DELAY,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use web_time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
