//! User settings: which suits to drill, how many cards, and display flags.
//!
//! Settings are loaded once at startup and saved after every change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{SETTINGS_KEY, Storage, StorageError};
use crate::{Suit, max_cards};

/// Session length used when nothing is stored
pub const DEFAULT_CARD_COUNT: usize = 10;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode settings: {0}")]
    Encode(serde_json::Error),
}

/// User-facing drill settings
///
/// Mutate through the methods, which keep the card count within what the
/// selected suits can provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    card_count: usize,
    selected_suits: Vec<Suit>,
    focus_mode: bool,
    vibration_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            card_count: DEFAULT_CARD_COUNT,
            selected_suits: Suit::all(),
            focus_mode: false,
            vibration_enabled: true,
        }
    }
}

impl Settings {
    /// Loads settings from `storage`
    ///
    /// Missing or unreadable settings fall back to the defaults.
    pub fn load<S: Storage>(storage: &S) -> Result<Self, SettingsError> {
        let Some(content) = storage.read(SETTINGS_KEY)? else {
            return Ok(Self::default());
        };

        let settings = serde_json::from_str::<Self>(&content)
            .map(Self::normalized)
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "stored settings are invalid, using defaults");
                Self::default()
            });

        Ok(settings)
    }

    /// Writes the settings to `storage`
    pub fn save<S: Storage>(&self, storage: &mut S) -> Result<(), SettingsError> {
        let json = serde_json::to_string(self).map_err(SettingsError::Encode)?;
        storage.write(SETTINGS_KEY, &json)?;
        Ok(())
    }

    pub const fn card_count(&self) -> usize {
        self.card_count
    }

    /// Selected suits in display order, without duplicates
    pub fn selected_suits(&self) -> Vec<Suit> {
        Suit::all()
            .into_iter()
            .filter(|suit| self.selected_suits.contains(suit))
            .collect()
    }

    pub fn is_selected(&self, suit: Suit) -> bool {
        self.selected_suits.contains(&suit)
    }

    /// Largest session length the selected suits allow
    pub fn max_cards(&self) -> usize {
        max_cards(self.selected_suits().len())
    }

    pub const fn focus_mode(&self) -> bool {
        self.focus_mode
    }

    pub const fn vibration_enabled(&self) -> bool {
        self.vibration_enabled
    }

    /// Sets the session length, clamped to `1..=max_cards`
    pub fn set_card_count(&mut self, count: usize) {
        self.card_count = count.clamp(1, self.max_cards().max(1));
    }

    /// Selects or deselects a suit
    ///
    /// Deselecting may leave no suit selected; starting a session then fails
    /// validation. The card count shrinks along with the available cards.
    pub fn toggle_suit(&mut self, suit: Suit) {
        if let Some(position) = self.selected_suits.iter().position(|s| *s == suit) {
            self.selected_suits.remove(position);
        } else {
            self.selected_suits.push(suit);
        }

        let max = self.max_cards();
        if max > 0 && self.card_count > max {
            self.card_count = max;
        }
    }

    pub const fn set_focus_mode(&mut self, enabled: bool) {
        self.focus_mode = enabled;
    }

    pub const fn set_vibration(&mut self, enabled: bool) {
        self.vibration_enabled = enabled;
    }

    fn normalized(mut self) -> Self {
        self.selected_suits = self.selected_suits();
        let max = self.max_cards();
        if self.card_count == 0 {
            self.card_count = DEFAULT_CARD_COUNT;
        }
        if max > 0 {
            self.card_count = self.card_count.min(max);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.card_count(), 10);
        assert_eq!(settings.selected_suits().len(), 4);
        assert_eq!(settings.max_cards(), 52);
        assert!(!settings.focus_mode());
        assert!(settings.vibration_enabled());
    }

    #[test]
    fn test_card_count_is_clamped() {
        let mut settings = Settings::default();
        settings.set_card_count(100);
        assert_eq!(settings.card_count(), 52);
        settings.set_card_count(0);
        assert_eq!(settings.card_count(), 1);
    }

    #[test]
    fn test_toggle_suit_shrinks_count() {
        let mut settings = Settings::default();
        settings.set_card_count(40);

        settings.toggle_suit(Suit::Clubs);
        assert_eq!(settings.card_count(), 39);
        settings.toggle_suit(Suit::Diamonds);
        assert_eq!(settings.card_count(), 26);

        settings.toggle_suit(Suit::Diamonds);
        assert!(settings.is_selected(Suit::Diamonds));
        assert_eq!(settings.card_count(), 26);
    }

    #[test]
    fn test_all_suits_can_be_deselected() {
        let mut settings = Settings::default();
        for suit in Suit::all() {
            settings.toggle_suit(suit);
        }
        assert!(settings.selected_suits().is_empty());
        assert_eq!(settings.max_cards(), 0);
        assert_eq!(settings.card_count(), 10);
    }

    #[test]
    fn test_persisted_format() {
        let mut storage = MemoryStorage::default();
        let mut settings = Settings::default();
        settings.toggle_suit(Suit::Clubs);
        settings.set_focus_mode(true);
        settings.save(&mut storage).unwrap();

        let json = storage.read(SETTINGS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cardCount"], 10);
        assert_eq!(value["selectedSuits"], serde_json::json!(["♠", "♥", "♦"]));
        assert_eq!(value["focusMode"], true);
        assert_eq!(value["vibrationEnabled"], true);

        assert_eq!(Settings::load(&storage).unwrap(), settings);
    }

    #[test]
    fn test_load_missing_and_partial() {
        let mut storage = MemoryStorage::default();
        assert_eq!(Settings::load(&storage).unwrap(), Settings::default());

        storage
            .write(SETTINGS_KEY, r#"{"cardCount":30,"selectedSuits":["♥"]}"#)
            .unwrap();
        let settings = Settings::load(&storage).unwrap();
        assert_eq!(settings.card_count(), 13);
        assert_eq!(settings.selected_suits(), vec![Suit::Hearts]);
        assert!(settings.vibration_enabled());
    }

    #[test]
    fn test_load_invalid_falls_back() {
        let mut storage = MemoryStorage::default();
        storage.write(SETTINGS_KEY, "not json").unwrap();
        assert_eq!(Settings::load(&storage).unwrap(), Settings::default());
    }
}
