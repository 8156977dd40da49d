//! The trainer owns everything a front-end needs: the user's settings, the
//! drill state machine and the session history, all persisting through one
//! [`Storage`].
//!
//! Saving never interrupts a drill. When a write fails the trainer keeps
//! going and holds on to the error until the UI collects it with
//! [`Trainer::take_warning`].

use rand::Rng;
use thiserror::Error;
use web_time::Duration;

use crate::history::HistoryError;
use crate::settings::SettingsError;
use crate::statistics::{CardTiming, Statistics};
use crate::storage::Storage;
use crate::timer::Clock;
use crate::trend::{SessionFilter, TrendError, TrendReport};
use crate::{Card, Configuration, Drill, DrillError, History, Progress, Session, Settings};

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("{0}")]
    History(#[from] HistoryError),

    #[error("{0}")]
    Settings(#[from] SettingsError),
}

#[derive(Debug)]
pub struct Trainer<S: Storage> {
    drill: Drill,
    history: History<S>,
    settings: Settings,
    config: Configuration,
    warning: Option<TrainerError>,
}

impl<S: Storage> Trainer<S> {
    /// Creates a trainer with the given settings and the default configuration
    ///
    /// Any history already in `storage` is loaded.
    pub fn new(storage: S, settings: Settings) -> Result<Self, TrainerError> {
        let config = Configuration::default();
        let history = History::load(storage, config.history_capacity)?;
        Ok(Self::assemble(history, settings, config, Drill::new()))
    }

    /// Loads settings and history from `storage`
    pub fn load(storage: S, config: Configuration) -> Result<Self, TrainerError> {
        let settings = Settings::load(&storage)?;
        let history = History::load(storage, config.history_capacity)?;
        Ok(Self::assemble(history, settings, config, Drill::new()))
    }

    /// Replaces the clock the drill measures with
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.drill = Drill::with_clock(clock);
        self
    }

    fn assemble(
        mut history: History<S>,
        settings: Settings,
        config: Configuration,
        drill: Drill,
    ) -> Self {
        tracing::debug!(
            sessions = history.len(),
            cards = settings.card_count(),
            "trainer ready"
        );
        let warning = history.take_load_warning().map(TrainerError::from);
        Self {
            drill,
            history,
            settings,
            config,
            warning,
        }
    }

    /// Starts a drill with the current settings
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), DrillError> {
        self.drill.start(&self.settings, rng)
    }

    /// Shows the current card, starting its timer
    pub fn present(&mut self) -> Result<Card, DrillError> {
        self.drill.present()
    }

    /// Records the current card and, after the last one, stores the session
    ///
    /// A failure to save the history does not fail the dismissal; it is kept
    /// as a warning instead.
    pub fn dismiss(&mut self) -> Result<Progress, DrillError> {
        let progress = self.drill.dismiss()?;

        if let Progress::Finished(session) = &progress
            && let Err(error) = self.history.append(session.clone())
        {
            self.warning = Some(error.into());
        }

        Ok(progress)
    }

    /// Abandons the running drill without storing anything
    pub fn cancel(&mut self) -> bool {
        self.drill.cancel()
    }

    /// Leaves the finished screen
    pub fn reset(&mut self) {
        self.drill.reset();
    }

    /// The last problem saving data, if any. Collecting it clears it.
    pub fn take_warning(&mut self) -> Option<TrainerError> {
        self.warning.take()
    }

    pub const fn drill(&self) -> &Drill {
        &self.drill
    }

    pub const fn history(&self) -> &History<S> {
        &self.history
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn current_card(&self) -> Option<Card> {
        self.drill.current_card()
    }

    pub fn position(&self) -> Option<(usize, usize)> {
        self.drill.position()
    }

    pub fn timings(&self) -> &[CardTiming] {
        self.drill.timings()
    }

    pub fn live_statistics(&self) -> Option<Statistics> {
        self.drill.live_statistics()
    }

    pub fn current_elapsed(&self) -> Option<Duration> {
        self.drill.current_elapsed()
    }

    /// The session shown after the last card
    pub fn finished(&self) -> Option<&Session> {
        self.drill.finished()
    }

    /// Changes the settings and saves them
    ///
    /// The change is kept even if saving fails.
    pub fn update_settings(
        &mut self,
        change: impl FnOnce(&mut Settings),
    ) -> Result<(), TrainerError> {
        change(&mut self.settings);
        self.settings
            .save(self.history.storage_mut())
            .map_err(|error| {
                tracing::warn!(%error, "failed to save settings");
                error.into()
            })
    }

    /// Deletes one session from the history (0 is the newest)
    pub fn delete_session(&mut self, index: usize) -> Result<Session, TrainerError> {
        Ok(self.history.delete(index)?)
    }

    /// Deletes every stored session
    pub fn clear_history(&mut self) -> Result<(), TrainerError> {
        Ok(self.history.clear()?)
    }

    /// Trend over the history, using the configured polynomial degree
    pub fn trend(&self, filter: &SessionFilter) -> Result<TrendReport, TrendError> {
        TrendReport::analyze(self.history.all(), filter, self.config.trend_degree)
    }
}
