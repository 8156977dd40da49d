use cardsight::{Card, Progress};
use crossterm::event::{Event, KeyCode};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Paragraph},
};
use web_time::Instant;

use super::Message;
use crate::{
    app::{self, AppTrainer},
    config::Config,
    page,
    utils::{center, seconds},
};

/// Size of the drawn card, borders included
const CARD_WIDTH: u16 = 13;
const CARD_HEIGHT: u16 = 9;

/// Page: Drill
///
/// Shows one card at a time. A card is presented (and its timer started) only
/// once the transition pause after the previous card has passed.
#[derive(Debug)]
pub struct Drill {
    /// When the next card should appear, while between cards
    show_at: Option<Instant>,
}

impl Drill {
    /// Creates a drill page for a freshly started session
    pub fn new() -> Self {
        Self {
            show_at: Some(Instant::now()),
        }
    }
}

impl Default for Drill {
    fn default() -> Self {
        Self::new()
    }
}

/// The lines of a card face
fn card_face(card: Card) -> Vec<Line<'static>> {
    let inner = usize::from(CARD_WIDTH - 2);
    let rank = card.rank.to_string();
    let suit = card.suit.to_string();

    let left = |text: &str| format!(" {text:<width$}", width = inner - 1);
    let right = |text: &str| format!("{text:>width$} ", width = inner - 1);
    let middle = |text: &str| format!("{text:^inner$}");

    [
        left(&rank),
        left(&suit),
        String::new(),
        middle(&format!("{rank}{suit}")),
        String::new(),
        right(&suit),
        right(&rank),
    ]
    .into_iter()
    .map(|line| Line::raw(format!("{line:<inner$}")))
    .collect()
}

// Rendering logic
impl Drill {
    pub fn render(&self, frame: &mut Frame, area: Rect, config: &Config, trainer: &AppTrainer) {
        let theme = &config.settings.theme;
        let focused = trainer.settings().focus_mode();

        let [card_area, progress_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(2)]).areas(area);

        if trainer.drill().is_presented()
            && let Some(card) = trainer.current_card()
        {
            let face = theme.card.face(theme);
            let block = Block::bordered()
                .border_type(BorderType::Rounded)
                .style(Style::new().bg(face).fg(theme.card.suit(card.suit, theme)).bold());

            let card_area = center(
                card_area,
                Constraint::Length(CARD_WIDTH),
                Constraint::Length(CARD_HEIGHT),
            );
            frame.render_widget(Paragraph::new(card_face(card)).block(block), card_area);
        }

        if focused {
            return;
        }

        if let Some((index, total)) = trainer.position() {
            let shown = (index + 1).min(total);
            let progress = Paragraph::new(vec![
                Line::raw(format!("Card {shown} of {total}")),
                Line::styled(
                    "<Space/Enter> recognized | <Esc> cancel",
                    Style::new().fg(theme.text.highlight),
                ),
            ])
            .centered();
            frame.render_widget(progress, progress_area);
        }
    }

    pub fn render_top(&self, config: &Config, trainer: &AppTrainer) -> Option<Line<'_>> {
        if trainer.settings().focus_mode() {
            return None;
        }

        let current = trainer
            .current_elapsed()
            .map(|elapsed| seconds(elapsed.as_secs_f64()))
            .unwrap_or_default();

        let stats = trainer
            .live_statistics()
            .map(|stats| {
                format!(
                    "avg {} | best {} | worst {}",
                    seconds(stats.average),
                    seconds(stats.best),
                    seconds(stats.worst)
                )
            })
            .unwrap_or_default();

        Some(Line::styled(
            format!("{current:>7} {stats}"),
            Style::new().fg(config.settings.theme.text.highlight),
        ))
    }

    pub fn poll(&mut self, _config: &Config, trainer: &mut AppTrainer) -> Option<Message> {
        if !trainer.drill().is_active() {
            return Some(Message::Reset);
        }

        if let Some(show_at) = self.show_at
            && Instant::now() >= show_at
        {
            self.show_at = None;
            if let Err(error) = trainer.present() {
                return Some(Message::Error(Box::new(error)));
            }
        }

        None
    }

    pub fn handle_events(
        &mut self,
        event: &Event,
        config: &Config,
        trainer: &mut AppTrainer,
    ) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
        {
            match key.code {
                KeyCode::Char(' ') | KeyCode::Enter if trainer.drill().is_presented() => {
                    return self.dismiss(config, trainer);
                }
                KeyCode::Esc => {
                    trainer.cancel();
                    return Some(Message::Reset);
                }
                _ => (),
            }
        }

        None
    }

    fn dismiss(&mut self, config: &Config, trainer: &mut AppTrainer) -> Option<Message> {
        match trainer.dismiss() {
            Ok(Progress::Next) => {
                self.show_at = Some(Instant::now() + config.settings.engine.transition_delay);
                None
            }
            Ok(Progress::Finished(session)) => {
                if trainer.settings().vibration_enabled() {
                    app::bell();
                }
                Some(Message::Show(page::Summary::finished(session).into()))
            }
            Err(error) => Some(Message::Error(Box::new(error))),
        }
    }
}
