use cardsight::{Settings, Suit};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, List, Paragraph, Wrap},
};

use super::Message;
use crate::{
    app::AppTrainer,
    config::Config,
    page,
    utils::{center, centered_padding, decrement_index, increment_index},
};

/// Cards added or removed by a large step
const LARGE_STEP: usize = 5;

/// An entry in the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Suit(Suit),
    CardCount,
    FocusMode,
    Vibration,
    Start,
    History,
    Quit,
}

impl Item {
    fn all() -> Vec<Self> {
        Suit::all()
            .into_iter()
            .map(Self::Suit)
            .chain([
                Self::CardCount,
                Self::FocusMode,
                Self::Vibration,
                Self::Start,
                Self::History,
                Self::Quit,
            ])
            .collect()
    }

    fn label(self, settings: &Settings) -> String {
        let check = |on: bool| if on { "[x]" } else { "[ ]" };
        match self {
            Self::Suit(suit) => {
                format!("{} {suit} {}", check(settings.is_selected(suit)), suit.name())
            }
            Self::CardCount => format!(
                "Cards: < {} >  (max {})",
                settings.card_count(),
                settings.max_cards()
            ),
            Self::FocusMode => format!("{} Focus mode", check(settings.focus_mode())),
            Self::Vibration => format!("{} Bell on finish", check(settings.vibration_enabled())),
            Self::Start => "Start session".to_string(),
            Self::History => "History & trends".to_string(),
            Self::Quit => "Quit".to_string(),
        }
    }
}

/// Page: Main menu
#[derive(Debug)]
pub struct Menu {
    items: Vec<Item>,
    index: usize,
    /// Why the last start attempt was rejected
    rejection: Option<String>,
}

impl Menu {
    /// Creates a new menu
    pub fn new() -> Self {
        let items = Item::all();
        // Start with the cursor on "Start session"
        let index = items
            .iter()
            .position(|item| *item == Item::Start)
            .unwrap_or_default();

        Self {
            items,
            index,
            rejection: None,
        }
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

// Rendering logic
impl Menu {
    pub fn render(&self, frame: &mut Frame, area: Rect, config: &Config, trainer: &AppTrainer) {
        let area = center(area, Constraint::Percentage(80), Constraint::Percentage(80));
        let theme = &config.settings.theme;
        let settings = trainer.settings();

        let items = self.items.iter().enumerate().map(|(i, item)| {
            let mut selector = "  ";
            let style = if i == self.index {
                selector = "> ";
                Style::new().fg(theme.text.highlight).reversed()
            } else {
                Style::new()
            };

            let mut line = Line::from(Span::styled(
                format!("{selector}{}", item.label(settings)),
                style,
            ));
            if let Item::Suit(suit) = item
                && suit.is_red()
                && i != self.index
            {
                line = line.fg(theme.card.red_suit);
            }
            line
        });

        let list = List::new(items);
        let list_height = list.len() as u16 + 1;

        let [list_area, message_area] =
            Layout::vertical([Constraint::Min(list_height), Constraint::Length(3)]).areas(area);

        let padding = centered_padding(list_area, Some(list_height), None);
        let list_area = Block::new().padding(padding).inner(list_area);
        frame.render_widget(list.block(Block::new().title("Card Recognition".bold())), list_area);

        if let Some(rejection) = &self.rejection {
            let message = Paragraph::new(Line::styled(
                rejection.as_str(),
                Style::new().bold().fg(theme.text.error),
            ))
            .wrap(Wrap { trim: true })
            .centered();
            frame.render_widget(message, message_area);
        }
    }

    pub fn render_top(&self, _config: &Config) -> Option<Line<'_>> {
        Some(Line::raw(
            "<Enter/Space> select | <Left/Right> cards | <s> start | <h> history",
        ))
    }

    pub fn handle_events(
        &mut self,
        event: &Event,
        _config: &Config,
        trainer: &mut AppTrainer,
    ) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
        {
            self.rejection = None;
            return self.handle_key(key, trainer);
        }

        None
    }
}

// Event handlers
impl Menu {
    fn handle_key(&mut self, key: &KeyEvent, trainer: &mut AppTrainer) -> Option<Message> {
        let item = self.items[self.index];

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => decrement_index(&mut self.index, self.items.len()),
            KeyCode::Down | KeyCode::Char('j') => {
                increment_index(&mut self.index, self.items.len())
            }
            KeyCode::Right | KeyCode::Char('+') if item == Item::CardCount => {
                let step = Self::step(key);
                return Self::update(trainer, |settings| {
                    settings.set_card_count(settings.card_count().saturating_add(step));
                });
            }
            KeyCode::Left | KeyCode::Char('-') if item == Item::CardCount => {
                let step = Self::step(key);
                return Self::update(trainer, |settings| {
                    settings.set_card_count(settings.card_count().saturating_sub(step));
                });
            }
            KeyCode::Char('s') => return self.start(trainer),
            KeyCode::Char('h') => return Some(Message::Show(page::History::new().into())),
            KeyCode::Esc => return Some(Message::Quit),
            KeyCode::Enter | KeyCode::Char(' ') => return self.select(item, trainer),
            _ => (),
        }

        None
    }

    fn step(key: &KeyEvent) -> usize {
        if key.modifiers.contains(KeyModifiers::SHIFT) {
            LARGE_STEP
        } else {
            1
        }
    }

    fn select(&mut self, item: Item, trainer: &mut AppTrainer) -> Option<Message> {
        match item {
            Item::Suit(suit) => Self::update(trainer, |settings| settings.toggle_suit(suit)),
            Item::FocusMode => Self::update(trainer, |settings| {
                settings.set_focus_mode(!settings.focus_mode());
            }),
            Item::Vibration => Self::update(trainer, |settings| {
                settings.set_vibration(!settings.vibration_enabled());
            }),
            Item::CardCount => None,
            Item::Start => self.start(trainer),
            Item::History => Some(Message::Show(page::History::new().into())),
            Item::Quit => Some(Message::Quit),
        }
    }

    fn update(trainer: &mut AppTrainer, change: impl FnOnce(&mut Settings)) -> Option<Message> {
        trainer
            .update_settings(change)
            .err()
            .map(|error| Message::Warn(error.to_string()))
    }

    fn start(&mut self, trainer: &mut AppTrainer) -> Option<Message> {
        match trainer.start(&mut rand::thread_rng()) {
            Ok(()) => Some(Message::Show(page::Drill::new().into())),
            Err(error) => {
                tracing::debug!(%error, "session start rejected");
                self.rejection = Some(error.to_string());
                None
            }
        }
    }
}
