use std::fmt::Display;

use crossterm::event::{Event, KeyCode};
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Style, Stylize},
    text::Line,
    widgets::{Block, Padding, Paragraph, Wrap},
};

use super::Message;
use crate::{
    config::Config,
    utils::center,
};

/// Page: Error
///
/// Displays an error
#[derive(Debug)]
pub struct Error(String);

impl<E: Display> From<E> for Error {
    fn from(value: E) -> Self {
        Self(value.to_string())
    }
}

/// Rendering logic
impl Error {
    pub fn render(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let center = center(area, Constraint::Percentage(80), Constraint::Percentage(80));

        let mut lines = vec![
            Line::styled(
                "[Error]",
                Style::new().bold().fg(config.settings.theme.text.error),
            )
            .centered(),
        ];

        lines.extend(self.message_lines());

        let text = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::new().padding(Padding::new(0, 0, center.height / 2, 0)));

        frame.render_widget(text, center);
    }

    fn message_lines(&self) -> Vec<Line<'static>> {
        self.0
            .lines()
            .map(|line| Line::from(line.to_string()).centered())
            .collect()
    }

    pub fn render_top(&self, _config: &Config) -> Option<Line<'_>> {
        Some(Line::from("<Enter> to return to menu"))
    }

    pub fn handle_events(&self, event: &Event, _config: &Config) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
            && matches!(key.code, KeyCode::Enter | KeyCode::Esc)
        {
            return Some(Message::Reset);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsight::history::HistoryError;

    #[test]
    fn test_message_lines() {
        let page = Error::from("Failed to export\nDisk full");
        let lines = page.message_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].to_string(), "Failed to export");
        assert_eq!(lines[1].to_string(), "Disk full");

        let page = Error::from(HistoryError::Skipped { skipped: 2 });
        assert_eq!(
            page.message_lines()[0].to_string(),
            "Skipped 2 unreadable sessions in the stored history"
        );
    }
}
