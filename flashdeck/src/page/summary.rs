use cardsight::{Session, Speed, export::Export};
use chrono::Local;
use crossterm::event::{Event, KeyCode};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span, ToSpan},
    widgets::{Bar, BarChart, BarGroup, Block, List, ListState, Paragraph},
};

use super::Message;
use crate::{
    app::AppTrainer,
    config::{Config, theme::PlotTheme},
    page,
    utils::{ROUNDED_BLOCK, center, decrement_index, increment_index, seconds},
};

/// Where the summary was opened from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Right after the last card of a drill
    Drill,
    /// Viewing an entry of the history
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Cards,
    Chart,
}

/// Page: Summary
///
/// Statistics of one session and the time taken for every card, as a list or
/// as a bar chart.
#[derive(Debug)]
pub struct Summary {
    session: Session,
    origin: Origin,
    view_mode: ViewMode,
    selected: usize,
    notice: Option<String>,
}

impl Summary {
    /// Summary of a drill that just finished
    pub const fn finished(session: Session) -> Self {
        Self {
            session,
            origin: Origin::Drill,
            view_mode: ViewMode::Cards,
            selected: 0,
            notice: None,
        }
    }

    /// Details of a stored session
    pub const fn review(session: Session) -> Self {
        Self {
            session,
            origin: Origin::History,
            view_mode: ViewMode::Cards,
            selected: 0,
            notice: None,
        }
    }
}

// Rendering logic
impl Summary {
    pub fn render(&self, frame: &mut Frame, area: Rect, config: &Config, _trainer: &AppTrainer) {
        let area = center(area, Constraint::Percentage(80), Constraint::Percentage(90));
        let theme = &config.settings.theme;

        let [stats_area, cards_area, notice_area] = Layout::vertical([
            Constraint::Length(8),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let date = self.session.date.with_timezone(&Local);
        let title = match self.origin {
            Origin::Drill => "Session Complete".to_span().bold(),
            Origin::History => {
                Span::from(format!("Session of {}", date.format("%Y-%m-%d %H:%M"))).bold()
            }
        };

        let stat_line = |label: &'static str, value: f64| {
            Line::from(vec![
                Span::raw(format!("{label:<10}")),
                Span::styled(
                    seconds(value),
                    Style::new().fg(theme.speed.color(Speed::classify(value))),
                ),
            ])
        };

        let mut stats = vec![Line::raw(format!(
            "{:<10}{} of {}",
            "Cards",
            self.session.cards.len(),
            self.session.total_cards
        ))];
        match self.session.statistics() {
            Some(summary) => {
                stats.push(Line::raw(format!("{:<10}{}", "Total", seconds(summary.total))));
                stats.push(stat_line("Average", summary.average));
                stats.push(stat_line("Best", summary.best));
                stats.push(stat_line("Worst", summary.worst));
            }
            None => stats.push(Line::raw("No cards were timed")),
        }

        frame.render_widget(
            Paragraph::new(stats).block(ROUNDED_BLOCK.title(title)),
            stats_area,
        );

        match self.view_mode {
            ViewMode::Cards => self.render_cards(frame, cards_area, config),
            ViewMode::Chart => self.render_chart(frame, cards_area, config),
        }

        if let Some(notice) = &self.notice {
            frame.render_widget(
                Paragraph::new(notice.as_str())
                    .style(Style::new().fg(theme.text.success))
                    .block(Block::new())
                    .centered(),
                notice_area,
            );
        }
    }

    fn render_cards(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let theme = &config.settings.theme;
        let items = self.session.cards.iter().enumerate().map(|(i, timing)| {
            let card_style = if timing.card.is_red() {
                Style::new().fg(theme.card.red_suit)
            } else {
                Style::new()
            };
            Line::from(vec![
                Span::raw(format!("{:>3}. ", i + 1)),
                Span::styled(format!("{:<4}", timing.card.to_string()), card_style),
                Span::styled(
                    format!("{:>8}", seconds(timing.elapsed)),
                    Style::new().fg(theme.speed.color(timing.speed())),
                ),
            ])
        });

        let list = List::new(items)
            .highlight_style(Style::new().fg(theme.text.highlight).reversed())
            .block(ROUNDED_BLOCK.title("Cards".to_span().bold()));
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_chart(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let block = ROUNDED_BLOCK.title("Time per card".to_span().bold());
        let inner = block.inner(area);
        let (bar_width, bar_gap) = bar_layout(inner.width, self.session.cards.len());
        let bars = card_bars(&self.session, &config.settings.theme.plot, bar_width >= 3);

        let chart = BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(bar_gap)
            .block(block);
        frame.render_widget(chart, area);
    }

    pub fn render_top(&self, _config: &Config) -> Option<Line<'_>> {
        let view = match self.view_mode {
            ViewMode::Cards => "<Tab> chart",
            ViewMode::Chart => "<Tab> list",
        };
        Some(Line::raw(match self.origin {
            Origin::Drill => format!(
                "<Enter> new session | {view} | <e> export | <h> history | <Esc> menu"
            ),
            Origin::History => format!("<Esc> back | {view} | <e> export"),
        }))
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
            let count = self.session.cards.len();
            match (key.code, self.origin) {
                (KeyCode::Up | KeyCode::Char('k'), _) => decrement_index(&mut self.selected, count),
                (KeyCode::Down | KeyCode::Char('j'), _) => {
                    increment_index(&mut self.selected, count)
                }
                (KeyCode::Tab, _) => self.toggle_view(),
                (KeyCode::Char('e'), _) => return self.export(config),
                (KeyCode::Enter | KeyCode::Char('n'), Origin::Drill) => {
                    trainer.reset();
                    return match trainer.start(&mut rand::thread_rng()) {
                        Ok(()) => Some(Message::Show(page::Drill::new().into())),
                        Err(error) => Some(Message::Error(Box::new(error))),
                    };
                }
                (KeyCode::Char('h'), Origin::Drill) => {
                    trainer.reset();
                    return Some(Message::Show(page::History::new().into()));
                }
                (KeyCode::Esc, Origin::Drill) => return Some(Message::Reset),
                (KeyCode::Esc | KeyCode::Backspace, Origin::History) => {
                    return Some(Message::Show(page::History::new().into()));
                }
                _ => (),
            }
        }

        None
    }

    fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Cards => ViewMode::Chart,
            ViewMode::Chart => ViewMode::Cards,
        };
    }

    fn export(&mut self, config: &Config) -> Option<Message> {
        match Export::session(&self.session).write_to(&config.export_dir) {
            Ok(path) => {
                self.notice = Some(format!("Exported to {}", path.display()));
                None
            }
            Err(error) => Some(Message::Error(Box::new(error))),
        }
    }
}

/// Bar width and gap that fit `count` bars into `width` columns
fn bar_layout(width: u16, count: usize) -> (u16, u16) {
    let count = u16::try_from(count.max(1)).unwrap_or(u16::MAX);
    let gap = if count.saturating_mul(2) > width { 0 } else { 1 };
    let bar_width = ((width + gap) / count).saturating_sub(gap).clamp(1, 6);
    (bar_width, gap)
}

/// One bar per card, height in hundredths of a second, colored by speed band
fn card_bars(session: &Session, theme: &PlotTheme, labeled: bool) -> Vec<Bar<'static>> {
    session
        .cards
        .iter()
        .map(|timing| {
            let color = theme.band_color(timing.elapsed);
            let bar = Bar::default()
                .value((timing.elapsed * 100.0).round() as u64)
                .text_value(format!("{:.1}", timing.elapsed))
                .style(Style::new().fg(color))
                .value_style(Style::new().fg(color).reversed());
            if labeled {
                bar.label(Line::from(timing.card.to_string()))
            } else {
                bar
            }
        })
        .collect()
}
