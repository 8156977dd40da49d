use cardsight::{
    Seconds, SessionFilter, TrendReport,
    export::{Export, ExportError},
};
use chrono::{DateTime, Local, Utc};
use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span, ToSpan},
    widgets::{Axis, Chart, Dataset, GraphType, List, ListState, Paragraph, Wrap},
};

use super::Message;
use crate::{
    app::AppTrainer,
    config::{Config, theme::PlotTheme},
    page,
    utils::{ROUNDED_BLOCK, center, decrement_index, increment_index, seconds},
};

/// Sessions exported by "export latest" unless changed
const DEFAULT_LATEST: usize = 10;

/// Points the trend line is drawn with
const TREND_SAMPLES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    List,
    Trends,
}

/// A destructive action waiting for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Delete(usize),
    Clear,
}

/// Page: History
///
/// Lists stored sessions and shows the trend of their averages.
#[derive(Debug)]
pub struct History {
    selected: usize,
    view_mode: ViewMode,
    filter: SessionFilter,
    latest: usize,
    pending: Option<Pending>,
    notice: Option<String>,
}

impl History {
    pub fn new() -> Self {
        Self {
            selected: 0,
            view_mode: ViewMode::List,
            filter: SessionFilter::default(),
            latest: DEFAULT_LATEST,
            pending: None,
            notice: None,
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

// Rendering logic
impl History {
    pub fn render(&self, frame: &mut Frame, area: Rect, config: &Config, trainer: &AppTrainer) {
        let area = center(area, Constraint::Percentage(90), Constraint::Percentage(90));

        let [content_area, notice_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        match self.view_mode {
            ViewMode::List => self.render_list_view(frame, content_area, config, trainer),
            ViewMode::Trends => self.render_trends_view(frame, content_area, config, trainer),
        }

        let theme = &config.settings.theme.text;
        let notice = match (self.pending, &self.notice) {
            (Some(Pending::Delete(index)), _) => Some(Line::styled(
                format!("Delete session #{}? <y> yes | <n> no", index + 1),
                Style::new().bold().fg(theme.warning),
            )),
            (Some(Pending::Clear), _) => Some(Line::styled(
                format!(
                    "Delete all {} sessions? <y> yes | <n> no",
                    trainer.history().len()
                ),
                Style::new().bold().fg(theme.warning),
            )),
            (None, Some(notice)) => Some(Line::styled(
                notice.as_str(),
                Style::new().fg(theme.success),
            )),
            (None, None) => None,
        };

        if let Some(notice) = notice {
            frame.render_widget(Paragraph::new(notice).centered(), notice_area);
        }
    }

    fn render_list_view(
        &self,
        frame: &mut Frame,
        area: Rect,
        config: &Config,
        trainer: &AppTrainer,
    ) {
        let sessions = trainer.history().all();
        let theme = &config.settings.theme;

        if sessions.is_empty() {
            let no_data = Paragraph::new(
                "No sessions saved yet.\nComplete a drill to see your history here.",
            )
            .block(ROUNDED_BLOCK.title("Session History".to_span().bold()))
            .centered();
            frame.render_widget(no_data, area);
            return;
        }

        let [list_area, detail_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(area);

        let items = sessions.iter().enumerate().map(|(i, session)| {
            let average = session.average_time();
            let average_span = average.map_or_else(
                || Span::raw(format!("{:>8}", "-")),
                |average| {
                    Span::styled(
                        format!("{:>8}", seconds(average)),
                        Style::new().fg(theme.plot.band_color(average)),
                    )
                },
            );

            Line::from(vec![
                Span::raw(format!(
                    "{:>3}. {}  {:>2} cards ",
                    i + 1,
                    format_date(session.date),
                    session.total_cards
                )),
                average_span,
            ])
        });

        let list = List::new(items)
            .highlight_style(Style::new().fg(theme.text.highlight).reversed())
            .highlight_symbol("> ")
            .block(ROUNDED_BLOCK.title(
                format!(
                    "Session History ({}/{})",
                    sessions.len(),
                    trainer.history().capacity()
                )
                .bold(),
            ));
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, list_area, &mut state);

        if let Some(session) = trainer.history().get(self.selected) {
            let mut lines = vec![
                Line::raw(format!("Date:    {}", format_date(session.date))),
                Line::raw(format!(
                    "Cards:   {} of {}",
                    session.cards.len(),
                    session.total_cards
                )),
            ];

            if let Some(stats) = session.statistics() {
                lines.extend([
                    Line::raw(format!("Total:   {}", seconds(stats.total))),
                    Line::raw(format!("Average: {}", seconds(stats.average))),
                    Line::raw(format!("Best:    {}", seconds(stats.best))),
                    Line::raw(format!("Worst:   {}", seconds(stats.worst))),
                ]);
            }

            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "<Enter> view cards",
                Style::new().fg(theme.text.highlight),
            ));

            frame.render_widget(
                Paragraph::new(lines)
                    .wrap(Wrap { trim: false })
                    .block(ROUNDED_BLOCK.title("Details".to_span().bold())),
                detail_area,
            );
        }
    }

    fn render_trends_view(
        &self,
        frame: &mut Frame,
        area: Rect,
        config: &Config,
        trainer: &AppTrainer,
    ) {
        let [chart_area, info_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(area);

        let filter_line = self.filter_line();

        let report = match trainer.trend(&self.filter) {
            Ok(report) => report,
            Err(error) => {
                let no_data = Paragraph::new(vec![
                    Line::raw(error.to_string()),
                    Line::raw("Complete more sessions or widen the filter to see your progress."),
                ])
                .wrap(Wrap { trim: true })
                .block(ROUNDED_BLOCK.title("Trends".to_span().bold()))
                .centered();
                frame.render_widget(no_data, chart_area);
                frame.render_widget(Paragraph::new(filter_line).centered(), info_area);
                return;
            }
        };

        let plot = &config.settings.theme.plot;

        // One scatter set per color band
        let mut bands: Vec<Vec<(f64, f64)>> = vec![Vec::new(); plot.bands.len()];
        for &(x, y) in &report.points {
            bands[PlotTheme::band(y)].push((x, y));
        }

        let trend_line = report.trend.as_ref().map(|curve| {
            let last = (report.len() - 1) as f64;
            (0..=TREND_SAMPLES)
                .map(|i| {
                    let x = last * i as f64 / TREND_SAMPLES as f64;
                    (x, curve.evaluate(x))
                })
                .collect::<Vec<_>>()
        });

        let best = [report.best_point()];
        let worst = [report.worst_point()];

        let mut datasets: Vec<Dataset> = bands
            .iter()
            .zip(&plot.bands)
            .filter(|(points, _)| !points.is_empty())
            .map(|(points, &color)| {
                Dataset::default()
                    .marker(plot.scatter_symbol.as_marker())
                    .graph_type(GraphType::Scatter)
                    .style(Style::new().fg(color))
                    .data(points)
            })
            .collect();

        if let Some(line) = &trend_line {
            datasets.push(
                Dataset::default()
                    .name("Trend")
                    .marker(plot.line_symbol.as_marker())
                    .graph_type(GraphType::Line)
                    .style(Style::new().fg(plot.trend))
                    .data(line),
            );
        }

        datasets.push(
            Dataset::default()
                .name("Best")
                .marker(plot.scatter_symbol.as_marker())
                .graph_type(GraphType::Scatter)
                .style(Style::new().fg(plot.best).bold())
                .data(&best),
        );
        datasets.push(
            Dataset::default()
                .name("Worst")
                .marker(plot.scatter_symbol.as_marker())
                .graph_type(GraphType::Scatter)
                .style(Style::new().fg(plot.worst).bold())
                .data(&worst),
        );

        let [y_min, y_max] = y_bounds(&report, trend_line.as_deref());
        let x_max = (report.len() - 1).max(1) as f64;

        let chart = Chart::new(datasets)
            .block(ROUNDED_BLOCK.title("Average Recognition Time".to_span().bold()))
            .x_axis(
                Axis::default()
                    .title("Sessions")
                    .style(Style::default().fg(Color::Gray))
                    .labels(["1".to_string(), report.len().to_string()])
                    .bounds([0.0, x_max]),
            )
            .y_axis(
                Axis::default()
                    .title("Seconds")
                    .style(Style::default().fg(Color::Gray))
                    .labels([format!("{y_min:.1}"), format!("{y_max:.1}")])
                    .bounds([y_min, y_max]),
            );

        frame.render_widget(chart, chart_area);

        let text = &config.settings.theme.text;
        let improvement = report.improvement_percent;
        let improvement_color = if improvement >= 0.0 {
            text.success
        } else {
            text.error
        };
        let (_, best_time) = report.best_point();
        let (_, worst_time) = report.worst_point();

        let info = vec![
            Line::from(vec![
                Span::raw("Improvement: "),
                Span::styled(
                    format!("{improvement:+.1}%"),
                    Style::new().bold().fg(improvement_color),
                ),
                Span::raw(format!(
                    "  |  Best: #{} {}  |  Worst: #{} {}",
                    report.best + 1,
                    seconds(best_time),
                    report.worst + 1,
                    seconds(worst_time)
                )),
            ]),
            filter_line,
        ];
        frame.render_widget(Paragraph::new(info).centered(), info_area);
    }

    fn filter_line(&self) -> Line<'static> {
        let deck = if self.filter.full_deck_only {
            "full deck only".to_string()
        } else {
            format!("{}-{} cards", self.filter.min_cards, self.filter.max_cards)
        };
        Line::raw(format!(
            "Filter: {deck}  |  <-/+> min  <[/]> max  <f> full deck"
        ))
    }

    pub fn render_top(&self, _config: &Config) -> Option<Line<'_>> {
        Some(Line::raw(match self.view_mode {
            ViewMode::List => format!(
                "<Esc> menu | <Tab> trends | <d> delete | <c> clear | <e> export all | <l> export last {}",
                self.latest
            ),
            ViewMode::Trends => "<Esc> menu | <Tab> list".to_string(),
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
            self.notice = None;

            if let Some(pending) = self.pending.take() {
                return self.handle_confirmation(key, pending, trainer);
            }

            match key.code {
                KeyCode::Esc => return Some(Message::Reset),
                KeyCode::Tab => {
                    self.view_mode = match self.view_mode {
                        ViewMode::List => ViewMode::Trends,
                        ViewMode::Trends => ViewMode::List,
                    };
                }
                _ => {
                    return match self.view_mode {
                        ViewMode::List => self.handle_list_key(key, config, trainer),
                        ViewMode::Trends => {
                            self.handle_trends_key(key);
                            None
                        }
                    };
                }
            }
        }

        None
    }
}

// Event handlers
impl History {
    fn handle_list_key(
        &mut self,
        key: &KeyEvent,
        config: &Config,
        trainer: &mut AppTrainer,
    ) -> Option<Message> {
        let count = trainer.history().len();

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => decrement_index(&mut self.selected, count),
            KeyCode::Down | KeyCode::Char('j') => increment_index(&mut self.selected, count),
            KeyCode::Enter => {
                if let Some(session) = trainer.history().get(self.selected) {
                    return Some(Message::Show(page::Summary::review(session.clone()).into()));
                }
            }
            KeyCode::Char('d') if count > 0 => self.pending = Some(Pending::Delete(self.selected)),
            KeyCode::Char('c') if count > 0 => self.pending = Some(Pending::Clear),
            KeyCode::Char('e') => {
                return self.export(config, Export::all(trainer.history().all()));
            }
            KeyCode::Char('l') => {
                return self.export(config, Export::latest(trainer.history().all(), self.latest));
            }
            KeyCode::Char('+') => self.latest = (self.latest + 1).min(trainer.history().capacity()),
            KeyCode::Char('-') => self.latest = self.latest.saturating_sub(1).max(1),
            _ => (),
        }

        None
    }

    fn handle_trends_key(&mut self, key: &KeyEvent) {
        let filter = self.filter;
        self.filter = match key.code {
            KeyCode::Char('-') => filter.with_min(filter.min_cards.saturating_sub(1)),
            KeyCode::Char('+') => filter.with_min(filter.min_cards + 1),
            KeyCode::Char('[') => filter.with_max(filter.max_cards.saturating_sub(1)),
            KeyCode::Char(']') => filter.with_max(filter.max_cards + 1),
            KeyCode::Char('f') => filter.with_full_deck_only(!filter.full_deck_only),
            _ => filter,
        };
    }

    fn handle_confirmation(
        &mut self,
        key: &KeyEvent,
        pending: Pending,
        trainer: &mut AppTrainer,
    ) -> Option<Message> {
        if !matches!(key.code, KeyCode::Char('y') | KeyCode::Enter) {
            return None;
        }

        let result = match pending {
            Pending::Delete(index) => trainer.delete_session(index).map(|_| ()),
            Pending::Clear => trainer.clear_history(),
        };

        self.selected = self
            .selected
            .min(trainer.history().len().saturating_sub(1));

        match result {
            Ok(()) => {
                self.notice = Some(match pending {
                    Pending::Delete(_) => "Session deleted".to_string(),
                    Pending::Clear => "History cleared".to_string(),
                });
                None
            }
            Err(error) => Some(Message::Warn(error.to_string())),
        }
    }

    fn export(&mut self, config: &Config, export: Result<Export, ExportError>) -> Option<Message> {
        match export.and_then(|export| export.write_to(&config.export_dir)) {
            Ok(path) => {
                self.notice = Some(format!("Exported to {}", path.display()));
                None
            }
            Err(ExportError::NoSessions) => {
                self.notice = Some(ExportError::NoSessions.to_string());
                None
            }
            Err(error) => Some(Message::Error(Box::new(error))),
        }
    }
}

/// Vertical chart bounds covering every point and the trend line, with a margin
fn y_bounds(report: &TrendReport, trend_line: Option<&[(f64, f64)]>) -> [Seconds; 2] {
    let values = report
        .points
        .iter()
        .chain(trend_line.unwrap_or_default())
        .map(|&(_, y)| y);

    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), y| {
        (min.min(y), max.max(y))
    });

    if !min.is_finite() || !max.is_finite() {
        return [0.0, 3.0];
    }

    let margin = ((max - min) * 0.1).max(0.1);
    [(min - margin).max(0.0), max + margin]
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsight::{Card, Rank, Session, Suit};

    fn report(averages: &[f64]) -> TrendReport {
        let sessions: Vec<Session> = averages
            .iter()
            .rev()
            .map(|&average| {
                let mut session = Session::new(10);
                session.record(Card::new(Rank::Two, Suit::Clubs), average);
                session
            })
            .collect();
        TrendReport::analyze(&sessions, &SessionFilter::default(), 2).unwrap()
    }

    #[test]
    fn test_y_bounds_include_margin() {
        let [min, max] = y_bounds(&report(&[1.0, 2.0, 1.5]), None);
        assert!((min - 0.9).abs() < 1e-9);
        assert!((max - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_y_bounds_never_negative() {
        let [min, _] = y_bounds(&report(&[0.05]), Some(&[(0.0, 0.02)]));
        assert_eq!(min, 0.0);
    }

    #[test]
    fn test_trend_filter_keys() {
        let mut page = History::new();
        let key = |c| KeyEvent::from(KeyCode::Char(c));

        page.handle_trends_key(&key('['));
        assert_eq!(page.filter.max_cards, 51);
        page.handle_trends_key(&key('+'));
        assert_eq!(page.filter.min_cards, 2);
        page.handle_trends_key(&key('f'));
        assert!(page.filter.full_deck_only);
    }
}
