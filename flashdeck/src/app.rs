use std::io::{Write, stdout};
use std::time::Duration;

use cardsight::Trainer;
use cardsight::storage::FileStorage;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use ratatui::{
    Frame,
    style::{Style, Stylize},
    text::{Line, ToLine},
    widgets::Padding,
};

use crate::config::Config;
use crate::page;
use crate::utils::ROUNDED_BLOCK;

/// The trainer the app drives, persisting to the data directory
pub type AppTrainer = Trainer<FileStorage>;

/// How long to wait for input before redrawing
const FRAME_TIME: Duration = Duration::from_millis(16);

/// An app message
pub enum Message {
    /// An error occurred
    Error(Box<dyn std::error::Error + Send>),
    /// Something went wrong, but the current page can carry on
    Warn(String),
    /// Show a specific page
    Show(page::Page),
    /// Reset to the main menu
    Reset,
    /// Quit the application
    Quit,
}

/// The app itself
pub struct App {
    page: page::Page,
    config: Config,
    trainer: AppTrainer,
    status: Option<String>,
}

impl App {
    /// Creates a new `App`
    pub fn new(config: Config, trainer: AppTrainer) -> Self {
        Self {
            page: page::Menu::new().into(),
            config,
            trainer,
            status: None,
        }
    }

    /// Runs the app
    pub fn run(&mut self) -> std::io::Result<()> {
        let mut terminal = ratatui::init();

        execute!(stdout(), Hide)?;

        loop {
            let event = event::poll(FRAME_TIME)?.then(event::read).transpose()?;
            if let Some(message) = self.handle_events(event) {
                match message {
                    Message::Error(error) => {
                        tracing::error!(%error, "showing error page");
                        self.page = page::Error::from(error).into();
                    }
                    Message::Warn(warning) => self.status = Some(warning),
                    Message::Show(page) => self.page = page,
                    Message::Reset => {
                        self.trainer.cancel();
                        self.trainer.reset();
                        self.page = page::Menu::new().into();
                    }
                    Message::Quit => break,
                }
            }

            if let Some(warning) = self.trainer.take_warning() {
                self.status = Some(warning.to_string());
            }

            terminal.draw(|frame| self.draw(frame))?;
        }

        execute!(stdout(), Show)?;
        ratatui::restore();

        Ok(())
    }

    /// Draws the next frame
    fn draw(&mut self, frame: &mut Frame) {
        let focused = self.trainer.settings().focus_mode() && self.trainer.drill().is_active();

        let mut block = ROUNDED_BLOCK.padding(Padding::new(1, 1, 0, 0));

        if !focused {
            block = block
                .title_top("FLASHDECK".to_line().bold().centered())
                .title_top("<CTRL-Q> to exit".to_line().right_aligned());
        }

        if let Some(top_msg) = self.page.render_top(&self.config, &self.trainer) {
            block = block.title_top(top_msg);
        }

        if let Some(status) = &self.status {
            block = block.title_bottom(Line::styled(
                format!(" {status} "),
                Style::new().fg(self.config.settings.theme.text.warning),
            ));
        }

        let area = frame.area();
        let content = block.inner(area);

        frame.render_widget(block, area);

        self.page.render(frame, content, &self.config, &self.trainer);
    }

    /// Global event handler
    fn handle_events(&mut self, event_opt: Option<Event>) -> Option<Message> {
        event_opt
            .and_then(|event| {
                if let Event::Key(key) = event {
                    // Any key acknowledges the last warning
                    self.status = None;
                    if let Some(message) = Self::handle_key_event(key) {
                        return Some(message);
                    }
                }
                self.page
                    .handle_events(&event, &self.config, &mut self.trainer)
            })
            .or_else(|| self.page.poll(&self.config, &mut self.trainer))
    }

    /// Global key events
    const fn handle_key_event(key: KeyEvent) -> Option<Message> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(Message::Quit),
            _ => None,
        }
    }
}

/// Rings the terminal bell, the closest a terminal gets to vibrating
pub fn bell() {
    let mut out = stdout();
    if let Err(error) = out.write_all(b"\x07").and_then(|()| out.flush()) {
        tracing::debug!(%error, "failed to ring bell");
    }
}
