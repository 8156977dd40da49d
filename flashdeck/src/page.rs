use crossterm::event::Event;
use ratatui::{Frame, layout::Rect, text::Line};

pub mod drill;
pub mod error;
pub mod history;
pub mod menu;
pub mod summary;

pub use drill::Drill;
pub use error::Error;
pub use history::History;
pub use menu::Menu;
pub use summary::Summary;

use crate::{
    app::{AppTrainer, Message},
    config::Config,
};

macro_rules! make_page_enum {
    ($($t:tt),*) => {
        pub enum Page {
            $(
                $t(Box<$t>),
            )*
        }

        $(
            impl From<$t> for Page {
                fn from(value: $t) -> Page {
                    Page::$t(Box::new(value))
                }
            }
        )*
    };
}

make_page_enum!(Menu, Drill, Summary, History, Error);

impl Page {
    pub fn render(&mut self, frame: &mut Frame, area: Rect, config: &Config, trainer: &AppTrainer) {
        match self {
            Self::Menu(page) => page.render(frame, area, config, trainer),
            Self::Drill(page) => page.render(frame, area, config, trainer),
            Self::Summary(page) => page.render(frame, area, config, trainer),
            Self::History(page) => page.render(frame, area, config, trainer),
            Self::Error(page) => page.render(frame, area, config),
        }
    }

    pub fn render_top(&mut self, config: &Config, trainer: &AppTrainer) -> Option<Line<'_>> {
        match self {
            Self::Menu(page) => page.render_top(config),
            Self::Drill(page) => page.render_top(config, trainer),
            Self::Summary(page) => page.render_top(config),
            Self::History(page) => page.render_top(config),
            Self::Error(page) => page.render_top(config),
        }
    }

    pub fn handle_events(
        &mut self,
        event: &Event,
        config: &Config,
        trainer: &mut AppTrainer,
    ) -> Option<Message> {
        match self {
            Self::Menu(page) => page.handle_events(event, config, trainer),
            Self::Drill(page) => page.handle_events(event, config, trainer),
            Self::Summary(page) => page.handle_events(event, config, trainer),
            Self::History(page) => page.handle_events(event, config, trainer),
            Self::Error(page) => page.handle_events(event, config),
        }
    }

    pub fn poll(&mut self, config: &Config, trainer: &mut AppTrainer) -> Option<Message> {
        match self {
            Self::Drill(page) => page.poll(config, trainer),
            Self::Menu(_) | Self::Summary(_) | Self::History(_) | Self::Error(_) => None,
        }
    }
}
