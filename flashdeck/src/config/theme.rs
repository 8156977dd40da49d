use cardsight::{Seconds, Speed, Suit};
use ratatui::{style::Color, symbols::Marker};
use serde::{Deserialize, Serialize};
use terminal_colorsaurus::QueryOptions;

/// General theme
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Theme {
    pub text: TextTheme,
    pub card: CardTheme,
    pub speed: SpeedTheme,
    pub plot: PlotTheme,
    #[serde(skip)]
    pub term_fg: Color,
    #[serde(skip)]
    pub term_bg: Color,
}

impl Theme {
    /// Asks the terminal for its colors, falling back to white on black
    pub fn detect_terminal_colors(&mut self) {
        let terminal_palette = terminal_colorsaurus::color_palette(QueryOptions::default()).ok();

        (self.term_fg, self.term_bg) = if let Some(palette) = terminal_palette {
            let fg = palette.foreground.scale_to_8bit();
            let bg = palette.background.scale_to_8bit();
            (Color::Rgb(fg.0, fg.1, fg.2), Color::Rgb(bg.0, bg.1, bg.2))
        } else {
            (Color::Rgb(255, 255, 255), Color::Rgb(0, 0, 0))
        };
    }
}

/// Text color theme
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TextTheme {
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub highlight: Color,
}

impl Default for TextTheme {
    fn default() -> Self {
        Self {
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            highlight: Color::Blue,
        }
    }
}

/// Colors of the card face shown during a drill
///
/// Without a `face` color the card uses the terminal's foreground as its
/// background, so it stands out in both light and dark terminals.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CardTheme {
    pub face: Option<Color>,
    pub red_suit: Color,
    pub black_suit: Option<Color>,
}

impl Default for CardTheme {
    fn default() -> Self {
        Self {
            face: None,
            red_suit: Color::Red,
            black_suit: None,
        }
    }
}

impl CardTheme {
    pub fn face(&self, theme: &Theme) -> Color {
        self.face.unwrap_or(theme.term_fg)
    }

    pub fn suit(&self, suit: Suit, theme: &Theme) -> Color {
        if suit.is_red() {
            self.red_suit
        } else {
            self.black_suit.unwrap_or(theme.term_bg)
        }
    }
}

/// Colors of per-card recognition speeds
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SpeedTheme {
    pub good: Color,
    pub medium: Color,
    pub slow: Color,
}

impl Default for SpeedTheme {
    fn default() -> Self {
        Self {
            good: Color::Green,
            medium: Color::Yellow,
            slow: Color::Red,
        }
    }
}

impl SpeedTheme {
    pub const fn color(&self, speed: Speed) -> Color {
        match speed {
            Speed::Good => self.good,
            Speed::Medium => self.medium,
            Speed::Slow => self.slow,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum PlotSymbol {
    Dot,
    Block,
    HalfBlock,
    Braille,
    Bar,
}

impl PlotSymbol {
    /// Returns the marker that the symbol corresponds to.
    ///
    /// This doesn't use the `From` trait, as we can't make that a const fn
    pub const fn as_marker(self) -> Marker {
        match self {
            Self::Dot => Marker::Dot,
            Self::Bar => Marker::Bar,
            Self::Block => Marker::Block,
            Self::Braille => Marker::Braille,
            Self::HalfBlock => Marker::HalfBlock,
        }
    }
}

/// Upper bounds (in seconds) of the session-average color bands
pub const BAND_LIMITS: [Seconds; 4] = [1.5, 1.75, 2.0, 2.5];

/// Plot color and symbol theme
///
/// Session averages are colored by band: below 1.5s, 1.75s, 2s, 2.5s, and
/// anything slower.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PlotTheme {
    pub bands: [Color; 5],
    pub trend: Color,
    pub best: Color,
    pub worst: Color,
    pub scatter_symbol: PlotSymbol,
    pub line_symbol: PlotSymbol,
}

impl Default for PlotTheme {
    fn default() -> Self {
        Self {
            bands: [
                Color::Green,
                Color::LightGreen,
                Color::Yellow,
                Color::LightRed,
                Color::Red,
            ],
            trend: Color::Cyan,
            best: Color::LightGreen,
            worst: Color::LightRed,
            scatter_symbol: PlotSymbol::Dot,
            line_symbol: PlotSymbol::Braille,
        }
    }
}

impl PlotTheme {
    /// Index of the color band an average falls into
    pub fn band(average: Seconds) -> usize {
        BAND_LIMITS
            .iter()
            .position(|&limit| average < limit)
            .unwrap_or(BAND_LIMITS.len())
    }

    pub fn band_color(&self, average: Seconds) -> Color {
        self.bands[Self::band(average)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(PlotTheme::band(1.2), 0);
        assert_eq!(PlotTheme::band(1.5), 1);
        assert_eq!(PlotTheme::band(1.9), 2);
        assert_eq!(PlotTheme::band(2.4), 3);
        assert_eq!(PlotTheme::band(2.5), 4);
        assert_eq!(PlotTheme::band(9.0), 4);
    }

    #[test]
    fn test_suit_colors() {
        let theme = Theme {
            term_fg: Color::White,
            term_bg: Color::Black,
            ..Theme::default()
        };
        assert_eq!(theme.card.suit(Suit::Hearts, &theme), Color::Red);
        assert_eq!(theme.card.suit(Suit::Spades, &theme), Color::Black);
        assert_eq!(theme.card.face(&theme), Color::White);
    }
}
