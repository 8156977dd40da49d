use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block, BorderType, Padding},
};

/// A block with a rounded border
pub const ROUNDED_BLOCK: Block = Block::bordered().border_type(BorderType::Rounded);

pub fn center(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
    let [area_horizontal] = Layout::horizontal([horizontal])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([vertical])
        .flex(Flex::Center)
        .areas(area_horizontal);
    area
}

/// Padding that centers content of the given size inside `area`
pub const fn centered_padding(area: Rect, height: Option<u16>, width: Option<u16>) -> Padding {
    let vertical = match height {
        Some(height) => area.height.saturating_sub(height) / 2,
        None => 0,
    };
    let horizontal = match width {
        Some(width) => area.width.saturating_sub(width) / 2,
        None => 0,
    };
    Padding::new(horizontal, horizontal, vertical, 0)
}

/// Moves a list selection up, wrapping to the bottom
pub const fn decrement_index(index: &mut usize, len: usize) {
    if len == 0 {
        return;
    }
    *index = if *index == 0 { len - 1 } else { *index - 1 }
}

/// Moves a list selection down, wrapping to the top
pub const fn increment_index(index: &mut usize, len: usize) {
    if len == 0 {
        return;
    }
    *index = (*index + 1) % len
}

/// Formats seconds the way every page shows them
pub fn seconds(value: f64) -> String {
    format!("{value:.2}s")
}
