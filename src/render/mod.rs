//! Drawing the clock face.
//!
//! - [`bar`]: the time meaning of each character of the bar, and its glyphs
//! - [`scale`]: the percentage scale under the bar
//! - [`frame`]: composing a whole screen into a grid of styled cells
//! - [`terminal`]: putting a frame on the real terminal with crossterm
//!
//! Everything up to [`frame::Frame`] is pure, so frames can be compared in
//! tests and printed headless by the simulator.

pub mod bar;
pub mod frame;
pub mod scale;
pub mod terminal;

pub use bar::{Bar, BarOffset, Phase};
pub use frame::{Frame, FrameOptions, LabelStyle, Renderer};
pub use terminal::{Screen, TerminalGuard};

/// Palette used by the clock face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Orange,
    Purple,
    Blue,
    Black,
}

impl Tone {
    pub fn to_color(self) -> crossterm::style::Color {
        use crossterm::style::Color;
        match self {
            Tone::Orange => Color::AnsiValue(214),
            Tone::Purple => Color::AnsiValue(129),
            Tone::Blue => Color::AnsiValue(33),
            Tone::Black => Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Option<Tone>,
    pub bg: Option<Tone>,
}

impl Style {
    pub const PLAIN: Style = Style { fg: None, bg: None };

    pub fn fg(tone: Tone) -> Self {
        Style {
            fg: Some(tone),
            bg: None,
        }
    }

    pub fn on(fg: Tone, bg: Tone) -> Self {
        Style {
            fg: Some(fg),
            bg: Some(bg),
        }
    }
}

/// One character position on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        style: Style::PLAIN,
    };

    pub fn new(ch: char, style: Style) -> Self {
        Self { ch, style }
    }
}
