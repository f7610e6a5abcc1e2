//! Screen composition.
//!
//! A [`Frame`] is the whole terminal as a grid of styled cells. The
//! [`Renderer`] lays out the bar, its caps, the scale and the event labels on
//! it, without touching the terminal, so frames can be printed headless and
//! compared in tests.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::{Bar, BarOffset};
use super::scale::scale_for_length;
use super::{Cell, Style};
use crate::constants::*;
use crate::geo::{AnchorKind, Cycle, DisplayZone};
use crate::memo::Memo;

/// How the labels above the bar read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Civil `HH:MM` of each event
    #[default]
    Time,
    /// `rise` and `set`, or `r` and `s` when the sunset is near the start
    Long,
    /// `r` and `s`
    Short,
}

impl LabelStyle {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(LabelStyle::Time),
            "long" => Ok(LabelStyle::Long),
            "short" => Ok(LabelStyle::Short),
            other => anyhow::bail!(
                "Unknown label style '{other}'. Use \"time\", \"long\", or \"short\""
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelStyle::Time => "time",
            LabelStyle::Long => "long",
            LabelStyle::Short => "short",
        }
    }
}

/// Layout settings taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    pub margin: u16,
    pub show_scale: bool,
    pub show_labels: bool,
    pub label_style: LabelStyle,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            show_scale: DEFAULT_SHOW_SCALE,
            show_labels: DEFAULT_SHOW_LABELS,
            label_style: LabelStyle::default(),
        }
    }
}

/// A label centred on a slot, with a marker between it and the bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub offset: BarOffset,
    pub text: String,
    /// Drawn above the bar, otherwise below it (under the scale if shown)
    pub above: bool,
}

/// The terminal as a grid of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; usize::from(width) * usize::from(height)],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells
                .get(usize::from(y) * usize::from(self.width) + usize::from(x))
        } else {
            None
        }
    }

    /// Write one cell; positions outside the grid are dropped.
    pub fn put(&mut self, x: i32, y: i32, cell: Cell) {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return;
        }
        let index = y as usize * usize::from(self.width) + x as usize;
        self.cells[index] = cell;
    }

    pub fn put_str(&mut self, x: i32, y: i32, text: &str, style: Style) {
        for (i, ch) in text.chars().enumerate() {
            self.put(x + i as i32, y, Cell::new(ch, style));
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(usize::from(self.width.max(1)))
    }

    /// Characters only, one line per row, trailing spaces trimmed.
    pub fn to_plain_string(&self) -> String {
        self.rows()
            .map(|row| {
                let line: String = row.iter().map(|cell| cell.ch).collect();
                line.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lays out frames, keeping bars and scales between redraws.
#[derive(Debug)]
pub struct Renderer {
    options: FrameOptions,
    bars: Memo<(Cycle, usize), Bar>,
    scales: Memo<usize, Option<String>>,
}

impl Renderer {
    pub fn new(options: FrameOptions) -> Self {
        Self {
            options,
            bars: Memo::new(BAR_MEMO_CAPACITY),
            scales: Memo::new(SCALE_MEMO_CAPACITY),
        }
    }

    pub fn set_options(&mut self, options: FrameOptions) {
        self.options = options;
    }

    /// Number of bars computed so far.
    pub fn bars_built(&self) -> u64 {
        self.bars.misses()
    }

    /// Compose the screen for `now`, which must lie inside `cycle`.
    pub fn compose(
        &mut self,
        cycle: &Cycle,
        now: DateTime<Utc>,
        zone: &DisplayZone,
        width: u16,
        height: u16,
    ) -> Result<Frame> {
        let mut frame = Frame::new(width, height);

        let margin = usize::from(self.options.margin);
        let bar_length = usize::from(width).saturating_sub(2 * margin + 2);
        let min_height = if self.options.show_labels { 4 } else { 1 };
        if bar_length < MIN_BAR_LENGTH || height < min_height {
            draw_notice(&mut frame, TOO_SMALL_NOTICE);
            return Ok(frame);
        }

        let bar_y = i32::from(height / 2);
        let cap_begin_x = margin as i32;
        let cap_end_x = i32::from(width) - margin as i32 - 1;
        let bar_x = cap_begin_x + 1;

        let bar = self
            .bars
            .get_or_try_insert_with((*cycle, bar_length), || Bar::new(*cycle, bar_length))?;
        let now_offset = bar.offset_of(now)?;
        let now_label = zone.format_hm(now);

        frame.put(cap_begin_x, bar_y, Cell::new(CHAR_BEGIN, Style::PLAIN));
        for (i, cell) in bar.cells(now_offset, Some(&now_label))?.into_iter().enumerate() {
            frame.put(bar_x + i as i32, bar_y, cell);
        }
        frame.put(cap_end_x, bar_y, Cell::new(CHAR_END, Style::PLAIN));

        if self.options.show_scale {
            let scale = self
                .scales
                .get_or_insert_with(bar_length, || scale_for_length(bar_length));
            if let Some(scale) = scale.as_deref() {
                frame.put_str(bar_x, bar_y + 1, scale, Style::PLAIN);
            }
        }

        if self.options.show_labels {
            for label in event_labels(&bar, zone, self.options.label_style)? {
                let x = bar_x + label.offset as i32;
                let half = (label.text.chars().count() / 2) as i32;
                let (marker_y, text_y) = if label.above {
                    (bar_y - 1, bar_y - 2)
                } else if self.options.show_scale {
                    (bar_y + 2, bar_y + 3)
                } else {
                    (bar_y + 1, bar_y + 2)
                };
                frame.put(x, marker_y, Cell::new(CHAR_MARKER, Style::PLAIN));
                frame.put_str(x - half, text_y, &label.text, Style::PLAIN);
            }
        }

        Ok(frame)
    }
}

/// Labels for the events of the bar's cycle, in drawing order.
///
/// Later labels overwrite earlier ones where they overlap.
pub fn event_labels(bar: &Bar, zone: &DisplayZone, style: LabelStyle) -> Result<Vec<Label>> {
    let cycle = &bar.cycle;

    let Some(sunset) = cycle.sunset else {
        let text = match cycle.start_kind {
            AnchorKind::PolarDay => "darkest".to_string(),
            AnchorKind::PolarNight => "lightest".to_string(),
            // The sun rises but does not set again until next cycle
            AnchorKind::Sunrise => sunrise_text(style, zone, cycle.start, usize::MAX),
        };
        // Polar night labels sit below the bar, with the sun
        return Ok(vec![Label {
            offset: 0,
            text,
            above: cycle.visible,
        }]);
    };

    let sunset_offset = bar.offset_of(sunset)?;
    let sunset_text = match style {
        LabelStyle::Time => zone.format_hm(sunset),
        LabelStyle::Long if sunset_offset > LONG_LABEL_MIN_OFFSET => "set".to_string(),
        LabelStyle::Long | LabelStyle::Short => "s".to_string(),
    };

    Ok(vec![
        Label {
            offset: sunset_offset,
            text: sunset_text,
            above: true,
        },
        Label {
            offset: 0,
            text: sunrise_text(style, zone, cycle.start, sunset_offset),
            above: true,
        },
        Label {
            offset: bar.len(),
            text: sunrise_text(style, zone, cycle.end, sunset_offset),
            above: true,
        },
    ])
}

fn sunrise_text(
    style: LabelStyle,
    zone: &DisplayZone,
    at: DateTime<Utc>,
    sunset_offset: BarOffset,
) -> String {
    match style {
        LabelStyle::Time => zone.format_hm(at),
        LabelStyle::Long if sunset_offset > LONG_LABEL_MIN_OFFSET => "rise".to_string(),
        LabelStyle::Long | LabelStyle::Short => "r".to_string(),
    }
}

fn draw_notice(frame: &mut Frame, text: &str) {
    let len = text.chars().count() as i32;
    let x = ((i32::from(frame.width()) - len) / 2).max(0);
    let y = i32::from(frame.height() / 2);
    frame.put_str(x, y, text, Style::PLAIN);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Tone;
    use chrono::{Duration, TimeZone};

    fn utc() -> DisplayZone {
        DisplayZone::Named(chrono_tz::UTC)
    }

    fn cycle(sunset_after_hours: Option<i64>, start_kind: AnchorKind) -> Cycle {
        let start = Utc.with_ymd_and_hms(2022, 3, 12, 6, 0, 0).unwrap();
        Cycle {
            start,
            end: start + Duration::hours(24),
            start_kind,
            sunset: sunset_after_hours.map(|h| start + Duration::hours(h)),
            visible: start_kind.sun_visible_after(),
        }
    }

    fn row(frame: &Frame, y: usize) -> String {
        frame
            .to_plain_string()
            .lines()
            .nth(y)
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_layout_of_bar_caps_and_now_label() {
        let cycle = cycle(Some(12), AnchorKind::Sunrise);
        let now = cycle.start + Duration::minutes(8 * 60 + 30);
        let mut renderer = Renderer::new(FrameOptions::default());
        // 30 columns with a margin of 2 leaves 24 one-hour slots
        let frame = renderer.compose(&cycle, now, &utc(), 30, 12).unwrap();

        assert_eq!(
            row(&frame, 6),
            format!("  ┣████14:30{}┫", "░".repeat(15))
        );
        assert_eq!(frame.get(2, 6).map(|c| c.ch), Some(CHAR_BEGIN));
        assert_eq!(frame.get(27, 6).map(|c| c.ch), Some(CHAR_END));
        // Passed label text is black on the day color
        assert_eq!(
            frame.get(11, 6).map(|c| c.style),
            Some(Style::on(Tone::Black, Tone::Orange))
        );
    }

    #[test]
    fn test_event_labels_above_the_bar() {
        let cycle = cycle(Some(12), AnchorKind::Sunrise);
        let mut renderer = Renderer::new(FrameOptions::default());
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 30, 12)
            .unwrap();

        assert_eq!(row(&frame, 4), " 06:00       18:00       06:00");
        assert_eq!(row(&frame, 5), "   |           |           |");
    }

    #[test]
    fn test_scale_under_the_bar() {
        let cycle = cycle(Some(12), AnchorKind::Sunrise);
        let mut renderer = Renderer::new(FrameOptions::default());
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 30, 12)
            .unwrap();

        let scale = row(&frame, 7);
        assert_eq!(scale.find('0'), Some(3));
        assert_eq!(
            scale.split_whitespace().collect::<Vec<_>>(),
            vec!["0", "20", "40", "60", "80", "100"]
        );
    }

    #[test]
    fn test_long_and_short_label_styles() {
        let zone = utc();

        let bar = Bar::new(cycle(Some(12), AnchorKind::Sunrise), 24).unwrap();
        let texts: Vec<String> = event_labels(&bar, &zone, LabelStyle::Long)
            .unwrap()
            .into_iter()
            .map(|l| l.text)
            .collect();
        assert_eq!(texts, vec!["set", "rise", "rise"]);

        // Sunset too close to the start for the long words
        let bar = Bar::new(cycle(Some(3), AnchorKind::Sunrise), 24).unwrap();
        let texts: Vec<String> = event_labels(&bar, &zone, LabelStyle::Long)
            .unwrap()
            .into_iter()
            .map(|l| l.text)
            .collect();
        assert_eq!(texts, vec!["s", "r", "r"]);

        let texts: Vec<String> = event_labels(&bar, &zone, LabelStyle::Short)
            .unwrap()
            .into_iter()
            .map(|l| l.text)
            .collect();
        assert_eq!(texts, vec!["s", "r", "r"]);
    }

    #[test]
    fn test_polar_labels() {
        let zone = utc();

        let bar = Bar::new(cycle(None, AnchorKind::PolarDay), 24).unwrap();
        let labels = event_labels(&bar, &zone, LabelStyle::Time).unwrap();
        assert_eq!(
            labels,
            vec![Label {
                offset: 0,
                text: "darkest".to_string(),
                above: true,
            }]
        );

        let bar = Bar::new(cycle(None, AnchorKind::PolarNight), 24).unwrap();
        let labels = event_labels(&bar, &zone, LabelStyle::Time).unwrap();
        assert_eq!(labels[0].text, "lightest");
        assert!(!labels[0].above);
    }

    #[test]
    fn test_polar_night_label_below_the_scale() {
        let cycle = cycle(None, AnchorKind::PolarNight);
        let mut renderer = Renderer::new(FrameOptions::default());
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 30, 12)
            .unwrap();

        // Bar on row 6, scale on row 7
        assert_eq!(row(&frame, 4), "");
        assert_eq!(row(&frame, 5), "");
        assert!(row(&frame, 7).starts_with("   0"));
        assert_eq!(row(&frame, 8), "   |");
        // Centred on column 3, so the first letter is clipped
        assert_eq!(row(&frame, 9), "ightest");
    }

    #[test]
    fn test_polar_night_label_below_the_bar_without_scale() {
        let cycle = cycle(None, AnchorKind::PolarNight);
        let mut renderer = Renderer::new(FrameOptions {
            show_scale: false,
            ..FrameOptions::default()
        });
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 30, 12)
            .unwrap();

        assert_eq!(row(&frame, 7), "   |");
        assert_eq!(row(&frame, 8), "ightest");
        assert_eq!(row(&frame, 9), "");
    }

    #[test]
    fn test_polar_day_label_above_the_bar() {
        let cycle = cycle(None, AnchorKind::PolarDay);
        let mut renderer = Renderer::new(FrameOptions::default());
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 30, 12)
            .unwrap();

        assert_eq!(row(&frame, 4), "darkest");
        assert_eq!(row(&frame, 5), "   |");
        assert_eq!(row(&frame, 8), "");
    }

    #[test]
    fn test_labels_clip_at_screen_edge() {
        let cycle = cycle(None, AnchorKind::PolarNight);
        let mut renderer = Renderer::new(FrameOptions {
            margin: 0,
            ..FrameOptions::default()
        });
        // "lightest" centred on column 1 starts off screen
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 30, 12)
            .unwrap();
        assert_eq!(row(&frame, 8), " |");
        assert_eq!(row(&frame, 9), "htest");
    }

    #[test]
    fn test_terminal_too_small() {
        let cycle = cycle(Some(12), AnchorKind::Sunrise);
        let mut renderer = Renderer::new(FrameOptions {
            margin: 5,
            ..FrameOptions::default()
        });
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 20, 12)
            .unwrap();
        assert_eq!(row(&frame, 6), " terminal too small");

        let mut renderer = Renderer::new(FrameOptions::default());
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 80, 3)
            .unwrap();
        assert!(frame.to_plain_string().contains(TOO_SMALL_NOTICE));
    }

    #[test]
    fn test_hidden_scale_and_labels() {
        let cycle = cycle(Some(12), AnchorKind::Sunrise);
        let mut renderer = Renderer::new(FrameOptions {
            show_scale: false,
            show_labels: false,
            ..FrameOptions::default()
        });
        let frame = renderer
            .compose(&cycle, cycle.start, &utc(), 30, 12)
            .unwrap();
        for y in [4, 5, 7] {
            assert_eq!(row(&frame, y), "");
        }
    }

    #[test]
    fn test_bars_are_reused_across_frames() {
        let cycle = cycle(Some(12), AnchorKind::Sunrise);
        let mut renderer = Renderer::new(FrameOptions::default());
        for minutes in [0, 5, 10] {
            renderer
                .compose(&cycle, cycle.start + Duration::minutes(minutes), &utc(), 30, 12)
                .unwrap();
        }
        assert_eq!(renderer.bars_built(), 1);

        renderer
            .compose(&cycle, cycle.start, &utc(), 40, 12)
            .unwrap();
        assert_eq!(renderer.bars_built(), 2);
    }

    #[test]
    fn test_now_outside_cycle_is_an_error() {
        let cycle = cycle(Some(12), AnchorKind::Sunrise);
        let mut renderer = Renderer::new(FrameOptions::default());
        let result = renderer.compose(&cycle, cycle.end + Duration::hours(1), &utc(), 30, 12);
        assert!(result.is_err());
    }

    #[test]
    fn test_label_style_parse() {
        assert_eq!(LabelStyle::parse("Long").unwrap(), LabelStyle::Long);
        assert_eq!(LabelStyle::parse("time").unwrap(), LabelStyle::Time);
        assert!(LabelStyle::parse("medium").is_err());
    }
}
