//! The bar: a cycle split into equal slots, one per character.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use super::{Cell, Style, Tone};
use crate::constants::*;
use crate::geo::Cycle;

/// Index of a slot, counted from the start of the bar.
///
/// `bar.len()` itself is a valid offset meaning "the very end of the bar".
pub type BarOffset = usize;

/// Where the sun is during a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Day,
    Night,
    Twilight,
}

impl Phase {
    pub fn tone(self) -> Tone {
        match self {
            Phase::Day => Tone::Orange,
            Phase::Twilight => Tone::Purple,
            Phase::Night => Tone::Blue,
        }
    }
}

/// The time meaning of every character of the bar during one cycle.
///
/// Slot `i` covers `[bounds[i], bounds[i + 1])`. Like cycles, slots include
/// their lower bound and exclude their upper bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub cycle: Cycle,
    bounds: Vec<DateTime<Utc>>,
    pub slot_duration: Duration,
}

impl Bar {
    /// Split `cycle` into `length` equal slots.
    pub fn new(cycle: Cycle, length: usize) -> Result<Self> {
        if length == 0 {
            anyhow::bail!("A bar needs at least one slot");
        }

        let span = (cycle.end - cycle.start)
            .num_nanoseconds()
            .ok_or_else(|| anyhow::anyhow!("Cycle is too long to divide into slots"))?;
        if span <= 0 {
            anyhow::bail!("Cycle must end after it starts");
        }

        let bounds = (0..=length)
            .map(|i| {
                let offset = i128::from(span) * i as i128 / length as i128;
                cycle.start + Duration::nanoseconds(offset as i64)
            })
            .collect();

        Ok(Self {
            cycle,
            bounds,
            slot_duration: Duration::nanoseconds(span / length as i64),
        })
    }

    /// Number of slots (characters).
    pub fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lower and upper bound of a slot.
    pub fn slot(&self, index: usize) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if index < self.len() {
            Some((self.bounds[index], self.bounds[index + 1]))
        } else {
            None
        }
    }

    /// Number of characters needed to represent `instant`, from the bar's start.
    ///
    /// The end of the cycle belongs to the next cycle's first slot, but it
    /// still maps to `len()` here so markers can be drawn at the end of the bar.
    pub fn offset_of(&self, instant: DateTime<Utc>) -> Result<BarOffset> {
        if instant == self.cycle.end {
            return Ok(self.len());
        }
        if !self.cycle.contains(instant) {
            anyhow::bail!(
                "{} is outside the cycle {} .. {}",
                instant.to_rfc3339(),
                self.cycle.start.to_rfc3339(),
                self.cycle.end.to_rfc3339()
            );
        }
        // First bound after the instant closes its slot
        Ok(self.bounds.partition_point(|bound| *bound <= instant) - 1)
    }

    /// Characters needed to represent a percentage of the bar, rounded half up.
    pub fn offset_of_percent(&self, percentage: f64) -> BarOffset {
        percent_offset(self.len(), percentage)
    }

    /// Phase of a slot given where (if anywhere) the sunset falls.
    pub fn phase_of(&self, slot: BarOffset, sunset_offset: Option<BarOffset>) -> Phase {
        if slot == 0 {
            return Phase::Twilight;
        }
        match sunset_offset {
            Some(sunset) if slot < sunset => Phase::Day,
            Some(sunset) if slot == sunset => Phase::Twilight,
            Some(_) => Phase::Night,
            None if self.cycle.visible => Phase::Day,
            None => Phase::Night,
        }
    }

    /// Glyphs and colors for every slot.
    ///
    /// Slots at or before `now_offset` have passed and are drawn filled. When a
    /// label is given it is written into the bar so that it ends on the `now`
    /// slot, or starts at the beginning of the bar if there is no room.
    pub fn cells(&self, now_offset: BarOffset, label: Option<&str>) -> Result<Vec<Cell>> {
        let sunset_offset = self
            .cycle
            .sunset
            .map(|sunset| self.offset_of(sunset))
            .transpose()?;

        let label: Vec<char> = label.map(|l| l.chars().collect()).unwrap_or_default();
        let label_start = if now_offset < label.len() {
            0
        } else {
            now_offset + 1 - label.len()
        };

        let cells = (0..self.len())
            .map(|slot| {
                let tone = self.phase_of(slot, sunset_offset).tone();
                let text_char = slot
                    .checked_sub(label_start)
                    .and_then(|i| label.get(i))
                    .copied();
                let has_passed = now_offset >= slot;

                match (text_char, has_passed) {
                    (Some(ch), true) => Cell::new(ch, Style::on(Tone::Black, tone)),
                    (Some(ch), false) => Cell::new(ch, Style::fg(tone)),
                    (None, true) => Cell::new(CHAR_FULL, Style::fg(tone)),
                    (None, false) => Cell::new(CHAR_EMPTY, Style::fg(tone)),
                }
            })
            .collect();

        Ok(cells)
    }
}

/// Characters needed to represent `percentage` of a bar `length` characters long.
pub fn percent_offset(length: usize, percentage: f64) -> BarOffset {
    let points_per_char = 100.0 / length as f64;
    let chars = percentage / points_per_char;
    (chars + 0.5) as BarOffset
}
