//! Sunrise-to-sunrise cycles.
//!
//! A [`Cycle`] is the half-open span `[start, end)` between two consecutive
//! anchors. Normally an anchor is a sunrise, so a cycle runs from this
//! morning's sunrise to tomorrow's and contains the sunset in between.
//!
//! There are places where, for part of the year, the sun never rises or never
//! sets. There the day begins and ends where the sun is closest to the
//! horizon: solar midnight during polar day (the darkest moment), solar noon
//! during polar night (the lightest). This keeps the bar continuous for an
//! observer moving into the Arctic: the sunset marker slides toward one end of
//! the bar and then disappears.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use super::solar::{Coordinates, DayKind, SolarCalculator, solar_date};
use crate::constants::*;

/// What the start of a cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    Sunrise,
    /// Solar midnight during polar day
    PolarDay,
    /// Solar noon during polar night
    PolarNight,
}

impl AnchorKind {
    /// Whether the sun is above the horizon just after the anchor.
    pub fn sun_visible_after(&self) -> bool {
        match self {
            AnchorKind::Sunrise | AnchorKind::PolarDay => true,
            AnchorKind::PolarNight => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    at: DateTime<Utc>,
    kind: AnchorKind,
}

/// The span of time a bar is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cycle {
    /// Inclusive lower bound
    pub start: DateTime<Utc>,
    /// Exclusive upper bound, the start of the next cycle
    pub end: DateTime<Utc>,
    pub start_kind: AnchorKind,
    /// The sunset inside the cycle, if the sun sets at all
    pub sunset: Option<DateTime<Utc>>,
    /// Whether the sun is up right after `start`
    pub visible: bool,
}

impl Cycle {
    /// Build the cycle that spans `instant`.
    pub fn spanning(instant: DateTime<Utc>, solar: &mut SolarCalculator) -> Result<Self> {
        let coords = solar.coordinates();
        let center = solar_date(instant, coords.longitude);

        let mut anchors = Vec::new();
        let mut sunsets = Vec::new();
        for offset in -CYCLE_SEARCH_DAYS..=CYCLE_SEARCH_DAYS {
            let date = center + Duration::days(offset);
            let events = solar.events(date);
            match events.kind {
                DayKind::Normal => {
                    if let Some(at) = events.sunrise {
                        anchors.push(Anchor {
                            at,
                            kind: AnchorKind::Sunrise,
                        });
                    }
                    if let Some(at) = events.sunset {
                        sunsets.push(at);
                    }
                }
                DayKind::PolarDay => anchors.push(Anchor {
                    at: events.midnight(),
                    kind: AnchorKind::PolarDay,
                }),
                DayKind::PolarNight => anchors.push(Anchor {
                    at: events.noon,
                    kind: AnchorKind::PolarNight,
                }),
            }
        }

        let anchors = merge_anchors(anchors);

        let (start, end) = anchors
            .windows(2)
            .find(|pair| pair[0].at <= instant && instant < pair[1].at)
            .map(|pair| (pair[0], pair[1]))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No sunrise-to-sunrise cycle spans {} at {}",
                    instant.format("%Y-%m-%d %H:%M:%S UTC"),
                    coords
                )
            })?;

        sunsets.sort();
        let sunset = sunsets
            .into_iter()
            .find(|s| start.at < *s && *s < end.at);

        Ok(Self {
            start: start.at,
            end: end.at,
            start_kind: start.kind,
            sunset,
            visible: start.kind.sun_visible_after(),
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

// Sorted, with anchors closer than a minute to the previous one dropped. A
// sunrise and a polar anchor can land together on the day polar day begins.
fn merge_anchors(mut anchors: Vec<Anchor>) -> Vec<Anchor> {
    anchors.sort_by_key(|a| a.at);
    let merge = Duration::seconds(ANCHOR_MERGE_SECONDS);
    anchors.dedup_by(|later, earlier| later.at - earlier.at < merge);
    anchors
}

/// Keeps the current cycle and rebuilds it only when time leaves it.
///
/// Building a cycle means a handful of solar calculations, so the render loop
/// builds one at launch and then only once the old one stops spanning "now".
#[derive(Debug)]
pub struct CycleTracker {
    solar: SolarCalculator,
    current: Option<Cycle>,
    rebuilds: u64,
}

impl CycleTracker {
    pub fn new(coords: Coordinates) -> Self {
        Self {
            solar: SolarCalculator::new(coords),
            current: None,
            rebuilds: 0,
        }
    }

    /// The cycle spanning `instant`, reusing the current one when possible.
    pub fn spanning(&mut self, instant: DateTime<Utc>) -> Result<Cycle> {
        if let Some(cycle) = self.current
            && cycle.contains(instant)
        {
            return Ok(cycle);
        }

        let cycle = Cycle::spanning(instant, &mut self.solar)?;
        self.current = Some(cycle);
        self.rebuilds += 1;
        Ok(cycle)
    }

    /// Switch location; the next lookup builds a fresh cycle.
    pub fn set_coordinates(&mut self, coords: Coordinates) {
        if coords != self.solar.coordinates() {
            self.solar.set_coordinates(coords);
            self.current = None;
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        self.solar.coordinates()
    }

    /// Number of cycles built so far.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Whether either end of `cycle` came from the NOAA fallback.
    pub fn used_fallback(&mut self, cycle: &Cycle) -> bool {
        let longitude = self.solar.coordinates().longitude;
        [cycle.start, cycle.end]
            .into_iter()
            .any(|at| self.solar.events(solar_date(at, longitude)).used_fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use chrono::TimeZone;

    fn nyc() -> Coordinates {
        Coordinates::new(TEST_NYC_LATITUDE, TEST_NYC_LONGITUDE).unwrap()
    }

    fn tromso() -> Coordinates {
        Coordinates::new(TEST_TROMSO_LATITUDE, TEST_TROMSO_LONGITUDE).unwrap()
    }

    #[test]
    fn test_cycle_contains_instant_and_sunset() {
        let mut solar = SolarCalculator::new(nyc());
        // Noon EDT
        let instant = Utc.with_ymd_and_hms(2022, 6, 21, 16, 0, 0).unwrap();
        let cycle = Cycle::spanning(instant, &mut solar).unwrap();

        assert!(cycle.contains(instant));
        assert_eq!(cycle.start_kind, AnchorKind::Sunrise);
        assert!(cycle.visible);
        let sunset = cycle.sunset.expect("New York has a sunset in June");
        assert!(cycle.start < sunset && sunset < cycle.end);
        // Sunrise to sunrise is within a few minutes of a day
        let hours = cycle.duration().num_minutes() as f64 / 60.0;
        assert!((23.9..24.1).contains(&hours), "cycle lasted {hours} hours");
    }

    #[test]
    fn test_cycle_before_sunrise_starts_yesterday() {
        let mut solar = SolarCalculator::new(nyc());
        // 03:00 EDT, before sunrise
        let instant = Utc.with_ymd_and_hms(2022, 6, 21, 7, 0, 0).unwrap();
        let cycle = Cycle::spanning(instant, &mut solar).unwrap();

        assert!(cycle.contains(instant));
        assert!(cycle.start < instant - Duration::hours(20));
        // Yesterday's sunset has already happened
        assert!(cycle.sunset.unwrap() < instant);
    }

    #[test]
    fn test_consecutive_cycles_are_contiguous() {
        let mut solar = SolarCalculator::new(nyc());
        let instant = Utc.with_ymd_and_hms(2022, 3, 12, 16, 0, 0).unwrap();
        let first = Cycle::spanning(instant, &mut solar).unwrap();
        let second = Cycle::spanning(first.end, &mut solar).unwrap();
        assert_eq!(second.start, first.end);
    }

    #[test]
    fn test_polar_day_cycle() {
        let mut solar = SolarCalculator::new(tromso());
        let instant = Utc.with_ymd_and_hms(2022, 6, 21, 12, 0, 0).unwrap();
        let cycle = Cycle::spanning(instant, &mut solar).unwrap();

        assert_eq!(cycle.start_kind, AnchorKind::PolarDay);
        assert!(cycle.visible);
        assert!(cycle.sunset.is_none());
        assert!(cycle.contains(instant));
    }

    #[test]
    fn test_polar_night_cycle() {
        let mut solar = SolarCalculator::new(tromso());
        let instant = Utc.with_ymd_and_hms(2022, 12, 21, 18, 0, 0).unwrap();
        let cycle = Cycle::spanning(instant, &mut solar).unwrap();

        assert_eq!(cycle.start_kind, AnchorKind::PolarNight);
        assert!(!cycle.visible);
        assert!(cycle.sunset.is_none());
    }

    #[test]
    fn test_close_anchors_are_merged() {
        let t = Utc.with_ymd_and_hms(2022, 5, 19, 23, 0, 0).unwrap();
        let anchor = |at, kind| Anchor { at, kind };
        let merged = merge_anchors(vec![
            anchor(t + Duration::hours(24), AnchorKind::PolarDay),
            anchor(t + Duration::seconds(30), AnchorKind::PolarDay),
            anchor(t, AnchorKind::Sunrise),
            anchor(t + Duration::seconds(60), AnchorKind::PolarDay),
        ]);

        assert_eq!(
            merged,
            vec![
                anchor(t, AnchorKind::Sunrise),
                anchor(t + Duration::seconds(60), AnchorKind::PolarDay),
                anchor(t + Duration::hours(24), AnchorKind::PolarDay),
            ]
        );
    }

    // Walk hour by hour and collect every distinct cycle
    fn walk(coords: Coordinates, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Cycle> {
        let mut tracker = CycleTracker::new(coords);
        let mut cycles: Vec<Cycle> = Vec::new();
        let mut instant = from;
        while instant < to {
            let cycle = tracker.spanning(instant).unwrap();
            assert!(cycle.contains(instant));
            if cycles.last() != Some(&cycle) {
                cycles.push(cycle);
            }
            instant += Duration::hours(1);
        }
        cycles
    }

    fn assert_contiguous(cycles: &[Cycle]) {
        for pair in cycles.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "gap between {:?} and {:?}", pair[0], pair[1]);
            assert!(pair[0].duration() >= Duration::seconds(ANCHOR_MERGE_SECONDS));
        }
    }

    #[test]
    fn test_tromso_enters_polar_day_in_may() {
        let cycles = walk(
            tromso(),
            Utc.with_ymd_and_hms(2022, 5, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap(),
        );
        assert_contiguous(&cycles);

        let kinds: Vec<AnchorKind> = cycles.iter().map(|c| c.start_kind).collect();
        assert_eq!(kinds.first(), Some(&AnchorKind::Sunrise));
        assert_eq!(kinds.last(), Some(&AnchorKind::PolarDay));
        // One switch, no flickering back
        let switches = kinds.windows(2).filter(|k| k[0] != k[1]).count();
        assert_eq!(switches, 1, "{kinds:?}");

        for cycle in &cycles {
            if let Some(sunset) = cycle.sunset {
                assert!(cycle.start < sunset && sunset < cycle.end);
            }
            if cycle.start_kind == AnchorKind::PolarDay {
                assert!(cycle.sunset.is_none());
            }
        }
    }

    #[test]
    fn test_tromso_leaves_polar_day_in_july() {
        let cycles = walk(
            tromso(),
            Utc.with_ymd_and_hms(2022, 7, 12, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2022, 8, 5, 0, 0, 0).unwrap(),
        );
        assert_contiguous(&cycles);

        let kinds: Vec<AnchorKind> = cycles.iter().map(|c| c.start_kind).collect();
        assert_eq!(kinds.first(), Some(&AnchorKind::PolarDay));
        assert_eq!(kinds.last(), Some(&AnchorKind::Sunrise));
        assert!(cycles.iter().all(|c| c.visible));
    }

    #[test]
    fn test_tracker_reports_fallback_use() {
        let mut tracker = CycleTracker::new(nyc());
        let cycle = tracker
            .spanning(Utc.with_ymd_and_hms(2022, 6, 21, 16, 0, 0).unwrap())
            .unwrap();
        assert!(!tracker.used_fallback(&cycle));

        let mut tracker = CycleTracker::new(Coordinates::new(-89.9, -120.0).unwrap());
        let cycle = tracker
            .spanning(Utc.with_ymd_and_hms(2022, 9, 20, 19, 53, 0).unwrap())
            .unwrap();
        assert!(tracker.used_fallback(&cycle), "{cycle:?}");
    }

    #[test]
    fn test_tracker_reuses_cycle_until_it_ends() {
        let mut tracker = CycleTracker::new(nyc());
        let instant = Utc.with_ymd_and_hms(2022, 6, 21, 16, 0, 0).unwrap();

        let first = tracker.spanning(instant).unwrap();
        tracker.spanning(instant + Duration::hours(1)).unwrap();
        assert_eq!(tracker.rebuilds(), 1);

        let next = tracker.spanning(first.end).unwrap();
        assert_eq!(tracker.rebuilds(), 2);
        assert_eq!(next.start, first.end);
    }

    #[test]
    fn test_tracker_rebuilds_on_location_change() {
        let mut tracker = CycleTracker::new(nyc());
        let instant = Utc.with_ymd_and_hms(2022, 6, 21, 16, 0, 0).unwrap();
        tracker.spanning(instant).unwrap();

        tracker.set_coordinates(tromso());
        let cycle = tracker.spanning(instant).unwrap();
        assert_eq!(tracker.rebuilds(), 2);
        assert_eq!(cycle.start_kind, AnchorKind::PolarDay);
    }
}
