//! Astronomical calculations for sunrise, sunset and solar position.
//!
//! Rise and set instants come from the `sunrise` crate. Solar noon, solar
//! elevation and the polar-day / polar-night classification use the NOAA
//! low-precision solar position formulas, which also serve as the fallback
//! when the crate's answer is unusable at extreme latitudes.
//!
//! All dates in this module are *solar dates*: the calendar date of local mean
//! solar time at the observer's longitude. Solar noon of solar date `D` always
//! falls within `D`, whatever civil timezone the observer uses.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use std::sync::Arc;

use crate::constants::*;
use crate::memo::Memo;

/// A validated geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            anyhow::bail!("latitude must be between -90 and 90 degrees (got {latitude})");
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!("longitude must be between -180 and 180 degrees (got {longitude})");
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Bit-exact key for memo tables (f64 is not `Hash`).
    pub(crate) fn key(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.3}°{}, {:.3}°{}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }
}

/// How the sun behaves over one solar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    /// The sun rises and sets.
    Normal,
    /// The sun never sets.
    PolarDay,
    /// The sun never rises.
    PolarNight,
}

/// Solar events of one solar date at one location.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarEvents {
    pub date: NaiveDate,
    pub kind: DayKind,
    pub noon: DateTime<Utc>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Set when the `sunrise` crate's answer was rejected in favor of NOAA's
    pub used_fallback: bool,
}

impl SolarEvents {
    /// Lowest sun of the day, twelve hours from noon.
    pub fn midnight(&self) -> DateTime<Utc> {
        self.noon - Duration::hours(12)
    }
}

// Julian day number of an instant
fn julian_day(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / 86_400_000.0 + 2_440_587.5
}

/// Solar declination (radians) and equation of time (minutes) at an instant.
pub fn declination_and_equation_of_time(instant: DateTime<Utc>) -> (f64, f64) {
    let t = (julian_day(instant) - 2_451_545.0) / 36_525.0;

    let mean_longitude = (280.46646 + t * (36_000.76983 + t * 0.000_303_2)).rem_euclid(360.0);
    let mean_anomaly = 357.52911 + t * (35_999.05029 - 0.000_153_7 * t);
    let eccentricity = 0.016_708_634 - t * (0.000_042_037 + 0.000_000_126_7 * t);

    let m = mean_anomaly.to_radians();
    let center = m.sin() * (1.914_602 - t * (0.004_817 + 0.000_014 * t))
        + (2.0 * m).sin() * (0.019_993 - 0.000_101 * t)
        + (3.0 * m).sin() * 0.000_289;

    let omega = (125.04 - 1934.136 * t).to_radians();
    let apparent_longitude = (mean_longitude + center - 0.005_69 - 0.004_78 * omega.sin()).to_radians();

    let mean_obliquity =
        23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.000_59 - t * 0.001_813))) / 60.0) / 60.0;
    let obliquity = (mean_obliquity + 0.002_56 * omega.cos()).to_radians();

    let declination = (obliquity.sin() * apparent_longitude.sin()).asin();

    let y = (obliquity / 2.0).tan().powi(2);
    let l0 = mean_longitude.to_radians();
    let eot = y * (2.0 * l0).sin() - 2.0 * eccentricity * m.sin()
        + 4.0 * eccentricity * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * eccentricity * eccentricity * (2.0 * m).sin();

    (declination, 4.0 * eot.to_degrees())
}

fn minutes(value: f64) -> Duration {
    Duration::milliseconds((value * 60_000.0).round() as i64)
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// The solar date an instant falls on at the given longitude.
pub fn solar_date(instant: DateTime<Utc>, longitude: f64) -> NaiveDate {
    (instant + minutes(4.0 * longitude)).date_naive()
}

/// Instant of solar noon (highest sun) on a solar date.
pub fn solar_noon(coords: Coordinates, date: NaiveDate) -> DateTime<Utc> {
    let mean_noon = utc_midnight(date) + minutes(720.0 - 4.0 * coords.longitude);

    // One refinement pass evaluates the equation of time at noon itself
    let (_, eot) = declination_and_equation_of_time(mean_noon);
    let first = mean_noon - minutes(eot);
    let (_, eot) = declination_and_equation_of_time(first);
    mean_noon - minutes(eot)
}

/// Geometric solar elevation in degrees (no refraction correction).
pub fn elevation(coords: Coordinates, instant: DateTime<Utc>) -> f64 {
    let (declination, eot) = declination_and_equation_of_time(instant);
    let utc_minutes = f64::from(instant.num_seconds_from_midnight()) / 60.0
        + f64::from(instant.nanosecond()) / 60.0e9;
    let true_solar_minutes = utc_minutes + eot + 4.0 * coords.longitude;
    let hour_angle = (true_solar_minutes / 4.0 - 180.0).to_radians();

    let lat = coords.latitude.to_radians();
    let sin_elevation =
        lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();
    sin_elevation.clamp(-1.0, 1.0).asin().to_degrees()
}

// Cosine of the hour angle at which the sun crosses the horizon
fn horizon_hour_angle_cosine(coords: Coordinates, declination: f64) -> f64 {
    let lat = coords.latitude.to_radians();
    let numerator = HORIZON_ALTITUDE_DEGREES.to_radians().sin() - lat.sin() * declination.sin();
    // At the poles the result saturates with the correct sign
    let denominator = (lat.cos() * declination.cos()).max(1e-12);
    numerator / denominator
}

/// Classify a solar date as a normal day, polar day or polar night.
pub fn classify_day(coords: Coordinates, date: NaiveDate) -> DayKind {
    let (declination, _) = declination_and_equation_of_time(solar_noon(coords, date));
    classify_cosine(horizon_hour_angle_cosine(coords, declination))
}

fn classify_cosine(cos_h: f64) -> DayKind {
    if cos_h < -1.0 {
        DayKind::PolarDay
    } else if cos_h > 1.0 {
        DayKind::PolarNight
    } else {
        DayKind::Normal
    }
}

// Rise/set from the sunrise crate, None if it cannot answer
fn crate_events(coords: Coordinates, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    use sunrise::{Coordinates as SunriseCoordinates, SolarDay, SolarEvent};

    let coord = SunriseCoordinates::new(coords.latitude, coords.longitude)?;
    let solar_day = SolarDay::new(coord, date);
    Some((
        solar_day.event_time(SolarEvent::Sunrise),
        solar_day.event_time(SolarEvent::Sunset),
    ))
}

/// Compute the solar events of one solar date.
///
/// Rise and set come from the `sunrise` crate when both land within
/// [`MAX_EVENT_DISTANCE_FROM_NOON_HOURS`] of noon on the correct side; near the
/// polar circles the crate can degenerate, and the NOAA hour angle is used
/// instead.
pub fn calculate_solar_events(coords: Coordinates, date: NaiveDate) -> SolarEvents {
    let noon = solar_noon(coords, date);
    let (declination, _) = declination_and_equation_of_time(noon);
    let cos_h = horizon_hour_angle_cosine(coords, declination);
    let kind = classify_cosine(cos_h);

    if kind != DayKind::Normal {
        return SolarEvents {
            date,
            kind,
            noon,
            sunrise: None,
            sunset: None,
            used_fallback: false,
        };
    }

    let half_day = minutes(4.0 * cos_h.acos().to_degrees());
    let window = Duration::hours(MAX_EVENT_DISTANCE_FROM_NOON_HOURS);
    let plausible = |rise: DateTime<Utc>, set: DateTime<Utc>| {
        rise < noon && set > noon && noon - rise < window && set - noon < window
    };

    let (sunrise, sunset, used_fallback) = match crate_events(coords, date) {
        Some((rise, set)) if plausible(rise, set) => (rise, set, false),
        _ => (noon - half_day, noon + half_day, true),
    };

    SolarEvents {
        date,
        kind,
        noon,
        sunrise: Some(sunrise),
        sunset: Some(sunset),
        used_fallback,
    }
}

/// Solar event provider for one location, memoized per solar date.
#[derive(Debug)]
pub struct SolarCalculator {
    coords: Coordinates,
    memo: Memo<(NaiveDate, (u64, u64)), SolarEvents>,
}

impl SolarCalculator {
    pub fn new(coords: Coordinates) -> Self {
        Self {
            coords,
            memo: Memo::new(SOLAR_MEMO_CAPACITY),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coords
    }

    /// Switch to another location. Memoized dates stay keyed by location.
    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.coords = coords;
    }

    pub fn events(&mut self, date: NaiveDate) -> Arc<SolarEvents> {
        let coords = self.coords;
        self.memo
            .get_or_insert_with((date, coords.key()), || calculate_solar_events(coords, date))
    }

    /// Number of solar dates computed so far (memo misses).
    pub fn computed_days(&self) -> u64 {
        self.memo.misses()
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_close(actual: DateTime<Utc>, expected: DateTime<Utc>, tolerance_minutes: i64) {
        let diff = (actual - expected).num_minutes().abs();
        assert!(
            diff <= tolerance_minutes,
            "expected {expected} ± {tolerance_minutes}m, got {actual}"
        );
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinates::new(40.7128, -74.0060).is_ok());
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -181.0).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_coordinates_display() {
        assert_eq!(nyc().to_string(), "40.713°N, 74.006°W");
    }

    #[test]
    fn test_solar_date_follows_longitude() {
        let instant = Utc.with_ymd_and_hms(2022, 6, 21, 2, 0, 0).unwrap();
        // 02:00 UTC is still the previous evening in New York
        assert_eq!(solar_date(instant, TEST_NYC_LONGITUDE), date(2022, 6, 20));
        // ...and already mid-morning in Singapore
        assert_eq!(solar_date(instant, TEST_SINGAPORE_LONGITUDE), date(2022, 6, 21));
    }

    #[test]
    fn test_solar_noon_new_york() {
        // Solar noon in NYC on the June solstice is about 12:57 EDT (16:57 UTC)
        let noon = solar_noon(nyc(), date(2022, 6, 21));
        assert_close(noon, Utc.with_ymd_and_hms(2022, 6, 21, 16, 57, 0).unwrap(), 3);
    }

    #[test]
    fn test_sunrise_sunset_new_york_solstice() {
        let events = calculate_solar_events(nyc(), date(2022, 6, 21));
        assert_eq!(events.kind, DayKind::Normal);
        // 05:25 EDT and 20:31 EDT
        assert_close(
            events.sunrise.unwrap(),
            Utc.with_ymd_and_hms(2022, 6, 21, 9, 25, 0).unwrap(),
            5,
        );
        assert_close(
            events.sunset.unwrap(),
            Utc.with_ymd_and_hms(2022, 6, 22, 0, 31, 0).unwrap(),
            5,
        );
    }

    #[test]
    fn test_ordinary_day_uses_the_sunrise_crate() {
        let events = calculate_solar_events(nyc(), date(2022, 6, 21));
        assert!(!events.used_fallback);
    }

    #[test]
    fn test_near_pole_falls_back_to_noaa() {
        // The crate's answer lands too far from noon this close to the pole
        let coords = Coordinates::new(-89.9, -120.0).unwrap();
        let events = calculate_solar_events(coords, date(2022, 9, 20));

        assert_eq!(events.kind, DayKind::Normal);
        assert!(events.used_fallback);
        let sunrise = events.sunrise.unwrap();
        let sunset = events.sunset.unwrap();
        assert!(sunrise < events.noon && events.noon < sunset);
        // The fallback is symmetric around noon
        assert_eq!(events.noon - sunrise, sunset - events.noon);
    }

    #[test]
    fn test_polar_classification() {
        assert_eq!(classify_day(tromso(), date(2022, 6, 21)), DayKind::PolarDay);
        assert_eq!(classify_day(tromso(), date(2022, 12, 21)), DayKind::PolarNight);
        assert_eq!(classify_day(tromso(), date(2022, 3, 20)), DayKind::Normal);

        let pole = Coordinates::new(90.0, 0.0).unwrap();
        assert_eq!(classify_day(pole, date(2022, 6, 21)), DayKind::PolarDay);
        assert_eq!(classify_day(pole, date(2022, 12, 21)), DayKind::PolarNight);
    }

    #[test]
    fn test_polar_events_have_no_rise_or_set() {
        let events = calculate_solar_events(tromso(), date(2022, 6, 21));
        assert_eq!(events.kind, DayKind::PolarDay);
        assert!(events.sunrise.is_none());
        assert!(events.sunset.is_none());
        assert_eq!(events.midnight(), events.noon - Duration::hours(12));
    }

    #[test]
    fn test_elevation_extremes() {
        let singapore = Coordinates::new(TEST_SINGAPORE_LATITUDE, TEST_SINGAPORE_LONGITUDE).unwrap();
        let noon = solar_noon(singapore, date(2022, 3, 20));
        assert!(elevation(singapore, noon) > 85.0);
        assert!(elevation(singapore, noon - Duration::hours(12)) < -80.0);

        // Midnight sun: still above the horizon at the lowest point
        let events = calculate_solar_events(tromso(), date(2022, 6, 21));
        assert!(elevation(tromso(), events.midnight()) > 0.0);
    }

    #[test]
    fn test_calculator_memoizes_per_date() {
        let mut calculator = SolarCalculator::new(nyc());
        let a = calculator.events(date(2022, 6, 21));
        let b = calculator.events(date(2022, 6, 21));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calculator.computed_days(), 1);

        calculator.events(date(2022, 6, 22));
        assert_eq!(calculator.computed_days(), 2);
    }
}
