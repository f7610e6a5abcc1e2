//! Timezone resolution for the clock's civil labels.
//!
//! The bar itself is anchored to the sun, but every label on it is a civil
//! time. Which zone those labels use is configurable: the system zone (looked
//! up again on every frame so a zone change shows up without a restart), the
//! zone at the configured coordinates, or an explicit IANA name.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use std::path::Path;
use tzf_rs::DefaultFinder;

use super::solar::Coordinates;

// Building the finder decodes the bundled boundary data, so do it once
static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Zone selection as written in the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneSetting {
    /// Follow the system timezone
    Local,
    /// Use the zone containing the configured coordinates
    Coordinates,
    /// A fixed IANA zone
    Named(Tz),
}

impl ZoneSetting {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("local") => Ok(ZoneSetting::Local),
            v if v.eq_ignore_ascii_case("coordinates") => Ok(ZoneSetting::Coordinates),
            name => name
                .parse::<Tz>()
                .map(ZoneSetting::Named)
                .map_err(|_| {
                    anyhow::anyhow!(
                        "Unknown timezone '{name}'. Use \"local\", \"coordinates\", or an IANA name like \"Europe/Oslo\""
                    )
                }),
        }
    }

    /// Resolve the zone to draw labels in right now.
    pub fn resolve(&self, coords: Coordinates) -> DisplayZone {
        match self {
            ZoneSetting::Local => match system_timezone() {
                Some(tz) => DisplayZone::Named(tz),
                None => DisplayZone::SystemLocal,
            },
            ZoneSetting::Coordinates => DisplayZone::Named(determine_timezone_from_coordinates(
                coords.latitude,
                coords.longitude,
            )),
            ZoneSetting::Named(tz) => DisplayZone::Named(*tz),
        }
    }
}

/// A zone civil times can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayZone {
    Named(Tz),
    /// chrono's `Local`, used when the system zone has no IANA name
    SystemLocal,
}

impl DisplayZone {
    /// Wall-clock time of an instant in this zone.
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            DisplayZone::Named(tz) => instant.with_timezone(tz).naive_local(),
            DisplayZone::SystemLocal => instant.with_timezone(&Local).naive_local(),
        }
    }

    /// `HH:MM` label of an instant in this zone.
    pub fn format_hm(&self, instant: DateTime<Utc>) -> String {
        self.local_time(instant).format("%H:%M").to_string()
    }

    /// Interpret a wall-clock time in this zone.
    ///
    /// Fails for local times skipped or repeated by a DST change.
    pub fn from_local(&self, naive: &NaiveDateTime) -> Result<DateTime<Utc>> {
        let resolved = match self {
            DisplayZone::Named(tz) => tz.from_local_datetime(naive).single().map(|dt| dt.with_timezone(&Utc)),
            DisplayZone::SystemLocal => {
                Local.from_local_datetime(naive).single().map(|dt| dt.with_timezone(&Utc))
            }
        };
        resolved.ok_or_else(|| anyhow::anyhow!("Ambiguous or invalid time {naive} in {self}"))
    }

    /// The IANA zone, if known.
    pub fn tz(&self) -> Option<Tz> {
        match self {
            DisplayZone::Named(tz) => Some(*tz),
            DisplayZone::SystemLocal => None,
        }
    }
}

impl std::fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayZone::Named(tz) => write!(f, "{tz}"),
            DisplayZone::SystemLocal => write!(f, "system local time"),
        }
    }
}

/// Parse `YYYY-MM-DD HH:MM[:SS]` as a wall-clock time in `zone`.
pub fn parse_local_datetime(text: &str, zone: &DisplayZone) -> Result<DateTime<Utc>> {
    let text = text.trim();
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M"))
        .with_context(|| format!("Invalid datetime '{text}'. Use YYYY-MM-DD HH:MM[:SS]"))?;
    zone.from_local(&naive)
}

/// IANA zone containing the coordinates, UTC when the finder has no answer.
pub fn determine_timezone_from_coordinates(latitude: f64, longitude: f64) -> Tz {
    FINDER
        .get_tz_name(longitude, latitude)
        .parse::<Tz>()
        .unwrap_or(Tz::UTC)
}

/// Detect the system timezone.
///
/// Checked in order: the `TZ` environment variable, the `/etc/localtime`
/// symlink target, then `/etc/timezone`.
pub fn system_timezone() -> Option<Tz> {
    if let Ok(value) = std::env::var("TZ")
        && let Some(tz) = parse_tz_name(&value)
    {
        return Some(tz);
    }

    if let Some(tz) = zone_from_localtime_link(Path::new("/etc/localtime")) {
        return Some(tz);
    }

    std::fs::read_to_string("/etc/timezone")
        .ok()
        .and_then(|content| parse_tz_name(&content))
}

fn parse_tz_name(value: &str) -> Option<Tz> {
    // POSIX allows a leading colon before a zone file name
    let name = value.trim().trim_start_matches(':');
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>().ok()
}

// /etc/localtime -> /usr/share/zoneinfo/America/New_York
fn zone_from_localtime_link(path: &Path) -> Option<Tz> {
    let target = std::fs::read_link(path).ok()?;
    zone_from_zoneinfo_path(&target.to_string_lossy())
}

pub(crate) fn zone_from_zoneinfo_path(path: &str) -> Option<Tz> {
    let (_, name) = path.rsplit_once("zoneinfo/")?;
    // Some distributions use posix/ or right/ subtrees
    let name = name
        .strip_prefix("posix/")
        .or_else(|| name.strip_prefix("right/"))
        .unwrap_or(name);
    parse_tz_name(name)
}
