//! Application-wide constants.
//!
//! Defaults, validation limits and glyphs shared by the configuration system,
//! the astronomy layer and the renderer.

// # Configuration files

pub const CONFIG_DIR_NAME: &str = "linear-terminal-clock";
pub const CONFIG_FILE_NAME: &str = "linear-terminal-clock.toml";
pub const GEO_FILE_NAME: &str = "geo.toml";

// # Configuration defaults

/// Latitude used when neither the config nor geo.toml provides one (New York City).
pub const DEFAULT_LATITUDE: f64 = 40.7128;
/// Longitude used when neither the config nor geo.toml provides one (New York City).
pub const DEFAULT_LONGITUDE: f64 = -74.0060;
pub const DEFAULT_TIMEZONE: &str = "local";
pub const DEFAULT_REFRESH_INTERVAL: u64 = 5; // seconds
pub const DEFAULT_MARGIN: u16 = 2; // columns on either side of the bar
pub const DEFAULT_SHOW_SCALE: bool = true;
pub const DEFAULT_SHOW_LABELS: bool = true;
pub const DEFAULT_LABEL_STYLE: &str = "time";

// # Validation limits

pub const MINIMUM_REFRESH_INTERVAL: u64 = 1;
pub const MAXIMUM_REFRESH_INTERVAL: u64 = 3600;
pub const MAXIMUM_MARGIN: u16 = 20;

// # Astronomy

/// Apparent altitude of the sun's upper limb at rise/set, including refraction.
pub const HORIZON_ALTITUDE_DEGREES: f64 = -0.833;
/// Solar dates examined on each side of an instant when building a cycle.
pub const CYCLE_SEARCH_DAYS: i64 = 2;
/// Anchors closer than this collapse into one.
pub const ANCHOR_MERGE_SECONDS: i64 = 60;
/// A rise/set answer further than this from solar noon is rejected.
pub const MAX_EVENT_DISTANCE_FROM_NOON_HOURS: i64 = 13;

// # Rendering

pub const CHAR_BEGIN: char = '┣';
pub const CHAR_END: char = '┫';
pub const CHAR_FULL: char = '█';
pub const CHAR_EMPTY: char = '░';
pub const CHAR_MARKER: char = '|';
/// Smallest bar worth drawing; anything narrower shows a notice instead.
pub const MIN_BAR_LENGTH: usize = 10;
/// Steps tried, in order, when laying out the percentage scale.
pub const SCALE_STEPS: [u32; 5] = [10, 20, 25, 33, 50];
/// The long label style shortens labels when the sunset sits this close to the start.
pub const LONG_LABEL_MIN_OFFSET: usize = 4;
pub const TOO_SMALL_NOTICE: &str = "terminal too small";

// # Memoization

pub const SOLAR_MEMO_CAPACITY: usize = 64;
pub const BAR_MEMO_CAPACITY: usize = 16;
pub const SCALE_MEMO_CAPACITY: usize = 16;

// # Loop timing

/// Longest single wait on terminal events, so signals are noticed promptly.
pub const EVENT_POLL_SLICE_MS: u64 = 100;

// # Simulation defaults

pub const DEFAULT_PRINT_WIDTH: u16 = 80;
pub const DEFAULT_PRINT_HEIGHT: u16 = 12;
pub const DEFAULT_SCENARIO: &str = "seasons";

// # Logging

pub const LOG_DESTINATION_ENV: &str = "LINEAR_CLOCK_LOG";

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[cfg(test)]
pub mod test_constants {
    pub const TEST_NYC_LATITUDE: f64 = 40.7128;
    pub const TEST_NYC_LONGITUDE: f64 = -74.0060;
    pub const TEST_TROMSO_LATITUDE: f64 = 69.6496;
    pub const TEST_TROMSO_LONGITUDE: f64 = 18.9560;
    pub const TEST_SINGAPORE_LATITUDE: f64 = 1.3521;
    pub const TEST_SINGAPORE_LONGITUDE: f64 = 103.8198;
}
