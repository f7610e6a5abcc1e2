//! Configuration system for the clock.
//!
//! Settings live in `linear-terminal-clock.toml` under the user's config
//! directory (`$XDG_CONFIG_HOME/linear-terminal-clock/` by default, or the
//! directory given with `--config`). A default file is written on first run.
//!
//! ```toml
//! #[Location]
//! latitude = 40.712800   # Geographic latitude (-90 to 90)
//! longitude = -74.006000 # Geographic longitude (-180 to 180)
//! timezone = "local"     # Label timezone: "local", "coordinates", or an IANA name
//!
//! #[Display]
//! refresh_interval = 5   # Seconds between redraws (1-3600)
//! margin = 2             # Columns left free on each side of the bar (0-20)
//! show_scale = true      # Percentage scale under the bar
//! show_labels = true     # Sunrise and sunset labels above the bar
//! label_style = "time"   # Label text: "time", "long" or "short"
//! ```
//!
//! An optional `geo.toml` next to the main file may hold `latitude` and
//! `longitude`. When present it overrides the main file, so the main file can
//! be shared without revealing where the user lives.

pub mod builder;
pub mod loading;
pub mod validation;

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use crate::constants::*;
use crate::geo::{Coordinates, ZoneSetting};
use crate::render::{FrameOptions, LabelStyle};

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Coordinates kept apart from the main configuration file.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct GeoConfig {
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
}

/// Settings loaded from `linear-terminal-clock.toml`.
///
/// Every field is optional in the file. After loading, defaults have been
/// filled in and all values validated.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// "local", "coordinates", or an IANA zone name
    pub timezone: Option<String>,
    pub refresh_interval: Option<u64>, // seconds
    pub margin: Option<u16>,
    pub show_scale: Option<bool>,
    pub show_labels: Option<bool>,
    /// "time", "long" or "short"
    pub label_style: Option<String>,
}

impl Config {
    /// Path to the geo.toml file beside the main config.
    pub fn get_geo_path() -> Result<PathBuf> {
        Ok(loading::get_config_base_dir()?.join(GEO_FILE_NAME))
    }

    pub fn load() -> Result<Self> {
        load()
    }

    pub fn load_from_path(path: &std::path::Path) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    /// Observer location.
    pub fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::new(
            self.latitude.unwrap_or(DEFAULT_LATITUDE),
            self.longitude.unwrap_or(DEFAULT_LONGITUDE),
        )
    }

    /// Which zone labels are drawn in.
    pub fn zone_setting(&self) -> Result<ZoneSetting> {
        ZoneSetting::parse(self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))
    }

    pub fn label_style(&self) -> Result<LabelStyle> {
        LabelStyle::parse(self.label_style.as_deref().unwrap_or(DEFAULT_LABEL_STYLE))
    }

    pub fn frame_options(&self) -> Result<FrameOptions> {
        Ok(FrameOptions {
            margin: self.margin.unwrap_or(DEFAULT_MARGIN),
            show_scale: self.show_scale.unwrap_or(DEFAULT_SHOW_SCALE),
            show_labels: self.show_labels.unwrap_or(DEFAULT_SHOW_LABELS),
            label_style: self.label_style()?,
        })
    }

    /// Time between redraws of the live clock.
    pub fn refresh_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL))
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        if let Ok(geo_path) = Self::get_geo_path()
            && geo_path.exists()
        {
            log_indented!("Loaded coordinates from geo.toml");
        }

        match self.coordinates() {
            Ok(coords) => log_indented!("Location: {}", coords),
            Err(e) => log_indented!("Location: invalid ({e})"),
        }
        log_indented!(
            "Timezone: {}",
            self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
        );

        let refresh = self.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL);
        log_indented!(
            "Refresh interval: {} {}",
            refresh,
            if refresh == 1 { "second" } else { "seconds" }
        );
        log_indented!("Margin: {}", self.margin.unwrap_or(DEFAULT_MARGIN));

        let shown: Vec<&str> = [
            (self.show_scale.unwrap_or(DEFAULT_SHOW_SCALE), "scale"),
            (self.show_labels.unwrap_or(DEFAULT_SHOW_LABELS), "labels"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        if shown.is_empty() {
            log_indented!("Showing: bar only");
        } else {
            log_indented!("Showing: bar, {}", shown.join(", "));
        }

        if self.show_labels.unwrap_or(DEFAULT_SHOW_LABELS) {
            log_indented!(
                "Label style: {}",
                self.label_style.as_deref().unwrap_or(DEFAULT_LABEL_STYLE)
            );
        }
    }
}
