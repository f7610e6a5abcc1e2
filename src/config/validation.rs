//! Configuration validation functionality.
//!
//! Rejects values the clock cannot work with before any of them reach the
//! astronomy layer or the renderer.

use anyhow::Result;

use super::Config;
use crate::constants::*;
use crate::geo::ZoneSetting;
use crate::render::LabelStyle;

/// Check every set field of a configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    match (config.latitude, config.longitude) {
        (Some(_), None) => anyhow::bail!("latitude is set but longitude is missing"),
        (None, Some(_)) => anyhow::bail!("longitude is set but latitude is missing"),
        _ => {}
    }

    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(interval) = config.refresh_interval
        && !(MINIMUM_REFRESH_INTERVAL..=MAXIMUM_REFRESH_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "refresh_interval ({} s) must be between {} and {} seconds",
            interval,
            MINIMUM_REFRESH_INTERVAL,
            MAXIMUM_REFRESH_INTERVAL
        );
    }

    if let Some(margin) = config.margin
        && margin > MAXIMUM_MARGIN
    {
        anyhow::bail!(
            "margin ({}) must be at most {} columns",
            margin,
            MAXIMUM_MARGIN
        );
    }

    if let Some(ref timezone) = config.timezone {
        ZoneSetting::parse(timezone)?;
    }

    if let Some(ref style) = config.label_style {
        LabelStyle::parse(style)?;
    }

    Ok(())
}
