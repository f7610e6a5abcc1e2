//! The live clock.

use anyhow::Result;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::Config;
use crate::logger::Log;
use crate::signals::setup_signal_handler;
use crate::time_source::{self, RealTimeSource};

/// Run the clock against the system time until the user quits.
pub fn handle_run_command(debug_enabled: bool) -> Result<()> {
    let config = Config::load()?;
    let coords = config.coordinates()?;
    let zone = config.zone_setting()?.resolve(coords);

    let source = Arc::new(RealTimeSource::new(config.refresh_interval()));
    time_source::init_time_source(source.clone());
    if let Some(tz) = zone.tz() {
        Log::set_display_timezone(tz);
    }

    log_version!();
    config.log_config();
    if debug_enabled {
        log_pipe!();
        log_debug!("Label timezone resolved to {}", zone);
    }

    let signals = setup_signal_handler(debug_enabled)?;
    let mut clock = Clock::new(config, source)?.with_debug(debug_enabled);
    clock.run(&signals)?;

    log_block_start!("Clock stopped");
    log_end!();
    Ok(())
}
