//! Command handlers behind the two entry points.
//!
//! - [`run`]: the live clock following the system time
//! - [`simulate`]: the clock driven by a simulated time source

pub mod run;
pub mod simulate;

use anyhow::Result;

use crate::config;
use crate::constants::*;
use crate::logger::{Log, LogTarget};

/// Prepare the process-wide settings and run a command.
///
/// The log destination is `log_target` if given, then `LINEAR_CLOCK_LOG`,
/// then `fallback`. Errors are logged and turned into the exit code.
pub fn execute(
    config_dir: Option<String>,
    log_target: Option<LogTarget>,
    fallback: LogTarget,
    command: impl FnOnce() -> Result<()>,
) -> i32 {
    let target = log_target.or_else(LogTarget::from_env).unwrap_or(fallback);
    // Kept alive until the command returns so file output is flushed
    let _guard = match Log::set_target(target) {
        Ok(guard) => guard,
        Err(e) => {
            log_error_exit!("{:#}", e);
            log_end!();
            return EXIT_FAILURE;
        }
    };

    if let Err(e) = config::set_config_dir(config_dir) {
        log_error_exit!("{:#}", e);
        log_end!();
        return EXIT_FAILURE;
    }

    match command() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            log_error_exit!("{:#}", e);
            log_end!();
            EXIT_FAILURE
        }
    }
}
