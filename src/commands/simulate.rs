//! Simulated time runs of the clock.
//!
//! Sets up a deterministic time source that steps through a range of
//! instants, then runs the clock against it either on the terminal or
//! headless. The built-in scenarios cover the situations that are hard to
//! wait for in real time: a bar rolling over at sunrise, a DST change, and
//! the sunset marker travelling across the seasons.

use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::clock::Clock;
use crate::config::Config;
use crate::geo::DisplayZone;
use crate::geo::timezone::parse_local_datetime;
use crate::logger::Log;
use crate::signals::setup_signal_handler;
use crate::time_source::{self, SimulatedTimeSource, SimulationPlan};

/// A named range of simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Two days around a sunrise, in large steps
    Bounds,
    /// Across the March DST change in the US
    Dst,
    /// Second by second through one sunrise
    Wraparound,
    /// Half a year, watching the sunset move
    Seasons,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Bounds,
        Scenario::Dst,
        Scenario::Wraparound,
        Scenario::Seasons,
    ];

    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown scenario '{name}'. Choose one of: {}",
                    Self::ALL.map(|s| s.name()).join(", ")
                )
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Bounds => "bounds",
            Scenario::Dst => "dst",
            Scenario::Wraparound => "wraparound",
            Scenario::Seasons => "seasons",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Bounds => "two days in 20 minute steps",
            Scenario::Dst => "across a DST change in 5 minute steps",
            Scenario::Wraparound => "one sunrise, second by second",
            Scenario::Seasons => "July to December in 2 hour steps",
        }
    }

    /// Local start and end, step and frame delay.
    fn range(&self) -> (&'static str, &'static str, ChronoDuration, StdDuration) {
        match self {
            Scenario::Bounds => (
                "2022-05-12 12:00",
                "2022-05-14 12:00",
                ChronoDuration::minutes(20),
                StdDuration::from_millis(500),
            ),
            Scenario::Dst => (
                "2022-03-11 12:00",
                "2022-03-14 12:00",
                ChronoDuration::minutes(5),
                StdDuration::from_millis(50),
            ),
            Scenario::Wraparound => (
                "2022-03-12 06:25",
                "2022-03-12 06:50",
                ChronoDuration::seconds(1),
                StdDuration::from_millis(25),
            ),
            Scenario::Seasons => (
                "2022-07-15 12:00",
                "2022-12-31 23:59",
                ChronoDuration::minutes(120),
                StdDuration::from_millis(10),
            ),
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the simulator was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    pub scenario: Scenario,
    pub start: Option<String>,
    pub end: Option<String>,
    pub step_secs: Option<u64>,
    pub delay_ms: Option<u64>,
    pub once: bool,
    pub print: bool,
    pub width: u16,
    pub height: u16,
    pub debug_enabled: bool,
}

/// Resolve a request into a plan, reading local times in `zone`.
///
/// Printing never sleeps and never repeats.
pub fn build_plan(request: &SimulationRequest, zone: &DisplayZone) -> Result<SimulationPlan> {
    let (start, end, step, delay) = request.scenario.range();

    let start_text = request.start.as_deref().unwrap_or(start);
    let end_text = request.end.as_deref().unwrap_or(end);
    let start = parse_local_datetime(start_text, zone).context("Invalid start time")?;
    let stop = parse_local_datetime(end_text, zone).context("Invalid end time")?;
    if stop <= start {
        anyhow::bail!("End time must be after start time");
    }

    let step = match request.step_secs {
        Some(0) => anyhow::bail!("Step must be at least one second"),
        Some(secs) => ChronoDuration::seconds(i64::try_from(secs).context("Step is too large")?),
        None => step,
    };
    let delay = if request.print {
        StdDuration::ZERO
    } else {
        request.delay_ms.map(StdDuration::from_millis).unwrap_or(delay)
    };

    Ok(SimulationPlan {
        start,
        stop,
        step,
        delay,
        repeat: !(request.once || request.print),
    })
}

/// Run the clock against simulated time.
pub fn handle_simulate_command(request: SimulationRequest) -> Result<()> {
    let config = Config::load()?;
    let zone = config.zone_setting()?.resolve(config.coordinates()?);
    let plan = build_plan(&request, &zone)?;

    let source = Arc::new(SimulatedTimeSource::new(plan.clone())?);
    // Installed before any logging so timestamps show simulated time
    time_source::init_time_source(source.clone());
    if let Some(tz) = zone.tz() {
        Log::set_display_timezone(tz);
    }

    log_version!();
    log_block_start!("Simulation: {} ({})", request.scenario, request.scenario.description());
    log_decorated!(
        "From {} to {} ({})",
        zone.local_time(plan.start).format("%Y-%m-%d %H:%M:%S"),
        zone.local_time(plan.stop).format("%Y-%m-%d %H:%M:%S"),
        zone
    );
    log_indented!("Step: {} seconds", plan.step.num_seconds());
    log_indented!("Frames per pass: {}", plan.frames_per_pass());
    if request.print {
        log_indented!("Printing {}x{} frames", request.width, request.height);
    } else {
        log_indented!("Frame delay: {} ms", plan.delay.as_millis());
        log_indented!("Repeat: {}", if plan.repeat { "yes" } else { "no" });
    }
    config.log_config();

    let mut clock = Clock::new(config, source)?.with_debug(request.debug_enabled);

    if request.print {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let frames = clock.print_frames(&mut out, request.width, request.height)?;
        log_block_start!("Printed {} frames", frames);
    } else {
        let signals = setup_signal_handler(request.debug_enabled)?;
        clock.run(&signals)?;
        log_block_start!("Simulation finished");
    }

    log_end!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::New_York;

    fn request(scenario: Scenario) -> SimulationRequest {
        SimulationRequest {
            scenario,
            start: None,
            end: None,
            step_secs: None,
            delay_ms: None,
            once: false,
            print: false,
            width: 80,
            height: 12,
            debug_enabled: false,
        }
    }

    fn new_york() -> DisplayZone {
        DisplayZone::Named(New_York)
    }

    #[test]
    fn test_scenario_parse() {
        assert_eq!(Scenario::parse("dst").unwrap(), Scenario::Dst);
        assert_eq!(Scenario::parse("Seasons").unwrap(), Scenario::Seasons);
        let err = Scenario::parse("winter").unwrap_err().to_string();
        assert!(err.contains("bounds, dst, wraparound, seasons"));
    }

    #[test]
    fn test_builtin_scenarios_build() {
        for scenario in Scenario::ALL {
            let plan = build_plan(&request(scenario), &new_york()).unwrap();
            assert!(plan.start < plan.stop, "{scenario}");
            assert!(plan.repeat);
        }
    }

    #[test]
    fn test_wraparound_plan() {
        let plan = build_plan(&request(Scenario::Wraparound), &new_york()).unwrap();
        assert_eq!(plan.start, Utc.with_ymd_and_hms(2022, 3, 12, 11, 25, 0).unwrap());
        assert_eq!(plan.stop, Utc.with_ymd_and_hms(2022, 3, 12, 11, 50, 0).unwrap());
        assert_eq!(plan.step, ChronoDuration::seconds(1));
        assert_eq!(plan.delay, StdDuration::from_millis(25));
        assert_eq!(plan.frames_per_pass(), 25 * 60 + 1);
    }

    #[test]
    fn test_dst_plan_spans_the_change() {
        let plan = build_plan(&request(Scenario::Dst), &new_york()).unwrap();
        // EST at the start, EDT at the end
        assert_eq!(plan.start, Utc.with_ymd_and_hms(2022, 3, 11, 17, 0, 0).unwrap());
        assert_eq!(plan.stop, Utc.with_ymd_and_hms(2022, 3, 14, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_custom_range_overrides_scenario() {
        let req = SimulationRequest {
            start: Some("2022-01-01 00:00".to_string()),
            end: Some("2022-01-02 00:00:30".to_string()),
            step_secs: Some(600),
            delay_ms: Some(5),
            once: true,
            ..request(Scenario::Seasons)
        };
        let plan = build_plan(&req, &new_york()).unwrap();
        assert_eq!(plan.start, Utc.with_ymd_and_hms(2022, 1, 1, 5, 0, 0).unwrap());
        assert_eq!(plan.stop, Utc.with_ymd_and_hms(2022, 1, 2, 5, 0, 30).unwrap());
        assert_eq!(plan.step, ChronoDuration::minutes(10));
        assert_eq!(plan.delay, StdDuration::from_millis(5));
        assert!(!plan.repeat);
    }

    #[test]
    fn test_print_never_sleeps_or_repeats() {
        let req = SimulationRequest {
            print: true,
            delay_ms: Some(1000),
            ..request(Scenario::Bounds)
        };
        let plan = build_plan(&req, &new_york()).unwrap();
        assert_eq!(plan.delay, StdDuration::ZERO);
        assert!(!plan.repeat);
    }

    #[test]
    fn test_bad_ranges_are_rejected() {
        let backwards = SimulationRequest {
            start: Some("2022-01-02 00:00".to_string()),
            end: Some("2022-01-01 00:00".to_string()),
            ..request(Scenario::Seasons)
        };
        assert!(build_plan(&backwards, &new_york()).is_err());

        let zero_step = SimulationRequest {
            step_secs: Some(0),
            ..request(Scenario::Seasons)
        };
        assert!(build_plan(&zero_step, &new_york()).is_err());

        let garbage = SimulationRequest {
            start: Some("yesterday".to_string()),
            ..request(Scenario::Seasons)
        };
        let err = build_plan(&garbage, &new_york()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid start time"));
    }
}
