//! Time source abstraction for supporting both real-time and simulated time.
//!
//! The clock never reads the system clock directly. It asks the installed
//! [`TimeSource`] for "now", for how long to wait before the next frame, and
//! tells it when a frame has been drawn. The real source follows the wall
//! clock; the simulated source steps through a fixed range so that the same
//! inputs always produce the same sequence of frames.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

/// Global time source instance, defaults to RealTimeSource
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;

    /// How long the loop should admire a frame before drawing the next one
    fn frame_delay(&self) -> StdDuration;

    /// Called once after every drawn frame
    fn advance(&self);

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;

    /// Check if simulation has ended (always false for real time)
    fn is_ended(&self) -> bool {
        false
    }
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource {
    refresh: StdDuration,
}

impl RealTimeSource {
    pub fn new(refresh: StdDuration) -> Self {
        Self { refresh }
    }
}

impl Default for RealTimeSource {
    fn default() -> Self {
        Self::new(StdDuration::from_secs(
            crate::constants::DEFAULT_REFRESH_INTERVAL,
        ))
    }
}

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn frame_delay(&self) -> StdDuration {
        self.refresh
    }

    fn advance(&self) {}

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Parameters of a simulated run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationPlan {
    /// First simulated instant
    pub start: DateTime<Utc>,
    /// Last simulated instant (inclusive)
    pub stop: DateTime<Utc>,
    /// Simulated time that passes between frames
    pub step: ChronoDuration,
    /// Real time spent on each frame
    pub delay: StdDuration,
    /// Rewind to `start` after passing `stop` instead of ending
    pub repeat: bool,
}

impl SimulationPlan {
    /// Number of frames in one pass over the range.
    pub fn frames_per_pass(&self) -> i64 {
        let span = (self.stop - self.start).num_milliseconds();
        let step = self.step.num_milliseconds().max(1);
        span / step + 1
    }
}

#[derive(Debug)]
struct SimulationProgress {
    current: DateTime<Utc>,
    ended: bool,
    passes: u64,
}

/// Deterministic time source that steps through a [`SimulationPlan`].
///
/// `now` starts at `plan.start`. Each `advance` adds one `plan.step`. Once the
/// simulated instant passes `plan.stop` the source either rewinds to the start
/// (repeating plans) or reports that it has ended.
pub struct SimulatedTimeSource {
    plan: SimulationPlan,
    progress: Mutex<SimulationProgress>,
}

impl SimulatedTimeSource {
    pub fn new(plan: SimulationPlan) -> anyhow::Result<Self> {
        if plan.stop < plan.start {
            anyhow::bail!("Simulation end must not be before its start");
        }
        if plan.step <= ChronoDuration::zero() {
            anyhow::bail!("Simulation step must be positive");
        }

        Ok(Self {
            progress: Mutex::new(SimulationProgress {
                current: plan.start,
                ended: false,
                passes: 0,
            }),
            plan,
        })
    }

    pub fn plan(&self) -> &SimulationPlan {
        &self.plan
    }

    /// Number of completed passes over the range.
    pub fn passes(&self) -> u64 {
        self.progress.lock().map(|p| p.passes).unwrap_or(0)
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        match self.progress.lock() {
            Ok(progress) => progress.current,
            Err(poisoned) => poisoned.into_inner().current,
        }
    }

    fn frame_delay(&self) -> StdDuration {
        self.plan.delay
    }

    fn advance(&self) {
        let mut progress = match self.progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if progress.ended {
            return;
        }

        let next = progress.current + self.plan.step;
        if next <= self.plan.stop {
            progress.current = next;
            return;
        }

        progress.passes += 1;
        if self.plan.repeat {
            progress.current = self.plan.start;
        } else {
            progress.ended = true;
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.progress.lock().map(|p| p.ended).unwrap_or(true)
    }
}

/// Initialize the global time source (call once at startup)
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Check if the time source has been initialized
pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

/// The installed time source, installing the real one if none was set
pub fn source() -> Arc<dyn TimeSource> {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource::default()))
        .clone()
}

/// Get the current time from the global time source
pub fn now() -> DateTime<Utc> {
    source().now()
}

/// Check if we're running in simulation mode
pub fn is_simulated() -> bool {
    source().is_simulated()
}
