//! The render loop.
//!
//! [`Clock`] ties the pieces together: it asks the time source for "now",
//! finds the cycle spanning it, and composes a frame at the terminal's size.
//! The interactive loop owns the terminal through a [`TerminalGuard`] and
//! waits between frames in short slices so that key presses, resizes and
//! signals are handled promptly. The headless loop writes plain frames to
//! any writer, which is how simulations are printed and tested.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use crate::config::Config;
use crate::constants::*;
use crate::geo::{CycleTracker, DisplayZone, ZoneSetting};
use crate::render::terminal;
use crate::render::{Frame, Renderer, Screen, TerminalGuard};
use crate::signals::{SignalMessage, SignalState};
use crate::time_source::{RealTimeSource, TimeSource};

/// Why the loop stopped waiting.
#[derive(Debug, PartialEq, Eq)]
enum Wake {
    /// The frame delay elapsed; move time forward
    Tick,
    /// Something changed; draw again at the same instant
    Redraw,
    Exit,
}

pub struct Clock {
    config: Config,
    source: Arc<dyn TimeSource>,
    zone_setting: ZoneSetting,
    tracker: CycleTracker,
    renderer: Renderer,
    debug_enabled: bool,
}

impl Clock {
    pub fn new(config: Config, source: Arc<dyn TimeSource>) -> Result<Self> {
        let coords = config.coordinates()?;
        Ok(Self {
            zone_setting: config.zone_setting()?,
            tracker: CycleTracker::new(coords),
            renderer: Renderer::new(config.frame_options()?),
            config,
            source,
            debug_enabled: false,
        })
    }

    /// Log cycle changes and reloads.
    pub fn with_debug(mut self, debug_enabled: bool) -> Self {
        self.debug_enabled = debug_enabled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Zone the labels are drawn in right now.
    ///
    /// Resolved on every call so a system timezone change shows up on the
    /// next frame.
    pub fn zone(&self) -> DisplayZone {
        self.zone_setting.resolve(self.tracker.coordinates())
    }

    /// Number of cycles built so far.
    pub fn cycles_built(&self) -> u64 {
        self.tracker.rebuilds()
    }

    /// Compose the frame for `now` at the given size.
    pub fn frame_at(&mut self, now: DateTime<Utc>, width: u16, height: u16) -> Result<Frame> {
        let rebuilds = self.tracker.rebuilds();
        let cycle = self.tracker.spanning(now)?;
        let zone = self.zone();

        if self.debug_enabled && self.tracker.rebuilds() != rebuilds {
            log_debug!(
                "New cycle {} to {} ({}), sunset {}",
                zone.local_time(cycle.start).format("%Y-%m-%d %H:%M"),
                zone.local_time(cycle.end).format("%Y-%m-%d %H:%M"),
                zone,
                cycle
                    .sunset
                    .map(|s| zone.format_hm(s))
                    .unwrap_or_else(|| "none".to_string())
            );
            if self.tracker.used_fallback(&cycle) {
                log_indented!("Sunrise computed with the NOAA fallback");
            }
        }

        self.renderer.compose(&cycle, now, &zone, width, height)
    }

    /// Switch to a freshly loaded configuration.
    pub fn apply_config(&mut self, config: Config) -> Result<()> {
        let coords = config.coordinates()?;
        let zone_setting = config.zone_setting()?;
        let options = config.frame_options()?;

        self.tracker.set_coordinates(coords);
        self.zone_setting = zone_setting;
        self.renderer.set_options(options);
        if !self.source.is_simulated() {
            self.source = Arc::new(RealTimeSource::new(config.refresh_interval()));
        }
        self.config = config;
        Ok(())
    }

    /// Run the interactive clock until a quit key, a shutdown signal, or the
    /// end of a one-shot simulation.
    pub fn run(&mut self, signals: &SignalState) -> Result<()> {
        let _guard = TerminalGuard::enter()?;
        let mut screen = Screen::new(std::io::stdout());

        while signals.is_running() && !self.source.is_ended() {
            let (width, height) = terminal::size()?;
            let frame = self.frame_at(self.source.now(), width, height)?;
            screen.draw(&frame)?;

            match self.wait(signals, &mut screen)? {
                Wake::Tick => self.source.advance(),
                Wake::Redraw => {}
                Wake::Exit => break,
            }
        }

        Ok(())
    }

    // Sleep for one frame delay, waking early for input and signals
    fn wait(&mut self, signals: &SignalState, screen: &mut Screen<std::io::Stdout>) -> Result<Wake> {
        let deadline = Instant::now() + self.source.frame_delay();
        let slice = StdDuration::from_millis(EVENT_POLL_SLICE_MS);

        loop {
            match signals.poll() {
                Some(SignalMessage::Shutdown) => return Ok(Wake::Exit),
                Some(SignalMessage::Reload) => {
                    self.reload();
                    screen.invalidate();
                    return Ok(Wake::Redraw);
                }
                None => {}
            }
            if !signals.is_running() {
                return Ok(Wake::Exit);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Wake::Tick);
            }

            if event::poll(remaining.min(slice)).context("Failed to poll terminal events")? {
                match event::read().context("Failed to read terminal event")? {
                    Event::Key(key) if is_quit_key(&key) => return Ok(Wake::Exit),
                    Event::Resize(_, _) => {
                        screen.invalidate();
                        return Ok(Wake::Redraw);
                    }
                    _ => {}
                }
            }
        }
    }

    fn reload(&mut self) {
        match Config::load().and_then(|config| self.apply_config(config)) {
            Ok(()) => {
                if self.debug_enabled {
                    log_pipe!();
                    log_info!("Configuration reloaded");
                }
            }
            Err(e) => {
                log_pipe!();
                log_error!("Failed to reload config: {e}");
                log_indented!("Continuing with previous configuration");
            }
        }
    }

    /// Write plain-text frames to `out` without sleeping.
    ///
    /// A simulated source is stepped until it ends; the real clock prints a
    /// single frame. Returns the number of frames written.
    pub fn print_frames<W: Write>(&mut self, out: &mut W, width: u16, height: u16) -> Result<u64> {
        let mut frames = 0;
        loop {
            let now = self.source.now();
            let frame = self.frame_at(now, width, height)?;
            let stamp = self.zone().local_time(now).format("%Y-%m-%d %H:%M:%S");

            writeln!(out, "[{stamp}]").context("Failed to write frame")?;
            writeln!(out, "{}", frame.to_plain_string()).context("Failed to write frame")?;
            frames += 1;

            if !self.source.is_simulated() {
                break;
            }
            self.source.advance();
            if self.source.is_ended() {
                break;
            }
        }
        out.flush().context("Failed to flush output")?;
        Ok(frames)
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
