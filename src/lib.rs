//! # linear-terminal-clock
//!
//! A terminal clock that shows the day as a bar running from one sunrise to
//! the next, with the sunset marked where it falls.
//!
//! The library backs two binaries: `linear-terminal-clock`, the live clock,
//! and `linear-terminal-clock-simulate-time`, which drives the same clock with
//! simulated time.
//!
//! ## Architecture
//!
//! - **Astronomy**: `geo` computes solar events and the sunrise-to-sunrise
//!   cycle spanning an instant
//! - **Rendering**: `render` turns a cycle and an instant into a frame of
//!   styled cells and puts it on the terminal
//! - **Loop**: `clock` drives rendering from a `time_source`, handling keys,
//!   resizes and `signals`
//! - **Configuration**: `config` for TOML settings with a private geo.toml
//! - **Infrastructure**: `logger`, `args`, `commands`, `memo`

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod clock;
pub mod commands;
pub mod config;
pub mod constants;
pub mod geo;
pub mod memo;
pub mod render;
pub mod signals;
pub mod time_source;
pub mod utils;

pub use clock::Clock;
