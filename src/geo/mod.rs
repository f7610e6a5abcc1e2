//! Where the sun is, and what that means for the bar.
//!
//! ## Module Structure
//!
//! - [`solar`]: sunrise, sunset and solar noon for a location and date, with
//!   polar day and polar night detection
//! - [`cycle`]: the sunrise-to-sunrise span the bar represents
//! - [`timezone`]: which civil zone the labels are drawn in
//!
//! Everything astronomical is computed in UTC. Civil time only appears at the
//! edges, when labels are formatted and when simulation bounds are parsed.

pub mod cycle;
pub mod solar;
pub mod timezone;

pub use cycle::{AnchorKind, Cycle, CycleTracker};
pub use solar::{Coordinates, DayKind, SolarCalculator, SolarEvents};
pub use timezone::{DisplayZone, ZoneSetting};
