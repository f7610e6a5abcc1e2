//! Percentage scale drawn under the bar.

use super::bar::percent_offset;
use crate::constants::SCALE_STEPS;

/// Scale markers spaced to match a bar `length` characters long.
///
/// Uses the smallest step from [`SCALE_STEPS`] that still leaves whitespace
/// between every marker. Returns `None` if no step fits.
pub fn scale_for_length(length: usize) -> Option<String> {
    if length == 0 {
        return None;
    }
    SCALE_STEPS
        .iter()
        .find_map(|&step| candidate_scale(length, step))
}

// Lay out markers 0, step, 2*step, ..., <= 100. Where markers overlap the one
// placed first keeps the position. The candidate is usable only if splitting
// it on whitespace gives back every marker.
fn candidate_scale(length: usize, step: u32) -> Option<String> {
    let markers: Vec<u32> = (0..=100).step_by(step as usize).collect();

    let mut positions: Vec<Option<char>> = Vec::new();
    for marker in &markers {
        let offset = percent_offset(length, f64::from(*marker));
        for (i, ch) in marker.to_string().chars().enumerate() {
            let x = offset + i;
            if positions.len() <= x {
                positions.resize(x + 1, None);
            }
            positions[x].get_or_insert(ch);
        }
    }

    let candidate: String = positions.into_iter().map(|c| c.unwrap_or(' ')).collect();
    if candidate.split_whitespace().count() == markers.len() {
        Some(candidate)
    } else {
        None
    }
}
