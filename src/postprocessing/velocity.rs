//! Maps detected note strengths to a bounded MIDI velocity range.

use crate::constants::{VELOCITY_CEIL, VELOCITY_FLOOR};
use crate::postprocessing::pitch_events::NoteCandidate;

/// Minimum and maximum strength over one score's candidates.
pub fn strength_bounds(notes: &[NoteCandidate]) -> (f32, f32) {
    notes.iter().fold(
        (f32::INFINITY, f32::NEG_INFINITY),
        |(low, high), note| (low.min(note.strength), high.max(note.strength)),
    )
}

/// Build the strength-to-velocity map for one score.
///
/// The returned function maps linearly from `[min, max]` into
/// `[60, 127]`, clamped; the epsilon keeps it defined when every strength
/// in the score is identical, in which case every note lands on the floor
/// value. This is a per-score min-max normalization, not a universal
/// constant: strengths are only comparable within one score.
pub fn velocity_map(min: f32, max: f32) -> impl Fn(f32) -> u8 {
    let span = (VELOCITY_CEIL - VELOCITY_FLOOR) as f32;
    move |strength| {
        let scaled = VELOCITY_FLOOR as f32 + span * ((strength - min) / (max - min + 1e-4));
        scaled.clamp(VELOCITY_FLOOR as f32, VELOCITY_CEIL as f32) as u8
    }
}
