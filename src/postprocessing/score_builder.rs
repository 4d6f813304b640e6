//! Assembles note candidates into an instrument track.

use crate::constants::MIDI_OFFSET;
use crate::postprocessing::pitch_events::NoteCandidate;
use crate::postprocessing::velocity::{strength_bounds, velocity_map};
use crate::score::{NoteEvent, Track};

/// Convert the candidates of one instrument into a [`Track`].
///
/// Frame indices become seconds via `t_unit`, pitch classes are offset
/// into absolute semitone numbers, and velocities come from the per-score
/// min-max strength mapping. Notes keep candidate order.
pub fn build_track(notes: &[NoteCandidate], t_unit: f32, program: u8) -> Track {
    let (low, high) = strength_bounds(notes);
    let v_map = velocity_map(low, high);

    let mut track = Track::new(program);
    for note in notes {
        track.notes.push(NoteEvent {
            pitch: (note.pitch + MIDI_OFFSET) as u8,
            start_time_seconds: note.start as f32 * t_unit,
            end_time_seconds: note.end as f32 * t_unit,
            velocity: v_map(note.strength),
        });
    }
    track
}
