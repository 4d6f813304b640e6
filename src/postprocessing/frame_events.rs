//! Contiguous-run note segmentation for frame modes, where the model
//! produces no distinct onset channel.

use crate::constants::MIN_FRAME_NOTE_SEC;
use crate::postprocessing::pitch_events::NoteCandidate;

/// Find the onset and offset of every retained activity run in one
/// thresholded pitch column.
///
/// Frames with value > 0.5 count as active; a maximal contiguous run is
/// retained only if it spans at least `max(t_unit, min_duration)` seconds.
///
/// # Arguments
///
/// * `column` - Binarized activity values of one pitch, per frame.
/// * `t_unit` - Seconds per frame.
/// * `min_duration` - Minimum note duration floor in seconds.
///
/// # Returns
///
/// * `(onset, offset)` frame pairs. Empty when the column has no active
///   frame (not an error).
pub fn find_active_runs(column: &[f32], t_unit: f32, min_duration: f32) -> Vec<(usize, usize)> {
    let min_frames = min_duration.max(t_unit) / t_unit;

    let active: Vec<usize> = column
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| (v > 0.5).then_some(i))
        .collect();
    if active.is_empty() {
        return Vec::new();
    }

    let mut runs = Vec::new();
    let mut start = active[0];
    let mut last = active[0];
    for &idx in &active {
        if idx - last > 1 {
            if (last - start) as f32 >= min_frames {
                runs.push((start, last));
            }
            start = idx;
        }
        last = idx;
    }
    if (last - start) as f32 >= min_frames {
        runs.push((start, last));
    }
    runs
}

/// Segment a binarized activity channel into note candidates, reading each
/// note's strength from the underlying pre-binarized magnitude at its
/// onset frame.
pub fn segment_frames(
    binarized: &[Vec<f32>],
    magnitude: &[Vec<f32>],
    t_unit: f32,
) -> Vec<NoteCandidate> {
    let n_pitches = binarized.first().map_or(0, |row| row.len());

    let mut notes = Vec::new();
    for pitch in 0..n_pitches {
        let column: Vec<f32> = binarized.iter().map(|row| row[pitch]).collect();
        for (onset, offset) in find_active_runs(&column, t_unit, MIN_FRAME_NOTE_SEC) {
            notes.push(NoteCandidate {
                pitch,
                start: onset,
                end: offset,
                strength: magnitude[onset][pitch],
            });
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_column_yields_no_runs() {
        assert!(find_active_runs(&vec![0.0; 50], 0.02, 0.03).is_empty());
    }

    #[test]
    fn run_bounds_are_first_and_last_active_frame() {
        let mut column = vec![0.0f32; 50];
        for v in column.iter_mut().take(30).skip(10) {
            *v = 1.0;
        }
        assert_eq!(find_active_runs(&column, 0.02, 0.03), vec![(10, 29)]);
    }

    #[test]
    fn gaps_split_runs_and_short_runs_are_dropped() {
        let mut column = vec![0.0f32; 50];
        // a long run, a gap, then a run of a single frame
        for v in column.iter_mut().take(20).skip(5) {
            *v = 1.0;
        }
        column[30] = 1.0;
        // min floor 0.03s at t_unit 0.02 is 1.5 frames
        assert_eq!(find_active_runs(&column, 0.02, 0.03), vec![(5, 19)]);
    }

    #[test]
    fn strength_is_read_at_the_onset_frame() {
        let mut binarized = vec![vec![0.0f32; 3]; 20];
        let mut magnitude = vec![vec![0.0f32; 3]; 20];
        for t in 4..12 {
            binarized[t][1] = 1.0;
            magnitude[t][1] = 0.1 * t as f32;
        }
        let notes = segment_frames(&binarized, &magnitude, 0.02);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].pitch, 1);
        assert_eq!(notes[0].start, 4);
        assert_eq!(notes[0].end, 11);
        assert!((notes[0].strength - 0.4).abs() < 1e-6);
    }
}
