//! Peak-based note event segmentation, one pitch row at a time, plus the
//! onset alignment pass that cleans up chord attacks.

use rayon::prelude::*;

use crate::constants::{PEAK_WIDTH_MIN, PITCH_CLASSES};
use crate::postprocessing::helpers::ported::scipy::find_peaks;

/// A detected note span in frame units, before velocity mapping and time
/// conversion. `start < end` holds for every emitted candidate. The
/// strength is an unnormalized magnitude used only for relative velocity
/// ranking within one score.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteCandidate {
    /// Pitch class, 0..=87.
    pub pitch: usize,
    pub start: usize,
    pub end: usize,
    pub strength: f32,
}

/// Segment one pitch row into note candidates.
///
/// Onset peaks become provisional notes spanning to the next peak (the
/// last one spans to the end of the sequence), shifted backward to
/// compensate for the peak detector's lag. Each note's end is then refined
/// to the first frame whose forward duration window sums to zero; a note
/// whose refined end lands closer than `shortest` frames to its start is
/// discarded as spurious.
///
/// # Arguments
///
/// * `pitch` - Pitch class of this row, stamped onto the candidates.
/// * `onset` - Onset channel values of this row, per frame.
/// * `duration` - Duration channel values of this row, per frame.
/// * `shortest` - Minimum note length and peak separation, in frames.
/// * `offset_interval` - Width of the forward silence-scan window, frames.
pub fn infer_pitch(
    pitch: usize,
    onset: &[f32],
    duration: &[f32],
    shortest: usize,
    offset_interval: usize,
) -> Vec<NoteCandidate> {
    let peaks = find_peaks(onset, shortest, PEAK_WIDTH_MIN);
    if peaks.is_empty() {
        return Vec::new();
    }

    // the detector reports peaks late; pull starts back accordingly
    let adjust = if shortest == 10 { 5 } else { 2 };

    let mut notes: Vec<NoteCandidate> = peaks
        .iter()
        .enumerate()
        .map(|(idx, &peak)| {
            let end = match peaks.get(idx + 1) {
                Some(&next) => next.saturating_sub(adjust),
                None => onset.len(),
            };
            NoteCandidate {
                pitch,
                start: peak.saturating_sub(adjust),
                end,
                strength: onset[peak],
            }
        })
        .collect();

    // offset refinement: one keep/discard decision per candidate, applied
    // after the full scan so no index shifting can occur
    let mut keep = vec![true; notes.len()];
    for (idx, &peak) in peaks.iter().enumerate() {
        let upper = peaks.get(idx + 1).copied().unwrap_or(duration.len());
        for i in peak..upper {
            let window_end = (i + offset_interval).min(duration.len());
            let window_sum: f32 = duration[i..window_end].iter().sum();
            if window_sum == 0.0 {
                if i - notes[idx].start < shortest {
                    keep[idx] = false;
                } else {
                    notes[idx].end = i;
                }
                break;
            }
        }
    }

    notes
        .into_iter()
        .zip(keep)
        .filter_map(|(note, kept)| kept.then_some(note))
        .collect()
}

/// Segment a full piece into note candidates.
///
/// The 88 pitch rows are mutually independent, so they fan out over a
/// worker pool; results are merged in pitch order before the global sort,
/// keeping the output deterministic regardless of scheduling.
///
/// # Arguments
///
/// * `duration` - Thresholded duration channel, time x pitch.
/// * `onset` - Thresholded onset channel, time x pitch.
/// * `shortest_sec` - Minimum note length in seconds.
/// * `offset_sec` - Forward silence-scan window in seconds.
/// * `t_unit` - Seconds per frame of the (possibly upsampled) channels.
///
/// # Returns
///
/// * All candidates, sorted by start frame with onsets aligned.
pub fn infer_piece(
    duration: &[Vec<f32>],
    onset: &[Vec<f32>],
    shortest_sec: f32,
    offset_sec: f32,
    t_unit: f32,
) -> Vec<NoteCandidate> {
    let shortest = (shortest_sec / t_unit).round() as usize;
    let offset_interval = (offset_sec / t_unit).round() as usize;

    let per_pitch: Vec<Vec<NoteCandidate>> = (0..PITCH_CLASSES)
        .into_par_iter()
        .map(|pitch| {
            let onset_col: Vec<f32> = onset.iter().map(|row| row[pitch]).collect();
            let duration_col: Vec<f32> = duration.iter().map(|row| row[pitch]).collect();
            if onset_col.iter().sum::<f32>() + duration_col.iter().sum::<f32>() <= 0.0 {
                return Vec::new();
            }
            log::trace!("segmenting pitch {}/{}", pitch + 1, PITCH_CLASSES);
            infer_pitch(pitch, &onset_col, &duration_col, shortest, offset_interval)
        })
        .collect();

    let mut notes: Vec<NoteCandidate> = per_pitch.into_iter().flatten().collect();
    // stable sort: candidates with equal starts stay in pitch order
    notes.sort_by_key(|note| note.start);
    align_onsets(&mut notes);
    notes
}

/// Tolerance, in frames, for snapping near-simultaneous onsets together.
const ALIGN_TOLERANCE: usize = 1;

/// Snap near-simultaneous onsets across pitches to a common start frame.
///
/// A single stateful pass over the start-sorted candidates: a note whose
/// start is within [`ALIGN_TOLERANCE`] of the running leader start is
/// snapped onto it, shifting its end by the same delta; otherwise the note
/// becomes the new leader. Processing order matters by design, mimicking a
/// monophonic leader onset per short time window.
pub fn align_onsets(notes: &mut [NoteCandidate]) {
    let mut last_start = 0usize;
    for note in notes.iter_mut() {
        let diff = note.start.saturating_sub(last_start);
        if diff <= ALIGN_TOLERANCE {
            note.start -= diff;
            note.end -= diff;
        } else {
            last_start = note.start;
        }
    }
}
