//! Statistical normalization and thresholding of the onset and duration
//! channels.

use crate::constants::DEFAULT_T_UNIT;
use crate::postprocessing::helpers::ported::numpy::z_score;
use crate::postprocessing::interpolation::interpolate;

/// Normalize and threshold one instrument's duration and onset channels.
///
/// The onset channel is first clipped against the duration channel: an
/// onset cannot exceed the sustained duration strength at the same
/// position, so those entries are forced to zero. After z-scoring and
/// thresholding the onset, the (already thresholded) onset is added onto
/// the normalized duration channel before its own threshold is applied, so
/// genuine onsets reinforce duration detection at the same frame.
///
/// # Arguments
///
/// * `duration` - Duration channel, time x pitch.
/// * `onset` - Onset channel, time x pitch.
/// * `onset_th` - Threshold for the (normalized) onset channel.
/// * `dura_th` - Threshold for the (normalized) duration channel.
/// * `upsample` - Whether to interpolate both channels to double time
///   resolution first (note modes).
/// * `normalize` - Whether to z-score the channels before thresholding.
///
/// # Returns
///
/// * The thresholded `(duration, onset)` channels; every entry is either 0
///   or a retained positive magnitude.
pub fn normalize_onset_duration(
    duration: &[Vec<f32>],
    onset: &[Vec<f32>],
    onset_th: f32,
    dura_th: f32,
    upsample: bool,
    normalize: bool,
) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let (duration, mut onset) = if upsample {
        (
            interpolate(duration, DEFAULT_T_UNIT, DEFAULT_T_UNIT / 2.0),
            interpolate(onset, DEFAULT_T_UNIT, DEFAULT_T_UNIT / 2.0),
        )
    } else {
        (duration.to_vec(), onset.to_vec())
    };

    for (onset_row, duration_row) in onset.iter_mut().zip(&duration) {
        for (on, du) in onset_row.iter_mut().zip(duration_row) {
            if *on <= *du {
                *on = 0.0;
            }
        }
    }

    let mut onset = if normalize { z_score(&onset) } else { onset };
    zero_below(&mut onset, onset_th);

    let mut duration = if normalize { z_score(&duration) } else { duration };
    for (duration_row, onset_row) in duration.iter_mut().zip(&onset) {
        for (du, on) in duration_row.iter_mut().zip(onset_row) {
            *du += *on;
        }
    }
    zero_below(&mut duration, dura_th);

    (duration, onset)
}

/// Split-threshold variant of [`normalize_onset_duration`].
///
/// Lower pitches systematically predict smaller magnitudes than higher
/// ones, so the pitch columns below `split_bound` are normalized and
/// thresholded independently with `lower_onset_th`, the rest with
/// `onset_th`, and the two halves are joined back together.
#[allow(clippy::too_many_arguments)]
pub fn normalize_split_onset_duration(
    duration: &[Vec<f32>],
    onset: &[Vec<f32>],
    onset_th: f32,
    lower_onset_th: f32,
    split_bound: usize,
    dura_th: f32,
    upsample: bool,
    normalize: bool,
) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let (lower_duration, upper_duration) = split_columns(duration, split_bound);
    let (lower_onset, upper_onset) = split_columns(onset, split_bound);

    let (lower_duration, lower_onset) = normalize_onset_duration(
        &lower_duration,
        &lower_onset,
        lower_onset_th,
        dura_th,
        upsample,
        normalize,
    );
    let (upper_duration, upper_onset) = normalize_onset_duration(
        &upper_duration,
        &upper_onset,
        onset_th,
        dura_th,
        upsample,
        normalize,
    );

    (
        join_columns(&lower_duration, &upper_duration),
        join_columns(&lower_onset, &upper_onset),
    )
}

/// Bias every retained (positive) entry by +1 so active duration frames can
/// never sum to zero in the offset scan of the peak segmenter.
pub fn bias_active(data: &mut [Vec<f32>]) {
    for row in data {
        for value in row {
            if *value > 0.0 {
                *value += 1.0;
            } else {
                *value = 0.0;
            }
        }
    }
}

fn zero_below(data: &mut [Vec<f32>], threshold: f32) {
    for row in data {
        for value in row {
            if *value < threshold {
                *value = 0.0;
            }
        }
    }
}

fn split_columns(data: &[Vec<f32>], bound: usize) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let lower = data.iter().map(|row| row[..bound.min(row.len())].to_vec()).collect();
    let upper = data.iter().map(|row| row[bound.min(row.len())..].to_vec()).collect();
    (lower, upper)
}

fn join_columns(lower: &[Vec<f32>], upper: &[Vec<f32>]) -> Vec<Vec<f32>> {
    lower
        .iter()
        .zip(upper)
        .map(|(lo, up)| lo.iter().chain(up).copied().collect())
        .collect()
}
