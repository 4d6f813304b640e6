//! The decision layer entry point: splits the prediction tensor into
//! per-instrument channels, gates out instruments the model is not
//! confident about, and dispatches each survivor through the event
//! segmentation pipeline.

use ndarray::{ArrayView3, Axis};
use rayon::prelude::*;

use crate::config::{InferenceConfig, Mode};
use crate::constants::{OFFSET_SCAN_SEC, PITCH_CLASSES, SHORTEST_NOTE_SEC};
use crate::error::InferenceError;
use crate::postprocessing::frame_events::segment_frames;
use crate::postprocessing::helpers::ported::numpy::{digitize_uniform, std_dev, z_score};
use crate::postprocessing::normalize::{
    bias_active, normalize_onset_duration, normalize_split_onset_duration,
};
use crate::postprocessing::pitch_events::infer_piece;
use crate::postprocessing::score_builder::build_track;
use crate::score::{Score, Track};

const ENTROPY_BINS: usize = 200;
const ENTROPY_MIN: f32 = -20.0;
const ENTROPY_MAX: f32 = 30.0;

/// Infer a symbolic [`Score`] from a raw prediction tensor.
///
/// The tensor has shape `[frames, 88, channels]`: channel 0 is the shared
/// background channel, followed by interleaved per-instrument channels
/// (duration, then onset for two-channel modes). The tensor is read-only
/// input; all thresholding happens on copies.
///
/// Instruments whose predictions fail the presence gate are skipped
/// entirely; an all-quiet input yields empty tracks (or an empty score in
/// stream modes), never an error.
///
/// # Errors
///
/// * `UnsupportedChannelLayout` - channel count incompatible with the mode.
/// * `ThresholdLengthMismatch` - a per-instrument threshold list does not
///   match the number of inferred instruments.
pub fn infer_score(
    pred: ArrayView3<f32>,
    config: &InferenceConfig,
) -> Result<Score, InferenceError> {
    let shape = pred.shape();
    debug_assert_eq!(
        shape[1], PITCH_CLASSES,
        "prediction tensor must be down-sampled to 88 pitch classes"
    );
    let channels = shape[2];

    let mode = config.mode;
    let ch_per_inst = mode.channels_per_instrument();
    if channels < 1 + ch_per_inst || (channels - 1) % ch_per_inst != 0 {
        return Err(InferenceError::UnsupportedChannelLayout {
            channels,
            mode: mode.as_str(),
        });
    }
    let instrument_count = (channels - 1) / ch_per_inst;

    // kind 0 is duration, kind 1 (when present) is onset; each kind holds
    // one (time x pitch) matrix per instrument
    let mut kinds: Vec<Vec<Vec<Vec<f32>>>> = (0..ch_per_inst)
        .map(|kind| {
            (0..instrument_count)
                .map(|inst| channel_matrix(&pred, inst * ch_per_inst + kind + 1))
                .collect()
        })
        .collect();

    if config.normalize {
        // one mean/std over the whole instrument stack of each kind, so
        // per-instrument magnitudes stay comparable for the presence gate
        for group in &mut kinds {
            z_score_group(group);
        }
    }

    let iters = if mode.is_stream() {
        instrument_count
    } else {
        // merge every instrument into a single averaged channel
        for group in &mut kinds {
            let merged = mean_across(group);
            *group = vec![merged];
        }
        1
    };

    let onset_th = config.onset_threshold.resolve(iters)?;
    let dura_th = config.duration_threshold.resolve(iters)?;
    let frm_th = config.frame_threshold.resolve(iters)?;

    // per-instrument dispatch is independent; collection is index-ordered
    // so track order never depends on scheduling
    let tracks: Vec<Option<Track>> = (0..iters)
        .into_par_iter()
        .map(|inst| {
            let inst_channels: Vec<&Vec<Vec<f32>>> =
                kinds.iter().map(|group| &group[inst]).collect();

            let std_avg = inst_channels.iter().map(|ch| std_dev(ch)).sum::<f32>()
                / ch_per_inst as f32;
            let ent_avg = inst_channels
                .iter()
                .map(|ch| channel_entropy(ch))
                .sum::<f32>()
                / ch_per_inst as f32;
            log::debug!(
                "instrument {}: std {:.3} ent {:.3} mult {:.3}",
                inst,
                std_avg,
                ent_avg,
                std_avg * ent_avg
            );

            if iters > 1 && !instrument_present(std_avg, config.instrument_threshold) {
                return Ok(None);
            }

            let program = config
                .channel_program_mapping
                .get(inst)
                .copied()
                .unwrap_or_else(|| {
                    log::warn!("no program mapped for instrument {}, defaulting to 0", inst);
                    0
                });

            infer_track(
                &inst_channels,
                mode,
                config,
                onset_th[inst],
                dura_th[inst],
                frm_th[inst],
                program,
            )
            .map(Some)
        })
        .collect::<Result<Vec<_>, InferenceError>>()?;

    Ok(Score {
        tracks: tracks.into_iter().flatten().collect(),
    })
}

/// The presence gate: only instruments whose mean channel standard
/// deviation strictly exceeds the threshold are emitted. A value exactly
/// at the boundary is excluded.
fn instrument_present(std_avg: f32, instrument_threshold: f32) -> bool {
    std_avg > instrument_threshold
}

/// Run the single-instrument pipeline over one set of channel matrices.
fn infer_track(
    channels: &[&Vec<Vec<f32>>],
    mode: Mode,
    config: &InferenceConfig,
    onset_th: f32,
    dura_th: f32,
    frm_th: f32,
    program: u8,
) -> Result<Track, InferenceError> {
    if mode.is_note() {
        let (mut duration, mut onset) = match config.lower_onset_threshold {
            Some(lower_onset_th) => normalize_split_onset_duration(
                channels[0],
                channels[1],
                onset_th,
                lower_onset_th,
                config.split_bound,
                dura_th,
                true,
                config.normalize,
            ),
            None => normalize_onset_duration(
                channels[0],
                channels[1],
                onset_th,
                dura_th,
                true,
                config.normalize,
            ),
        };
        bias_active(&mut duration);
        bias_active(&mut onset);

        // channels were upsampled 2x, so segmentation runs at half t_unit
        let t_unit = config.t_unit / 2.0;
        let notes = infer_piece(&duration, &onset, SHORTEST_NOTE_SEC, OFFSET_SCAN_SEC, t_unit);
        Ok(build_track(&notes, t_unit, program))
    } else {
        // frame-style segmentation: collapse the channels into one mix
        let mix: Vec<Vec<f32>> = match channels {
            [duration] => (*duration).clone(),
            [duration, onset] => duration
                .iter()
                .zip(onset.iter())
                .map(|(du_row, on_row)| {
                    du_row
                        .iter()
                        .zip(on_row)
                        .map(|(&du, &on)| (du + on) / 2.0)
                        .collect()
                })
                .collect(),
            other => {
                return Err(InferenceError::UnsupportedChannelLayout {
                    channels: other.len() + 1,
                    mode: mode.as_str(),
                })
            }
        };

        let prob = if config.normalize { z_score(&mix) } else { mix.clone() };
        let binarized: Vec<Vec<f32>> = prob
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&v| if v > frm_th { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();

        let notes = segment_frames(&binarized, &mix, config.t_unit);
        Ok(build_track(&notes, config.t_unit, program))
    }
}

/// Extract one channel of the tensor as a time-major matrix.
fn channel_matrix(pred: &ArrayView3<f32>, channel: usize) -> Vec<Vec<f32>> {
    pred.index_axis(Axis(2), channel)
        .outer_iter()
        .map(|row| row.to_vec())
        .collect()
}

/// Z-score a group of matrices against their joint mean and standard
/// deviation, equivalent to normalizing the stacked 3-D array at once.
fn z_score_group(group: &mut [Vec<Vec<f32>>]) {
    let mut sum = 0.0f32;
    let mut sum_squared = 0.0f32;
    let mut count = 0usize;
    for matrix in group.iter() {
        for row in matrix {
            for &value in row {
                sum += value;
                sum_squared += value * value;
                count += 1;
            }
        }
    }
    if count == 0 {
        return;
    }
    let mean = sum / count as f32;
    let std = (sum_squared / count as f32 - mean * mean).max(0.0).sqrt();

    for matrix in group.iter_mut() {
        for row in matrix.iter_mut() {
            for value in row.iter_mut() {
                // constant stacks degrade to silence rather than NaN
                *value = if std == 0.0 { 0.0 } else { (*value - mean) / std };
            }
        }
    }
}

/// Element-wise mean across a group of equally shaped matrices.
fn mean_across(group: &[Vec<Vec<f32>>]) -> Vec<Vec<f32>> {
    let n = group.len() as f32;
    let mut merged = group[0].clone();
    for matrix in &group[1..] {
        for (merged_row, row) in merged.iter_mut().zip(matrix) {
            for (acc, &value) in merged_row.iter_mut().zip(row) {
                *acc += value;
            }
        }
    }
    for row in &mut merged {
        for value in row {
            *value /= n;
        }
    }
    merged
}

/// Shannon entropy of the value distribution, discretized into fixed bins
/// over [-20, 30]. Reported next to the standard deviation as a diagnostic
/// but never consulted by the presence gate.
fn channel_entropy(data: &[Vec<f32>]) -> f32 {
    let interval = (ENTROPY_MAX - ENTROPY_MIN) / ENTROPY_BINS as f32;
    let mut counts = vec![0usize; ENTROPY_BINS + 2];
    for row in data {
        for &value in row {
            counts[digitize_uniform(value, ENTROPY_MIN, interval, ENTROPY_BINS)] += 1;
        }
    }

    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f32 / total as f32;
            -p * p.ln()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_gate_uses_a_strict_comparison() {
        assert!(!instrument_present(0.95, 0.95));
        assert!(!instrument_present(0.1, 0.95));
        assert!(instrument_present(0.96, 0.95));
    }

    #[test]
    fn constant_channel_has_zero_entropy() {
        let data = vec![vec![1.0f32; 10]; 10];
        assert!(channel_entropy(&data).abs() < 1e-6);
    }

    #[test]
    fn spread_values_raise_entropy() {
        let concentrated = vec![vec![0.0f32; 100]];
        let spread: Vec<Vec<f32>> = vec![(0..100).map(|i| i as f32 * 0.3 - 15.0).collect()];
        assert!(channel_entropy(&spread) > channel_entropy(&concentrated));
    }

    #[test]
    fn joint_normalization_keeps_relative_scale() {
        // one loud and one quiet instrument; after joint z-scoring the loud
        // one must still have the larger standard deviation
        let loud: Vec<Vec<f32>> = (0..50)
            .map(|t| vec![if t % 2 == 0 { 1.0 } else { -1.0 }; 4])
            .collect();
        let quiet: Vec<Vec<f32>> = (0..50)
            .map(|t| vec![if t % 2 == 0 { 0.1 } else { -0.1 }; 4])
            .collect();
        let mut group = vec![loud, quiet];
        z_score_group(&mut group);
        assert!(std_dev(&group[0]) > std_dev(&group[1]) * 5.0);
    }

    #[test]
    fn mean_across_averages_elementwise() {
        let a = vec![vec![1.0, 3.0]];
        let b = vec![vec![3.0, 5.0]];
        assert_eq!(mean_across(&[a, b]), vec![vec![2.0, 4.0]]);
    }
}
