//! Configuration for one inference call.

use std::str::FromStr;

use crate::constants::{DEFAULT_T_UNIT, MUSICNET_PROGRAM_MAPPING};
use crate::error::InferenceError;

/// Inference mode. The `*Stream` variants classify notes into one track per
/// instrument; the plain variants merge every instrument into a single
/// track. `Note*` modes consume a distinct onset channel next to the
/// duration channel, `Frame*` modes segment the duration channel alone,
/// which usually gives a rougher listening experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Note,
    NoteStream,
    Frame,
    FrameStream,
    /// Compatibility mode for older models trained on pure frame-level
    /// targets with a single channel per instrument. Behaves as `Frame`.
    TrueFrame,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Note => "note",
            Mode::NoteStream => "note-stream",
            Mode::Frame => "frame",
            Mode::FrameStream => "frame-stream",
            Mode::TrueFrame => "true_frame",
        }
    }

    /// Number of prediction channels each instrument occupies, on top of
    /// the shared background channel.
    pub fn channels_per_instrument(&self) -> usize {
        match self {
            Mode::TrueFrame => 1,
            _ => 2,
        }
    }

    /// Whether notes are split into per-instrument tracks.
    pub fn is_stream(&self) -> bool {
        matches!(self, Mode::NoteStream | Mode::FrameStream)
    }

    /// Whether segmentation is driven by onset peaks rather than frame runs.
    pub fn is_note(&self) -> bool {
        matches!(self, Mode::Note | Mode::NoteStream)
    }
}

impl FromStr for Mode {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Mode::Note),
            "note-stream" => Ok(Mode::NoteStream),
            "frame" => Ok(Mode::Frame),
            "frame-stream" => Ok(Mode::FrameStream),
            "true_frame" => Ok(Mode::TrueFrame),
            other => Err(InferenceError::UnsupportedMode(other.to_string())),
        }
    }
}

/// A threshold that is either shared by every instrument or given per
/// instrument. List-valued thresholds must match the number of inferred
/// instruments exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    Scalar(f32),
    PerInstrument(Vec<f32>),
}

impl Threshold {
    /// Resolve to one threshold per instrument.
    ///
    /// # Errors
    ///
    /// `ThresholdLengthMismatch` when a per-instrument list does not have
    /// exactly `count` entries.
    pub fn resolve(&self, count: usize) -> Result<Vec<f32>, InferenceError> {
        match self {
            Threshold::Scalar(value) => Ok(vec![*value; count]),
            Threshold::PerInstrument(values) => {
                if values.len() == count {
                    Ok(values.clone())
                } else {
                    Err(InferenceError::ThresholdLengthMismatch {
                        expected: count,
                        actual: values.len(),
                    })
                }
            }
        }
    }
}

impl From<f32> for Threshold {
    fn from(value: f32) -> Self {
        Threshold::Scalar(value)
    }
}

/// Options recognized by [`crate::infer_score`].
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Inference mode (default: `Note`).
    pub mode: Mode,

    /// Threshold applied to the normalized onset channel (default: 5.0).
    pub onset_threshold: Threshold,

    /// Optional lower-register onset threshold. When set, pitch columns
    /// below `split_bound` are thresholded with this value instead of
    /// `onset_threshold`. Low pitches systematically predict smaller
    /// magnitudes than high pitches, so a single global threshold under-
    /// or over-fires depending on register.
    pub lower_onset_threshold: Option<f32>,

    /// Pitch column splitting the low and high register, 0..=87
    /// (default: 36).
    pub split_bound: usize,

    /// Threshold applied to the normalized duration channel (default: 2.0).
    pub duration_threshold: Threshold,

    /// Binarization threshold for frame modes (default: 1.0).
    pub frame_threshold: Threshold,

    /// Instrument presence gate: in multi-instrument modes an instrument is
    /// emitted only when the mean standard deviation of its prediction
    /// channels exceeds this value (default: 0.95).
    pub instrument_threshold: f32,

    /// Whether to z-score normalize prediction channels (default: true).
    pub normalize: bool,

    /// Seconds per source frame (default: 0.02). Should match the feature
    /// extraction settings of the upstream model.
    pub t_unit: f32,

    /// Maps instrument index to output MIDI program number (default: the
    /// MusicNet instrument set).
    pub channel_program_mapping: Vec<u8>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Note,
            onset_threshold: Threshold::Scalar(5.0),
            lower_onset_threshold: None,
            split_bound: 36,
            duration_threshold: Threshold::Scalar(2.0),
            frame_threshold: Threshold::Scalar(1.0),
            instrument_threshold: 0.95,
            normalize: true,
            t_unit: DEFAULT_T_UNIT,
            channel_program_mapping: MUSICNET_PROGRAM_MAPPING.to_vec(),
        }
    }
}
