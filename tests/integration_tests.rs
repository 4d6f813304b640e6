//! End-to-end tests for the note inference pipeline, driving synthetic
//! prediction tensors through every supported mode.

use ndarray::Array3;
use pretty_assertions::assert_eq;

use score_inference::{infer_score, InferenceConfig, InferenceError, Mode, Score, Threshold};

/// Check the output invariants every score must satisfy.
fn assert_score_invariants(score: &Score) {
    for track in &score.tracks {
        for note in &track.notes {
            assert!(
                note.start_time_seconds < note.end_time_seconds,
                "note must end after it starts: {:?}",
                note
            );
            assert!((21..=108).contains(&note.pitch), "pitch out of range: {:?}", note);
            assert!(
                (60..=127).contains(&note.velocity),
                "velocity out of range: {:?}",
                note
            );
        }
    }
}

/// A tensor with one sustained note at `pitch`: a Gaussian onset bump of
/// width 7 centered on frame 35 (frames 30..=40) and a duration plateau
/// over frames 30..50.
fn single_note_tensor(pitch: usize) -> Array3<f32> {
    let mut pred = Array3::<f32>::zeros((100, 88, 3));
    for t in 30..50 {
        pred[[t, pitch, 1]] = 1.0;
    }
    for t in 30..=40usize {
        let d = t as f32 - 35.0;
        pred[[t, pitch, 2]] = (-d * d / 8.0).exp();
    }
    pred
}

#[test]
fn scenario_a_single_note_is_transcribed() {
    let pred = single_note_tensor(40);
    let score = infer_score(pred.view(), &InferenceConfig::default()).unwrap();

    assert_eq!(score.tracks.len(), 1);
    assert_eq!(score.tracks[0].program, 0);
    assert_eq!(score.tracks[0].name, "Acoustic Grand Piano");
    assert_eq!(score.tracks[0].notes.len(), 1);

    let note = &score.tracks[0].notes[0];
    assert_eq!(note.pitch, 61); // 40 + 21
    assert!(
        (0.55..=0.72).contains(&note.start_time_seconds),
        "start {} out of expected range",
        note.start_time_seconds
    );
    assert!(
        (0.95..=1.07).contains(&note.end_time_seconds),
        "end {} out of expected range",
        note.end_time_seconds
    );
    // the only note in the score maps to the velocity floor
    assert_eq!(note.velocity, 60);

    assert_score_invariants(&score);
}

#[test]
fn scenario_b_silent_input_yields_one_empty_track() {
    let pred = Array3::<f32>::zeros((50, 88, 3));
    let score = infer_score(pred.view(), &InferenceConfig::default()).unwrap();

    assert_eq!(score.tracks.len(), 1);
    assert_eq!(score.note_count(), 0);
}

#[test]
fn scenario_c_incompatible_channel_count_fails() {
    let pred = Array3::<f32>::zeros((20, 88, 4));
    let config = InferenceConfig {
        mode: Mode::Frame,
        ..InferenceConfig::default()
    };
    assert_eq!(
        infer_score(pred.view(), &config),
        Err(InferenceError::UnsupportedChannelLayout {
            channels: 4,
            mode: "frame",
        })
    );
}

#[test]
fn scenario_d_unknown_mode_string_fails() {
    assert_eq!(
        "unknown".parse::<Mode>(),
        Err(InferenceError::UnsupportedMode("unknown".to_string()))
    );
}

/// Fill an instrument's channels with an alternating +/-`amplitude`
/// pattern, giving them a standard deviation of exactly `amplitude` and a
/// mean of zero.
fn fill_instrument(pred: &mut Array3<f32>, instrument: usize, amplitude: f32) {
    let (frames, pitches, _) = pred.dim();
    for ch in 0..2 {
        for t in 0..frames {
            for p in 0..pitches {
                let sign = if (t + p) % 2 == 0 { 1.0 } else { -1.0 };
                pred[[t, p, 1 + instrument * 2 + ch]] = sign * amplitude;
            }
        }
    }
}

#[test]
fn scenario_e_presence_gate_keeps_only_confident_instruments() {
    let mut pred = Array3::<f32>::zeros((200, 88, 7));
    fill_instrument(&mut pred, 0, 0.1);
    fill_instrument(&mut pred, 1, 0.1);
    fill_instrument(&mut pred, 2, 0.99);

    let config = InferenceConfig {
        mode: Mode::NoteStream,
        normalize: false,
        ..InferenceConfig::default()
    };
    let score = infer_score(pred.view(), &config).unwrap();

    // only instrument 2 clears the 0.95 gate
    assert_eq!(score.tracks.len(), 1);
    assert_eq!(score.tracks[0].program, 40);
    assert_eq!(score.tracks[0].name, "Violin");
}

#[test]
fn frame_mode_segments_activity_runs() {
    let mut pred = Array3::<f32>::zeros((60, 88, 3));
    for t in 10..30 {
        pred[[t, 30, 1]] = 1.0;
        pred[[t, 30, 2]] = 1.0;
    }
    let config = InferenceConfig {
        mode: Mode::Frame,
        normalize: false,
        frame_threshold: Threshold::Scalar(0.5),
        ..InferenceConfig::default()
    };
    let score = infer_score(pred.view(), &config).unwrap();

    assert_eq!(score.tracks.len(), 1);
    assert_eq!(score.tracks[0].notes.len(), 1);
    let note = &score.tracks[0].notes[0];
    assert_eq!(note.pitch, 51);
    assert!((note.start_time_seconds - 0.2).abs() < 1e-6);
    assert!((note.end_time_seconds - 0.58).abs() < 1e-6);
    assert_eq!(note.velocity, 60);

    assert_score_invariants(&score);
}

#[test]
fn frame_stream_mode_gates_and_segments_per_instrument() {
    // 1 background + 2 two-channel instruments; only the second has any
    // activity, a sustained block loud enough to clear the gate
    let mut pred = Array3::<f32>::zeros((60, 88, 5));
    for t in 10..40 {
        pred[[t, 25, 3]] = 3.0;
        pred[[t, 25, 4]] = 3.0;
    }
    let config = InferenceConfig {
        mode: Mode::FrameStream,
        normalize: false,
        instrument_threshold: 0.1,
        ..InferenceConfig::default()
    };
    let score = infer_score(pred.view(), &config).unwrap();

    // the silent first instrument is gated out entirely
    assert_eq!(score.tracks.len(), 1);
    assert_eq!(score.tracks[0].program, 6);
    assert_eq!(score.tracks[0].name, "Harpsichord");

    assert_eq!(score.tracks[0].notes.len(), 1);
    let note = &score.tracks[0].notes[0];
    assert_eq!(note.pitch, 46);
    assert!((note.start_time_seconds - 0.2).abs() < 1e-6);
    assert!((note.end_time_seconds - 0.78).abs() < 1e-6);

    assert_score_invariants(&score);
}

#[test]
fn true_frame_mode_merges_single_channel_instruments() {
    // 1 background + 2 single-channel instruments (legacy layout)
    let mut pred = Array3::<f32>::zeros((60, 88, 3));
    for t in 5..25 {
        pred[[t, 20, 1]] = 1.0;
        pred[[t, 20, 2]] = 1.0;
    }
    let config = InferenceConfig {
        mode: Mode::TrueFrame,
        normalize: false,
        frame_threshold: Threshold::Scalar(0.5),
        ..InferenceConfig::default()
    };
    let score = infer_score(pred.view(), &config).unwrap();

    assert_eq!(score.tracks.len(), 1);
    assert_eq!(score.tracks[0].notes.len(), 1);
    assert_eq!(score.tracks[0].notes[0].pitch, 41);
}

#[test]
fn per_instrument_threshold_lists_are_length_checked() {
    let pred = Array3::<f32>::zeros((20, 88, 7));
    let config = InferenceConfig {
        mode: Mode::NoteStream,
        onset_threshold: Threshold::PerInstrument(vec![5.0, 5.0]),
        ..InferenceConfig::default()
    };
    assert_eq!(
        infer_score(pred.view(), &config),
        Err(InferenceError::ThresholdLengthMismatch {
            expected: 3,
            actual: 2,
        })
    );
}

#[test]
fn split_thresholding_still_detects_high_register_notes() {
    let pred = single_note_tensor(40);
    let config = InferenceConfig {
        lower_onset_threshold: Some(5.0),
        split_bound: 36,
        ..InferenceConfig::default()
    };
    let score = infer_score(pred.view(), &config).unwrap();

    assert_eq!(score.tracks.len(), 1);
    assert_eq!(score.tracks[0].notes.len(), 1);
    assert_eq!(score.tracks[0].notes[0].pitch, 61);

    assert_score_invariants(&score);
}

#[test]
fn inference_is_deterministic() {
    let pred = single_note_tensor(40);
    let config = InferenceConfig::default();
    let first = infer_score(pred.view(), &config).unwrap();
    let second = infer_score(pred.view(), &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn chords_share_a_common_attack_frame() {
    let mut pred = Array3::<f32>::zeros((100, 88, 3));
    // same note shape on three pitches; the third attacks half a source
    // frame late, one frame at the upsampled resolution
    for (pitch, center) in [(40usize, 35.0f32), (44, 35.0), (47, 35.5)] {
        for t in 30..50 {
            pred[[t, pitch, 1]] = 1.0;
        }
        for t in 30..=41usize {
            let d = t as f32 - center;
            pred[[t, pitch, 2]] = (-d * d / 8.0).exp();
        }
    }
    let score = infer_score(pred.view(), &InferenceConfig::default()).unwrap();

    assert_eq!(score.tracks.len(), 1);
    let notes = &score.tracks[0].notes;
    assert_eq!(notes.len(), 3);
    let first_start = notes[0].start_time_seconds;
    for note in notes {
        assert!(
            (note.start_time_seconds - first_start).abs() < 1e-6,
            "onsets should snap to a common attack: {:?}",
            notes
        );
    }

    assert_score_invariants(&score);
}
