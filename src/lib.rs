//! Decision layer for polyphonic music transcription.
//!
//! Converts the continuous frame-level pitch/instrument activations of an
//! upstream acoustic model into discrete note events organized into
//! instrument tracks. The input is a 3-D prediction tensor of shape
//! `[frames, 88, channels]`; the output is an in-memory [`Score`] ready
//! for notation export by a downstream collaborator.
//!
//! ```
//! use ndarray::Array3;
//! use score_inference::{infer_score, InferenceConfig};
//!
//! // a silent prediction yields one empty track, not an error
//! let pred = Array3::<f32>::zeros((100, 88, 3));
//! let score = infer_score(pred.view(), &InferenceConfig::default()).unwrap();
//! assert_eq!(score.tracks.len(), 1);
//! assert_eq!(score.note_count(), 0);
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod score;
pub mod postprocessing {
    pub mod helpers {
        pub mod ported {
            pub mod numpy;
            pub mod scipy;
        }
    }
    pub mod frame_events;
    pub mod interpolation;
    pub mod normalize;
    pub mod pitch_events;
    pub mod score_builder;
    pub mod velocity;
}

pub use config::{InferenceConfig, Mode, Threshold};
pub use error::InferenceError;
pub use inference::infer_score;
pub use score::{NoteEvent, Score, Track};
