//! The symbolic output types: note events, instrument tracks and the score.

use crate::constants::program_name;

/// A single discrete note, in absolute time and MIDI pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    /// Absolute semitone number, 21 (A0) through 108 (C8).
    pub pitch: u8,
    pub start_time_seconds: f32,
    pub end_time_seconds: f32,
    /// MIDI velocity, mapped into 60..=127 per score.
    pub velocity: u8,
}

/// One instrument's notes. Notes follow detection order: by pitch, then by
/// onset within a pitch, before the global start-frame sort.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub program: u8,
    pub name: String,
    pub notes: Vec<NoteEvent>,
}

impl Track {
    pub fn new(program: u8) -> Self {
        Self {
            program,
            name: program_name(program).to_string(),
            notes: Vec::new(),
        }
    }
}

/// The assembled result of one inference call: an ordered collection of
/// instrument tracks. Tracks keep the instrument-channel order of the
/// prediction tensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    pub tracks: Vec<Track>,
}

impl Score {
    /// Total number of notes across all tracks.
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|track| track.notes.len()).sum()
    }
}
