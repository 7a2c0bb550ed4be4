//! # Notation Compiler
//!
//! Compiles the line-oriented notation language into MIDI tracks.
//!
//! ## Source Layout
//! ```text
//! ---                      optional YAML settings (see `settings`)
//! volume: 0.6
//! ---
//! Track Melody             starts a named track
//! :voice 73                directive: program change
//! :tempo=96                directive: tempo meta event
//! 4C D E F | 2G G          note tokens, bars are ignored
//! 8E:G:C+ R 4.~A A         chords, rests, dots, ties
//! ```
//!
//! ## Pipeline
//! 1. `settings::extract_front_matter` - settings block, line numbers preserved
//! 2. [`split_tracks`] - comments, blank lines, `Track` headers
//! 3. [`compile_track`] - directives and note tokens to events, per track
//!
//! ## Timing
//! A note lasts `ticks_per_whole / length` ticks (triplets and duplets scale the length,
//! a dot adds half). It sounds for `note_on_percent` of that and stays silent for the
//! rest, which becomes the delta of the next event. Tied notes share a single note-on
//! and note-off spanning their combined duration.
//!
//! ## Example
//! ```rust
//! use notemidi::event::Event;
//! use notemidi::notation::compile_source;
//!
//! let midi = compile_source("Track Lead\nC4").unwrap();
//! let track = &midi.tracks[0];
//! assert_eq!(track[0], Event::track_name(0, "Lead"));
//! assert!(matches!(track[1], Event::ChannelNote { is_on: true, note: 60, .. }));
//! assert!(matches!(track[2], Event::ChannelNote { is_on: false, delta: 204, .. }));
//! assert!(track[3].is_end_of_track());
//! ```

mod compiler;
mod note;
mod source;

#[cfg(test)]
mod tests;

pub use compiler::{compile_track, SourceLine};
pub use note::{
    parse_note, Accent, Accidental, NoteDefaults, NoteDescriptor, NoteName, Pitch, Plet, Ticks,
};
pub use source::{split_tracks, TrackSource, IMPLICIT_TRACK_NAME};

use crate::error::MidiError;
use crate::event::MidiFile;
use crate::settings::{extract_front_matter, Settings};

/// Compile a whole notation source, front matter included
pub fn compile_source(source: &str) -> Result<MidiFile, MidiError> {
    let (front_matter, body) = extract_front_matter(source);
    let settings = match front_matter {
        Some(yaml) => Settings::from_yaml(&yaml)?,
        None => Settings::default(),
    };
    compile_with_settings(&body, &settings)
}

/// Compile a notation body (no front matter) with explicit settings
pub fn compile_with_settings(body: &str, settings: &Settings) -> Result<MidiFile, MidiError> {
    let mut midi = MidiFile::new(settings.format, settings.division);
    for track in split_tracks(body) {
        midi.tracks
            .push(compile_track(&track.name, &track.lines, settings)?);
    }
    Ok(midi)
}
