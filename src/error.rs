//! # Error Types
//!
//! This module defines the single error type shared by every stage of notemidi.
//!
//! Every variant carries enough location information (byte offset, source line, or
//! track index) to point at the offending input. Errors are always fatal to the
//! conversion in progress: no stage produces partial output.
//!
//! ## Error Types
//! - `FormatError` - Malformed or unsupported Standard MIDI File bytes
//! - `NoteSyntaxError` - A note token that does not follow the notation grammar
//! - `UnknownDirectiveError` - An unrecognized `:` directive or a bad `NumTracks=` header
//! - `CountMismatchError` - Declared track count differs from the tracks present
//! - `EmptyTrackError` - A track handed to the merger has no events
//! - `MetadataError` - Invalid YAML settings in the notation front matter
//! - `AssemblyError` - A line of a text event dump that cannot be assembled
//! - `RunningStatusError` - A running-status event that cannot be expanded
//! - `SerializeError` - JSON rendering failed
//!
//! ## Usage
//! ```rust
//! use notemidi::{compile, MidiError};
//!
//! match compile("C4 D E F") {
//!     Ok(midi) => println!("{} tracks", midi.tracks.len()),
//!     Err(MidiError::NoteSyntaxError { line, text, message }) => {
//!         eprintln!("line {}: bad note '{}': {}", line, text, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MidiError {
    /// Malformed binary input.
    ///
    /// `offset` is the byte position in the input where decoding gave up.
    ///
    /// # Example
    /// ```
    /// # use notemidi::MidiError;
    /// let err = MidiError::FormatError {
    ///     offset: 0,
    ///     message: "missing 'MThd' header".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Format error at byte 0: missing 'MThd' header");
    /// ```
    #[error("Format error at byte {offset}: {message}")]
    FormatError { offset: usize, message: String },

    /// A note token violates the notation grammar.
    ///
    /// # Example
    /// ```
    /// # use notemidi::MidiError;
    /// let err = MidiError::NoteSyntaxError {
    ///     line: 3,
    ///     text: "C4#5".to_string(),
    ///     message: "unexpected '#5' after the pitch".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Note syntax error at line 3 in 'C4#5': unexpected '#5' after the pitch"
    /// );
    /// ```
    #[error("Note syntax error at line {line} in '{text}': {message}")]
    NoteSyntaxError {
        line: usize,
        text: String,
        message: String,
    },

    /// Unrecognized `:` directive, or a malformed `NumTracks=...` header line.
    #[error("Unknown directive at line {line}: '{text}'")]
    UnknownDirectiveError { line: usize, text: String },

    /// The number of tracks found differs from the number declared.
    #[error("Expected {declared} tracks but found {actual}")]
    CountMismatchError { declared: usize, actual: usize },

    /// The merger was given a track with no events.
    #[error("Track {index} has no events to merge")]
    EmptyTrackError { index: usize },

    /// Invalid settings in the YAML front matter.
    ///
    /// # Example
    /// ```
    /// # use notemidi::MidiError;
    /// let err = MidiError::MetadataError("channel must be 0-15, got 16".to_string());
    /// assert_eq!(err.to_string(), "Invalid settings: channel must be 0-15, got 16");
    /// ```
    #[error("Invalid settings: {0}")]
    MetadataError(String),

    /// A text event dump line that cannot be turned back into an event.
    #[error("Assembly error at line {line}: {message}")]
    AssemblyError { line: usize, message: String },

    /// A running-status event with no usable predecessor.
    ///
    /// `index` is the position of the running-status event within its track.
    ///
    /// # Example
    /// ```
    /// # use notemidi::MidiError;
    /// let err = MidiError::RunningStatusError {
    ///     index: 4,
    ///     message: "cannot follow a ProgramChange event".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Running status error at track event 4: cannot follow a ProgramChange event"
    /// );
    /// ```
    #[error("Running status error at track event {index}: {message}")]
    RunningStatusError { index: usize, message: String },

    /// The event model could not be rendered as JSON.
    #[error("Serialization error: {0}")]
    SerializeError(String),
}
