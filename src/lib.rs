pub mod assemble;
pub mod dump;
pub mod error;
pub mod event;
pub mod merge;
pub mod notation;
pub mod settings;
pub mod smf;

pub use assemble::assemble;
pub use dump::{render_file, render_json};
pub use error::*;
pub use event::{Event, MidiFile, Track};
pub use merge::{merge_file, merge_tracks};
pub use notation::compile_source;
pub use settings::Settings;
pub use smf::{decode, encode};

/// Compile notation source into an in-memory MIDI file.
/// This is the main entry point for the library.
pub fn compile(source: &str) -> Result<MidiFile, MidiError> {
    compile_source(source)
}

/// Compile notation source straight to Standard MIDI File bytes
pub fn compile_to_smf(source: &str) -> Result<Vec<u8>, MidiError> {
    encode(&compile_source(source)?)
}

/// Compile with every track merged into one (format 0 output)
pub fn compile_merged(source: &str) -> Result<Vec<u8>, MidiError> {
    let midi = compile_source(source)?;
    encode(&merge_file(&midi)?)
}
