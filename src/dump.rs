//! # Text Dump
//!
//! Human-readable listing of a decoded [`MidiFile`], one event per line:
//!
//! ```text
//! NumTracks=1 Format=1 Division=256
//!
//! Track 0 ; 4 events
//! 0 MetaEvent 3 76 101 97 100 ; name="Lead"
//! 0 NoteOn 0 60 64
//! 204 NoteOff 0 60 0
//! 0 MetaEvent 47 ; end of track
//! ```
//!
//! Every line is `delta Kind fields...` in decimal, optionally followed by a `;`
//! comment. The [`assemble`](crate::assemble) module reads this format back.

use crate::error::MidiError;
use crate::event::{Event, MidiFile, META_END_OF_TRACK, META_TEMPO, META_TRACK_NAME};
use std::fmt::Write;

/// Render a whole file: the header line, then each track after a blank line
pub fn render_file(midi: &MidiFile) -> String {
    let mut out = format!(
        "NumTracks={} Format={} Division={}\n",
        midi.tracks.len(),
        midi.format,
        midi.division
    );
    for (index, track) in midi.tracks.iter().enumerate() {
        out.push('\n');
        out.push_str(&render_track(index, track));
    }
    out
}

/// Render one track under its `Track <index>` heading
pub fn render_track(index: usize, track: &[Event]) -> String {
    let mut out = format!("Track {} ; {} events\n", index, track.len());
    for event in track {
        out.push_str(&render_event(event, track));
        out.push('\n');
    }
    out
}

/// Render a single event. `track` resolves running-status predecessors.
pub fn render_event(event: &Event, track: &[Event]) -> String {
    let mut line = format!("{} {}", event.delta(), event.kind_name());
    let fields: Vec<u8> = match event {
        Event::Meta {
            meta_type, data, ..
        } => std::iter::once(*meta_type).chain(data.iter().copied()).collect(),
        Event::SystemExclusive { data, .. } | Event::RunningStatus { data, .. } => data.clone(),
        Event::ChannelNote {
            channel,
            note,
            velocity,
            ..
        } => vec![*channel, *note, *velocity],
        Event::ProgramChange {
            channel, program, ..
        } => vec![*channel, *program],
        Event::ControlChange {
            channel,
            controller,
            value,
            ..
        } => vec![*channel, *controller, *value],
        Event::PolyphonicKeyPressure {
            channel,
            note,
            value,
            ..
        } => vec![*channel, *note, *value],
    };
    for field in fields {
        let _ = write!(line, " {}", field);
    }
    if let Some(comment) = comment(event, track) {
        let _ = write!(line, " ; {}", comment);
    }
    line
}

fn comment(event: &Event, track: &[Event]) -> Option<String> {
    match event {
        Event::Meta {
            meta_type, data, ..
        } => match *meta_type {
            META_TRACK_NAME => Some(format!("name=\"{}\"", String::from_utf8_lossy(data))),
            META_TEMPO if data.len() == 3 => {
                let micros =
                    (u32::from(data[0]) << 16) | (u32::from(data[1]) << 8) | u32::from(data[2]);
                Some(format!("tempo={}", micros))
            }
            META_END_OF_TRACK => Some("end of track".to_string()),
            _ => None,
        },
        Event::RunningStatus { previous, .. } => {
            let source = track.get(*previous)?;
            Some(format!("{}:{}", source.kind_name(), source.channel()?))
        }
        _ => None,
    }
}

/// The same file as pretty-printed JSON
pub fn render_json(midi: &MidiFile) -> Result<String, MidiError> {
    serde_json::to_string_pretty(midi).map_err(|e| MidiError::SerializeError(e.to_string()))
}
