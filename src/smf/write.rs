//! Encoding of a [`MidiFile`] into Standard MIDI File bytes.

use super::cursor::write_vlq;
use super::{HEADER_LENGTH, HEADER_MAGIC, TRACK_MAGIC};
use crate::error::MidiError;
use crate::event::{Event, MidiFile};

/// Serialize a MIDI file.
///
/// Running-status events are written as their raw data bytes, so they must already
/// hold a valid elided-status sequence for the event they follow.
pub fn encode(midi: &MidiFile) -> Result<Vec<u8>, MidiError> {
    let track_count = u16::try_from(midi.tracks.len()).map_err(|_| MidiError::FormatError {
        offset: 0,
        message: format!("{} tracks do not fit in the header", midi.tracks.len()),
    })?;

    let mut out = Vec::new();
    out.extend_from_slice(HEADER_MAGIC);
    out.extend_from_slice(&HEADER_LENGTH.to_be_bytes());
    out.extend_from_slice(&midi.format.to_be_bytes());
    out.extend_from_slice(&track_count.to_be_bytes());
    out.extend_from_slice(&midi.division.to_be_bytes());

    for track in &midi.tracks {
        let data = encode_track(track)?;
        out.extend_from_slice(TRACK_MAGIC);
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(&data);
    }
    Ok(out)
}

/// Encode the event stream of one track (without the chunk header)
pub fn encode_track(track: &[Event]) -> Result<Vec<u8>, MidiError> {
    let mut data = Vec::new();
    for event in track {
        encode_event(&mut data, event)?;
    }
    Ok(data)
}

fn encode_event(out: &mut Vec<u8>, event: &Event) -> Result<(), MidiError> {
    write_vlq(out, event.delta())?;

    match event {
        Event::Meta {
            meta_type, data, ..
        } => {
            out.push(0xFF);
            out.push(*meta_type);
            write_vlq(out, data.len() as u32)?;
            out.extend_from_slice(data);
        }
        Event::SystemExclusive { data, .. } | Event::RunningStatus { data, .. } => {
            out.extend_from_slice(data);
        }
        Event::ChannelNote {
            channel,
            is_on,
            note,
            velocity,
            ..
        } => {
            let command = if *is_on { 0x90 } else { 0x80 };
            out.extend_from_slice(&[command | (channel & 0x0F), *note, *velocity]);
        }
        Event::PolyphonicKeyPressure {
            channel,
            note,
            value,
            ..
        } => {
            out.extend_from_slice(&[0xA0 | (channel & 0x0F), *note, *value]);
        }
        Event::ControlChange {
            channel,
            controller,
            value,
            ..
        } => {
            out.extend_from_slice(&[0xB0 | (channel & 0x0F), *controller, *value]);
        }
        Event::ProgramChange {
            channel, program, ..
        } => {
            out.extend_from_slice(&[0xC0 | (channel & 0x0F), *program]);
        }
    }
    Ok(())
}
