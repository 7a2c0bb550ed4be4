//! # Assembler
//!
//! Reads the text listing produced by [`dump`](crate::dump) back into a [`MidiFile`].
//!
//! - `;` starts a comment; blank lines are skipped.
//! - The first line must be the header, `NumTracks=N Format=F Division=D`, keys in any
//!   order. A malformed header is an [`MidiError::UnknownDirectiveError`].
//! - `Track ...` starts a new track; every other line is one event.
//! - The number of `Track` sections must equal `NumTracks`.

use crate::error::MidiError;
use crate::event::{Event, MidiFile, Track};

/// Assemble a text event listing into a file
pub fn assemble(text: &str) -> Result<MidiFile, MidiError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, strip_comment(line).trim()))
        .filter(|(_, line)| !line.is_empty());

    let (declared, mut midi) = match lines.next() {
        Some((number, line)) => parse_header(number, line)?,
        None => {
            return Err(MidiError::UnknownDirectiveError {
                line: 1,
                text: String::new(),
            })
        }
    };

    for (number, line) in lines {
        if line == "Track" || line.starts_with("Track ") {
            midi.tracks.push(Track::new());
            continue;
        }
        let Some(track) = midi.tracks.last_mut() else {
            return Err(MidiError::AssemblyError {
                line: number,
                message: "event before the first 'Track' line".to_string(),
            });
        };
        let event = parse_event(line, track).map_err(|message| MidiError::AssemblyError {
            line: number,
            message,
        })?;
        track.push(event);
    }

    if midi.tracks.len() != declared {
        return Err(MidiError::CountMismatchError {
            declared,
            actual: midi.tracks.len(),
        });
    }
    Ok(midi)
}

fn strip_comment(line: &str) -> &str {
    line.split(';').next().unwrap_or("")
}

fn parse_header(number: usize, line: &str) -> Result<(usize, MidiFile), MidiError> {
    let bad = || MidiError::UnknownDirectiveError {
        line: number,
        text: line.to_string(),
    };

    let mut tracks = None;
    let mut format = None;
    let mut division = None;
    for field in line.split_whitespace() {
        let (key, value) = field.split_once('=').ok_or_else(bad)?;
        match key {
            "NumTracks" => tracks = Some(value.parse::<usize>().map_err(|_| bad())?),
            "Format" => format = Some(value.parse::<u16>().map_err(|_| bad())?),
            "Division" => division = Some(value.parse::<u16>().map_err(|_| bad())?),
            _ => return Err(bad()),
        }
    }

    match (tracks, format, division) {
        (Some(tracks), Some(format), Some(division)) => {
            Ok((tracks, MidiFile::new(format, division)))
        }
        _ => Err(bad()),
    }
}

/// Parse one event line against the events already assembled into its track
fn parse_event(line: &str, track: &[Event]) -> Result<Event, String> {
    let mut words = line.split_whitespace();
    let delta_text = words.next().unwrap_or("");
    let delta: u32 = delta_text
        .parse()
        .map_err(|_| format!("invalid delta '{}'", delta_text))?;
    let kind = words.next().ok_or("missing event kind")?;
    let fields = words
        .map(|word| {
            word.parse::<u8>()
                .map_err(|_| format!("invalid byte '{}'", word))
        })
        .collect::<Result<Vec<u8>, String>>()?;

    let event = match kind {
        "MetaEvent" => {
            let (meta_type, data) = fields
                .split_first()
                .ok_or("MetaEvent needs a meta type")?;
            Event::Meta {
                delta,
                meta_type: *meta_type,
                data: data.to_vec(),
            }
        }
        "SysEx" => Event::SystemExclusive {
            delta,
            data: fields,
        },
        "NoteOn" | "NoteOff" => {
            let [channel, note, velocity] = channel_fields::<3>(kind, &fields)?;
            Event::ChannelNote {
                delta,
                channel,
                is_on: kind == "NoteOn",
                note,
                velocity,
            }
        }
        "PolyPressure" => {
            let [channel, note, value] = channel_fields::<3>(kind, &fields)?;
            Event::PolyphonicKeyPressure {
                delta,
                channel,
                note,
                value,
            }
        }
        "ControlChange" => {
            let [channel, controller, value] = channel_fields::<3>(kind, &fields)?;
            Event::ControlChange {
                delta,
                channel,
                controller,
                value,
            }
        }
        "ProgramChange" => {
            let [channel, program] = channel_fields::<2>(kind, &fields)?;
            Event::ProgramChange {
                delta,
                channel,
                program,
            }
        }
        "RunningStatus" => {
            if fields.len() != 2 {
                return Err(format!(
                    "RunningStatus takes 2 data bytes, got {}",
                    fields.len()
                ));
            }
            // Same rule as the binary decoder: the last full-status channel event
            let previous = track
                .iter()
                .rposition(|event| event.channel().is_some())
                .ok_or("RunningStatus without a preceding channel event")?;
            if !track[previous].supports_running_status() {
                return Err(format!(
                    "RunningStatus cannot follow a {} event",
                    track[previous].kind_name()
                ));
            }
            Event::RunningStatus {
                delta,
                previous,
                data: fields,
            }
        }
        other => return Err(format!("unknown event kind '{}'", other)),
    };
    Ok(event)
}

/// Exactly `N` fields: a channel (0-15) followed by 7-bit data bytes
fn channel_fields<const N: usize>(kind: &str, fields: &[u8]) -> Result<[u8; N], String> {
    let values: [u8; N] = fields
        .try_into()
        .map_err(|_| format!("{} takes {} fields, got {}", kind, N, fields.len()))?;
    if values[0] > 15 {
        return Err(format!("channel must be 0-15, got {}", values[0]));
    }
    if let Some(byte) = values[1..].iter().find(|b| **b > 127) {
        return Err(format!("data byte must be 0-127, got {}", byte));
    }
    Ok(values)
}
