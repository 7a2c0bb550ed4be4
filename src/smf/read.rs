//! Decoding of Standard MIDI File bytes into a [`MidiFile`].

use super::cursor::ByteReader;
use super::{HEADER_LENGTH, HEADER_MAGIC, TRACK_MAGIC};
use crate::error::MidiError;
use crate::event::{Event, MidiFile, Track};

/// Parse a complete Standard MIDI File.
///
/// Fails with [`MidiError::FormatError`] on a bad header or track magic, a header length
/// other than 6, a track that does not end with end-of-track, an unsupported status byte
/// (channel pressure, pitch bend, multi-byte system exclusive), or a running-status
/// continuation without a note or control-change predecessor.
pub fn decode(bytes: &[u8]) -> Result<MidiFile, MidiError> {
    let mut reader = ByteReader::new(bytes);
    let (format, track_count, division) = read_header_chunk(&mut reader)?;

    let mut midi = MidiFile::new(format, division);
    for _ in 0..track_count {
        midi.tracks.push(read_track_chunk(&mut reader)?);
    }
    Ok(midi)
}

fn read_header_chunk(reader: &mut ByteReader) -> Result<(u16, u16, u16), MidiError> {
    let start = reader.position();
    if reader.read_bytes(4)? != HEADER_MAGIC {
        return Err(MidiError::FormatError {
            offset: start,
            message: "missing 'MThd' header".to_string(),
        });
    }

    let length_offset = reader.position();
    let length = reader.read_u32()?;
    if length != HEADER_LENGTH {
        return Err(MidiError::FormatError {
            offset: length_offset,
            message: format!(
                "expected header length to be {} bytes but got {}",
                HEADER_LENGTH, length
            ),
        });
    }

    let format = reader.read_u16()?;
    let track_count = reader.read_u16()?;
    let division = reader.read_u16()?;
    Ok((format, track_count, division))
}

fn read_track_chunk(reader: &mut ByteReader) -> Result<Track, MidiError> {
    let start = reader.position();
    if reader.read_bytes(4)? != TRACK_MAGIC {
        return Err(MidiError::FormatError {
            offset: start,
            message: "missing 'MTrk' header".to_string(),
        });
    }
    let size = reader.read_u32()? as usize;
    let end_of_track = reader.position() + size;

    let mut events: Track = Vec::new();
    // Index of the last full-status channel event, for running status
    let mut previous: Option<usize> = None;

    while reader.position() < end_of_track {
        let delta = reader.read_vlq()?;
        let status_offset = reader.position();
        let status = reader.read_byte()?;

        if status < 0x80 {
            // Running status: this byte is already the first data byte
            let index = previous.ok_or_else(|| MidiError::FormatError {
                offset: status_offset,
                message: "running status without a preceding channel event".to_string(),
            })?;
            let predecessor = &events[index];
            if !predecessor.supports_running_status() {
                return Err(MidiError::FormatError {
                    offset: status_offset,
                    message: format!(
                        "running status cannot follow a {} event",
                        predecessor.kind_name()
                    ),
                });
            }
            let second = read_data_byte(reader)?;
            events.push(Event::RunningStatus {
                delta,
                previous: index,
                data: vec![status, second],
            });
            continue;
        }

        if status == 0xFF {
            let meta_type = reader.read_byte()?;
            let length = reader.read_vlq()? as usize;
            let data = reader.read_bytes(length)?.to_vec();
            events.push(Event::Meta {
                delta,
                meta_type,
                data,
            });
            continue;
        }

        let channel = status & 0x0F;
        let event = match status >> 4 {
            0x8 | 0x9 => Event::ChannelNote {
                delta,
                channel,
                is_on: status >> 4 == 0x9,
                note: read_data_byte(reader)?,
                velocity: read_data_byte(reader)?,
            },
            0xA => Event::PolyphonicKeyPressure {
                delta,
                channel,
                note: read_data_byte(reader)?,
                value: read_data_byte(reader)?,
            },
            0xB => Event::ControlChange {
                delta,
                channel,
                controller: read_data_byte(reader)?,
                value: read_data_byte(reader)?,
            },
            0xC => Event::ProgramChange {
                delta,
                channel,
                program: read_data_byte(reader)?,
            },
            0xD => return Err(unsupported(status_offset, "channel pressure", status)),
            0xE => return Err(unsupported(status_offset, "pitch bend", status)),
            _ => match status {
                0xF0 | 0xF2 | 0xF3 => {
                    return Err(unsupported(status_offset, "system exclusive", status))
                }
                _ => {
                    events.push(Event::SystemExclusive {
                        delta,
                        data: vec![status],
                    });
                    continue;
                }
            },
        };
        previous = Some(events.len());
        events.push(event);
    }

    if reader.position() != end_of_track {
        return Err(reader.error(format!(
            "events overrun the track chunk, which ends at byte {}",
            end_of_track
        )));
    }

    match events.last() {
        Some(last) if last.is_end_of_track() => Ok(events),
        _ => Err(MidiError::FormatError {
            offset: end_of_track,
            message: "missing end-of-track meta event".to_string(),
        }),
    }
}

/// A channel-event data byte, which must have the high bit clear
fn read_data_byte(reader: &mut ByteReader) -> Result<u8, MidiError> {
    let offset = reader.position();
    let byte = reader.read_byte()?;
    if byte > 0x7F {
        return Err(MidiError::FormatError {
            offset,
            message: format!("data byte 0x{:02X} has the high bit set", byte),
        });
    }
    Ok(byte)
}

fn unsupported(offset: usize, what: &str, status: u8) -> MidiError {
    MidiError::FormatError {
        offset,
        message: format!("unsupported {} status byte 0x{:02X}", what, status),
    }
}
