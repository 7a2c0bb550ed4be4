//! # Event Model
//!
//! The closed set of events that flow between the notation compiler, the SMF codec,
//! and the timeline merger.
//!
//! ## Type Hierarchy
//! ```text
//! MidiFile
//!   ├── format: u16
//!   ├── division: u16 (ticks per quarter note)
//!   └── Vec<Track>
//!         └── Vec<Event> (last one is always Meta end-of-track)
//!
//! Event (enum, every variant has a delta)
//!   ├── Meta { meta_type, data }
//!   ├── SystemExclusive { data }
//!   ├── ChannelNote { channel, is_on, note, velocity }
//!   ├── ProgramChange { channel, program }
//!   ├── ControlChange { channel, controller, value }
//!   ├── PolyphonicKeyPressure { channel, note, value }
//!   └── RunningStatus { previous, data }
//! ```
//!
//! ## Delta Times
//! Every delta is the number of ticks since the previous event in the same track.
//! Events are values: re-timing one produces a copy via [`Event::with_delta`].
//!
//! ## Running Status
//! `RunningStatus` only exists on the decode path. `previous` is the index, within the
//! same track, of the full-status channel event whose status byte was elided. It is a
//! lookup key, not an owner. [`Event::expand`] turns it back into a concrete event.

use crate::error::MidiError;
use serde::Serialize;

/// Meta type of the track/sequence name event
pub const META_TRACK_NAME: u8 = 0x03;
/// Meta type of the end-of-track event
pub const META_END_OF_TRACK: u8 = 0x2F;
/// Meta type of the set-tempo event (3 bytes, microseconds per quarter note)
pub const META_TEMPO: u8 = 0x51;

/// Controller number of the channel volume control change
pub const CONTROLLER_VOLUME: u8 = 7;

/// A single timed event in a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Event {
    Meta {
        delta: u32,
        meta_type: u8,
        data: Vec<u8>,
    },
    SystemExclusive {
        delta: u32,
        data: Vec<u8>,
    },
    ChannelNote {
        delta: u32,
        channel: u8,
        is_on: bool,
        note: u8,
        velocity: u8,
    },
    ProgramChange {
        delta: u32,
        channel: u8,
        program: u8,
    },
    ControlChange {
        delta: u32,
        channel: u8,
        controller: u8,
        value: u8,
    },
    PolyphonicKeyPressure {
        delta: u32,
        channel: u8,
        note: u8,
        value: u8,
    },
    RunningStatus {
        delta: u32,
        previous: usize,
        data: Vec<u8>,
    },
}

/// Ordered, delta-relative events terminated by an end-of-track meta event
pub type Track = Vec<Event>;

/// An entire Standard MIDI File held in memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MidiFile {
    pub format: u16,
    pub division: u16,
    pub tracks: Vec<Track>,
}

impl Event {
    /// A meta end-of-track event
    pub fn end_of_track(delta: u32) -> Self {
        Event::Meta {
            delta,
            meta_type: META_END_OF_TRACK,
            data: Vec::new(),
        }
    }

    /// A meta track-name event
    pub fn track_name(delta: u32, name: &str) -> Self {
        Event::Meta {
            delta,
            meta_type: META_TRACK_NAME,
            data: name.as_bytes().to_vec(),
        }
    }

    /// A meta set-tempo event from microseconds per quarter note (low 24 bits)
    pub fn tempo(delta: u32, micros_per_quarter: u32) -> Self {
        Event::Meta {
            delta,
            meta_type: META_TEMPO,
            data: vec![
                (micros_per_quarter >> 16) as u8,
                (micros_per_quarter >> 8) as u8,
                micros_per_quarter as u8,
            ],
        }
    }

    pub fn delta(&self) -> u32 {
        match self {
            Event::Meta { delta, .. }
            | Event::SystemExclusive { delta, .. }
            | Event::ChannelNote { delta, .. }
            | Event::ProgramChange { delta, .. }
            | Event::ControlChange { delta, .. }
            | Event::PolyphonicKeyPressure { delta, .. }
            | Event::RunningStatus { delta, .. } => *delta,
        }
    }

    /// Copy of this event moved to a new delta
    pub fn with_delta(&self, new_delta: u32) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            Event::Meta { delta, .. }
            | Event::SystemExclusive { delta, .. }
            | Event::ChannelNote { delta, .. }
            | Event::ProgramChange { delta, .. }
            | Event::ControlChange { delta, .. }
            | Event::PolyphonicKeyPressure { delta, .. }
            | Event::RunningStatus { delta, .. } => *delta = new_delta,
        }
        copy
    }

    pub fn is_end_of_track(&self) -> bool {
        matches!(self, Event::Meta { meta_type, .. } if *meta_type == META_END_OF_TRACK)
    }

    /// Channel of a full-status channel event
    pub fn channel(&self) -> Option<u8> {
        match self {
            Event::ChannelNote { channel, .. }
            | Event::ProgramChange { channel, .. }
            | Event::ControlChange { channel, .. }
            | Event::PolyphonicKeyPressure { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    /// Whether a running-status continuation may borrow this event's status byte
    pub fn supports_running_status(&self) -> bool {
        matches!(self, Event::ChannelNote { .. } | Event::ControlChange { .. })
    }

    /// Name used by the text dump for this event's kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::Meta { .. } => "MetaEvent",
            Event::SystemExclusive { .. } => "SysEx",
            Event::ChannelNote { is_on: true, .. } => "NoteOn",
            Event::ChannelNote { is_on: false, .. } => "NoteOff",
            Event::ProgramChange { .. } => "ProgramChange",
            Event::ControlChange { .. } => "ControlChange",
            Event::PolyphonicKeyPressure { .. } => "PolyPressure",
            Event::RunningStatus { .. } => "RunningStatus",
        }
    }

    /// Resolve a running-status event into the concrete channel event it stands for.
    ///
    /// `track` is the track this event was decoded from; `previous` indexes into it.
    /// Any other variant is returned unchanged. The error is a bare message; callers
    /// that know the event's position wrap it, as [`expand_running_status`] does.
    pub fn expand(&self, track: &[Event]) -> Result<Event, String> {
        let Event::RunningStatus {
            delta,
            previous,
            data,
        } = self
        else {
            return Ok(self.clone());
        };

        let (first, second) = match data.as_slice() {
            [first, second] => (*first, *second),
            _ => return Err(format!("needs 2 data bytes, got {}", data.len())),
        };

        match track.get(*previous) {
            Some(Event::ChannelNote { channel, is_on, .. }) => Ok(Event::ChannelNote {
                delta: *delta,
                channel: *channel,
                is_on: *is_on,
                note: first,
                velocity: second,
            }),
            Some(Event::ControlChange { channel, .. }) => Ok(Event::ControlChange {
                delta: *delta,
                channel: *channel,
                controller: first,
                value: second,
            }),
            Some(other) => Err(format!(
                "cannot follow a {} event (event {})",
                other.kind_name(),
                previous
            )),
            None => Err(format!("refers to missing event {}", previous)),
        }
    }
}

impl MidiFile {
    pub fn new(format: u16, division: u16) -> Self {
        Self {
            format,
            division,
            tracks: Vec::new(),
        }
    }
}

/// Replace every running-status event in a track with its concrete equivalent
pub fn expand_running_status(track: &[Event]) -> Result<Track, MidiError> {
    track
        .iter()
        .enumerate()
        .map(|(index, event)| {
            event
                .expand(track)
                .map_err(|message| MidiError::RunningStatusError { index, message })
        })
        .collect()
}
