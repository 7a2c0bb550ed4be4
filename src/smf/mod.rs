//! # SMF Codec
//!
//! Byte-exact reading and writing of Standard MIDI Files.
//!
//! ## Layout
//! ```text
//! "MThd" + u32 length (always 6) + u16 format + u16 track count + u16 division
//! "MTrk" + u32 byte length + <vlq delta><event> <vlq delta><event> ...
//! ```
//!
//! ## Event Bytes
//! | Status | Data | Event |
//! |---|---|---|
//! | `FF` | type, vlq length, bytes | `Meta` |
//! | `8n` / `9n` | note, velocity | `ChannelNote` off / on |
//! | `An` | note, value | `PolyphonicKeyPressure` |
//! | `Bn` | controller, value | `ControlChange` |
//! | `Cn` | program | `ProgramChange` |
//! | `Dn`, `En`, `F0`, `F2`, `F3` | | unsupported, decode fails |
//! | other `Fx` | | `SystemExclusive` (status byte only) |
//! | `00`-`7F` | one more byte | `RunningStatus` |
//!
//! ## Example
//! ```rust
//! use notemidi::event::{Event, MidiFile};
//! use notemidi::smf::{decode, encode};
//!
//! let mut midi = MidiFile::new(1, 256);
//! midi.tracks.push(vec![Event::track_name(0, "Lead"), Event::end_of_track(0)]);
//!
//! let bytes = encode(&midi).unwrap();
//! assert_eq!(&bytes[..4], b"MThd");
//! assert_eq!(decode(&bytes).unwrap(), midi);
//! ```

mod cursor;
mod read;
mod write;

pub use cursor::{decode_vlq, encode_vlq, ByteReader, MAX_VLQ};
pub use read::decode;
pub use write::{encode, encode_track};

pub(crate) const HEADER_MAGIC: &[u8] = b"MThd";
pub(crate) const TRACK_MAGIC: &[u8] = b"MTrk";
pub(crate) const HEADER_LENGTH: u32 = 6;
