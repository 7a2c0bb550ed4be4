//! Turns the lines of one notation track into timed MIDI events.

use super::note::{parse_note, NoteDefaults, Ticks};
use crate::error::MidiError;
use crate::event::{Event, Track, CONTROLLER_VOLUME};
use crate::settings::Settings;

/// A source line with its 1-based line number in the original text
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Compile the lines of one track.
///
/// `lines` must already be stripped of comments and blank lines. The result starts with
/// a track-name meta event and ends with end-of-track.
pub fn compile_track(
    name: &str,
    lines: &[SourceLine],
    settings: &Settings,
) -> Result<Track, MidiError> {
    let mut compiler = TrackCompiler::new(name, settings);
    for line in lines {
        if line.text.starts_with(':') {
            compiler.directive(line)?;
        } else {
            let text = line.text.replace('|', "");
            for token in text.split_whitespace() {
                compiler.note(token, line.number)?;
            }
        }
    }
    Ok(compiler.finish())
}

/// Notes sounding across a tie
struct Held {
    notes: Vec<u8>,
    ticks: Ticks,
}

struct TrackCompiler<'a> {
    settings: &'a Settings,
    channel: u8,
    defaults: NoteDefaults,
    // Ticks to wait before the next event; the fraction carries over
    wait: Ticks,
    held: Option<Held>,
    events: Track,
}

impl<'a> TrackCompiler<'a> {
    fn new(name: &str, settings: &'a Settings) -> Self {
        Self {
            settings,
            channel: settings.channel,
            defaults: NoteDefaults::from_settings(settings),
            wait: Ticks::default(),
            held: None,
            events: vec![Event::track_name(0, name)],
        }
    }

    /// Whole ticks of the pending wait, leaving the fraction behind
    fn take_wait(&mut self) -> u32 {
        let whole = self.wait.floor();
        self.wait = self.wait.saturating_sub_whole(whole);
        u32::try_from(whole).unwrap_or(u32::MAX)
    }

    fn directive(&mut self, line: &SourceLine) -> Result<(), MidiError> {
        let unknown = || MidiError::UnknownDirectiveError {
            line: line.number,
            text: line.text.clone(),
        };

        let body = &line.text[1..];
        let name_end = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(body.len());
        let name = body[..name_end].to_ascii_lowercase();
        let argument = body[name_end..].trim_start();
        let argument = argument.strip_prefix('=').unwrap_or(argument).trim();
        let value: u32 = argument.parse().map_err(|_| unknown())?;

        match name.as_str() {
            "voice" => {
                let program = data_byte(value).ok_or_else(unknown)?;
                self.events.push(Event::ProgramChange {
                    delta: 0,
                    channel: self.channel,
                    program,
                });
            }
            "tempo" => {
                let micros = 60_000_000u32.checked_div(value).ok_or_else(unknown)?;
                if micros > 0xFF_FFFF {
                    return Err(unknown());
                }
                self.events.push(Event::tempo(0, micros));
            }
            "volume" => {
                let level = data_byte(value).ok_or_else(unknown)?;
                self.events.push(Event::ControlChange {
                    delta: 0,
                    channel: self.channel,
                    controller: CONTROLLER_VOLUME,
                    value: level,
                });
            }
            "channel" => {
                self.channel = u8::try_from(value)
                    .ok()
                    .filter(|c| *c <= 15)
                    .ok_or_else(unknown)?;
            }
            _ => return Err(unknown()),
        }
        Ok(())
    }

    fn note(&mut self, token: &str, line: usize) -> Result<(), MidiError> {
        let (note, next) =
            parse_note(token, &self.defaults).map_err(|message| MidiError::NoteSyntaxError {
                line,
                text: token.to_string(),
                message,
            })?;
        self.defaults = next;
        let ticks = note.duration(self.settings.ticks_per_whole);

        if note.is_rest() {
            self.release();
            self.wait += ticks;
            return Ok(());
        }

        match self.held.as_mut() {
            // Continuing a tie: the earlier note-on keeps sounding
            Some(held) => held.ticks += ticks,
            None => {
                let velocity = self.settings.velocity();
                let notes = note.midi_notes();
                for (i, pitch) in notes.iter().enumerate() {
                    let delta = if i == 0 { self.take_wait() } else { 0 };
                    self.events.push(Event::ChannelNote {
                        delta,
                        channel: self.channel,
                        is_on: true,
                        note: *pitch,
                        velocity,
                    });
                }
                self.held = Some(Held { notes, ticks });
            }
        }

        if !note.tie {
            self.release();
        }
        Ok(())
    }

    /// Emit note-offs for the held notes after their sounding portion
    fn release(&mut self) {
        let Some(held) = self.held.take() else {
            return;
        };
        let on = ((held.ticks.as_f64() * self.settings.note_on_percent).floor() as u64)
            .min(held.ticks.floor());
        for (i, pitch) in held.notes.iter().enumerate() {
            self.events.push(Event::ChannelNote {
                delta: if i == 0 { u32::try_from(on).unwrap_or(u32::MAX) } else { 0 },
                channel: self.channel,
                is_on: false,
                note: *pitch,
                velocity: 0,
            });
        }
        self.wait += held.ticks.saturating_sub_whole(on);
    }

    fn finish(mut self) -> Track {
        self.release();
        self.events.push(Event::end_of_track(0));
        self.events
    }
}

/// A value that fits in a 7-bit MIDI data byte
fn data_byte(value: u32) -> Option<u8> {
    u8::try_from(value).ok().filter(|v| *v <= 127)
}
