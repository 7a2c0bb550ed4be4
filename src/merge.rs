//! # Timeline Merger
//!
//! Interleaves several delta-timed tracks into one track whose deltas are recomputed
//! against a shared clock.
//!
//! Each track keeps the ticks remaining until its next event. The clock jumps straight
//! to the nearest of those, and every track whose counter hits zero emits its event
//! plus any zero-delta followers. Tracks due on the same tick fire in input order.
//!
//! End-of-track events are held back: the merged track gets a single end-of-track at
//! the time the last input track ended.

use crate::error::MidiError;
use crate::event::{expand_running_status, Event, MidiFile, Track};

/// Position of one input track during the merge
struct Cursor {
    events: Track,
    next: usize,
    remaining: u32,
}

impl Cursor {
    fn is_done(&self) -> bool {
        self.next >= self.events.len()
    }
}

/// Merge tracks into one.
///
/// Running-status events are expanded against their own source track first, so the
/// result never borrows a status byte from a different track.
///
/// ```
/// use notemidi::event::Event;
/// use notemidi::merge::merge_tracks;
///
/// let on = |delta, note| Event::ChannelNote { delta, channel: 0, is_on: true, note, velocity: 64 };
/// let merged = merge_tracks(&[vec![on(5, 60)], vec![on(3, 64)]]).unwrap();
/// assert_eq!(merged, vec![on(3, 64), on(2, 60)]);
/// ```
pub fn merge_tracks(tracks: &[Track]) -> Result<Track, MidiError> {
    let mut cursors = Vec::with_capacity(tracks.len());
    for (index, track) in tracks.iter().enumerate() {
        let Some(first) = track.first() else {
            return Err(MidiError::EmptyTrackError { index });
        };
        cursors.push(Cursor {
            remaining: first.delta(),
            events: expand_running_status(track)?,
            next: 0,
        });
    }

    let mut merged = Track::new();
    let mut now: u64 = 0;
    let mut last_emitted: u64 = 0;
    let mut end_of_track: Option<u64> = None;

    loop {
        let Some(step) = cursors
            .iter()
            .filter(|c| !c.is_done())
            .map(|c| c.remaining)
            .min()
        else {
            break;
        };
        now += u64::from(step);

        for cursor in cursors.iter_mut().filter(|c| !c.is_done()) {
            cursor.remaining -= step;
            if cursor.remaining > 0 {
                continue;
            }

            // The due event, then everything stacked on the same tick
            loop {
                let event = &cursor.events[cursor.next];
                cursor.next += 1;
                if event.is_end_of_track() {
                    end_of_track = Some(end_of_track.map_or(now, |t| t.max(now)));
                } else {
                    merged.push(event.with_delta(elapsed(now, last_emitted)?));
                    last_emitted = now;
                }

                match cursor.events.get(cursor.next) {
                    Some(next) if next.delta() == 0 => continue,
                    Some(next) => {
                        cursor.remaining = next.delta();
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if let Some(end) = end_of_track {
        merged.push(Event::end_of_track(elapsed(end, last_emitted)?));
    }
    Ok(merged)
}

/// Collapse every track of a file into a single-track format 0 file
pub fn merge_file(midi: &MidiFile) -> Result<MidiFile, MidiError> {
    let mut merged = MidiFile::new(0, midi.division);
    merged.tracks.push(merge_tracks(&midi.tracks)?);
    Ok(merged)
}

fn elapsed(now: u64, since: u64) -> Result<u32, MidiError> {
    u32::try_from(now - since).map_err(|_| MidiError::FormatError {
        offset: 0,
        message: format!("merged delta {} does not fit in 32 bits", now - since),
    })
}
