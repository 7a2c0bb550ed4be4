use super::*;
use crate::event::{Event, Track, META_TEMPO};

fn compile_lines(text: &str) -> Track {
    let lines: Vec<SourceLine> = text
        .lines()
        .enumerate()
        .map(|(i, line)| SourceLine::new(i + 1, line))
        .collect();
    compile_track("Test", &lines, &Settings::default()).unwrap()
}

fn note_on(delta: u32, note: u8) -> Event {
    Event::ChannelNote {
        delta,
        channel: 0,
        is_on: true,
        note,
        velocity: 64,
    }
}

fn note_off(delta: u32, note: u8) -> Event {
    Event::ChannelNote {
        delta,
        channel: 0,
        is_on: false,
        note,
        velocity: 0,
    }
}

fn count_notes(track: &Track, on: bool) -> usize {
    track
        .iter()
        .filter(|e| matches!(e, Event::ChannelNote { is_on, .. } if *is_on == on))
        .count()
}

#[test]
fn test_single_quarter_note() {
    let track = compile_lines("C4");
    assert_eq!(
        track,
        vec![
            Event::track_name(0, "Test"),
            note_on(0, 60),
            // 0.8 * 1024 / 4 = 204.8
            note_off(204, 60),
            Event::end_of_track(0),
        ]
    );
}

#[test]
fn test_remainder_carries_to_next_note() {
    let track = compile_lines("C4 D4");
    assert_eq!(track[3], note_on(52, 62));
    assert_eq!(track[4], note_off(204, 62));
}

#[test]
fn test_whole_note_timing() {
    let track = compile_lines("1C4 C");
    assert_eq!(track[1], note_on(0, 60));
    assert_eq!(track[2], note_off(819, 60));
    // 1024 - 819 carried to the next note, which keeps length 1
    assert_eq!(track[3], note_on(205, 60));
    assert_eq!(track[4], note_off(819, 60));
}

#[test]
fn test_tied_notes_share_one_on_and_off() {
    let track = compile_lines("4~C4 4C4 E");
    let c_events: Vec<&Event> = track
        .iter()
        .filter(|e| matches!(e, Event::ChannelNote { note: 60, .. }))
        .collect();
    assert_eq!(c_events, vec![&note_on(0, 60), &note_off(409, 60)]);
    // 512 - 409 left over before the E
    assert_eq!(track[3], note_on(103, 64));
}

#[test]
fn test_tie_chain() {
    let track = compile_lines("4~C 4~C 2C");
    assert_eq!(count_notes(&track, true), 1);
    assert_eq!(count_notes(&track, false), 1);
    // 0.8 * 1024 = 819.2
    assert_eq!(track[2], note_off(819, 60));
}

#[test]
fn test_tie_into_rest_releases() {
    let track = compile_lines("4~C R D");
    assert_eq!(track[2], note_off(204, 60));
    assert_eq!(track[3], note_on(52 + 256, 62));
}

#[test]
fn test_tie_at_end_of_track_releases() {
    let track = compile_lines("4~C");
    assert_eq!(track[2], note_off(204, 60));
    assert!(track[3].is_end_of_track());
}

#[test]
fn test_rest_accumulates_wait() {
    let track = compile_lines("C R R D");
    assert_eq!(track[3], note_on(52 + 256 + 256, 62));
}

#[test]
fn test_leading_rest() {
    let track = compile_lines("2R C");
    assert_eq!(track[1], note_on(512, 60));
}

#[test]
fn test_chord_events() {
    let track = compile_lines("2C:E:G");
    assert_eq!(
        &track[1..7],
        &[
            note_on(0, 60),
            note_on(0, 64),
            note_on(0, 67),
            note_off(409, 60),
            note_off(0, 64),
            note_off(0, 67),
        ]
    );
}

#[test]
fn test_triplets_keep_total_time() {
    let track = compile_lines("8tC C C 4D");
    let deltas: Vec<u32> = track[1..8].iter().map(Event::delta).collect();
    assert_eq!(deltas, vec![0, 68, 17, 68, 17, 68, 18]);
    assert_eq!(deltas.iter().sum::<u32>(), 256);
}

#[test]
fn test_bar_lines_are_ignored() {
    assert_eq!(compile_lines("C D | E F |"), compile_lines("C D E F"));
}

#[test]
fn test_voice_directive() {
    let track = compile_lines(":voice 41\nC");
    assert_eq!(
        track[1],
        Event::ProgramChange {
            delta: 0,
            channel: 0,
            program: 41,
        }
    );
}

#[test]
fn test_tempo_directive() {
    let track = compile_lines(":tempo=120");
    assert_eq!(
        track[1],
        Event::Meta {
            delta: 0,
            meta_type: META_TEMPO,
            data: vec![0x07, 0xA1, 0x20],
        }
    );
}

#[test]
fn test_volume_directive() {
    let track = compile_lines(":volume 100");
    assert_eq!(
        track[1],
        Event::ControlChange {
            delta: 0,
            channel: 0,
            controller: 7,
            value: 100,
        }
    );
}

#[test]
fn test_channel_directive() {
    let track = compile_lines(":channel 9\n:voice 1\nC");
    assert!(matches!(track[1], Event::ProgramChange { channel: 9, .. }));
    assert!(matches!(track[2], Event::ChannelNote { channel: 9, is_on: true, .. }));
    assert!(matches!(track[3], Event::ChannelNote { channel: 9, is_on: false, .. }));
}

#[test]
fn test_directive_keeps_pending_wait_for_next_note() {
    let track = compile_lines("C\n:voice 2\nD");
    assert_eq!(track[3], Event::ProgramChange { delta: 0, channel: 0, program: 2 });
    assert_eq!(track[4], note_on(52, 62));
}

#[test]
fn test_unknown_directive() {
    let lines = vec![SourceLine::new(7, ":swing 2")];
    let result = compile_track("Test", &lines, &Settings::default());
    assert_eq!(
        result,
        Err(MidiError::UnknownDirectiveError {
            line: 7,
            text: ":swing 2".to_string(),
        })
    );
}

#[test]
fn test_bad_directive_arguments() {
    for text in [":voice", ":voice 128", ":channel 16", ":tempo=0", ":tempo=3", ":volume x"] {
        let lines = vec![SourceLine::new(1, text)];
        let result = compile_track("Test", &lines, &Settings::default());
        assert!(
            matches!(result, Err(MidiError::UnknownDirectiveError { .. })),
            "{} gave {:?}",
            text,
            result
        );
    }
}

#[test]
fn test_note_syntax_error_location() {
    let result = compile_source("Track A\nC D\nE C4#5 F");
    match result {
        Err(MidiError::NoteSyntaxError { line, text, .. }) => {
            assert_eq!(line, 3);
            assert_eq!(text, "C4#5");
        }
        other => panic!("Expected NoteSyntaxError but got: {:?}", other),
    }
}

#[test]
fn test_front_matter_settings() {
    let source = "---\nvolume: 1.0\ndivision: 480\nticks-per-whole: 1920\n---\nTrack A\nC";
    let midi = compile_source(source).unwrap();
    assert_eq!(midi.division, 480);
    assert_eq!(midi.format, 1);
    assert!(matches!(
        midi.tracks[0][1],
        Event::ChannelNote { velocity: 127, .. }
    ));
    // 0.8 * 1920 / 4
    assert_eq!(midi.tracks[0][2].delta(), 384);
}

#[test]
fn test_front_matter_keeps_line_numbers() {
    let result = compile_source("---\nvolume: 0.5\n---\nTrack A\nX");
    assert!(matches!(
        result,
        Err(MidiError::NoteSyntaxError { line: 5, .. })
    ));
}

#[test]
fn test_invalid_front_matter() {
    let result = compile_source("---\nvolume: loud\n---\nC");
    assert!(matches!(result, Err(MidiError::MetadataError(_))));
}

#[test]
fn test_multiple_tracks() {
    let midi = compile_source("Track Treble\nC5\nTrack Bass\n:channel 1\nC3").unwrap();
    assert_eq!(midi.tracks.len(), 2);
    assert_eq!(midi.tracks[0][0], Event::track_name(0, "Treble"));
    assert_eq!(midi.tracks[1][0], Event::track_name(0, "Bass"));
    assert!(matches!(
        midi.tracks[1][1],
        Event::ChannelNote { channel: 1, note: 48, .. }
    ));
    for track in &midi.tracks {
        assert!(track.last().unwrap().is_end_of_track());
    }
}

#[test]
fn test_octave_carries_within_track_only() {
    let midi = compile_source("Track A\nC6\nTrack B\nC").unwrap();
    assert!(matches!(midi.tracks[1][1], Event::ChannelNote { note: 60, .. }));
}

#[test]
fn test_empty_source() {
    let midi = compile_source("; nothing here\n").unwrap();
    assert!(midi.tracks.is_empty());
}

#[test]
fn test_many_unrelated_lengths_keep_time() {
    let primes = [
        3u32, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61,
    ];
    let line: Vec<String> = primes.iter().map(|p| format!("{}C", p)).collect();
    let track = compile_lines(&line.join(" "));
    assert_eq!(count_notes(&track, true), primes.len());

    let mut now = 0u64;
    let mut last_on = 0u64;
    for event in &track {
        now += u64::from(event.delta());
        if matches!(event, Event::ChannelNote { is_on: true, .. }) {
            last_on = now;
        }
    }
    let expected: f64 = primes[..primes.len() - 1]
        .iter()
        .map(|p| 1024.0 / f64::from(*p))
        .sum();
    assert!((last_on as f64 - expected.floor()).abs() <= 1.0);
}

#[test]
fn test_huge_triplet_lengths_compile() {
    let track = compile_lines("4294967295tC 4294967291tC");
    assert_eq!(count_notes(&track, true), 2);
    assert!(track.last().unwrap().is_end_of_track());
}

#[test]
fn test_octave_overflow_is_a_syntax_error() {
    for text in ["C999999999", "C2147483647+", "E:G2147483647+"] {
        let result = compile_source(&format!("Track A\n{}", text));
        assert!(
            matches!(result, Err(MidiError::NoteSyntaxError { line: 2, .. })),
            "{}: {:?}",
            text,
            result
        );
    }
}
