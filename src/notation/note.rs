//! Note token grammar.
//!
//! ```text
//! token   := accent? length? tie? name-list
//! accent  := '>' | '.' | '-' | '^'
//! length  := digits plet? '.'* plet?       (at most one plet)
//! plet    := 't' | 'd'
//! tie     := '~'
//! name-list := pitch (':' pitch)*  |  'R'
//! pitch   := ('C'|'D'|'E'|'F'|'G'|'A'|'B') ('#'|'b'|'n')? digits? ('+'|'-')*
//! ```
//!
//! Examples: `C`, `8E`, `4.G#5`, `>2~Bb-`, `8tC:E:G`, `16R`.
//!
//! Length, dots, plet and octave carry forward from one token to the next on the same
//! track; accent, tie and accidentals apply to their own token only. The carried values
//! live in [`NoteDefaults`], which [`parse_note`] takes by reference and hands back
//! updated, so each token parses independently of any hidden state.

use crate::settings::Settings;

/// Triplet/duplet timing modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plet {
    #[default]
    None,
    /// `t`: three notes in the time of two
    Triplet,
    /// `d`: two notes in the time of three
    Duplet,
}

/// Articulation mark. Parsed and kept, but it does not change the generated events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Accent,   // >
    Staccato, // .
    Tenuto,   // -
    Marcato,  // ^
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    /// Semitones above C
    pub fn semitone(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    Sharp,   // #
    Flat,    // b
    Natural, // n
}

/// One sounding pitch of a note or chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pitch {
    pub name: NoteName,
    pub accidental: Option<Accidental>,
    pub octave: i32,
}

impl Pitch {
    /// MIDI note number, where C4 = 60 and octave -1 starts at 0
    pub fn midi_note(&self) -> Option<u8> {
        let offset = match self.accidental {
            Some(Accidental::Sharp) => 1,
            Some(Accidental::Flat) => -1,
            Some(Accidental::Natural) | None => 0,
        };
        let note = self
            .octave
            .checked_add(1)?
            .checked_mul(12)?
            .checked_add(self.name.semitone() + offset)?;
        u8::try_from(note).ok().filter(|n| *n <= 127)
    }
}

/// Values carried from one note token to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteDefaults {
    pub length: u32,
    pub dots: u32,
    pub plet: Plet,
    pub octave: i32,
}

impl NoteDefaults {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            length: settings.length,
            dots: 0,
            plet: Plet::None,
            octave: settings.octave,
        }
    }
}

impl Default for NoteDefaults {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// A fully resolved note token
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDescriptor {
    pub length: u32,
    pub dots: u32,
    pub plet: Plet,
    /// Octave of the last pitch (the carried octave after this token)
    pub octave: i32,
    /// Tied into the next note
    pub tie: bool,
    pub accent: Option<Accent>,
    /// Empty for a rest
    pub pitches: Vec<Pitch>,
}

impl NoteDescriptor {
    pub fn is_rest(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Exact duration in ticks
    pub fn duration(&self, ticks_per_whole: u32) -> Ticks {
        let whole = u64::from(ticks_per_whole);
        let length = u64::from(self.length);
        let (mut num, mut den) = match self.plet {
            Plet::None => (whole, length),
            Plet::Triplet => (whole * 2, length * 3),
            Plet::Duplet => (whole * 3, length * 2),
        };
        // Only one dot is honored
        if self.dots > 0 {
            num *= 3;
            den *= 2;
        }
        Ticks::new(num, den)
    }

    /// Duration in (fractional) ticks
    pub fn ticks(&self, ticks_per_whole: u32) -> f64 {
        self.duration(ticks_per_whole).as_f64()
    }

    /// MIDI note numbers of every pitch, in the order written
    pub fn midi_notes(&self) -> Vec<u8> {
        self.pitches.iter().filter_map(Pitch::midi_note).collect()
    }
}

/// A non-negative tick count kept as an exact fraction, so triplet timing does not drift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticks {
    num: u64,
    den: u64,
}

impl Ticks {
    pub fn new(num: u64, den: u64) -> Self {
        let divisor = gcd(num, den).max(1);
        Self {
            num: num / divisor,
            den: (den / divisor).max(1),
        }
    }

    pub fn whole(ticks: u64) -> Self {
        Self { num: ticks, den: 1 }
    }

    /// Whole ticks, rounded down
    pub fn floor(self) -> u64 {
        self.num / self.den
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Subtract whole ticks, stopping at zero
    pub fn saturating_sub_whole(self, ticks: u64) -> Self {
        let whole = ticks.saturating_mul(self.den);
        Self::new(self.num.saturating_sub(whole), self.den)
    }

    /// Exact sum, or `None` when it does not fit in 64 bits
    pub fn checked_add(self, other: Ticks) -> Option<Ticks> {
        let den = (self.den / gcd(self.den, other.den)).checked_mul(other.den)?;
        let left = self.num.checked_mul(den / self.den)?;
        let right = other.num.checked_mul(den / other.den)?;
        Some(Ticks::new(left.checked_add(right)?, den))
    }

    /// Nearest value on a fixed 1/2^20 tick grid
    fn approximate(ticks: f64) -> Self {
        let scaled = ticks * APPROXIMATE_DENOMINATOR as f64;
        if scaled < u64::MAX as f64 {
            Self::new(scaled.round() as u64, APPROXIMATE_DENOMINATOR)
        } else {
            Self::whole(ticks.round() as u64)
        }
    }
}

/// Grid used once an exact sum no longer fits
const APPROXIMATE_DENOMINATOR: u64 = 1 << 20;

impl Default for Ticks {
    fn default() -> Self {
        Self::whole(0)
    }
}

impl std::ops::Add for Ticks {
    type Output = Ticks;

    /// Exact while the fraction fits, otherwise rounded to a fine grid
    fn add(self, other: Ticks) -> Ticks {
        self.checked_add(other)
            .unwrap_or_else(|| Ticks::approximate(self.as_f64() + other.as_f64()))
    }
}

impl std::ops::AddAssign for Ticks {
    fn add_assign(&mut self, other: Ticks) {
        *self = *self + other;
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Parse one note token.
///
/// Returns the resolved note and the defaults for the next token, or a message
/// describing why the token is invalid.
///
/// ```
/// use notemidi::notation::{parse_note, NoteDefaults};
///
/// let (note, next) = parse_note("8E5", &NoteDefaults::default()).unwrap();
/// assert_eq!(note.pitches[0].midi_note(), Some(76));
/// assert_eq!((next.length, next.octave), (8, 5));
///
/// assert!(parse_note("C4#5", &NoteDefaults::default()).is_err());
/// ```
pub fn parse_note(
    text: &str,
    defaults: &NoteDefaults,
) -> Result<(NoteDescriptor, NoteDefaults), String> {
    let mut parts = text.split(':');
    let first = parts.next().unwrap_or_default();

    let name_at = first
        .find(|c: char| "CDEFGABR".contains(c))
        .ok_or_else(|| "note name is required".to_string())?;
    let (prefix, named) = first.split_at(name_at);

    let rhythm = parse_prefix(prefix)?;
    let mut next = *defaults;
    if let Some(length) = rhythm.length {
        next.length = length;
        next.dots = rhythm.dots;
        next.plet = rhythm.plet;
    }

    let mut pitches = Vec::new();
    if named.starts_with('R') {
        if named.len() > 1 {
            return Err(format!(
                "a rest cannot have an accidental or octave, found '{}'",
                &named[1..]
            ));
        }
    } else {
        let pitch = parse_pitch(named, next.octave)?;
        next.octave = pitch.octave;
        pitches.push(pitch);
    }

    for part in parts {
        if part.starts_with('R') || pitches.is_empty() {
            return Err("a rest cannot be part of a chord".to_string());
        }
        if !part.starts_with(|c: char| "CDEFGAB".contains(c)) {
            return Err(format!("invalid parallel note '{}'", part));
        }
        let pitch = parse_pitch(part, next.octave)?;
        next.octave = pitch.octave;
        pitches.push(pitch);
    }

    for pitch in &pitches {
        if pitch.midi_note().is_none() {
            return Err(format!(
                "pitch {:?}{} is outside the MIDI note range",
                pitch.name, pitch.octave
            ));
        }
    }

    let note = NoteDescriptor {
        length: next.length,
        dots: next.dots,
        plet: next.plet,
        octave: next.octave,
        tie: rhythm.tie,
        accent: rhythm.accent,
        pitches,
    };
    Ok((note, next))
}

/// Everything before the note name
struct Rhythm {
    accent: Option<Accent>,
    tie: bool,
    length: Option<u32>,
    plet: Plet,
    dots: u32,
}

fn parse_prefix(prefix: &str) -> Result<Rhythm, String> {
    let mut rest = prefix;

    let accent = match rest.chars().next() {
        Some('>') => Some(Accent::Accent),
        Some('.') => Some(Accent::Staccato),
        Some('-') => Some(Accent::Tenuto),
        Some('^') => Some(Accent::Marcato),
        _ => None,
    };
    if accent.is_some() {
        rest = &rest[1..];
    }

    let tie = rest.ends_with('~');
    if tie {
        rest = &rest[..rest.len() - 1];
    }

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let length = if digits_end > 0 {
        let length: u32 = rest[..digits_end]
            .parse()
            .map_err(|_| format!("note length '{}' is too large", &rest[..digits_end]))?;
        if length == 0 {
            return Err("note length must be positive".to_string());
        }
        Some(length)
    } else {
        None
    };
    rest = &rest[digits_end..];

    let mut plet = take_plet(&mut rest);
    let dots_end = rest.find(|c: char| c != '.').unwrap_or(rest.len());
    let dots = dots_end as u32;
    rest = &rest[dots_end..];
    if plet == Plet::None {
        plet = take_plet(&mut rest);
    }

    if !rest.is_empty() {
        return Err(format!("unexpected '{}' before the note name", rest));
    }
    if length.is_none() && (plet != Plet::None || dots > 0) {
        return Err("a numeric length must be given with a plet or dot".to_string());
    }

    Ok(Rhythm {
        accent,
        tie,
        length,
        plet,
        dots,
    })
}

fn take_plet(rest: &mut &str) -> Plet {
    let plet = match rest.chars().next() {
        Some('t') => Plet::Triplet,
        Some('d') => Plet::Duplet,
        _ => return Plet::None,
    };
    *rest = &rest[1..];
    plet
}

/// Parse `name accidental? octave? (+|-)*`, starting from the carried octave
fn parse_pitch(text: &str, carried_octave: i32) -> Result<Pitch, String> {
    let mut chars = text.chars();
    let name = chars
        .next()
        .and_then(NoteName::from_char)
        .ok_or_else(|| format!("invalid note name in '{}'", text))?;
    let mut rest = chars.as_str();

    let accidental = match rest.chars().next() {
        Some('#') => Some(Accidental::Sharp),
        Some('b') => Some(Accidental::Flat),
        Some('n') => Some(Accidental::Natural),
        _ => None,
    };
    if accidental.is_some() {
        rest = &rest[1..];
    }

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let mut octave = if digits_end > 0 {
        rest[..digits_end]
            .parse::<i32>()
            .map_err(|_| format!("octave '{}' is too large", &rest[..digits_end]))?
    } else {
        carried_octave
    };
    rest = &rest[digits_end..];

    while let Some(adjust) = rest.chars().next() {
        let step = match adjust {
            '+' => 1,
            '-' => -1,
            _ => break,
        };
        octave = octave
            .checked_add(step)
            .ok_or_else(|| format!("octave is out of range in '{}'", text))?;
        rest = &rest[1..];
    }

    if !rest.is_empty() {
        return Err(format!("unexpected '{}' after the pitch", rest));
    }

    Ok(Pitch {
        name,
        accidental,
        octave,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> NoteDescriptor {
        parse_note(text, &NoteDefaults::default()).unwrap().0
    }

    #[test]
    fn test_middle_c() {
        let note = parse("C4");
        assert_eq!(note.length, 4);
        assert_eq!(note.pitches.len(), 1);
        assert_eq!(note.pitches[0].midi_note(), Some(60));
        assert!(!note.tie);
    }

    #[test]
    fn test_note_numbers() {
        assert_eq!(parse("A4").pitches[0].midi_note(), Some(69));
        assert_eq!(parse("C#4").pitches[0].midi_note(), Some(61));
        assert_eq!(parse("Bb3").pitches[0].midi_note(), Some(58));
        assert_eq!(parse("En4").pitches[0].midi_note(), Some(64));
        assert_eq!(parse("C0-").pitches[0].midi_note(), Some(0));
        assert_eq!(parse("G9").pitches[0].midi_note(), Some(127));
    }

    #[test]
    fn test_out_of_range_pitch() {
        assert!(parse_note("G#9", &NoteDefaults::default()).is_err());
        assert!(parse_note("C0--", &NoteDefaults::default()).is_err());
        assert!(parse_note("C999999999", &NoteDefaults::default()).is_err());
        assert!(parse_note("C2147483647+", &NoteDefaults::default()).is_err());
        assert!(parse_note("C99999999999", &NoteDefaults::default()).is_err());
    }

    #[test]
    fn test_ticks_add_exact() {
        let third = Ticks::new(1024, 3);
        let sum = third + third + third;
        assert_eq!(sum, Ticks::whole(1024));
        assert_eq!(Ticks::new(1, 2) + Ticks::new(1, 6), Ticks::new(2, 3));
    }

    #[test]
    fn test_ticks_add_falls_back_when_too_fine() {
        let a = Ticks::new(1, 4_294_967_291 * 3);
        let b = Ticks::new(1, 4_294_967_279 * 3);
        assert_eq!(a.checked_add(b), None);

        let sum = a + b;
        assert!((sum.as_f64() - (a.as_f64() + b.as_f64())).abs() < 1e-6);

        let big = Ticks::new(u64::MAX - 1, 3) + Ticks::new(u64::MAX - 1, 5);
        assert!(big.as_f64() > 1e18);
    }

    #[test]
    fn test_accidental_after_octave_is_rejected() {
        let err = parse_note("C4#5", &NoteDefaults::default()).unwrap_err();
        assert!(err.contains("#5"), "{}", err);
    }

    #[test]
    fn test_length_plet_and_dots() {
        let note = parse("8t.C");
        assert_eq!(note.length, 8);
        assert_eq!(note.plet, Plet::Triplet);
        assert_eq!(note.dots, 1);

        // Trailing plet after the dots is accepted too
        let note = parse("4.dG");
        assert_eq!(note.plet, Plet::Duplet);
        assert_eq!(note.dots, 1);
    }

    #[test]
    fn test_plet_or_dot_needs_length() {
        assert!(parse_note("tC", &NoteDefaults::default()).is_err());
        // A leading '.' is a staccato accent, not a dot
        let (note, _) = parse_note(".~C", &NoteDefaults::default()).unwrap();
        assert_eq!(note.accent, Some(Accent::Staccato));
        assert!(note.tie);
        assert!(parse_note(">.C", &NoteDefaults::default()).is_err());
    }

    #[test]
    fn test_two_plets_rejected() {
        assert!(parse_note("4t.tC", &NoteDefaults::default()).is_err());
    }

    #[test]
    fn test_defaults_carry_forward() {
        let defaults = NoteDefaults::default();
        let (_, defaults) = parse_note("8.tE5", &defaults).unwrap();
        let (note, defaults) = parse_note("F", &defaults).unwrap();
        assert_eq!(note.length, 8);
        assert_eq!(note.dots, 1);
        assert_eq!(note.plet, Plet::Triplet);
        assert_eq!(note.pitches[0].midi_note(), Some(77)); // F5
        assert_eq!(defaults.octave, 5);

        // A new numeric length resets dots and plet
        let (note, _) = parse_note("2G", &defaults).unwrap();
        assert_eq!((note.length, note.dots, note.plet), (2, 0, Plet::None));
    }

    #[test]
    fn test_tie_accent_and_accidental_do_not_carry() {
        let (first, defaults) = parse_note(">4~C#", &NoteDefaults::default()).unwrap();
        assert!(first.tie);
        assert_eq!(first.accent, Some(Accent::Accent));
        let (second, _) = parse_note("C", &defaults).unwrap();
        assert!(!second.tie);
        assert_eq!(second.accent, None);
        assert_eq!(second.pitches[0].accidental, None);
    }

    #[test]
    fn test_relative_octaves() {
        let (note, defaults) = parse_note("C++", &NoteDefaults::default()).unwrap();
        assert_eq!(note.pitches[0].octave, 6);
        let (note, _) = parse_note("C3-", &defaults).unwrap();
        assert_eq!(note.pitches[0].octave, 2);
    }

    #[test]
    fn test_chord() {
        let (note, defaults) = parse_note("2C:E:G+", &NoteDefaults::default()).unwrap();
        let notes = note.midi_notes();
        assert_eq!(notes, vec![60, 64, 79]);
        assert_eq!(defaults.octave, 5);
        assert_eq!(note.length, 2);
    }

    #[test]
    fn test_rest() {
        let note = parse("2R");
        assert!(note.is_rest());
        assert_eq!(note.length, 2);
    }

    #[test]
    fn test_rest_rejects_pitch_details() {
        assert!(parse_note("R4", &NoteDefaults::default()).is_err());
        assert!(parse_note("R#", &NoteDefaults::default()).is_err());
        assert!(parse_note("R+", &NoteDefaults::default()).is_err());
    }

    #[test]
    fn test_rest_in_chord_rejected() {
        assert!(parse_note("C:R", &NoteDefaults::default()).is_err());
        assert!(parse_note("R:C", &NoteDefaults::default()).is_err());
    }

    #[test]
    fn test_parallel_note_cannot_have_prefix() {
        assert!(parse_note("C:4E", &NoteDefaults::default()).is_err());
        assert!(parse_note("C:", &NoteDefaults::default()).is_err());
    }

    #[test]
    fn test_missing_note_name() {
        let err = parse_note("4.", &NoteDefaults::default()).unwrap_err();
        assert!(err.contains("note name is required"));
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(parse_note("0C", &NoteDefaults::default()).is_err());
    }

    #[test]
    fn test_triplet_thirds_add_up() {
        let third = parse("8tC").duration(1024);
        assert_eq!(third, Ticks::new(256, 3));
        assert_eq!((third + third + third).floor(), 256);
        assert_eq!(third.saturating_sub_whole(68), Ticks::new(52, 3));
    }

    #[test]
    fn test_ticks() {
        let tpw = 1024;
        assert_eq!(parse("C").ticks(tpw), 256.0);
        assert_eq!(parse("1C").ticks(tpw), 1024.0);
        assert_eq!(parse("4.C").ticks(tpw), 384.0);
        assert_eq!(parse("4..C").ticks(tpw), 384.0); // one dot level only
        assert!((parse("4dC").ticks(tpw) - 384.0).abs() < 1e-9);
        assert!((parse("4tC").ticks(tpw) - 1024.0 / 6.0).abs() < 1e-9);
    }
}
