//! # Compiler Settings
//!
//! Defaults used by the notation compiler, optionally overridden by a YAML front-matter
//! block at the top of the notation source:
//!
//! ```text
//! ---
//! division: 480
//! ticks-per-whole: 1920
//! volume: 0.75
//! note-on-percent: 0.9
//! ---
//! Track Melody
//! C4 D E F
//! ```
//!
//! Parsing is two-step: YAML is deserialized into [`RawSettings`] (every key optional),
//! then each present key is range-checked and laid over [`Settings::default`].

use crate::error::MidiError;
use serde::Deserialize;

/// Resolved compiler settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// SMF format written to the header
    pub format: u16,
    /// Ticks per quarter note written to the header
    pub division: u16,
    /// Ticks in a whole note, the base of every note duration
    pub ticks_per_whole: u32,
    /// Note-on velocity as a fraction of 127
    pub volume: f64,
    /// Fraction of a note's duration it sounds before its note-off
    pub note_on_percent: f64,
    /// Starting channel of every track
    pub channel: u8,
    /// Starting note length (4 = quarter note)
    pub length: u32,
    /// Starting octave (middle C is C4)
    pub octave: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: 1,
            division: 256,
            ticks_per_whole: 256 * 4,
            volume: 0.5,
            note_on_percent: 0.8,
            channel: 0,
            length: 4,
            octave: 4,
        }
    }
}

/// Raw settings for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawSettings {
    pub format: Option<u16>,
    pub division: Option<u16>,
    pub ticks_per_whole: Option<u32>,
    pub volume: Option<f64>,
    pub note_on_percent: Option<f64>,
    pub channel: Option<u8>,
    pub length: Option<u32>,
    pub octave: Option<i32>,
}

impl Settings {
    /// Parse settings from the YAML text between the `---` markers
    pub fn from_yaml(content: &str) -> Result<Self, MidiError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawSettings =
            serde_yaml::from_str(content).map_err(|e| MidiError::MetadataError(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawSettings) -> Result<Self, MidiError> {
        let mut settings = Self::default();

        if let Some(format) = raw.format {
            if format > 2 {
                return Err(invalid(format!("format must be 0, 1 or 2, got {}", format)));
            }
            settings.format = format;
        }
        if let Some(division) = raw.division {
            // Top bit set would mean SMPTE timing
            if division == 0 || division > 0x7FFF {
                return Err(invalid(format!(
                    "division must be 1-32767 ticks per quarter note, got {}",
                    division
                )));
            }
            settings.division = division;
        }
        if let Some(ticks) = raw.ticks_per_whole {
            if ticks == 0 {
                return Err(invalid("ticks-per-whole must be positive".to_string()));
            }
            settings.ticks_per_whole = ticks;
        }
        if let Some(volume) = raw.volume {
            if !(0.0..=1.0).contains(&volume) {
                return Err(invalid(format!("volume must be 0.0-1.0, got {}", volume)));
            }
            settings.volume = volume;
        }
        if let Some(percent) = raw.note_on_percent {
            if !(percent > 0.0 && percent <= 1.0) {
                return Err(invalid(format!(
                    "note-on-percent must be above 0.0 and at most 1.0, got {}",
                    percent
                )));
            }
            settings.note_on_percent = percent;
        }
        if let Some(channel) = raw.channel {
            if channel > 15 {
                return Err(invalid(format!("channel must be 0-15, got {}", channel)));
            }
            settings.channel = channel;
        }
        if let Some(length) = raw.length {
            if length == 0 {
                return Err(invalid("length must be positive".to_string()));
            }
            settings.length = length;
        }
        if let Some(octave) = raw.octave {
            if !(-1..=9).contains(&octave) {
                return Err(invalid(format!("octave must be -1 to 9, got {}", octave)));
            }
            settings.octave = octave;
        }

        Ok(settings)
    }

    /// Note-on velocity derived from the volume
    pub fn velocity(&self) -> u8 {
        (self.volume * 127.0).round() as u8
    }
}

fn invalid(message: String) -> MidiError {
    MidiError::MetadataError(message)
}

/// Split a leading `---` front-matter block off a notation source.
///
/// The returned body keeps one (empty) line for every line of the block, so line
/// numbers reported later still match the original file. Only a block that starts on
/// the first non-blank line counts as front matter.
///
/// ```
/// use notemidi::settings::extract_front_matter;
///
/// let (yaml, body) = extract_front_matter("---\nvolume: 0.9\n---\nC4 D E");
/// assert_eq!(yaml.as_deref(), Some("volume: 0.9"));
/// assert_eq!(body, "\n\n\nC4 D E");
/// ```
pub fn extract_front_matter(source: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = source.lines().collect();

    let start = match lines.iter().position(|line| !line.trim().is_empty()) {
        Some(i) if lines[i].trim() == "---" => i,
        _ => return (None, source.to_string()),
    };
    let end = match lines[start + 1..].iter().position(|line| line.trim() == "---") {
        Some(offset) => start + 1 + offset,
        None => return (None, source.to_string()),
    };

    let yaml = lines[start + 1..end].join("\n");
    let body: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| if i <= end { "" } else { *line })
        .collect();
    (Some(yaml), body.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.division, 256);
        assert_eq!(settings.ticks_per_whole, 1024);
        assert_eq!(settings.velocity(), 64); // round(63.5)
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let settings = Settings::from_yaml("volume: 1.0\nticks-per-whole: 1920").unwrap();
        assert_eq!(settings.velocity(), 127);
        assert_eq!(settings.ticks_per_whole, 1920);
        assert_eq!(settings.division, 256);
        assert_eq!(settings.octave, 4);
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_out_of_range_channel() {
        let result = Settings::from_yaml("channel: 16");
        assert!(result.is_err());
        if let Err(MidiError::MetadataError(message)) = result {
            assert!(message.contains("channel must be 0-15"));
        }
    }

    #[test]
    fn test_smpte_division_rejected() {
        assert!(Settings::from_yaml("division: 40000").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Settings::from_yaml("tempo: 120");
        assert!(matches!(result, Err(MidiError::MetadataError(_))));
    }

    #[test]
    fn test_invalid_note_on_percent() {
        assert!(Settings::from_yaml("note-on-percent: 0").is_err());
        assert!(Settings::from_yaml("note-on-percent: 1.5").is_err());
        assert!(Settings::from_yaml("note-on-percent: 1").is_ok());
    }

    #[test]
    fn test_no_front_matter() {
        let (yaml, body) = extract_front_matter("Track 1\nC D E");
        assert!(yaml.is_none());
        assert_eq!(body, "Track 1\nC D E");
    }

    #[test]
    fn test_unclosed_front_matter_is_ignored() {
        let (yaml, body) = extract_front_matter("---\nvolume: 1.0\nC D E");
        assert!(yaml.is_none());
        assert_eq!(body, "---\nvolume: 1.0\nC D E");
    }
}
