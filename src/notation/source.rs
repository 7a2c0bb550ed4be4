//! Splitting a notation file into named tracks.

use super::compiler::SourceLine;

/// Name given to lines that appear before the first `Track` header
pub const IMPLICIT_TRACK_NAME: &str = "0";

/// The cleaned lines of one `Track <name>` section
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSource {
    pub name: String,
    pub lines: Vec<SourceLine>,
}

/// Split notation text into tracks.
///
/// Strips `;` comments and surrounding whitespace and drops blank lines. Each
/// `Track <name>` line starts a new track. Lines before the first header form an
/// implicit track named `0`, which is only returned when it has content.
pub fn split_tracks(source: &str) -> Vec<TrackSource> {
    let mut tracks: Vec<TrackSource> = Vec::new();
    let mut preamble: Vec<SourceLine> = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let text = match raw.find(';') {
            Some(comment) => &raw[..comment],
            None => raw,
        }
        .trim();
        if text.is_empty() {
            continue;
        }

        if let Some(name) = track_header(text) {
            let name = if name.is_empty() {
                tracks.len().to_string()
            } else {
                name.to_string()
            };
            tracks.push(TrackSource {
                name,
                lines: Vec::new(),
            });
            continue;
        }

        let line = SourceLine::new(i + 1, text);
        match tracks.last_mut() {
            Some(track) => track.lines.push(line),
            None => preamble.push(line),
        }
    }

    if !preamble.is_empty() {
        tracks.insert(
            0,
            TrackSource {
                name: IMPLICIT_TRACK_NAME.to_string(),
                lines: preamble,
            },
        );
    }
    tracks
}

/// The name in a `Track <name>` header line
fn track_header(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("Track")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim();
    Some(name.strip_suffix(':').unwrap_or(name).trim_end())
}
