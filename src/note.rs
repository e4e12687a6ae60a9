use serde::{Deserialize, Serialize};
use std::fmt;

/// Pitch classes in chromatic order, sharps only (the paper keyboard never spells flats).
pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Prefix tried after the bare token when looking for an on-screen key.
pub const KEY_ID_PREFIX: &str = "key-";

/// A note token as the UI displays it.
///
/// `pitch_class + octave` is not guaranteed to reconstruct `raw`: only the first
/// letter/accidental/digit group is captured and everything around it is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub raw: String,
    pub pitch_class: String,
    /// A single digit, or empty when the token did not parse.
    pub octave: String,
}

impl NoteEvent {
    /// True if the token contained a `[A-G]#?[0-9]` group.
    pub fn is_parsed(&self) -> bool {
        !self.octave.is_empty()
    }

    /// MIDI note number (C4 = 60), `None` for unparsed tokens or notes above 127.
    pub fn midi(&self) -> Option<u8> {
        let octave: u32 = self.octave.parse().ok()?;
        let pc = NOTE_NAMES.iter().position(|&n| n == self.pitch_class)? as u32;
        let midi = (octave + 1) * 12 + pc;
        u8::try_from(midi).ok().filter(|&m| m <= 127)
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_parsed() {
            write!(f, "{} (pc={} oct={})", self.raw, self.pitch_class, self.octave)
        } else {
            write!(f, "{} (unparsed)", self.raw)
        }
    }
}

/// Split a note token into pitch class and octave.
///
/// Looks for the leftmost `[A-G]#?[0-9]` group anywhere in the string.
/// Anything that doesn't contain one falls back to `pitch_class = raw`, `octave = ""`.
pub fn parse_note_token(raw: &str) -> NoteEvent {
    match find_note_group(raw) {
        Some((pc, oct)) => NoteEvent {
            raw: raw.to_string(),
            pitch_class: pc.to_string(),
            octave: oct.to_string(),
        },
        None => NoteEvent {
            raw: raw.to_string(),
            pitch_class: raw.to_string(),
            octave: String::new(),
        },
    }
}

/// Returns (letter+accidental, digit) slices of the first match.
/// All matched bytes are ASCII, so the slice bounds are always char boundaries.
fn find_note_group(s: &str) -> Option<(&str, &str)> {
    let b = s.as_bytes();
    for i in 0..b.len() {
        if !(b'A'..=b'G').contains(&b[i]) {
            continue;
        }
        // Greedy on the sharp first, then the bare letter.
        if b.get(i + 1) == Some(&b'#') && b.get(i + 2).is_some_and(u8::is_ascii_digit) {
            return Some((&s[i..i + 2], &s[i + 2..i + 3]));
        }
        if b.get(i + 1).is_some_and(u8::is_ascii_digit) {
            return Some((&s[i..i + 1], &s[i + 1..i + 2]));
        }
    }
    None
}

/// Resolve the display element to highlight for a note token.
///
/// Tries the token itself, then `key-<token>`. `exists` answers whether the
/// presentation layer has an element with that id.
pub fn lookup_key_element<F>(raw: &str, exists: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    if exists(raw) {
        return Some(raw.to_string());
    }
    let prefixed = format!("{}{}", KEY_ID_PREFIX, raw);
    if exists(&prefixed) {
        return Some(prefixed);
    }
    None
}

/// Convert MIDI note number to Hz (A4 = 440 Hz, 12-TET).
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(raw: &str) -> (String, String) {
        let e = parse_note_token(raw);
        (e.pitch_class, e.octave)
    }

    #[test]
    fn test_parse_sharp() {
        let e = parse_note_token("C#4");
        assert_eq!(e.raw, "C#4");
        assert_eq!(e.pitch_class, "C#");
        assert_eq!(e.octave, "4");
    }

    #[test]
    fn test_parse_every_well_formed_token() {
        for letter in ["A", "B", "C", "D", "E", "F", "G"] {
            for sharp in ["", "#"] {
                for digit in 0..10 {
                    let raw = format!("{}{}{}", letter, sharp, digit);
                    let (pc, oct) = parts(&raw);
                    assert_eq!(pc, format!("{}{}", letter, sharp), "token {}", raw);
                    assert_eq!(oct, digit.to_string(), "token {}", raw);
                }
            }
        }
    }

    #[test]
    fn test_parse_no_match_falls_back_to_raw() {
        for raw in ["Xyz", "", "c4", "H2", "C#", "#4", "C##4", "Cb4"] {
            let e = parse_note_token(raw);
            assert_eq!(e.pitch_class, raw, "token {:?}", raw);
            assert_eq!(e.octave, "", "token {:?}", raw);
            assert!(!e.is_parsed());
        }
    }

    #[test]
    fn test_parse_ignores_surrounding_text() {
        assert_eq!(parts("note:A#0!"), ("A#".into(), "0".into()));
        // Only the first digit is the octave
        assert_eq!(parts("C10"), ("C".into(), "1".into()));
        // Leftmost match wins
        assert_eq!(parts("xxG7 then A1"), ("G".into(), "7".into()));
        // A failed sharp group doesn't hide a later match
        assert_eq!(parts("C#x D5"), ("D".into(), "5".into()));
    }

    #[test]
    fn test_parse_non_ascii_input() {
        assert_eq!(parts("♯C♯4"), ("♯C♯4".into(), "".into()));
        assert_eq!(parts("é F#3 é"), ("F#".into(), "3".into()));
    }

    #[test]
    fn test_midi() {
        assert_eq!(parse_note_token("C4").midi(), Some(60));
        assert_eq!(parse_note_token("A0").midi(), Some(21));
        assert_eq!(parse_note_token("C8").midi(), Some(108));
        assert_eq!(parse_note_token("A#3").midi(), Some(58));
        assert_eq!(parse_note_token("G9").midi(), Some(127));
        assert_eq!(parse_note_token("G#9").midi(), None);
        assert_eq!(parse_note_token("Xyz").midi(), None);
    }

    #[test]
    fn test_midi_to_hz() {
        assert!((midi_to_hz(69.0) - 440.0).abs() < 0.01);
        assert!((midi_to_hz(60.0) - 261.63).abs() < 0.1);
    }

    #[test]
    fn test_lookup_key_element_order() {
        let ids = ["C4", "key-C4", "key-D4"];
        let exists = |id: &str| ids.contains(&id);
        assert_eq!(lookup_key_element("C4", exists), Some("C4".into()));
        assert_eq!(lookup_key_element("D4", exists), Some("key-D4".into()));
        assert_eq!(lookup_key_element("E4", exists), None);
    }
}
