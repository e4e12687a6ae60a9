use crate::note::{parse_note_token, NoteEvent};
use std::collections::VecDeque;

/// Number of notes kept (and rendered) in the history.
pub const HISTORY_CAP: usize = 10;

/// Most-recent-first record of note events, never longer than [`HISTORY_CAP`].
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    events: VecDeque<NoteEvent>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(HISTORY_CAP + 1),
        }
    }

    /// Prepend and drop from the tail until the length fits.
    pub fn insert(&mut self, event: NoteEvent) {
        self.events.push_front(event);
        self.events.truncate(HISTORY_CAP);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn latest(&self) -> Option<&NoteEvent> {
        self.events.front()
    }

    /// Iterate most-recent-first.
    pub fn iter(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter()
    }

    /// Raw tokens, most-recent-first.
    pub fn tokens(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.raw.as_str()).collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses incoming note tokens and keeps the bounded display history.
///
/// Owned by whoever drives the UI; there is no shared or global state, so the
/// insert-and-truncate in [`record_note`](Self::record_note) is atomic as long
/// as the tracker has a single owner.
#[derive(Debug, Clone, Default)]
pub struct NoteHistoryTracker {
    history: HistoryBuffer,
}

impl NoteHistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw`, prepend it to the history and return the parsed event.
    pub fn record_note(&mut self, raw: &str) -> NoteEvent {
        let event = parse_note_token(raw);
        self.history.insert(event.clone());
        event
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn latest(&self) -> Option<&NoteEvent> {
        self.history.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_returns_parsed_event() {
        let mut t = NoteHistoryTracker::new();
        let e = t.record_note("C#4");
        assert_eq!(e.raw, "C#4");
        assert_eq!(e.pitch_class, "C#");
        assert_eq!(e.octave, "4");
        assert_eq!(t.history().tokens(), vec!["C#4"]);
    }

    #[test]
    fn test_record_unparsed_token() {
        let mut t = NoteHistoryTracker::new();
        let e = t.record_note("Xyz");
        assert_eq!(e.pitch_class, "Xyz");
        assert_eq!(e.octave, "");
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_most_recent_first() {
        let mut t = NoteHistoryTracker::new();
        t.record_note("C4");
        t.record_note("D4");
        assert_eq!(t.history().tokens(), vec!["D4", "C4"]);
        assert_eq!(t.latest().map(|e| e.raw.as_str()), Some("D4"));
    }

    #[test]
    fn test_length_is_min_n_cap() {
        let mut t = NoteHistoryTracker::new();
        assert!(t.is_empty());
        for n in 1..=25 {
            t.record_note(&format!("n{}", n));
            assert_eq!(t.len(), n.min(HISTORY_CAP));
        }
    }

    #[test]
    fn test_eleventh_insert_evicts_first() {
        let mut t = NoteHistoryTracker::new();
        for n in 1..=11 {
            t.record_note(&format!("t{}", n));
        }
        let tokens = t.history().tokens();
        assert_eq!(tokens.len(), 10);
        assert!(!tokens.contains(&"t1"));
        assert_eq!(tokens.first(), Some(&"t11"));
        assert_eq!(tokens.last(), Some(&"t2"));
    }

    #[test]
    fn test_twelve_tokens_keeps_3_through_12() {
        let mut t = NoteHistoryTracker::new();
        for n in 1..=12 {
            t.record_note(&format!("k{}", n));
        }
        let expected: Vec<String> = (3..=12).rev().map(|n| format!("k{}", n)).collect();
        let got: Vec<String> = t.history().iter().map(|e| e.raw.clone()).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut t = NoteHistoryTracker::new();
        t.record_note("E4");
        t.record_note("E4");
        assert_eq!(t.history().tokens(), vec!["E4", "E4"]);
    }

    #[test]
    fn test_buffer_never_exceeds_cap() {
        let mut b = HistoryBuffer::default();
        for n in 0..(HISTORY_CAP * 3) {
            b.insert(parse_note_token(&format!("A{}", n % 8)));
            assert!(b.len() <= HISTORY_CAP);
        }
        assert_eq!(b.len(), HISTORY_CAP);
        assert_eq!(b.latest().map(|e| e.raw.as_str()), Some("A5"));
    }
}
