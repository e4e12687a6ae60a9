//! JSONL session reader: parses recorded note logs back into notes.
//!
//! Reads the header line then yields notes one at a time. Works with any
//! `BufRead`: files, in-memory buffers, stdin.

use crate::session_log::{LoggedNote, LOG_FORMAT};
use crate::types::HostEvent;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::io::BufRead;
use std::thread;
use std::time::{Duration, Instant};

/// Parsed JSONL header (first line of a session file).
#[derive(Debug)]
pub struct SessionHeader {
    pub format: String,
    pub session: u64,
    pub raw: serde_json::Value,
}

/// Line-by-line note log reader.
pub struct NoteSessionReader<R: BufRead> {
    reader: R,
    pub header: SessionHeader,
    line_buf: String,
}

impl<R: BufRead> NoteSessionReader<R> {
    /// Read and validate the header line. Returns an error if the header
    /// is missing, unparseable, or lacks a `"format": "paper-piano"` field.
    pub fn open(mut reader: R) -> Result<Self, String> {
        let mut first_line = String::new();
        reader
            .read_line(&mut first_line)
            .map_err(|e| format!("read header: {}", e))?;

        let first_line = first_line.trim();
        if first_line.is_empty() {
            return Err("empty file".into());
        }

        let raw: serde_json::Value =
            serde_json::from_str(first_line).map_err(|e| format!("parse header: {}", e))?;

        let format = raw["format"]
            .as_str()
            .ok_or("missing \"format\" field")?
            .to_string();
        if format != LOG_FORMAT {
            return Err(format!("unknown format: {}", format));
        }
        let session = raw["session"].as_u64().unwrap_or(0);

        Ok(Self {
            reader,
            header: SessionHeader {
                format,
                session,
                raw,
            },
            line_buf: String::new(),
        })
    }

    /// Read the next note. Returns `None` at EOF, `Err` for unparseable lines.
    pub fn next_note(&mut self) -> Option<Result<LoggedNote, String>> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = self.line_buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(
                        serde_json::from_str::<LoggedNote>(trimmed)
                            .map_err(|e| format!("parse note: {}", e)),
                    );
                }
                Err(e) => return Some(Err(format!("read line: {}", e))),
            }
        }
    }

    /// Read all remaining notes, skipping malformed lines.
    pub fn read_all(mut self) -> Vec<LoggedNote> {
        let mut notes = Vec::new();
        while let Some(result) = self.next_note() {
            match result {
                Ok(n) => notes.push(n),
                Err(e) => warn!("Skipping line: {}", e),
            }
        }
        notes
    }
}

/// Feed a recorded session back in as host note events, keeping the
/// original spacing divided by `speed` (0 or less = as fast as possible).
/// Returns the number of notes sent.
pub fn replay<R: BufRead>(
    reader: NoteSessionReader<R>,
    tx: &Sender<HostEvent>,
    speed: f64,
) -> usize {
    info!("Replaying session {}", reader.header.session);
    let notes = reader.read_all();
    let start = Instant::now();
    let first_t = notes.first().map(|n| n.t).unwrap_or(0);
    let mut sent = 0;

    for note in notes {
        if speed > 0.0 {
            let offset_us = note.t.saturating_sub(first_t) as f64 / speed;
            let target = Duration::from_micros(offset_us as u64);
            let elapsed = start.elapsed();
            if elapsed < target {
                thread::sleep(target - elapsed);
            }
        }
        if tx.send(HostEvent::Note(note.n)).is_err() {
            break;
        }
        sent += 1;
    }
    info!("Replay complete: {} notes", sent);
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::io::Cursor;

    fn header() -> String {
        format!(r#"{{"format":"{}","session":7,"version":"0.1.0"}}"#, LOG_FORMAT)
    }

    #[test]
    fn test_open_valid_header() {
        let data = header() + "\n";
        let reader = NoteSessionReader::open(Cursor::new(data)).unwrap();
        assert_eq!(reader.header.format, "paper-piano");
        assert_eq!(reader.header.session, 7);
    }

    #[test]
    fn test_open_missing_or_wrong_format() {
        let err = NoteSessionReader::open(Cursor::new("{\"session\":1}\n")).err().unwrap();
        assert!(err.contains("format"), "got: {}", err);
        let err = NoteSessionReader::open(Cursor::new("{\"format\":\"steel\"}\n")).err().unwrap();
        assert!(err.contains("unknown format"), "got: {}", err);
        assert!(NoteSessionReader::open(Cursor::new("")).is_err());
    }

    #[test]
    fn test_read_all_skips_blank_and_malformed() {
        let data = header()
            + "\n"
            + r#"{"t":10,"n":"C4","m":60}"#
            + "\n\n"
            + "not json\n"
            + r#"{"t":20,"n":"Xyz"}"#
            + "\n";
        let notes = NoteSessionReader::open(Cursor::new(data)).unwrap().read_all();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].m, Some(60));
        assert_eq!(notes[1].n, "Xyz");
        assert_eq!(notes[1].m, None);
    }

    #[test]
    fn test_next_note_reports_error() {
        let data = header() + "\ngarbage\n";
        let mut reader = NoteSessionReader::open(Cursor::new(data)).unwrap();
        assert!(reader.next_note().unwrap().is_err());
        assert!(reader.next_note().is_none());
    }

    #[test]
    fn test_replay_sends_notes_in_order() {
        let data = header()
            + "\n"
            + r#"{"t":1000,"n":"E4"}"#
            + "\n"
            + r#"{"t":2000,"n":"D4"}"#
            + "\n";
        let (tx, rx) = unbounded();
        let reader = NoteSessionReader::open(Cursor::new(data)).unwrap();
        assert_eq!(replay(reader, &tx, 0.0), 2);
        let got: Vec<HostEvent> = rx.try_iter().collect();
        assert_eq!(got, vec![HostEvent::note("E4"), HostEvent::note("D4")]);
    }
}
