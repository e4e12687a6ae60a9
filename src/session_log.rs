//! Per-session note log.
//!
//! Layout on disk:
//!   <output_dir>/session_<unix-secs>/notes.jsonl   header line, then one note per line
//!   <output_dir>/session_<unix-secs>/manifest.json  session metadata, rewritten on close

use crate::types::NoteRecord;
use crossbeam_channel::Receiver;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Value of the header's `format` field.
pub const LOG_FORMAT: &str = "paper-piano";

/// One note line. Short keys keep the log compact:
/// t=microseconds since session start, n=raw token, m=MIDI number if the token parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedNote {
    pub t: u64,
    pub n: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<u8>,
}

impl From<&NoteRecord> for LoggedNote {
    fn from(r: &NoteRecord) -> Self {
        Self {
            t: r.t_us,
            n: r.event.raw.clone(),
            m: r.event.midi(),
        }
    }
}

pub struct SessionLogger {
    rx: Receiver<NoteRecord>,
    session_id: u64,
    session_dir: PathBuf,
}

impl SessionLogger {
    /// Create the session directory. The session id is the start time in
    /// unix seconds.
    pub fn new(rx: Receiver<NoteRecord>, output_dir: &Path) -> Result<Self, String> {
        let session_id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| e.to_string())?
            .as_secs();
        Self::with_id(rx, output_dir, session_id)
    }

    pub fn with_id(
        rx: Receiver<NoteRecord>,
        output_dir: &Path,
        session_id: u64,
    ) -> Result<Self, String> {
        let session_dir = output_dir.join(format!("session_{}", session_id));
        fs::create_dir_all(&session_dir)
            .map_err(|e| format!("create {:?}: {}", session_dir, e))?;
        Ok(Self {
            rx,
            session_id,
            session_dir,
        })
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn notes_path(&self) -> PathBuf {
        self.session_dir.join("notes.jsonl")
    }

    /// Run the logger until the note channel closes. Blocks the calling thread.
    pub fn run(&self) {
        info!("Session log → {:?}", self.session_dir);
        match self.write_session() {
            Ok(count) => info!("Session saved: {} notes → {:?}", count, self.session_dir),
            Err(e) => error!("Session log failed: {}", e),
        }
    }

    fn write_session(&self) -> io::Result<u64> {
        self.write_manifest(None)?;

        let mut out = BufWriter::new(File::create(self.notes_path())?);
        let header = json!({
            "format": LOG_FORMAT,
            "version": env!("CARGO_PKG_VERSION"),
            "session": self.session_id,
        });
        writeln!(out, "{}", header)?;
        out.flush()?;

        let mut count: u64 = 0;
        for record in self.rx.iter() {
            let line = serde_json::to_string(&LoggedNote::from(&record))?;
            writeln!(out, "{}", line)?;
            // Notes arrive at human speed; keep the file current.
            out.flush()?;
            count += 1;
        }

        self.write_manifest(Some(count))?;
        Ok(count)
    }

    fn write_manifest(&self, notes: Option<u64>) -> io::Result<()> {
        let manifest = json!({
            "system": LOG_FORMAT,
            "version": env!("CARGO_PKG_VERSION"),
            "session": self.session_id,
            "notes_file": "notes.jsonl",
            "total_notes": notes,
            "complete": notes.is_some(),
        });
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(self.session_dir.join("manifest.json"), json)
    }
}
