use crate::note::NoteEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

// ─── Host → UI ──────────────────────────────────────────────────────────────

/// One encoded camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePayload {
    /// MIME type of the encoded image, e.g. "image/jpeg"
    pub mime: String,
    /// Base64 image bytes, no `data:` prefix
    pub base64: String,
}

impl FramePayload {
    pub fn jpeg(base64: impl Into<String>) -> Self {
        Self {
            mime: "image/jpeg".into(),
            base64: base64.into(),
        }
    }

    /// `data:` URL suitable for an `<img src>`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub message: String,
    pub is_error: bool,
}

/// One-way notifications from the host. None of them expects a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Frame(FramePayload),
    Status(StatusUpdate),
    /// A note token such as "C4" or "A#0"
    Note(String),
}

impl HostEvent {
    pub fn status(message: impl Into<String>, is_error: bool) -> Self {
        HostEvent::Status(StatusUpdate {
            message: message.into(),
            is_error,
        })
    }

    pub fn note(token: impl Into<String>) -> Self {
        HostEvent::Note(token.into())
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::Frame(p) => write!(f, "frame {} ({} b64 chars)", p.mime, p.base64.len()),
            HostEvent::Status(s) => {
                write!(f, "status {:?}{}", s.message, if s.is_error { " [err]" } else { "" })
            }
            HostEvent::Note(n) => write!(f, "note {}", n),
        }
    }
}

// ─── UI → Host ──────────────────────────────────────────────────────────────

/// Messages the page posts back to the host.
///
/// Wire form: `{"kind":"ui_ready","elements":["note-display", ...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum UiSignal {
    /// Page is built; host may start producing events.
    /// `elements` lists every element id present on the page.
    #[serde(rename = "ui_ready")]
    Ready {
        #[serde(default)]
        elements: Vec<String>,
    },
}

impl UiSignal {
    pub fn parse(msg: &str) -> Result<Self, String> {
        serde_json::from_str(msg).map_err(|e| format!("bad UI message {:?}: {}", msg, e))
    }
}

// ─── Recorded notes (coordinator → consumers) ──────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    /// Microseconds since session start
    pub t_us: u64,
    pub event: NoteEvent,
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic clock for the session.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_ready_wire_format() {
        let sig = UiSignal::parse(r#"{"kind":"ui_ready","elements":["note-display","key-C4"]}"#)
            .unwrap();
        assert_eq!(
            sig,
            UiSignal::Ready {
                elements: vec!["note-display".into(), "key-C4".into()]
            }
        );
        let bare = UiSignal::parse(r#"{"kind":"ui_ready"}"#).unwrap();
        assert_eq!(bare, UiSignal::Ready { elements: vec![] });
        assert!(UiSignal::parse("ready").is_err());
        assert!(UiSignal::parse(r#"{"kind":"shutdown"}"#).is_err());
    }

    #[test]
    fn test_data_url() {
        let p = FramePayload::jpeg("AAAA");
        assert_eq!(p.data_url(), "data:image/jpeg;base64,AAAA");
    }
}
