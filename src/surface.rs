//! Presentation primitives the UI writes through.
//!
//! Every operation names its target by element id and is a no-op when the
//! element doesn't exist, so a page missing e.g. the status dot still works.

use crossbeam_channel::{Sender, TrySendError};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// CSS class toggled on a highlighted key.
pub const ACTIVE_CLASS: &str = "active";
/// CSS class of each history list row.
pub const HISTORY_ITEM_CLASS: &str = "history-item";
/// Scripts queued for the WebView before frames start being dropped.
pub const SCRIPT_QUEUE: usize = 256;

pub trait Surface {
    fn has_element(&self, id: &str) -> bool;
    fn set_text(&mut self, id: &str, text: &str);
    fn set_image_src(&mut self, id: &str, src: &str);
    fn set_background(&mut self, id: &str, color: &str);
    /// Insert a row at the top of a list, then drop rows from the bottom
    /// until at most `cap` remain.
    fn prepend_history_item(&mut self, list_id: &str, text: &str, cap: usize);
    /// Mark an element active for `ms` milliseconds.
    fn flash(&mut self, id: &str, ms: u64);
    /// All writes for one host message are done.
    fn commit(&mut self) {}
}

// ─── In-memory model ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub text: String,
    pub image_src: Option<String>,
    pub background: Option<String>,
    /// List rows, top first
    pub children: Vec<String>,
    pub active_until: Option<Instant>,
}

/// A model of the page's elements, used headless and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    elements: HashMap<String, Element>,
    /// Every id flashed, in order
    flashes: Vec<String>,
    /// Bumped on every effective write
    revision: u64,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut s = Self::new();
        for id in ids {
            s.add_element(id);
        }
        s
    }

    pub fn add_element(&mut self, id: impl Into<String>) {
        self.elements.entry(id.into()).or_default();
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.text.as_str())
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.elements.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.is_active_at(id, Instant::now())
    }

    pub fn is_active_at(&self, id: &str, now: Instant) -> bool {
        self.elements
            .get(id)
            .and_then(|e| e.active_until)
            .is_some_and(|until| now < until)
    }

    pub fn flashes(&self) -> &[String] {
        &self.flashes
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Ids of all elements, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.elements.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn with_element(&mut self, id: &str, f: impl FnOnce(&mut Element)) {
        if let Some(e) = self.elements.get_mut(id) {
            f(e);
            self.revision += 1;
        }
    }
}

impl Surface for MemorySurface {
    fn has_element(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn set_text(&mut self, id: &str, text: &str) {
        self.with_element(id, |e| e.text = text.to_string());
    }

    fn set_image_src(&mut self, id: &str, src: &str) {
        self.with_element(id, |e| e.image_src = Some(src.to_string()));
    }

    fn set_background(&mut self, id: &str, color: &str) {
        self.with_element(id, |e| e.background = Some(color.to_string()));
    }

    fn prepend_history_item(&mut self, list_id: &str, text: &str, cap: usize) {
        self.with_element(list_id, |e| {
            e.children.insert(0, text.to_string());
            e.children.truncate(cap);
        });
    }

    fn flash(&mut self, id: &str, ms: u64) {
        if !self.has_element(id) {
            return;
        }
        let until = Instant::now() + Duration::from_millis(ms);
        self.with_element(id, |e| e.active_until = Some(until));
        self.flashes.push(id.to_string());
    }
}

// ─── WebView scripts ────────────────────────────────────────────────────────

/// Turns surface calls into JavaScript statements for the WebView.
///
/// Element presence comes from the inventory the page sent with its ready
/// signal. The generated scripts still null-check, since the page can change
/// after it reported.
///
/// The channel should be bounded. When it is full, frames are dropped and
/// every other update waits for room.
pub struct ScriptSurface {
    elements: HashSet<String>,
    tx: Sender<String>,
    sent: u64,
    dropped_frames: u64,
    closed: bool,
}

impl ScriptSurface {
    pub fn new<I>(elements: I, tx: Sender<String>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            elements: elements.into_iter().collect(),
            tx,
            sent: 0,
            dropped_frames: 0,
            closed: false,
        }
    }

    /// `frame` scripts are skipped rather than queued when the page is behind.
    fn emit(&mut self, id: &str, body: &str, frame: bool) {
        if self.closed || !self.has_element(id) {
            return;
        }
        let script = format!(
            "(function(e){{if(!e)return;{}}})(document.getElementById({}));",
            body,
            js_str(id)
        );
        let delivered = if frame {
            match self.tx.try_send(script) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    self.dropped_frames += 1;
                    debug!("WebView behind, frame dropped ({} so far)", self.dropped_frames);
                    return;
                }
                Err(TrySendError::Disconnected(_)) => false,
            }
        } else {
            self.tx.send(script).is_ok()
        };
        if !delivered {
            debug!(
                "WebView script channel closed after {} scripts ({} frames dropped)",
                self.sent, self.dropped_frames
            );
            self.closed = true;
            return;
        }
        self.sent += 1;
    }
}

impl Surface for ScriptSurface {
    fn has_element(&self, id: &str) -> bool {
        self.elements.contains(id)
    }

    fn set_text(&mut self, id: &str, text: &str) {
        self.emit(id, &format!("e.innerText={};", js_str(text)), false);
    }

    fn set_image_src(&mut self, id: &str, src: &str) {
        self.emit(id, &format!("e.src={};", js_str(src)), true);
    }

    fn set_background(&mut self, id: &str, color: &str) {
        self.emit(id, &format!("e.style.background={};", js_str(color)), false);
    }

    fn prepend_history_item(&mut self, list_id: &str, text: &str, cap: usize) {
        self.emit(
            list_id,
            &format!(
                "var i=document.createElement('div');i.className={};i.innerText={};e.prepend(i);\
                 while(e.children.length>{})e.lastElementChild.remove();",
                js_str(HISTORY_ITEM_CLASS),
                js_str(text),
                cap
            ),
            false,
        );
    }

    fn flash(&mut self, id: &str, ms: u64) {
        let class = js_str(ACTIVE_CLASS);
        self.emit(
            id,
            &format!(
                "e.classList.add({c});setTimeout(function(){{e.classList.remove({c});}},{ms});",
                c = class,
                ms = ms
            ),
            false,
        );
    }
}

/// Quote a string as a JavaScript literal.
fn js_str(s: &str) -> String {
    // JSON strings are valid JS literals once the two line separators
    // JSON allows raw are escaped.
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
