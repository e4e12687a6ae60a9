//! Element ids and styling the UI writes to.
//!
//! Defaults match `web/index.html`. A JSON file with any subset of the fields
//! can override them (`--layout my_layout.json`).

use crate::history::HISTORY_CAP;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiLayout {
    pub note_display: String,
    pub octave_label: String,
    pub history_list: String,
    pub video_feed: String,
    pub status_dot: String,
    pub status_text: String,
    /// Prepended to the octave digit, e.g. "Octave 4"
    pub octave_prefix: String,
    pub ok_color: String,
    pub error_color: String,
    /// How long a matched key keeps its highlight
    pub highlight_ms: u64,
    /// Children kept in the rendered history list, 1..=10
    pub history_items: usize,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            note_display: "note-display".into(),
            octave_label: "full-note-name".into(),
            history_list: "history-list".into(),
            video_feed: "video-feed".into(),
            status_dot: "status-dot".into(),
            status_text: "status-text".into(),
            octave_prefix: "Octave ".into(),
            ok_color: "#00d26a".into(),
            error_color: "red".into(),
            highlight_ms: 200,
            history_items: HISTORY_CAP,
        }
    }
}

impl UiLayout {
    /// Load from a JSON file. Returns None if file is absent or malformed.
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(l) => {
                info!("Loaded UI layout from {:?}", path);
                Some(l)
            }
            Err(e) => {
                warn!("Failed to parse layout file {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)?;
        info!("UI layout saved to {:?}", path);
        Ok(())
    }

    /// The fixed element ids, in page order.
    pub fn element_ids(&self) -> [&str; 6] {
        [
            self.video_feed.as_str(),
            self.status_dot.as_str(),
            self.status_text.as_str(),
            self.note_display.as_str(),
            self.octave_label.as_str(),
            self.history_list.as_str(),
        ]
    }

    /// Rendered history length. Never more than the tracker keeps.
    pub fn history_rows(&self) -> usize {
        self.history_items.clamp(1, HISTORY_CAP)
    }

    pub fn status_color(&self, is_error: bool) -> &str {
        if is_error {
            &self.error_color
        } else {
            &self.ok_color
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let l: UiLayout =
            serde_json::from_str(r#"{"highlight_ms": 350, "error_color": "orange"}"#).unwrap();
        assert_eq!(l.highlight_ms, 350);
        assert_eq!(l.error_color, "orange");
        assert_eq!(l.note_display, "note-display");
        assert_eq!(l.history_items, 10);
    }

    #[test]
    fn test_load_missing_or_malformed() {
        let dir = std::env::temp_dir().join(format!("pp_layout_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(UiLayout::load(&dir.join("nope.json")).is_none());

        let bad = dir.join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(UiLayout::load(&bad).is_none());

        let good = dir.join("good.json");
        let mut l = UiLayout::default();
        l.ok_color = "lime".into();
        l.save(&good).unwrap();
        assert_eq!(UiLayout::load(&good), Some(l));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_history_rows_clamped() {
        let big: UiLayout = serde_json::from_str(r#"{"history_items": 25}"#).unwrap();
        assert_eq!(big.history_rows(), HISTORY_CAP);
        let zero: UiLayout = serde_json::from_str(r#"{"history_items": 0}"#).unwrap();
        assert_eq!(zero.history_rows(), 1);
        let few: UiLayout = serde_json::from_str(r#"{"history_items": 4}"#).unwrap();
        assert_eq!(few.history_rows(), 4);
        assert_eq!(UiLayout::default().history_rows(), 10);
    }

    #[test]
    fn test_status_color() {
        let l = UiLayout::default();
        assert_eq!(l.status_color(true), "red");
        assert_eq!(l.status_color(false), "#00d26a");
    }
}
