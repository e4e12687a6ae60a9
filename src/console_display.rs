use crate::layout::UiLayout;
use crate::surface::{MemorySurface, Surface};
use std::io::{self, Write};
use std::time::{Duration, Instant};

const WIDTH: usize = 58;

/// Headless stand-in for the page: keeps the element state in a
/// [`MemorySurface`] and redraws an ASCII panel of it to stdout.
///
/// Redraws happen on [`Surface::commit`], so a note's display, octave and
/// history row always appear together. Only frame-only changes are held
/// back by the refresh rate.
pub struct ConsoleDisplay {
    page: MemorySurface,
    layout: UiLayout,
    min_interval: Duration,
    last_draw: Option<Instant>,
    /// Change count at the last redraw
    drawn_revision: u64,
    /// Text, colour or history changed since the last redraw
    content_changed: bool,
}

impl ConsoleDisplay {
    /// A page with every element in `layout`. `update_hz` of 0 redraws on
    /// every change.
    pub fn new(layout: UiLayout, update_hz: u32) -> Self {
        let page = MemorySurface::with_elements(layout.element_ids());
        let min_interval = if update_hz == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / update_hz as f64)
        };
        Self {
            page,
            layout,
            min_interval,
            last_draw: None,
            drawn_revision: 0,
            content_changed: false,
        }
    }

    /// Ids this display can show, as the page would report them when ready.
    pub fn element_ids(&self) -> Vec<String> {
        self.page.ids().into_iter().map(String::from).collect()
    }

    /// Render the current state as a boxed panel.
    pub fn render(&self) -> String {
        let l = &self.layout;
        let p = &self.page;
        let mut lines = Vec::new();
        lines.push(format!("╔{}╗", "═".repeat(WIDTH)));
        lines.push(row("PAPER PIANO  Live Notes"));
        lines.push(format!("╠{}╣", "═".repeat(WIDTH)));

        let dot = match p.element(&l.status_dot).and_then(|e| e.background.as_deref()) {
            Some(c) if c == l.error_color => "●ERR",
            Some(_) => "●OK ",
            None => "○   ",
        };
        lines.push(row(&format!("{} {}", dot, p.text(&l.status_text).unwrap_or(""))));

        let frame = match p.element(&l.video_feed).and_then(|e| e.image_src.as_deref()) {
            Some(src) => format!("Frame: {} bytes", src.len()),
            None => "Frame: (none yet)".to_string(),
        };
        lines.push(row(&frame));
        lines.push(row(""));

        let note = p.text(&l.note_display).unwrap_or("");
        let octave = p.text(&l.octave_label).unwrap_or("");
        lines.push(row(&format!(
            "Note: {:<6} {}",
            if note.is_empty() { "--" } else { note },
            octave
        )));
        lines.push(row(""));
        lines.push(row("History:"));
        let history = p.children(&l.history_list);
        if history.is_empty() {
            lines.push(row("  (empty)"));
        } else {
            lines.push(row(&format!("  {}", history.join("  "))));
        }
        lines.push(format!("╚{}╝", "═".repeat(WIDTH)));
        lines.join("\n")
    }

    fn maybe_draw(&mut self) {
        if self.page.revision() == self.drawn_revision {
            return;
        }
        let now = Instant::now();
        if !self.content_changed {
            if let Some(last) = self.last_draw {
                if now.duration_since(last) < self.min_interval {
                    return;
                }
            }
        }
        self.last_draw = Some(now);
        self.drawn_revision = self.page.revision();
        self.content_changed = false;

        let mut stdout = io::stdout();
        // Clear screen and move cursor home
        let _ = writeln!(stdout, "\x1b[2J\x1b[H{}", self.render());
        let _ = stdout.flush();
    }
}

impl Surface for ConsoleDisplay {
    fn has_element(&self, id: &str) -> bool {
        self.page.has_element(id)
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if self.page.has_element(id) && self.page.text(id) != Some(text) {
            self.content_changed = true;
        }
        self.page.set_text(id, text);
    }

    fn set_image_src(&mut self, id: &str, src: &str) {
        self.page.set_image_src(id, src);
    }

    fn set_background(&mut self, id: &str, color: &str) {
        let current = self.page.element(id).and_then(|e| e.background.as_deref());
        if self.page.has_element(id) && current != Some(color) {
            self.content_changed = true;
        }
        self.page.set_background(id, color);
    }

    fn prepend_history_item(&mut self, list_id: &str, text: &str, cap: usize) {
        if self.page.has_element(list_id) {
            self.content_changed = true;
        }
        self.page.prepend_history_item(list_id, text, cap);
    }

    fn flash(&mut self, id: &str, ms: u64) {
        self.page.flash(id, ms);
    }

    fn commit(&mut self) {
        self.maybe_draw();
    }
}

/// Pad (or cut) to the panel width, counting chars rather than bytes.
fn row(content: &str) -> String {
    let mut s: String = format!("  {}", content).chars().take(WIDTH).collect();
    while s.chars().count() < WIDTH {
        s.push(' ');
    }
    format!("║{}║", s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{NoteUi, UiHandler};

    #[test]
    fn test_render_after_notes() {
        let mut ui = NoteUi::new(ConsoleDisplay::new(UiLayout::default(), 0), UiLayout::default());
        ui.render_status("Sheet:0 Keys:15", false);
        ui.record_note("A#0");
        ui.record_note("B0");
        let out = ui.surface().render();
        assert!(out.contains("●OK  Sheet:0 Keys:15"));
        assert!(out.contains("Note: B      Octave 0"));
        assert!(out.contains("B0  A#0"));
    }

    #[test]
    fn test_each_note_is_drawn_whole() {
        // 1 Hz: only the refresh limit could hold a redraw back
        let mut ui = NoteUi::new(ConsoleDisplay::new(UiLayout::default(), 1), UiLayout::default());
        for tok in ["C#4", "D4", "E4"] {
            ui.record_note(tok);
            let d = ui.surface();
            assert_eq!(d.drawn_revision, d.page.revision(), "after {}", tok);
        }
        ui.render_status("Sheet:4 Keys:13", false);
        assert_eq!(ui.surface().drawn_revision, ui.surface().page.revision());
    }

    #[test]
    fn test_frame_only_updates_are_rate_limited() {
        let mut ui = NoteUi::new(ConsoleDisplay::new(UiLayout::default(), 1), UiLayout::default());
        ui.record_note("A0");
        ui.render_frame(&crate::types::FramePayload::jpeg("AAAA"));
        let d = ui.surface();
        assert!(d.drawn_revision < d.page.revision());

        // A repeated status adds nothing readable either
        ui.render_status("same", false);
        let drawn = ui.surface().drawn_revision;
        ui.render_status("same", false);
        assert_eq!(ui.surface().drawn_revision, drawn);
    }

    #[test]
    fn test_rows_have_fixed_width() {
        let d = ConsoleDisplay::new(UiLayout::default(), 20);
        for line in d.render().lines() {
            assert_eq!(line.chars().count(), WIDTH + 2, "line {:?}", line);
        }
        assert_eq!(row(&"x".repeat(200)).chars().count(), WIDTH + 2);
    }

    #[test]
    fn test_reports_layout_elements() {
        let d = ConsoleDisplay::new(UiLayout::default(), 20);
        let ids = d.element_ids();
        assert_eq!(ids.len(), 6);
        assert!(ids.contains(&"history-list".to_string()));
    }
}
