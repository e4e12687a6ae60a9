use crate::history::NoteHistoryTracker;
use crate::layout::UiLayout;
use crate::note::{lookup_key_element, NoteEvent};
use crate::surface::Surface;
use crate::types::{FramePayload, HostEvent};
use log::trace;

/// One method per message the host can send. None of them reports failure:
/// a missing element just means that part of the display doesn't update.
pub trait UiHandler {
    fn render_frame(&mut self, frame: &FramePayload);
    fn render_status(&mut self, message: &str, is_error: bool);
    fn record_note(&mut self, raw: &str) -> NoteEvent;

    /// Route a host event to the matching method. Returns the recorded
    /// note for `HostEvent::Note`.
    fn dispatch(&mut self, event: &HostEvent) -> Option<NoteEvent> {
        match event {
            HostEvent::Frame(frame) => {
                self.render_frame(frame);
                None
            }
            HostEvent::Status(s) => {
                self.render_status(&s.message, s.is_error);
                None
            }
            HostEvent::Note(raw) => Some(self.record_note(raw)),
        }
    }
}

/// The note display: owns the history tracker and writes through a surface.
pub struct NoteUi<S: Surface> {
    tracker: NoteHistoryTracker,
    layout: UiLayout,
    surface: S,
}

impl<S: Surface> NoteUi<S> {
    pub fn new(surface: S, layout: UiLayout) -> Self {
        Self {
            tracker: NoteHistoryTracker::new(),
            layout,
            surface,
        }
    }

    pub fn tracker(&self) -> &NoteHistoryTracker {
        &self.tracker
    }

    pub fn layout(&self) -> &UiLayout {
        &self.layout
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

}

impl<S: Surface> UiHandler for NoteUi<S> {
    fn render_frame(&mut self, frame: &FramePayload) {
        let id = &self.layout.video_feed;
        if self.surface.has_element(id) {
            self.surface.set_image_src(id, &frame.data_url());
        }
        self.surface.commit();
    }

    fn render_status(&mut self, message: &str, is_error: bool) {
        let l = &self.layout;
        if self.surface.has_element(&l.status_text) {
            self.surface.set_text(&l.status_text, message);
        }
        if self.surface.has_element(&l.status_dot) {
            self.surface.set_background(&l.status_dot, l.status_color(is_error));
        }
        self.surface.commit();
    }

    fn record_note(&mut self, raw: &str) -> NoteEvent {
        let event = self.tracker.record_note(raw);
        trace!("Recorded {}", event);

        let l = &self.layout;
        let s = &mut self.surface;
        if s.has_element(&l.note_display) {
            s.set_text(&l.note_display, &event.pitch_class);
        }
        if s.has_element(&l.octave_label) {
            s.set_text(&l.octave_label, &format!("{}{}", l.octave_prefix, event.octave));
        }
        if s.has_element(&l.history_list) {
            s.prepend_history_item(&l.history_list, raw, l.history_rows());
        }
        if let Some(key) = lookup_key_element(raw, |id| s.has_element(id)) {
            s.flash(&key, l.highlight_ms);
        }
        s.commit();
        event
    }
}
