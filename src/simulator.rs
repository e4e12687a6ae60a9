use crate::frame::{render_frame, FrameScene};
use crate::keyboard::{key_at_percent, normalize_marker, SheetMap};
use crate::types::HostEvent;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

/// Hand landmark ids of the tracked fingertips (index, middle, ring, pinky).
pub const FINGERTIPS: [u8; 4] = [8, 12, 16, 20];
pub const INDEX_TIP: u8 = 8;
pub const MIDDLE_TIP: u8 = 12;

/// Stands in for the camera/hand-tracking host: plays a scripted sequence
/// of sheet and fingertip movements and emits the same frame, status and
/// note events the real host would.
pub struct Simulator {
    tx: Sender<HostEvent>,
    sheets: SheetMap,
    tick: Duration,
    /// Send a frame + status every N ticks
    frame_every: u32,
}

/// One step of a scripted session.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// A sheet's marker comes into view
    ShowSheet { marker: u32 },
    /// Markers lost
    HideSheet,
    /// Fingertip at a fraction of the sheet width
    Press { finger: u8, u: f64 },
    /// Fingertip over the named key of the visible sheet
    PressKey { finger: u8, key: &'static str },
    /// Fingertip lifted
    Release { finger: u8 },
    Hold { ms: u64 },
}

#[derive(Debug, Clone, Default)]
struct SimState {
    sheet: Option<u32>,
    /// Fingertips in view, by landmark id
    fingers: BTreeMap<u8, f64>,
    /// Note under each fingertip on the previous tick
    last_notes: BTreeMap<u8, String>,
    ticks: u64,
}

impl Simulator {
    pub fn new(tx: Sender<HostEvent>, tick: Duration, frame_every: u32) -> Self {
        Self {
            tx,
            sheets: SheetMap::new(),
            tick,
            frame_every: frame_every.max(1),
        }
    }

    /// Run a named demo. Unknown names fall back to "scale".
    /// Blocks the calling thread until the sequence finishes or the
    /// receiver goes away.
    pub fn run(&self, demo: &str) {
        let gestures = match demo {
            "melody" => melody_sequence(),
            "scale" => scale_sequence(),
            other => {
                warn!("Unknown demo {:?}, playing \"scale\"", other);
                scale_sequence()
            }
        };
        info!("Simulator starting {:?} ({} gestures)", demo, gestures.len());
        self.run_sequence(&gestures);
        info!("Simulator sequence complete");
    }

    pub fn run_sequence(&self, gestures: &[Gesture]) {
        let mut state = SimState::default();
        for g in gestures {
            if !self.execute(g, &mut state) {
                info!("Host event receiver closed, stopping simulator");
                return;
            }
        }
    }

    /// Returns false once the receiver is gone.
    fn execute(&self, gesture: &Gesture, state: &mut SimState) -> bool {
        match gesture {
            Gesture::ShowSheet { marker } => {
                info!("  sheet {} in view", marker);
                state.sheet = Some(*marker);
                self.emit_tick(state)
            }
            Gesture::HideSheet => {
                info!("  sheet out of view");
                state.sheet = None;
                self.emit_tick(state)
            }
            Gesture::Press { finger, u } => {
                if !FINGERTIPS.contains(finger) {
                    warn!("  landmark {} is not a tracked fingertip", finger);
                    return true;
                }
                state.fingers.insert(*finger, *u);
                self.emit_tick(state)
            }
            Gesture::PressKey { finger, key } => {
                let keys = self.visible_keys(state);
                match keys.iter().position(|k| k == key) {
                    Some(i) => {
                        let u = (i as f64 + 0.5) / keys.len() as f64;
                        self.execute(&Gesture::Press { finger: *finger, u }, state)
                    }
                    None => {
                        warn!("  key {} is not on the visible sheet", key);
                        true
                    }
                }
            }
            Gesture::Release { finger } => {
                state.fingers.remove(finger);
                state.last_notes.remove(finger);
                self.emit_tick(state)
            }
            Gesture::Hold { ms } => {
                let ticks = if self.tick.is_zero() {
                    1
                } else {
                    (*ms as u128 / self.tick.as_millis().max(1)).max(1) as u64
                };
                for _ in 0..ticks {
                    if !self.emit_tick(state) {
                        return false;
                    }
                }
                true
            }
        }
    }

    fn visible_keys(&self, state: &SimState) -> &[String] {
        state
            .sheet
            .map(|m| self.sheets.sheet_keys(m))
            .unwrap_or(&[])
    }

    /// One camera frame's worth of work.
    fn emit_tick(&self, state: &mut SimState) -> bool {
        state.ticks += 1;
        let keys = self.visible_keys(state);
        let locked = !keys.is_empty();

        // A held finger only sounds once; it must move to another key or lift.
        // Each fingertip is tracked on its own.
        let mut pressed = Vec::new();
        for (&finger, &u) in &state.fingers {
            match key_at_percent(keys, u) {
                Some((i, key)) => {
                    pressed.push(i);
                    if state.last_notes.get(&finger).map(String::as_str) != Some(key) {
                        if self.tx.send(HostEvent::note(key)).is_err() {
                            return false;
                        }
                        state.last_notes.insert(finger, key.to_string());
                    }
                }
                None => {
                    state.last_notes.remove(&finger);
                }
            }
        }

        if state.ticks % self.frame_every as u64 == 0 {
            let status = match state.sheet {
                Some(m) => format!("Sheet:{} Keys:{}", normalize_marker(m), keys.len()),
                None => "Sheet:None Keys:0".to_string(),
            };
            let frame = render_frame(&FrameScene {
                keys,
                pressed,
                fingers: state.fingers.values().copied().collect(),
                caption: &status,
            });
            if self.tx.send(HostEvent::Frame(frame)).is_err()
                || self.tx.send(HostEvent::status(status, !locked)).is_err()
            {
                return false;
            }
        }

        if !self.tick.is_zero() {
            thread::sleep(self.tick);
        }
        true
    }
}

/// Walk up the D#3..D#4 sheet, with a re-press and a lost-marker moment.
pub fn scale_sequence() -> Vec<Gesture> {
    let mut g = vec![Gesture::ShowSheet { marker: 4 }, Gesture::Hold { ms: 300 }];
    for key in ["E3", "F3", "G3", "A3", "B3", "C4", "D4"] {
        g.push(Gesture::PressKey { finger: INDEX_TIP, key });
        g.push(Gesture::Hold { ms: 250 });
        g.push(Gesture::Release { finger: INDEX_TIP });
        g.push(Gesture::Hold { ms: 100 });
    }
    // Same key without lifting: one note only
    g.push(Gesture::PressKey { finger: INDEX_TIP, key: "C4" });
    g.push(Gesture::Hold { ms: 200 });
    g.push(Gesture::PressKey { finger: INDEX_TIP, key: "C4" });
    // Second finger joins for a third; the held C4 stays silent
    g.push(Gesture::PressKey { finger: MIDDLE_TIP, key: "E3" });
    g.push(Gesture::Hold { ms: 300 });
    g.push(Gesture::Release { finger: MIDDLE_TIP });
    g.push(Gesture::Release { finger: INDEX_TIP });
    g.push(Gesture::HideSheet);
    g.push(Gesture::Hold { ms: 500 });
    g
}

/// Opening phrase of the Ode to Joy on the F#4..A#5 sheet.
pub fn melody_sequence() -> Vec<Gesture> {
    let mut g = vec![Gesture::ShowSheet { marker: 7 }, Gesture::Hold { ms: 300 }];
    let phrase = [
        "B4", "B4", "C5", "D5", "D5", "C5", "B4", "A4", "G4", "G4", "A4", "B4", "B4", "A4", "A4",
    ];
    for key in phrase {
        g.push(Gesture::PressKey { finger: INDEX_TIP, key });
        g.push(Gesture::Hold { ms: 280 });
        g.push(Gesture::Release { finger: INDEX_TIP });
        g.push(Gesture::Hold { ms: 60 });
    }
    g.push(Gesture::Hold { ms: 500 });
    g
}
