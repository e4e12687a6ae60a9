use crate::types::{HostEvent, NoteRecord, SessionClock, UiSignal};
use crate::ui::UiHandler;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info, trace, warn};
use std::time::Duration;

/// How the wait for the page's ready signal ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadyOutcome {
    /// Page reported in, with the ids of its elements
    Ready(Vec<String>),
    /// Nothing arrived in time; carry on assuming the default page
    TimedOut,
    /// The UI side went away before it was ready
    Closed,
}

/// Block until the UI posts its ready signal.
pub fn wait_for_ui(ready_rx: &Receiver<UiSignal>, timeout: Duration) -> ReadyOutcome {
    match ready_rx.recv_timeout(timeout) {
        Ok(UiSignal::Ready { elements }) => {
            info!("UI ready ({} elements)", elements.len());
            ReadyOutcome::Ready(elements)
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!("No UI ready signal after {:?}, starting anyway", timeout);
            ReadyOutcome::TimedOut
        }
        Err(RecvTimeoutError::Disconnected) => ReadyOutcome::Closed,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub frames: u64,
    pub statuses: u64,
    pub notes: u64,
}

/// Drains host events into the UI and hands every recorded note to the
/// downstream consumers (session logger, tone player).
///
/// The host is only told to start once the UI exists, so nothing is ever
/// rendered into a page that isn't there yet.
pub struct Coordinator {
    event_rx: Receiver<HostEvent>,
    note_txs: Vec<Sender<NoteRecord>>,
    clock: SessionClock,
    stats: CoordinatorStats,
}

impl Coordinator {
    pub fn new(
        event_rx: Receiver<HostEvent>,
        note_txs: Vec<Sender<NoteRecord>>,
        clock: SessionClock,
    ) -> Self {
        Self {
            event_rx,
            note_txs,
            clock,
            stats: CoordinatorStats::default(),
        }
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    /// Wait for the UI, build the handler from what it reported, release
    /// the host, then process events until the host hangs up.
    ///
    /// `build_ui` gets `None` when the wait timed out. Returns `None` without
    /// starting the host if the UI closed first.
    pub fn run_when_ready<H, F>(
        &mut self,
        ready_rx: &Receiver<UiSignal>,
        timeout: Duration,
        host_start: &Sender<()>,
        build_ui: F,
    ) -> Option<H>
    where
        H: UiHandler,
        F: FnOnce(Option<Vec<String>>) -> H,
    {
        let mut ui = match wait_for_ui(ready_rx, timeout) {
            ReadyOutcome::Ready(elements) => build_ui(Some(elements)),
            ReadyOutcome::TimedOut => build_ui(None),
            ReadyOutcome::Closed => {
                info!("UI closed before it was ready; not starting host");
                return None;
            }
        };
        if host_start.send(()).is_err() {
            warn!("Host source already gone");
        }
        self.run(&mut ui);
        Some(ui)
    }

    /// Process events until the host channel closes. Blocks the calling thread.
    pub fn run<H: UiHandler>(&mut self, ui: &mut H) -> CoordinatorStats {
        info!("Coordinator running ({} note consumers)", self.note_txs.len());

        for event in self.event_rx.iter() {
            trace!("{}", event);
            match &event {
                HostEvent::Frame(_) => self.stats.frames += 1,
                HostEvent::Status(_) => self.stats.statuses += 1,
                HostEvent::Note(_) => self.stats.notes += 1,
            }
            if let Some(note) = ui.dispatch(&event) {
                debug!("Note {}", note);
                let record = NoteRecord {
                    t_us: self.clock.now_us(),
                    event: note,
                };
                for tx in &self.note_txs {
                    let _ = tx.send(record.clone());
                }
            }
        }

        info!(
            "Coordinator shutting down: {} notes, {} frames, {} status updates",
            self.stats.notes, self.stats.frames, self.stats.statuses
        );
        self.stats
    }
}
