use paper_piano::console_display::ConsoleDisplay;
use paper_piano::coordinator::Coordinator;
use paper_piano::jsonl_reader::{self, NoteSessionReader};
use paper_piano::layout::UiLayout;
use paper_piano::session_log::SessionLogger;
use paper_piano::simulator::Simulator;
use paper_piano::surface::MemorySurface;
use paper_piano::types::*;
use paper_piano::ui::{NoteUi, UiHandler};
#[cfg(feature = "gui")]
use paper_piano::{
    surface::{ScriptSurface, SCRIPT_QUEUE},
    webview_app,
};
#[cfg(feature = "audio")]
use paper_piano::tone_player::ToneNotePlayer;

use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "paper-piano")]
#[command(about = "Note display for the camera-tracked paper piano")]
struct Cli {
    /// Disable the native GUI window
    #[arg(long)]
    no_gui: bool,

    /// Show the UI as a terminal panel (headless)
    #[arg(long)]
    console: bool,

    /// Console display refresh rate (Hz, 0 = every change)
    #[arg(long, default_value_t = 20)]
    display_hz: u32,

    /// Simulator demo sequence: "scale" (default) or "melody"
    #[arg(long, default_value = "scale")]
    demo: String,

    /// Replay a recorded notes.jsonl instead of running the simulator
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Replay speed multiplier (0 = as fast as possible)
    #[arg(long, default_value_t = 1.0)]
    replay_speed: f64,

    /// Log every note of the session
    #[arg(long)]
    log_data: bool,

    /// Output directory for logged sessions
    #[arg(long, default_value = "./sessions")]
    output_dir: PathBuf,

    /// JSON file overriding element ids and styling
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Send a camera frame every N simulator ticks
    #[arg(long, default_value_t = 2)]
    frame_every: u32,

    /// Simulator tick length (ms)
    #[arg(long, default_value_t = 33)]
    tick_ms: u64,

    /// How long to wait for the UI ready signal before starting anyway (ms)
    #[arg(long, default_value_t = 10_000)]
    ready_timeout_ms: u64,

    /// Play a tone for each note
    #[cfg(feature = "audio")]
    #[arg(long)]
    audio: bool,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();
    let layout = cli
        .layout
        .as_deref()
        .and_then(UiLayout::load)
        .unwrap_or_default();
    let clock = SessionClock::new();
    let gui_enabled = cfg!(feature = "gui") && !cli.no_gui;

    info!("═══════════════════════════════════════════════");
    info!("  PAPER PIANO v{}", env!("CARGO_PKG_VERSION"));
    match &cli.replay {
        Some(path) => info!("  Source: replay {:?}", path),
        None => info!("  Source: simulator ({})", cli.demo),
    }
    if gui_enabled {
        info!("  UI: WebView (wry)");
    } else if cli.console {
        info!("  UI: Console");
    } else {
        info!("  UI: headless (log only)");
    }
    info!("═══════════════════════════════════════════════");

    // Channel: host → coordinator
    let (event_tx, event_rx) = bounded::<HostEvent>(1024);
    // UI → coordinator, once
    let (ready_tx, ready_rx) = bounded::<UiSignal>(1);
    // Coordinator → host: UI exists, start producing
    let (start_tx, start_rx) = bounded::<()>(1);

    // Channels: coordinator → note consumers
    let mut note_txs: Vec<Sender<NoteRecord>> = Vec::new();
    let mut handles = Vec::new();

    // ─── Session log ────────────────────────────────────────────────
    if cli.log_data {
        let (tx, rx) = bounded::<NoteRecord>(1024);
        match SessionLogger::new(rx, &cli.output_dir) {
            Ok(logger) => {
                note_txs.push(tx);
                handles.push(thread::Builder::new().name("logger".into()).spawn(move || {
                    logger.run();
                }).unwrap());
            }
            Err(e) => error!("Session logging disabled: {}", e),
        }
    }

    // ─── Tone player (stream lives on this thread) ──────────────────
    #[cfg(feature = "audio")]
    let _player = if cli.audio {
        let (tx, rx) = bounded::<NoteRecord>(256);
        match ToneNotePlayer::start(rx) {
            Ok(p) => {
                note_txs.push(tx);
                Some(p)
            }
            Err(e) => {
                error!("Audio disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    // ─── Host source: waits until the UI is up ──────────────────────
    let replay = cli.replay.clone();
    let replay_speed = cli.replay_speed;
    let demo = cli.demo.clone();
    let tick = Duration::from_millis(cli.tick_ms);
    let frame_every = cli.frame_every;
    handles.push(thread::Builder::new().name("host".into()).spawn(move || {
        if start_rx.recv().is_err() {
            return;
        }
        match replay {
            Some(path) => match open_session(&path) {
                Ok(reader) => {
                    jsonl_reader::replay(reader, &event_tx, replay_speed);
                }
                Err(e) => error!("Cannot replay {:?}: {}", path, e),
            },
            None => Simulator::new(event_tx, tick, frame_every).run(&demo),
        }
    }).unwrap());

    // ─── Coordinator ────────────────────────────────────────────────
    let timeout = Duration::from_millis(cli.ready_timeout_ms);
    let coord = Coordinator::new(event_rx, note_txs, clock);

    if gui_enabled {
        #[cfg(feature = "gui")]
        {
            let (script_tx, script_rx) = bounded::<String>(SCRIPT_QUEUE);
            let l = layout.clone();
            handles.push(spawn_coordinator(coord, ready_rx, timeout, start_tx, move |elements| {
                let elements = elements.unwrap_or_else(|| default_elements(&l));
                NoteUi::new(ScriptSurface::new(elements, script_tx), l)
            }));

            // WKWebView (via wry/tao) MUST run on the main thread on macOS.
            // webview_app::run() never returns once the window is up.
            info!("Launching WebView");
            if let Err(e) = webview_app::run(webview_app::INDEX_HTML, ready_tx, script_rx) {
                error!("WebView failed: {}", e);
            }
        }
    } else if cli.console {
        info!("Console display running. Press Ctrl+C to stop.");
        let display = ConsoleDisplay::new(layout.clone(), cli.display_hz);
        let _ = ready_tx.send(UiSignal::Ready { elements: display.element_ids() });
        handles.push(spawn_coordinator(coord, ready_rx, timeout, start_tx, move |_| {
            NoteUi::new(display, layout)
        }));
    } else {
        info!("Running headless. Press Ctrl+C to stop.");
        let page = MemorySurface::with_elements(layout.element_ids());
        let _ = ready_tx.send(UiSignal::Ready { elements: default_elements(&layout) });
        handles.push(spawn_coordinator(coord, ready_rx, timeout, start_tx, move |_| {
            NoteUi::new(page, layout)
        }));
    }

    for h in handles {
        let _ = h.join();
    }
}

fn spawn_coordinator<H, F>(
    mut coord: Coordinator,
    ready_rx: Receiver<UiSignal>,
    timeout: Duration,
    start_tx: Sender<()>,
    build_ui: F,
) -> thread::JoinHandle<()>
where
    H: UiHandler,
    F: FnOnce(Option<Vec<String>>) -> H + Send + 'static,
{
    thread::Builder::new().name("coordinator".into()).spawn(move || {
        coord.run_when_ready(&ready_rx, timeout, &start_tx, build_ui);
    }).unwrap()
}

fn default_elements(layout: &UiLayout) -> Vec<String> {
    layout.element_ids().iter().map(|s| s.to_string()).collect()
}

fn open_session(path: &Path) -> Result<NoteSessionReader<BufReader<File>>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    NoteSessionReader::open(BufReader::new(file))
}
