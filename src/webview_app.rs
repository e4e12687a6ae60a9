use crate::types::UiSignal;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use tao::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use wry::WebViewBuilder;

/// The page shown in the window. Builds its keyboard strip, then posts
/// `{"kind":"ui_ready","elements":[...]}` over IPC.
pub const INDEX_HTML: &str = include_str!("../web/index.html");

/// How often queued scripts are pushed into the page.
const SCRIPT_POLL: Duration = Duration::from_millis(16);

/// Open a native WebView window (WKWebView on macOS) showing `html`.
///
/// IPC messages from the page are parsed as [`UiSignal`]s and forwarded on
/// `ready_tx`. Scripts arriving on `script_rx` are evaluated in the page.
/// Runs the tao event loop on the current thread and, once it starts, never
/// returns (exits the process when the window is closed).
pub fn run(html: &str, ready_tx: Sender<UiSignal>, script_rx: Receiver<String>) -> Result<(), String> {
    let event_loop = EventLoop::new();

    let window = WindowBuilder::new()
        .with_title("CV Paper Piano")
        .with_inner_size(tao::dpi::LogicalSize::new(1100_u32, 700_u32))
        .with_min_inner_size(tao::dpi::LogicalSize::new(800_u32, 500_u32))
        .build(&event_loop)
        .map_err(|e| format!("create window: {}", e))?;

    let webview = WebViewBuilder::new()
        .with_html(html)
        .with_ipc_handler(move |req: wry::http::Request<String>| {
            match UiSignal::parse(req.body()) {
                Ok(signal) => match ready_tx.try_send(signal) {
                    Ok(()) => info!("UI ready signal sent to host"),
                    Err(TrySendError::Full(_)) => debug!("Repeated ready signal ignored"),
                    Err(TrySendError::Disconnected(_)) => debug!("Host no longer listening"),
                },
                Err(e) => warn!("{}", e),
            }
        })
        .build(&window)
        .map_err(|e| format!("create WebView: {}", e))?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + SCRIPT_POLL);

        while let Ok(script) = script_rx.try_recv() {
            if let Err(e) = webview.evaluate_script(&script) {
                warn!("Script failed: {}", e);
            }
        }

        if let Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } = event
        {
            info!("Window closed");
            *control_flow = ControlFlow::Exit;
        }
    })
}
