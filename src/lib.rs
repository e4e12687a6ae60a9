pub mod console_display;
pub mod coordinator;
pub mod frame;
pub mod history;
pub mod jsonl_reader;
pub mod keyboard;
pub mod layout;
pub mod note;
pub mod session_log;
pub mod simulator;
pub mod surface;
pub mod types;
pub mod ui;

#[cfg(feature = "audio")]
pub mod tone_player;

#[cfg(feature = "gui")]
pub mod webview_app;
