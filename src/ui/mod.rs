//! GUI implementation with egui/eframe
//!
//! This module provides the desktop chat window using the eframe framework.

mod app;
pub mod components;
mod state;
mod theme;

pub use app::VoiceChatApp;
pub use state::{AppState, PendingRequest};
pub use theme::Theme;

use crate::config::AppConfig;
use crate::integration::Orchestrator;
use crate::speech::create_transcriber;

/// Start the workers and run the chat window until it is closed
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let (orchestrator, handle) = Orchestrator::from_config(&config)?;
    let workers = orchestrator.start()?;

    let transcriber = create_transcriber(&config.speech);
    let state = handle.connect(AppState::from_config(&config, transcriber));
    let theme = Theme::from_config(&config.ui);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Voice Chat"),
        ..Default::default()
    };

    eframe::run_native(
        "Voice Chat",
        options,
        Box::new(move |cc| Ok(Box::new(VoiceChatApp::new(cc, state, theme, handle, workers)))),
    )
    .map_err(|e| anyhow::anyhow!("Window error: {}", e))
}
