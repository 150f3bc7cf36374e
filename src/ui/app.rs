//! Main application struct and eframe integration
//!
//! This module contains the main VoiceChatApp that implements eframe::App.

use crate::integration::OrchestratorHandle;
use crate::ui::components::{InputBar, MessageList, Sidebar, StatusBar};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How often to poll workers while something is in flight
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Main voice chat application
pub struct VoiceChatApp {
    state: AppState,
    theme: Theme,
    orchestrator: Option<OrchestratorHandle>,
    workers: Vec<JoinHandle<()>>,
}

impl VoiceChatApp {
    /// Create the application with its workers already running
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        state: AppState,
        theme: Theme,
        orchestrator: OrchestratorHandle,
        workers: Vec<JoinHandle<()>>,
    ) -> Self {
        theme.apply(&cc.egui_ctx);

        Self {
            state,
            theme,
            orchestrator: Some(orchestrator),
            workers,
        }
    }

    /// Create the application without workers, e.g. for a test harness
    pub fn with_state(state: AppState, theme: Theme) -> Self {
        Self {
            state,
            theme,
            orchestrator: None,
            workers: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Poll backend events and draw one frame
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.state.poll_events();

        // Without speech recognition the view is withheld entirely
        if !self.state.is_speech_supported() {
            return;
        }

        self.show_header(ctx);
        self.show_sidebar(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);

        self.schedule_repaint(ctx);
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(egui::Margin::symmetric(self.theme.spacing_lg, self.theme.spacing_sm)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let toggle = ui.button("☰").on_hover_text("Chat history");
                    toggle.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Toggle chat history")
                    });
                    if toggle.clicked() {
                        self.state.show_sidebar = !self.state.show_sidebar;
                    }

                    ui.label(
                        RichText::new("Voice Chat")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Delete All").on_hover_text("Delete the conversation").clicked() {
                            self.state.delete_conversation();
                        }

                        ui.checkbox(&mut self.state.speak_replies, "Read replies aloud");
                    });
                });
            });
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        if !self.state.show_sidebar {
            return;
        }

        SidePanel::left("chat_history")
            .resizable(true)
            .default_width(260.0)
            .min_width(200.0)
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                Sidebar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                let status = StatusBar::new(&self.state, &self.theme);
                if status.is_visible() {
                    status.show(ui);
                    ui.add_space(self.theme.spacing_sm);
                }

                InputBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                MessageList::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        if self.state.is_loading() || self.state.is_transcribing() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
        if let Some(remaining) = self.state.clipboard.remaining(Instant::now()) {
            ctx.request_repaint_after(remaining);
        }
    }

    fn shutdown(&mut self) {
        self.state.shutdown();

        if let Some(orchestrator) = self.orchestrator.take() {
            orchestrator.shutdown();
        }

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("Worker thread panicked during shutdown");
            }
        }
    }
}

impl eframe::App for VoiceChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Voice chat shutting down");
        self.shutdown();
    }
}
