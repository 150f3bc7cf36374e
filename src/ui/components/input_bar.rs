//! Input bar component
//!
//! Text input mirrored from speech recognition, plus the submit, clear,
//! listening and copy controls.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};
use std::time::Instant;

pub const INPUT_HINT: &str = "Speak or Type your message";

/// Input bar component for text and voice input
pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    self.show_text_input(ui);
                    ui.add_space(self.theme.spacing_sm);
                    ui.horizontal_wrapped(|ui| self.show_controls(ui));
                });
            });
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let mut text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .hint_text(INPUT_HINT)
            .desired_width(f32::INFINITY)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0))
            .id(egui::Id::new("message_input"));

        if self.state.voice_transcribed {
            text_edit = text_edit.background_color(self.theme.voice_highlight);
        }

        let response = ui.add(text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Message input")
        });

        if response.changed() {
            self.state.on_manual_edit();
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.submit();
            ui.ctx().request_repaint();
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let can_submit = self.state.can_submit();
        let submit = egui::Button::new(RichText::new("Submit").color(egui::Color32::WHITE))
            .min_size(Vec2::new(80.0, 32.0))
            .rounding(self.theme.button_rounding)
            .fill(if can_submit {
                self.theme.primary
            } else {
                self.theme.text_muted
            });
        if ui.add_enabled(can_submit, submit).clicked() {
            self.state.submit();
            ui.ctx().request_repaint();
        }

        if self.button(ui, "Clear", true).clicked() {
            self.state.clear_input();
            ui.ctx().request_repaint();
        }

        let listening = self.state.is_listening();
        if self.button(ui, "Start Listening", !listening).clicked() {
            self.state.start_listening();
            ui.ctx().request_repaint();
        }
        if self.button(ui, "Stop Listening", listening).clicked() {
            self.state.stop_listening();
            ui.ctx().request_repaint();
        }

        let now = Instant::now();
        let copy_label = if self.state.is_copied(now) {
            "Copied!"
        } else {
            "Copy to clipboard"
        };
        if self.button(ui, copy_label, true).clicked() {
            self.state.copy_to_clipboard(ui.ctx(), now);
            ui.ctx().request_repaint();
        }

        if listening {
            ui.label(RichText::new("● Listening").color(self.theme.listening));
        }
    }

    fn button(&self, ui: &mut egui::Ui, text: &str, enabled: bool) -> egui::Response {
        let button = egui::Button::new(text)
            .min_size(Vec2::new(0.0, 32.0))
            .rounding(self.theme.button_rounding);
        ui.add_enabled(enabled, button)
    }
}
