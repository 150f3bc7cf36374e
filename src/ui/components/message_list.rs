//! Message list component
//!
//! Displays the conversation with per-message speak and delete controls.

use crate::messages::Message;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, RichText, Vec2};
use uuid::Uuid;

enum MessageAction {
    Speak(Uuid),
    Delete(Uuid),
}

/// Message list component
pub struct MessageList<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let messages = self.state.messages.get_all();
        let mut action = None;

        egui::ScrollArea::vertical()
            .id_salt("messages")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(self.theme.spacing);

                if messages.is_empty() && !self.state.is_loading() {
                    self.show_empty_state(ui);
                }

                for message in &messages {
                    if let Some(a) = self.show_message(ui, message) {
                        action = Some(a);
                    }
                    ui.add_space(self.theme.spacing_sm);
                }

                ui.add_space(self.theme.spacing);
            });

        match action {
            Some(MessageAction::Speak(id)) => {
                self.state.speak_message(id);
            }
            Some(MessageAction::Delete(id)) => {
                self.state.delete_message(id);
                ui.ctx().request_repaint();
            }
            None => {}
        }
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(self.theme.spacing_lg * 3.0);
            ui.label(
                RichText::new("Start a conversation")
                    .size(22.0)
                    .color(self.theme.text_primary),
            );
            ui.add_space(self.theme.spacing_sm);
            ui.label(
                RichText::new("Type a message, or press Start Listening and speak.")
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_message(&self, ui: &mut egui::Ui, message: &Message) -> Option<MessageAction> {
        let is_user = message.is_user();
        let align = if is_user { Align::RIGHT } else { Align::LEFT };
        let mut action = None;

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            ui.label(
                RichText::new(if is_user { "You" } else { "Chatbot" })
                    .size(12.0)
                    .color(self.theme.text_muted),
            );

            let max_width = ui.available_width() * 0.75;
            egui::Frame::none()
                .fill(if is_user {
                    self.theme.user_bubble
                } else {
                    self.theme.assistant_bubble
                })
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    let response = ui.label(
                        RichText::new(&message.content).color(self.theme.bubble_text(is_user)),
                    );
                    let label = format!(
                        "{} message: {}",
                        if is_user { "User" } else { "Assistant" },
                        message.content
                    );
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                    });
                });

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(message.timestamp.format("%H:%M").to_string())
                        .size(10.0)
                        .color(self.theme.text_muted),
                );

                let speak = ui
                    .add(egui::Button::new("🔊").small().min_size(Vec2::splat(20.0)))
                    .on_hover_text("Read aloud");
                let speak_label = format!("Speak message: {}", message.content);
                speak.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Button, true, &speak_label)
                });
                if speak.clicked() {
                    action = Some(MessageAction::Speak(message.id));
                }

                let delete = ui
                    .add(egui::Button::new("🗑").small().min_size(Vec2::splat(20.0)))
                    .on_hover_text("Delete message");
                let delete_label = format!("Delete message: {}", message.content);
                delete.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Button, true, &delete_label)
                });
                if delete.clicked() {
                    action = Some(MessageAction::Delete(message.id));
                }
            });
        });

        action
    }
}
