//! Chat history sidebar
//!
//! Mirrors the conversation with its own bulk delete and per-message delete.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

const PREVIEW_CHARS: usize = 48;

pub struct Sidebar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> Sidebar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Chat History");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let delete_all = ui.button("Delete All");
                delete_all.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Delete all history")
                });
                if delete_all.clicked() {
                    self.state.delete_conversation();
                    ui.ctx().request_repaint();
                }
            });
        });
        ui.separator();

        let messages = self.state.messages.get_all();
        if messages.is_empty() {
            ui.label(RichText::new("No messages yet").color(self.theme.text_muted));
            return;
        }

        let mut removed = None;
        egui::ScrollArea::vertical()
            .id_salt("history")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for message in &messages {
                    ui.horizontal(|ui| {
                        let who = if message.is_user() { "You" } else { "Bot" };
                        ui.label(RichText::new(who).strong().color(self.theme.text_secondary));
                        ui.label(RichText::new(preview(&message.content)).color(self.theme.text_primary));

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let remove = ui.small_button("✖");
                            let label = format!("Remove from history: {}", message.content);
                            remove.widget_info(|| {
                                egui::WidgetInfo::labeled(egui::WidgetType::Button, true, &label)
                            });
                            if remove.clicked() {
                                removed = Some(message.id);
                            }
                        });
                    });
                    ui.add_space(self.theme.spacing_sm * 0.5);
                }
            });

        if let Some(id) = removed {
            self.state.delete_message(id);
            ui.ctx().request_repaint();
        }
    }
}

fn preview(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS || line.len() < content.len() {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut.trim_end())
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_and_multiline_content() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview("first\nsecond"), "first…");

        let long = "a".repeat(60);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 1);
        assert!(shown.ends_with('…'));
    }
}
