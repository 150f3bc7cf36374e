//! Error banner and loading indicator

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct StatusBar<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    /// Whether there is anything to show
    pub fn is_visible(&self) -> bool {
        self.state.is_loading() || self.state.last_error.is_some()
    }

    pub fn show(self, ui: &mut egui::Ui) {
        if let Some(error) = &self.state.last_error {
            egui::Frame::none()
                .fill(self.theme.error.gamma_multiply(0.2))
                .stroke(egui::Stroke::new(1.0, self.theme.error))
                .rounding(self.theme.button_rounding)
                .inner_margin(self.theme.spacing_sm)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    let response = ui.label(RichText::new(error).color(self.theme.error));
                    let label = format!("Error: {}", error);
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                    });
                });
        }

        if self.state.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                let response = ui.label(RichText::new("Loading...").color(self.theme.text_muted));
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, "Loading")
                });
            });
        }
    }
}
