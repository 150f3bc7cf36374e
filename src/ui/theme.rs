//! Colors, spacing and text styles for the chat window

use crate::config::UiConfig;
use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Vec2, Visuals};

#[derive(Clone, Debug)]
pub struct Theme {
    /// Accent for primary actions
    pub primary: Color32,
    pub success: Color32,
    pub error: Color32,

    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Microphone indicator while listening
    pub listening: Color32,
    /// Input background while its content came from voice
    pub voice_highlight: Color32,

    pub user_bubble: Color32,
    pub assistant_bubble: Color32,

    pub button_rounding: Rounding,
    pub card_rounding: Rounding,
    pub bubble_rounding: Rounding,

    pub spacing: f32,
    pub spacing_lg: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(99, 102, 241),
            success: Color32::from_rgb(34, 197, 94),
            error: Color32::from_rgb(239, 68, 68),

            bg_primary: Color32::from_rgb(17, 24, 39),
            bg_secondary: Color32::from_rgb(31, 41, 55),
            bg_tertiary: Color32::from_rgb(55, 65, 81),

            text_primary: Color32::from_rgb(249, 250, 251),
            text_secondary: Color32::from_rgb(209, 213, 219),
            text_muted: Color32::from_rgb(156, 163, 175),

            listening: Color32::from_rgb(239, 68, 68),
            voice_highlight: Color32::from_rgb(30, 58, 95),

            user_bubble: Color32::from_rgb(79, 70, 229),
            assistant_bubble: Color32::from_rgb(55, 65, 81),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),
            bubble_rounding: Rounding::same(14.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    pub fn light() -> Self {
        Self {
            primary: Color32::from_rgb(79, 70, 229),
            success: Color32::from_rgb(22, 163, 74),
            error: Color32::from_rgb(220, 38, 38),

            bg_primary: Color32::from_rgb(255, 255, 255),
            bg_secondary: Color32::from_rgb(243, 244, 246),
            bg_tertiary: Color32::from_rgb(229, 231, 235),

            text_primary: Color32::from_rgb(17, 24, 39),
            text_secondary: Color32::from_rgb(55, 65, 81),
            text_muted: Color32::from_rgb(107, 114, 128),

            listening: Color32::from_rgb(220, 38, 38),
            voice_highlight: Color32::from_rgb(219, 234, 254),

            user_bubble: Color32::from_rgb(99, 102, 241),
            assistant_bubble: Color32::from_rgb(229, 231, 235),

            ..Self::dark()
        }
    }

    /// Pick the color scheme named in the view configuration
    pub fn from_config(config: &UiConfig) -> Self {
        if config.light_theme {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Text color to use on top of a message bubble
    pub fn bubble_text(&self, is_user: bool) -> Color32 {
        if is_user {
            Color32::WHITE
        } else {
            self.text_primary
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = if self.bg_primary == Color32::WHITE {
            Visuals::light()
        } else {
            Visuals::dark()
        };

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_tertiary;

        visuals.widgets.noninteractive.bg_fill = self.bg_secondary;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);
        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);
        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);
        visuals.widgets.active.bg_fill = self.primary;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);
        visuals.window_rounding = self.card_rounding;

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.button_padding = Vec2::new(self.spacing_sm * 1.5, self.spacing_sm * 0.75);

        for (text_style, size, family) in [
            (TextStyle::Heading, 20.0, FontFamily::Proportional),
            (TextStyle::Body, 14.0, FontFamily::Proportional),
            (TextStyle::Button, 14.0, FontFamily::Proportional),
            (TextStyle::Small, 11.0, FontFamily::Proportional),
            (TextStyle::Monospace, 13.0, FontFamily::Monospace),
        ] {
            style.text_styles.insert(text_style, FontId::new(size, family));
        }

        ctx.set_style(style);
    }
}
