//! Status bar component
//!
//! Shows the model id and the status line with a color-coded indicator.

use crate::integration::Phase;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Color32, RichText, Vec2};

/// Indicator color for a phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorStatus {
    /// Nothing running (orange before a model is loaded)
    Waiting,
    /// Loading, thinking, generating or speaking (green, pulsing)
    Running,
    /// Model ready (green)
    Ready,
    /// Last load failed (red)
    Error,
}

impl IndicatorStatus {
    pub fn from_state(state: &AppState) -> Self {
        if state.interaction.status_text.starts_with("Error") {
            IndicatorStatus::Error
        } else if state.interaction.phase() != Phase::Idle {
            IndicatorStatus::Running
        } else if state.model_loaded {
            IndicatorStatus::Ready
        } else {
            IndicatorStatus::Waiting
        }
    }
}

pub struct StatusBar<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let status = IndicatorStatus::from_state(self.state);

        let response = ui.vertical(|ui| {
            ui.label(
                RichText::new(format!("Model: {}", self.state.selection.selected()))
                    .size(12.0)
                    .family(egui::FontFamily::Monospace)
                    .color(self.theme.text_secondary),
            );

            ui.horizontal(|ui| {
                self.draw_dot(ui, status);
                ui.label(
                    RichText::new(format!("Status: {}", self.state.interaction.status_text))
                        .size(13.0)
                        .color(self.theme.text_primary),
                );
            });
        });

        if status == IndicatorStatus::Running {
            ui.ctx().request_repaint();
        }

        response.response
    }

    fn draw_dot(&self, ui: &mut egui::Ui, status: IndicatorStatus) {
        let base_color = match status {
            IndicatorStatus::Waiting => self.theme.warning,
            IndicatorStatus::Running | IndicatorStatus::Ready => self.theme.success,
            IndicatorStatus::Error => self.theme.error,
        };

        let color = if status == IndicatorStatus::Running {
            let time = ui.ctx().input(|i| i.time);
            let pulse = ((time * 2.0).sin() * 0.5 + 0.5) as f32;
            Color32::from_rgba_unmultiplied(
                base_color.r(),
                base_color.g(),
                base_color.b(),
                (255.0 * (0.6 + 0.4 * pulse)) as u8,
            )
        } else {
            base_color
        };

        let (rect, _response) = ui.allocate_exact_size(Vec2::splat(10.0), egui::Sense::hover());
        ui.painter().circle_filled(rect.center(), 5.0, color);
    }
}
