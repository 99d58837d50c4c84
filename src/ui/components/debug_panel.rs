//! Debug panel component
//!
//! Displays internal state information for debugging.

use crate::integration::Phase;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, ScrollArea};

/// Debug panel component
pub struct DebugPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> DebugPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new("Debug Panel")
                                .strong()
                                .color(self.theme.text_primary),
                        );

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                RichText::new(format!("{:.1} FPS", self.state.debug_info.fps))
                                    .size(12.0)
                                    .family(egui::FontFamily::Monospace)
                                    .color(self.fps_color()),
                            );
                        });
                    });

                    ui.separator();

                    egui::Grid::new("debug_stats")
                        .num_columns(2)
                        .spacing([20.0, 4.0])
                        .show(ui, |ui| {
                            self.stat_row(ui, "Phase", &self.phase_label());
                            self.stat_row(ui, "Model", self.state.selection.selected());
                            self.stat_row(
                                ui,
                                "Response",
                                &format!("{} chars", self.state.streaming_response.text.len()),
                            );
                            self.stat_row(ui, "LLM Stats", &self.state.debug_info.llm_stats);
                        });

                    ui.add_space(self.theme.spacing_sm);
                    ui.separator();

                    ui.label(
                        RichText::new("Recent Logs")
                            .size(12.0)
                            .strong()
                            .color(self.theme.text_secondary),
                    );

                    ScrollArea::vertical()
                        .max_height(100.0)
                        .auto_shrink([false, false])
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for msg in &self.state.debug_info.log_messages {
                                ui.label(
                                    RichText::new(msg)
                                        .size(11.0)
                                        .family(egui::FontFamily::Monospace)
                                        .color(self.theme.text_muted),
                                );
                            }

                            if self.state.debug_info.log_messages.is_empty() {
                                ui.label(
                                    RichText::new("No log messages")
                                        .size(11.0)
                                        .color(self.theme.text_muted)
                                        .italics(),
                                );
                            }
                        });
                });
            });
    }

    fn stat_row(&self, ui: &mut egui::Ui, label: &str, value: &str) {
        ui.label(RichText::new(label).size(12.0).color(self.theme.text_muted));

        let display_value = if value.is_empty() { "-" } else { value };

        ui.label(
            RichText::new(display_value)
                .size(12.0)
                .family(egui::FontFamily::Monospace)
                .color(self.theme.text_primary),
        );

        ui.end_row();
    }

    fn phase_label(&self) -> String {
        match self.state.interaction.phase() {
            Phase::Idle => "Idle",
            Phase::LoadingModel => "Loading model",
            Phase::Thinking => "Thinking",
            Phase::Generating => "Generating",
            Phase::Speaking => "Speaking",
        }
        .to_string()
    }

    fn fps_color(&self) -> egui::Color32 {
        let fps = self.state.debug_info.fps;
        if fps >= 55.0 {
            self.theme.success
        } else if fps >= 30.0 {
            self.theme.warning
        } else {
            self.theme.error
        }
    }
}
