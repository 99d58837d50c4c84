//! Input bar component
//!
//! Provides the question input, send controls and the location shortcut.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

/// Input bar component for typed questions
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

                    ui.horizontal(|ui| {
                        self.show_send_button(ui);
                        ui.add_space(self.theme.spacing_sm);
                        self.show_location_button(ui);

                        if self.state.interaction.is_speaking {
                            ui.add_space(self.theme.spacing_sm);
                            self.show_stop_speaking_button(ui);
                        }
                    });
                });
            });
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let enabled = self.state.can_send();

        let text_edit = egui::TextEdit::multiline(&mut self.state.input_text)
            .hint_text("Ask something...")
            .desired_rows(3)
            .desired_width(f32::INFINITY)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0))
            .id(egui::Id::new("question_input"));

        let response = ui.add_enabled(enabled, text_edit);

        response.widget_info(|| {
            egui::WidgetInfo::text_edit(enabled, &self.state.input_text, "Question input")
        });

        // Enter sends, Shift+Enter inserts a newline
        if response.has_focus() {
            let send = ui.input(|i| i.key_pressed(Key::Enter) && !i.modifiers.shift);
            if send {
                let trimmed = self.state.input_text.trim_end_matches('\n').to_string();
                self.state.input_text = trimmed;
                self.state.send_message();
            }
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let is_busy = self.state.interaction.is_busy();
        let can_send = self.state.can_send() && !self.state.input_text.trim().is_empty();

        let label = if is_busy { "Generating..." } else { "Send Message" };
        let fill = if can_send {
            self.theme.primary
        } else {
            self.theme.text_muted
        };

        let button = egui::Button::new(RichText::new(label).color(egui::Color32::WHITE))
            .min_size(Vec2::new(140.0, 36.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add_enabled(can_send, button);

        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, can_send, label)
        });

        if response.clicked() {
            self.state.send_message();
        }
    }

    fn show_location_button(&mut self, ui: &mut egui::Ui) {
        let enabled = self.state.can_send();

        let button = egui::Button::new(RichText::new("📍 Use my location"))
            .min_size(Vec2::new(140.0, 36.0))
            .rounding(self.theme.button_rounding);

        let response = ui.add_enabled(enabled, button);
        if response.clicked() {
            self.state.use_my_location();
        }

        response.on_hover_text("Ask about the weather where you are");
    }

    fn show_stop_speaking_button(&mut self, ui: &mut egui::Ui) {
        let button = egui::Button::new(RichText::new("Stop speaking").color(egui::Color32::WHITE))
            .min_size(Vec2::new(120.0, 36.0))
            .rounding(self.theme.button_rounding)
            .fill(self.theme.warning);

        if ui.add(button).clicked() {
            self.state.stop_speaking();
        }
    }
}
