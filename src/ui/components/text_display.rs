//! LLM Text Display Component
//!
//! Displays the streaming answer in real-time with visual indicators for
//! generation state and interruption.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct TextDisplay<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> TextDisplay<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new("AI Response:")
                .size(14.0)
                .strong()
                .color(self.theme.text_secondary),
        );
        ui.add_space(self.theme.spacing_sm);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                let streaming = &self.state.streaming_response;
                let mut display_text = streaming.text.clone();

                if streaming.is_generating {
                    // Blinking cursor while tokens arrive
                    let time = ui.ctx().input(|i| i.time);
                    if (time * 2.0).fract() < 0.5 {
                        display_text.push('▌');
                    }
                    ui.ctx().request_repaint();
                }

                let text_color = if streaming.was_interrupted {
                    self.theme.warning
                } else {
                    self.theme.text_primary
                };

                if display_text.is_empty() && !streaming.is_generating {
                    ui.label(
                        RichText::new("Waiting for a question...")
                            .size(16.0)
                            .color(self.theme.text_muted)
                            .italics(),
                    );
                } else if display_text.is_empty() {
                    self.show_typing_indicator(ui);
                } else {
                    let label = ui.label(RichText::new(&display_text).size(16.0).color(text_color));

                    let accessibility_text = if streaming.is_generating {
                        format!("Generating response: {}", &streaming.text)
                    } else {
                        format!("Response: {}", &streaming.text)
                    };
                    label.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &accessibility_text)
                    });
                }

                if let (Some(first), Some(total)) = (streaming.first_token_ms, streaming.total_ms) {
                    ui.add_space(self.theme.spacing_sm);
                    ui.label(
                        RichText::new(format!("first token {} ms, total {} ms", first, total))
                            .size(11.0)
                            .color(self.theme.text_muted),
                    );
                }
            });
    }

    /// Animated dots while waiting for the first token
    fn show_typing_indicator(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let time = ui.ctx().input(|i| i.time);
            for i in 0..3 {
                let phase = time * 3.0 + i as f64 * 0.5;
                let alpha = (phase.sin() * 0.5 + 0.5) as f32;

                ui.label(
                    RichText::new("●")
                        .size(12.0)
                        .color(self.theme.primary.gamma_multiply(alpha)),
                );
            }
        });
        ui.ctx().request_repaint();
    }
}
