//! Model picker shown while no session is live

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

pub struct ModelPicker<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> ModelPicker<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let is_loading = self.state.interaction.is_loading_model;
        let mut chosen: Option<String> = None;

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!is_loading, |ui| {
                egui::ComboBox::from_id_salt("model_picker")
                    .width(320.0)
                    .selected_text(self.state.selection.selected())
                    .show_ui(ui, |ui| {
                        for model in self.state.selection.available() {
                            let selected = model == self.state.selection.selected();
                            if ui.selectable_label(selected, model).clicked() && !selected {
                                chosen = Some(model.clone());
                            }
                        }
                    });
            });

            ui.add_space(self.theme.spacing_sm);

            let label = if is_loading { "Loading..." } else { "Load Model" };
            let button = egui::Button::new(RichText::new(label).color(egui::Color32::WHITE))
                .min_size(Vec2::new(120.0, 32.0))
                .rounding(self.theme.button_rounding)
                .fill(self.theme.primary);

            if ui.add_enabled(!is_loading, button).clicked() {
                self.state.load_selected_model();
            }
        });

        if let Some(model) = chosen {
            self.state.select_model(&model);
        }
    }
}
