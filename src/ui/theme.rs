//! Colors and spacing for the Nimbus window

use egui::{Color32, Rounding};

#[derive(Debug, Clone)]
pub struct Theme {
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,
    pub primary: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,
    pub spacing: f32,
    pub spacing_sm: f32,
    pub card_rounding: Rounding,
    pub button_rounding: Rounding,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            bg_primary: Color32::from_rgb(0x12, 0x16, 0x1f),
            bg_secondary: Color32::from_rgb(0x1b, 0x21, 0x2e),
            bg_tertiary: Color32::from_rgb(0x26, 0x2e, 0x3f),
            text_primary: Color32::from_rgb(0xe8, 0xec, 0xf3),
            text_secondary: Color32::from_rgb(0xb4, 0xbd, 0xcc),
            text_muted: Color32::from_rgb(0x74, 0x7f, 0x91),
            primary: Color32::from_rgb(0x3b, 0x8e, 0xea),
            success: Color32::from_rgb(0x3f, 0xb9, 0x50),
            warning: Color32::from_rgb(0xf0, 0x8c, 0x2e),
            error: Color32::from_rgb(0xe5, 0x48, 0x4d),
            spacing: 12.0,
            spacing_sm: 6.0,
            card_rounding: Rounding::same(10.0),
            button_rounding: Rounding::same(8.0),
        }
    }

    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_tertiary;
        visuals.selection.bg_fill = self.primary;
        ctx.set_visuals(visuals);
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
