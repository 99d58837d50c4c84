//! Main application struct and eframe integration
//!
//! This module contains the NimbusApp that implements eframe::App.

use crate::integration::Orchestrator;
use crate::ui::components::{DebugPanel, InputBar, ModelPicker, StatusBar, TextDisplay};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::info;

/// Main Nimbus application
pub struct NimbusApp {
    state: AppState,
    theme: Theme,
    last_frame_time: Instant,
    /// Runs orchestrator work; dropped with the window
    _runtime: Runtime,
}

impl NimbusApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        orchestrator: Arc<Orchestrator>,
        runtime: Runtime,
    ) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        let mut state = AppState::new(orchestrator, runtime.handle().clone());
        state.debug_info.add_log("Nimbus UI initialized".to_string());

        Self {
            state,
            theme,
            last_frame_time: Instant::now(),
            _runtime: runtime,
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Nimbus")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );

                    ui.label(
                        RichText::new("Weather Assistant")
                            .size(14.0)
                            .color(self.theme.text_muted),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🔍").on_hover_text("Toggle Debug Panel").clicked() {
                            self.state.show_debug_panel = !self.state.show_debug_panel;
                        }

                        if self.state.model_loaded
                            && !self.state.interaction.is_busy()
                            && ui.button("⏏").on_hover_text("Unload model").clicked()
                        {
                            self.state.unload_model();
                        }
                    });
                });

                ui.add_space(self.theme.spacing_sm);
                StatusBar::new(&self.state, &self.theme).show(ui);
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                if self.state.model_loaded {
                    InputBar::new(&mut self.state, &self.theme).show(ui);
                } else {
                    ModelPicker::new(&mut self.state, &self.theme).show(ui);
                }
            });
    }

    fn show_debug_panel(&mut self, ctx: &egui::Context) {
        if !self.state.show_debug_panel {
            return;
        }

        SidePanel::right("debug_panel")
            .resizable(true)
            .default_width(300.0)
            .min_width(250.0)
            .max_width(500.0)
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                DebugPanel::new(&self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                TextDisplay::new(&self.state, &self.theme).show(ui);
            });
    }

    /// Modal alert; blocks the window until acknowledged
    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.state.alert.clone() else {
            return;
        };

        let mut acknowledged = false;
        egui::Window::new("Location unavailable")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(&message).color(self.theme.text_primary));
                ui.add_space(self.theme.spacing_sm);
                if ui.button("OK").clicked() {
                    acknowledged = true;
                }
            });

        if acknowledged {
            self.state.dismiss_alert();
        }
    }
}

impl eframe::App for NimbusApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f64();
        self.last_frame_time = now;
        self.state.update_fps(delta);

        let changed = self.state.poll_events();

        self.show_header(ctx);
        self.show_debug_panel(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);
        self.show_alert(ctx);

        // Keep polling while work is in flight
        if changed || self.state.interaction.is_busy() {
            ctx.request_repaint();
        } else if self.state.interaction.is_speaking {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.stop_speaking();
        info!("Nimbus shutting down");
    }
}
