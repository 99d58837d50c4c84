//! GUI implementation with egui/eframe
//!
//! This module provides the desktop user interface for Nimbus using the eframe framework.

mod app;
mod components;
mod state;
mod theme;

use crate::integration::Orchestrator;
use std::sync::Arc;
use tokio::runtime::Runtime;

pub use app::NimbusApp;
pub use state::{AppState, DebugInfo, StreamingResponse};
pub use theme::Theme;

/// Run the Nimbus window until it is closed
pub fn run(orchestrator: Arc<Orchestrator>, runtime: Runtime) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([480.0, 400.0])
            .with_title("Nimbus"),
        ..Default::default()
    };

    eframe::run_native(
        "Nimbus",
        options,
        Box::new(move |cc| Ok(Box::new(NimbusApp::new(cc, orchestrator, runtime)))),
    )
}
