//! UI Components for Nimbus

mod debug_panel;
mod input_bar;
mod model_picker;
mod status_bar;
mod text_display;

pub use debug_panel::DebugPanel;
pub use input_bar::InputBar;
pub use model_picker::ModelPicker;
pub use status_bar::{IndicatorStatus, StatusBar};
pub use text_display::TextDisplay;
