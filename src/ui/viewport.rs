use crate::constant::{DEFAULT_WINDOW_TITLE, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH};
use crate::window::WindowSize;

/// Native options for the main window. Decorations are drawn by the title
/// bar; the window is transparent so auto-hide can clear it.
pub fn build_viewport(size: WindowSize) -> eframe::NativeOptions {
    let size = size.sanitized();
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(DEFAULT_WINDOW_TITLE)
            .with_inner_size([size.width, size.height])
            .with_min_inner_size([MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT])
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(true)
            .with_drag_and_drop(true),
        ..Default::default()
    }
}
