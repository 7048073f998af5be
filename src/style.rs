use crate::config::ReaderSettings;
use egui::{Color32, Context, Stroke, Style, Visuals};

/// Progress bars, selection and highlights
pub const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);

/// Light chrome around the page; the page colours come from the settings
pub fn configure_style(ctx: &Context) {
    let mut style = Style::default();
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.window_margin = egui::Margin::same(16);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.slider_width = 180.0;
    ctx.set_style(style);

    let mut visuals = Visuals::light();
    visuals.window_shadow = egui::epaint::Shadow::NONE;
    visuals.popup_shadow = egui::epaint::Shadow::NONE;
    visuals.panel_fill = Color32::from_gray(250);

    // Buttons stay flat until hovered
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(0.0, Color32::TRANSPARENT);
    visuals.widgets.inactive.bg_fill = Color32::TRANSPARENT;
    visuals.widgets.inactive.weak_bg_fill = Color32::TRANSPARENT;
    visuals.widgets.hovered.weak_bg_fill = Color32::from_gray(238);
    visuals.widgets.active.weak_bg_fill = Color32::from_gray(228);

    visuals.selection.bg_fill = ACCENT.gamma_multiply(0.35);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    ctx.set_visuals(visuals);
}

pub fn rgb_to_color32([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// Page colour of the reading area
pub fn page_color(settings: &ReaderSettings) -> Color32 {
    rgb_to_color32(settings.background_rgb())
}

/// Body text colour, following the background when automatic
pub fn text_color(settings: &ReaderSettings) -> Color32 {
    rgb_to_color32(settings.effective_font_rgb())
}
