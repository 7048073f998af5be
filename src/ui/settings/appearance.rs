use crate::config::{
    DEFAULT_BACKGROUND, DEFAULT_FONT_COLOR, FONT_SIZE_RANGE, LINE_HEIGHT_RANGE,
    LINES_PER_SCREEN_RANGE, PADDING_RANGE, ReaderSettings, SCROLL_SPEED_RANGE, format_hex_color,
    is_color_dark, parse_hex_color,
};
use crate::style::{ACCENT, rgb_to_color32};
use egui::{RichText, Slider, Ui};

const BACKGROUND_PRESETS: [(&str, &str); 4] = [
    ("白色", "#ffffff"),
    ("米黄", "#f4ecd8"),
    ("护眼绿", "#c7edcc"),
    ("深色", "#1e1e1e"),
];

const FONT_PRESETS: [(&str, &str); 4] = [
    ("深灰", "#333333"),
    ("黑色", "#000000"),
    ("浅灰", "#e0e0e0"),
    ("米白", "#f5f5dc"),
];

/// Text buffers of the two hex inputs, committed on Enter or focus loss
#[derive(Debug, Default, Clone)]
pub struct HexInputs {
    pub background: String,
    pub font: String,
}

impl HexInputs {
    pub fn sync(&mut self, settings: &ReaderSettings) {
        self.background = settings.background_color.clone();
        self.font = settings.font_color.clone();
    }
}

/// Normalized colour for a committed hex input; anything unparsable
/// becomes `default`
pub fn commit_hex(input: &str, default: &str) -> String {
    match parse_hex_color(input) {
        Some(rgb) => format_hex_color(rgb),
        None => default.to_string(),
    }
}

/// Apply the background hex input; an unchanged value is left alone
pub fn commit_background(settings: &mut ReaderSettings, hex: &mut HexInputs) {
    let committed = commit_hex(&hex.background, DEFAULT_BACKGROUND);
    if parse_hex_color(&committed) != parse_hex_color(&settings.background_color) {
        settings.background_color = committed;
    }
    hex.background = settings.background_color.clone();
}

/// Apply the font hex input. Only a different colour counts as picking one,
/// which is what turns the automatic font colour off.
pub fn commit_font(settings: &mut ReaderSettings, hex: &mut HexInputs) {
    let committed = commit_hex(&hex.font, DEFAULT_FONT_COLOR);
    if parse_hex_color(&committed) != parse_hex_color(&settings.font_color) {
        settings.set_font_color(committed);
    }
    hex.font = settings.font_color.clone();
}

pub fn show(ui: &mut Ui, settings: &mut ReaderSettings, hex: &mut HexInputs) {
    ui.label(RichText::new("背景颜色").strong());
    ui.horizontal_wrapped(|ui| {
        for (name, color) in BACKGROUND_PRESETS {
            if swatch(ui, name, color, settings.background_color == color) {
                settings.background_color = color.to_string();
                hex.background = color.to_string();
            }
        }
    });
    ui.horizontal(|ui| {
        let mut rgb = settings.background_rgb();
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            settings.background_color = format_hex_color(rgb);
            hex.background = settings.background_color.clone();
        }
        let response = ui.add(egui::TextEdit::singleline(&mut hex.background).desired_width(90.0));
        if response.lost_focus() {
            commit_background(settings, hex);
        }
    });

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label(RichText::new("字体颜色").strong());
        ui.checkbox(&mut settings.auto_font_color, "自动");
    });
    ui.horizontal_wrapped(|ui| {
        for (name, color) in FONT_PRESETS {
            let selected = !settings.auto_font_color && settings.font_color == color;
            if swatch(ui, name, color, selected) {
                settings.set_font_color(color.to_string());
                hex.font = color.to_string();
            }
        }
    });
    ui.horizontal(|ui| {
        let mut rgb = settings.effective_font_rgb();
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            settings.set_font_color(format_hex_color(rgb));
            hex.font = settings.font_color.clone();
        }
        let response = ui.add(egui::TextEdit::singleline(&mut hex.font).desired_width(90.0));
        if response.lost_focus() {
            commit_font(settings, hex);
        }
    });

    ui.add_space(8.0);
    ui.label(RichText::new("排版").strong());
    ui.add(
        Slider::new(&mut settings.font_size, FONT_SIZE_RANGE.0..=FONT_SIZE_RANGE.1)
            .step_by(1.0)
            .text("字号"),
    );
    ui.add(
        Slider::new(&mut settings.line_height, LINE_HEIGHT_RANGE.0..=LINE_HEIGHT_RANGE.1)
            .step_by(0.1)
            .text("行高"),
    );
    ui.add(
        Slider::new(&mut settings.padding, PADDING_RANGE.0..=PADDING_RANGE.1)
            .step_by(4.0)
            .text("页边距"),
    );
    ui.add(
        Slider::new(
            &mut settings.lines_per_screen,
            LINES_PER_SCREEN_RANGE.0..=LINES_PER_SCREEN_RANGE.1,
        )
        .text("沉浸模式行数"),
    );
    ui.add(
        Slider::new(&mut settings.scroll_speed, SCROLL_SPEED_RANGE.0..=SCROLL_SPEED_RANGE.1)
            .step_by(0.1)
            .text("滚动速度"),
    );

    ui.add_space(8.0);
    ui.label(RichText::new("沉浸模式").strong());
    ui.checkbox(&mut settings.auto_hide_in_immersive, "鼠标移出时隐藏窗口");
    ui.checkbox(&mut settings.show_scrollbar_in_immersive, "显示滚动条");
}

/// Coloured preset button; returns whether it was clicked
fn swatch(ui: &mut Ui, name: &str, color: &str, selected: bool) -> bool {
    let rgb = parse_hex_color(color).unwrap_or([255; 3]);
    let fill = rgb_to_color32(rgb);
    let text_color = if is_color_dark(rgb) {
        egui::Color32::from_gray(230)
    } else {
        egui::Color32::from_gray(40)
    };
    let mut button = egui::Button::new(RichText::new(name).color(text_color)).fill(fill);
    if selected {
        button = button.stroke(egui::Stroke::new(2.0, ACCENT));
    }
    ui.add(button).clicked()
}
