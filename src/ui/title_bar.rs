use egui::{Align, Layout, RichText, Ui};

pub enum TitleBarAction {
    BackToBookshelf,
    OpenFile,
    Settings,
    ToggleImmersive,
}

pub struct TitleBar;

pub struct TitleBarState<'a> {
    pub title: &'a str,
    pub has_book: bool,
    pub open_hint: String,
    pub settings_hint: String,
    pub immersive_hint: String,
}

impl TitleBar {
    pub fn show(ui: &mut Ui, state: TitleBarState<'_>) -> Option<TitleBarAction> {
        let TitleBarState {
            title,
            has_book,
            open_hint,
            settings_hint,
            immersive_hint,
        } = state;

        let mut action = None;
        let title_bar_rect = ui.available_rect_before_wrap();

        // Registered before the widgets so they can steal input
        let interact = ui.interact(
            title_bar_rect,
            ui.id().with("title_bar_drag"),
            egui::Sense::click_and_drag(),
        );
        if interact.dragged() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::StartDrag);
        }
        if interact.double_clicked() {
            toggle_maximized(ui);
        }

        ui.horizontal(|ui| {
            ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                if has_book && ui.button("←").on_hover_text("返回书架").clicked() {
                    action = Some(TitleBarAction::BackToBookshelf);
                }
                ui.label(RichText::new(title).strong());
            });

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.spacing_mut().item_spacing.x = 8.0;

                if ui.button("❌").on_hover_text("关闭").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
                if ui.button("🗖").on_hover_text("最大化").clicked() {
                    toggle_maximized(ui);
                }
                if ui.button("➖").on_hover_text("最小化").clicked() {
                    ui.ctx()
                        .send_viewport_cmd(egui::ViewportCommand::Minimized(true));
                }

                ui.add_space(16.0);

                if has_book && ui.button("沉浸").on_hover_text(immersive_hint).clicked() {
                    action = Some(TitleBarAction::ToggleImmersive);
                }
                if ui.button("⚙").on_hover_text(settings_hint).clicked() {
                    action = Some(TitleBarAction::Settings);
                }
                if !has_book && ui.button("📂").on_hover_text(open_hint).clicked() {
                    action = Some(TitleBarAction::OpenFile);
                }
            });
        });

        action
    }
}

fn toggle_maximized(ui: &Ui) {
    let maximized = ui.input(|i| i.viewport().maximized.unwrap_or(false));
    ui.ctx()
        .send_viewport_cmd(egui::ViewportCommand::Maximized(!maximized));
}

/// Borderless strip that keeps the window draggable in immersive mode
pub fn drag_strip(ui: &mut Ui, height: f32) {
    let rect = egui::Rect::from_min_size(ui.max_rect().min, egui::vec2(ui.max_rect().width(), height));
    let response = ui.interact(rect, ui.id().with("immersive_drag"), egui::Sense::drag());
    if response.drag_started() {
        ui.ctx().send_viewport_cmd(egui::ViewportCommand::StartDrag);
    }
}
