mod appearance;
mod shortcuts;

use crate::shortcuts::ShortcutRecorder;
use crate::state::AppState;
use crate::ui::keys::key_presses;
use appearance::HexInputs;
use egui::{Context, ScrollArea, Ui};

pub enum SettingsAction {
    SaveWindowSize,
}

/// Reader settings in a separate native window
pub struct SettingsWindow {
    open: bool,
    viewport_id: egui::ViewportId,
    hex: HexInputs,
    recorder: ShortcutRecorder,
    pending_action: Option<SettingsAction>,
}

impl Default for SettingsWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsWindow {
    pub fn new() -> Self {
        Self {
            open: false,
            viewport_id: egui::ViewportId::from_hash_of("settings_window"),
            hex: HexInputs::default(),
            recorder: ShortcutRecorder::default(),
            pending_action: None,
        }
    }

    pub fn toggle(&mut self, state: &AppState) {
        self.open = !self.open;
        if self.open {
            self.hex.sync(state.settings());
        } else {
            self.recorder.cancel();
        }
    }

    pub fn take_pending_action(&mut self) -> Option<SettingsAction> {
        self.pending_action.take()
    }

    pub fn show(&mut self, ctx: &Context, state: &mut AppState) {
        if !self.open {
            return;
        }

        let viewport_id = self.viewport_id;

        ctx.show_viewport_immediate(
            viewport_id,
            egui::ViewportBuilder::default()
                .with_title("设置")
                .with_inner_size([420.0, 640.0])
                .with_resizable(true),
            |ctx, _class| {
                self.record_keys(ctx, state);

                egui::CentralPanel::default().show(ctx, |ui| {
                    self.show_content(ui, state);
                });

                if ctx.input(|i| i.viewport().close_requested()) {
                    self.open = false;
                    self.recorder.cancel();
                }
            },
        );
    }

    fn record_keys(&mut self, ctx: &Context, state: &mut AppState) {
        if self.recorder.recording().is_none() {
            return;
        }
        for (key, ctrl) in key_presses(ctx) {
            if let Some((action, key, ctrl)) = self.recorder.feed(&key, ctrl) {
                state.rebind_shortcut(action, key, ctrl);
                break;
            }
        }
    }

    fn show_content(&mut self, ui: &mut Ui, state: &mut AppState) {
        ScrollArea::vertical().show(ui, |ui| {
            let mut edited = state.settings().clone();
            appearance::show(ui, &mut edited, &mut self.hex);
            if &edited != state.settings() {
                state.update_settings(|settings| *settings = edited);
            }

            ui.add_space(8.0);
            if ui.button("保存当前窗口大小").clicked() {
                self.pending_action = Some(SettingsAction::SaveWindowSize);
            }

            ui.separator();
            shortcuts::show(ui, state.shortcuts(), &mut self.recorder);
        });
    }
}
