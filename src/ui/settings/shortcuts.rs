use crate::shortcuts::{ShortcutMap, ShortcutRecorder};
use egui::{Grid, RichText, Ui};

pub fn show(ui: &mut Ui, map: &ShortcutMap, recorder: &mut ShortcutRecorder) {
    let mac = cfg!(target_os = "macos");
    ui.label(RichText::new("快捷键").strong());
    ui.label(RichText::new("点击右侧按钮后按下新的组合键").small().weak());

    Grid::new("shortcut_grid")
        .num_columns(2)
        .spacing([16.0, 6.0])
        .show(ui, |ui| {
            for (action, shortcut) in map.iter() {
                ui.label(&shortcut.description);
                let recording = recorder.recording() == Some(action);
                let text = if recording {
                    "按下新快捷键…".to_string()
                } else {
                    shortcut.label(mac)
                };
                if ui.selectable_label(recording, text).clicked() {
                    if recording {
                        recorder.cancel();
                    } else {
                        recorder.start(action);
                    }
                }
                ui.end_row();
            }
        });
}
