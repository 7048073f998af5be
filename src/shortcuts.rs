use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Keyboard-triggered actions. Declaration order is dispatch priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShortcutAction {
    ToggleImmersive,
    ExitImmersive,
    OpenFile,
    ToggleSettings,
    BackToBookshelf,
    SaveWindowSize,
}

impl ShortcutAction {
    pub const ALL: [ShortcutAction; 6] = [
        ShortcutAction::ToggleImmersive,
        ShortcutAction::ExitImmersive,
        ShortcutAction::OpenFile,
        ShortcutAction::ToggleSettings,
        ShortcutAction::BackToBookshelf,
        ShortcutAction::SaveWindowSize,
    ];

    pub fn default_binding(self) -> Shortcut {
        let (key, ctrl, description) = match self {
            ShortcutAction::OpenFile => ("o", true, "打开文件"),
            ShortcutAction::ToggleSettings => (",", true, "打开设置"),
            ShortcutAction::ToggleImmersive => ("Enter", true, "切换沉浸模式"),
            ShortcutAction::BackToBookshelf => ("b", true, "返回书架"),
            ShortcutAction::ExitImmersive => ("Escape", false, "退出沉浸模式"),
            ShortcutAction::SaveWindowSize => ("s", true, "保存窗口大小"),
        };
        Shortcut {
            key: key.to_string(),
            ctrl,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub key: String,
    /// Ctrl on Windows/Linux, Command on macOS
    pub ctrl: bool,
    #[serde(default)]
    pub description: String,
}

impl Shortcut {
    /// Key names compare case-insensitively; the ctrl flag must match exactly
    pub fn matches(&self, key: &str, ctrl: bool) -> bool {
        self.ctrl == ctrl && self.key.eq_ignore_ascii_case(key)
    }

    /// Human-readable label such as `Ctrl + O` or `⌘ + ↵`
    pub fn label(&self, mac: bool) -> String {
        let key = match self.key.as_str() {
            "Enter" => "↵".to_string(),
            "Escape" => "Esc".to_string(),
            other => other.to_uppercase(),
        };
        if self.ctrl {
            format!("{} + {}", if mac { "⌘" } else { "Ctrl" }, key)
        } else {
            key
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortcutMap {
    bindings: BTreeMap<ShortcutAction, Shortcut>,
}

impl Default for ShortcutMap {
    fn default() -> Self {
        let bindings = ShortcutAction::ALL
            .iter()
            .map(|&action| (action, action.default_binding()))
            .collect();
        Self { bindings }
    }
}

impl ShortcutMap {
    pub fn get(&self, action: ShortcutAction) -> Shortcut {
        self.bindings
            .get(&action)
            .cloned()
            .unwrap_or_else(|| action.default_binding())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShortcutAction, &Shortcut)> {
        self.bindings.iter().map(|(action, shortcut)| (*action, shortcut))
    }

    /// Rebind an action, keeping its description
    pub fn rebind(&mut self, action: ShortcutAction, key: String, ctrl: bool) {
        let entry = self
            .bindings
            .entry(action)
            .or_insert_with(|| action.default_binding());
        entry.key = key;
        entry.ctrl = ctrl;
    }

    /// Lay persisted bindings over the current ones, action by action.
    /// Unknown actions and malformed entries are skipped.
    pub fn merge_persisted(&mut self, persisted: BTreeMap<String, Value>) {
        for (name, value) in persisted {
            let Ok(action) = serde_json::from_value::<ShortcutAction>(Value::String(name.clone()))
            else {
                warn!("Ignoring unknown shortcut action '{}'", name);
                continue;
            };
            match serde_json::from_value::<Shortcut>(value) {
                Ok(mut shortcut) => {
                    if shortcut.description.is_empty() {
                        shortcut.description = action.default_binding().description;
                    }
                    self.bindings.insert(action, shortcut);
                }
                Err(e) => warn!("Ignoring malformed shortcut '{}': {}", name, e),
            }
        }
    }

    /// Actions bound to this key press, in dispatch priority order
    pub fn matching(&self, key: &str, ctrl: bool) -> Vec<ShortcutAction> {
        ShortcutAction::ALL
            .iter()
            .copied()
            .filter(|&action| self.get(action).matches(key, ctrl))
            .collect()
    }
}

const MODIFIER_KEYS: [&str; 4] = ["Control", "Meta", "Alt", "Shift"];

/// "Press the new shortcut" interaction of the settings window
#[derive(Debug, Default, Clone)]
pub struct ShortcutRecorder {
    recording: Option<ShortcutAction>,
}

impl ShortcutRecorder {
    pub fn start(&mut self, action: ShortcutAction) {
        self.recording = Some(action);
    }

    pub fn cancel(&mut self) {
        self.recording = None;
    }

    pub fn recording(&self) -> Option<ShortcutAction> {
        self.recording
    }

    /// Feed a key press. Returns the binding to store once a non-modifier
    /// key arrives while recording.
    pub fn feed(&mut self, key: &str, ctrl: bool) -> Option<(ShortcutAction, String, bool)> {
        let action = self.recording?;
        if MODIFIER_KEYS.contains(&key) {
            return None;
        }
        self.recording = None;
        Some((action, key.to_string(), ctrl))
    }
}
