use egui::{Context, Event, Key};

/// Name a key the way shortcuts store it: lowercase letters and digits,
/// punctuation as the character, named keys as egui names them
pub fn key_name(key: Key) -> String {
    let symbol = match key {
        Key::Comma => ",",
        Key::Period => ".",
        Key::Slash => "/",
        Key::Backslash => "\\",
        Key::Semicolon => ";",
        Key::Minus => "-",
        Key::Equals => "=",
        Key::OpenBracket => "[",
        Key::CloseBracket => "]",
        Key::Backtick => "`",
        other => {
            let name = other.name();
            return if name.chars().count() == 1 {
                name.to_lowercase()
            } else {
                name.to_string()
            };
        }
    };
    symbol.to_string()
}

/// Key presses of this frame as `(name, ctrl_or_command)`, repeats skipped
pub fn key_presses(ctx: &Context) -> Vec<(String, bool)> {
    ctx.input(|i| {
        i.events
            .iter()
            .filter_map(|event| match event {
                Event::Key {
                    key,
                    pressed: true,
                    repeat: false,
                    modifiers,
                    ..
                } => Some((
                    key_name(*key),
                    modifiers.ctrl || modifiers.command || modifiers.mac_cmd,
                )),
                _ => None,
            })
            .collect()
    })
}
