//! System font discovery. Novels are mostly Chinese, so a CJK family is
//! put in front of egui's bundled fonts.
use eframe::egui::{FontData, FontDefinitions, FontFamily};
use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;

const READER_FONT: &str = "ReaderSystemFont";

/// Font definitions with the best available CJK system font as the primary
/// proportional face. Falls back to the system sans-serif, then to egui's
/// own fonts.
pub fn setup_fonts() -> FontDefinitions {
    let mut fonts = FontDefinitions::default();
    let source = SystemSource::new();

    let found = preferred_families()
        .iter()
        .find_map(|name| family_bytes(&source, name).map(|bytes| (*name, bytes)));

    let bytes = match found {
        Some((name, bytes)) => {
            tracing::info!("Using system font '{}' for body text", name);
            Some(bytes)
        }
        None => {
            let fallback = sans_serif_bytes(&source);
            if fallback.is_some() {
                tracing::info!("No CJK font found, using the system sans-serif");
            } else {
                tracing::warn!("Could not load any system font, using egui defaults");
            }
            fallback
        }
    };

    if let Some(bytes) = bytes {
        install(&mut fonts, bytes);
    }
    fonts
}

fn preferred_families() -> &'static [&'static str] {
    match std::env::consts::OS {
        "macos" => &["PingFang SC", "Hiragino Sans GB", "STSong", "Heiti SC"],
        "windows" => &["Microsoft YaHei", "SimSun", "SimHei"],
        "linux" => &[
            "Noto Sans CJK SC",
            "Noto Sans CJK TC",
            "Source Han Sans SC",
            "WenQuanYi Micro Hei",
        ],
        _ => &[],
    }
}

fn family_bytes(source: &SystemSource, name: &str) -> Option<Vec<u8>> {
    let family = source.select_family_by_name(name).ok()?;
    let handle = family.fonts().first()?;
    handle_bytes(handle)
}

fn sans_serif_bytes(source: &SystemSource) -> Option<Vec<u8>> {
    let handle = source
        .select_best_match(&[FamilyName::SansSerif], &Properties::new())
        .ok()?;
    handle_bytes(&handle)
}

fn handle_bytes(handle: &Handle) -> Option<Vec<u8>> {
    match handle {
        Handle::Memory { bytes, .. } => Some(bytes.to_vec()),
        Handle::Path { path, .. } => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Failed to read font file {:?}: {}", path, e);
                None
            }
        },
    }
}

fn install(fonts: &mut FontDefinitions, bytes: Vec<u8>) {
    fonts
        .font_data
        .insert(READER_FONT.to_owned(), FontData::from_owned(bytes).into());
    fonts
        .families
        .entry(FontFamily::Proportional)
        .or_default()
        .insert(0, READER_FONT.to_owned());
    fonts
        .families
        .entry(FontFamily::Monospace)
        .or_default()
        .push(READER_FONT.to_owned());
}
