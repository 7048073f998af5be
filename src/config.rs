//! Application configuration module
//!
//! Two layers live here. [`Config`] is the launch configuration, stored with
//! `confy` in the OS-specific config directory. [`ReaderSettings`] is the
//! reading appearance record the user edits in the settings window; it is
//! persisted in the JSON data store next to the bookshelf.

use crate::constant::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, DATA_FILE_NAME};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Confy(#[from] confy::ConfyError),
}

pub struct Config {
    pub launch: LaunchConfig,
}

impl Config {
    /// Load configuration from disk, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let launch: LaunchConfig = confy::load(APP_NAME, None)?;
        Ok(Self { launch })
    }

    /// Get the application data directory
    /// Falls back to a local "data" directory if platform dirs are unavailable
    pub fn data_dir(&self) -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME) {
            proj_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from("data")
        }
    }

    /// Path of the JSON document holding bookshelf, settings and shortcuts
    pub fn data_file(&self) -> PathBuf {
        self.launch
            .data_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join(DATA_FILE_NAME))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, None)?)
    }

    pub fn log_level(&self) -> tracing::Level {
        self.launch
            .log_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            launch: LaunchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Overrides the location of the reading data document
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// Maximum tracing level: error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            log_level: default_log_level(),
        }
    }
}

pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_FONT_COLOR: &str = "#333333";
pub const LIGHT_FONT_COLOR: &str = "#e0e0e0";

pub const FONT_SIZE_RANGE: (f32, f32) = (12.0, 32.0);
pub const LINE_HEIGHT_RANGE: (f32, f32) = (1.2, 3.0);
pub const PADDING_RANGE: (f32, f32) = (0.0, 64.0);
pub const LINES_PER_SCREEN_RANGE: (u32, u32) = (1, 50);
pub const SCROLL_SPEED_RANGE: (f32, f32) = (0.1, 3.0);

/// Reading appearance and behaviour.
///
/// Every field carries a serde default so a record written by an older
/// version, or edited by hand, still loads field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderSettings {
    pub background_color: String,
    pub font_color: String,
    /// Pick the font colour from the background brightness
    pub auto_font_color: bool,
    pub font_size: f32,
    /// Multiplier of `font_size`
    pub line_height: f32,
    /// Horizontal padding on each side, in points
    pub padding: f32,
    /// Immersive mode sizes the window to show this many lines
    pub lines_per_screen: u32,
    pub auto_hide_in_immersive: bool,
    pub scroll_speed: f32,
    pub show_scrollbar_in_immersive: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND.to_string(),
            font_color: DEFAULT_FONT_COLOR.to_string(),
            auto_font_color: true,
            font_size: 18.0,
            line_height: 1.8,
            padding: 16.0,
            lines_per_screen: 20,
            auto_hide_in_immersive: true,
            scroll_speed: 1.0,
            show_scrollbar_in_immersive: false,
        }
    }
}

impl ReaderSettings {
    /// Copy with every numeric field pulled back into its supported range
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let clamp = |value: f32, (lo, hi): (f32, f32), fallback: f32| {
            if value.is_finite() {
                value.clamp(lo, hi)
            } else {
                fallback
            }
        };
        Self {
            font_size: clamp(self.font_size, FONT_SIZE_RANGE, defaults.font_size),
            line_height: clamp(self.line_height, LINE_HEIGHT_RANGE, defaults.line_height),
            padding: clamp(self.padding, PADDING_RANGE, defaults.padding),
            lines_per_screen: self
                .lines_per_screen
                .clamp(LINES_PER_SCREEN_RANGE.0, LINES_PER_SCREEN_RANGE.1),
            scroll_speed: clamp(self.scroll_speed, SCROLL_SPEED_RANGE, defaults.scroll_speed),
            ..self.clone()
        }
    }

    /// Pixel height of one rendered line
    pub fn line_height_px(&self) -> f32 {
        self.font_size * self.line_height
    }

    pub fn background_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.background_color)
            .or_else(|| parse_hex_color(DEFAULT_BACKGROUND))
            .unwrap_or([255, 255, 255])
    }

    /// Font colour actually used for text, honouring `auto_font_color`
    pub fn effective_font_rgb(&self) -> [u8; 3] {
        let chosen = if self.auto_font_color {
            if is_color_dark(self.background_rgb()) {
                LIGHT_FONT_COLOR
            } else {
                DEFAULT_FONT_COLOR
            }
        } else {
            self.font_color.as_str()
        };
        parse_hex_color(chosen)
            .or_else(|| parse_hex_color(DEFAULT_FONT_COLOR))
            .unwrap_or([51, 51, 51])
    }

    /// Picking an explicit font colour turns the automatic choice off
    pub fn set_font_color(&mut self, color: String) {
        self.font_color = color;
        self.auto_font_color = false;
    }
}

/// Parse `#rrggbb` (the leading `#` is optional)
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Perceived brightness below the midpoint
pub fn is_color_dark([r, g, b]: [u8; 3]) -> bool {
    let brightness = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000;
    brightness < 128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#f4ecd8"), Some([0xf4, 0xec, 0xd8]));
        assert_eq!(parse_hex_color("1E1E1E"), Some([0x1e, 0x1e, 0x1e]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(format_hex_color([0xc7, 0xed, 0xcc]), "#c7edcc");
    }

    #[test]
    fn test_auto_font_color_follows_background() {
        let mut settings = ReaderSettings::default();
        assert_eq!(settings.effective_font_rgb(), [0x33, 0x33, 0x33]);

        settings.background_color = "#1e1e1e".to_string();
        assert_eq!(settings.effective_font_rgb(), [0xe0, 0xe0, 0xe0]);

        settings.set_font_color("#000000".to_string());
        assert!(!settings.auto_font_color);
        assert_eq!(settings.effective_font_rgb(), [0, 0, 0]);
    }

    #[test]
    fn test_invalid_colors_fall_back() {
        let settings = ReaderSettings {
            background_color: "nonsense".to_string(),
            font_color: "#12".to_string(),
            auto_font_color: false,
            ..Default::default()
        };
        assert_eq!(settings.background_rgb(), [255, 255, 255]);
        assert_eq!(settings.effective_font_rgb(), [0x33, 0x33, 0x33]);
    }

    #[test]
    fn test_clamped_ranges() {
        let settings = ReaderSettings {
            font_size: 4.0,
            line_height: f32::NAN,
            padding: 500.0,
            lines_per_screen: 0,
            scroll_speed: 9.0,
            ..Default::default()
        }
        .clamped();
        assert_eq!(settings.font_size, 12.0);
        assert_eq!(settings.line_height, 1.8);
        assert_eq!(settings.padding, 64.0);
        assert_eq!(settings.lines_per_screen, 1);
        assert_eq!(settings.scroll_speed, 3.0);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: ReaderSettings =
            serde_json::from_str(r##"{"backgroundColor":"#c7edcc","fontSize":22}"##).unwrap();
        assert_eq!(settings.background_color, "#c7edcc");
        assert_eq!(settings.font_size, 22.0);
        assert_eq!(settings.line_height, 1.8);
        assert!(settings.auto_hide_in_immersive);
    }

    #[test]
    fn test_log_level_parsing() {
        let config = Config {
            launch: LaunchConfig {
                data_file: Some(PathBuf::from("/tmp/reader.json")),
                log_level: "debug".to_string(),
            },
        };
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert_eq!(config.data_file(), PathBuf::from("/tmp/reader.json"));
        assert_eq!(Config::default().log_level(), tracing::Level::INFO);
    }
}
