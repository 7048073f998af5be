//! Window geometry and visibility policy. The eframe side only executes
//! what these functions decide.

use crate::config::ReaderSettings;
use crate::constant::{
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, IMMERSIVE_EXTRA_HEIGHT, MIN_WINDOW_HEIGHT,
    MIN_WINDOW_WIDTH, NORMAL_WINDOW_HEIGHT, SCREEN_BOTTOM_MARGIN,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

impl WindowSize {
    /// Usable initial size: falls back to the default for nonsense values
    /// and respects the minimum window size
    pub fn sanitized(self) -> Self {
        let pick = |v: f32, fallback: f32, min: f32| {
            if v.is_finite() && v > 0.0 { v.max(min) } else { fallback }
        };
        Self {
            width: pick(self.width, DEFAULT_WINDOW_WIDTH, MIN_WINDOW_WIDTH),
            height: pick(self.height, DEFAULT_WINDOW_HEIGHT, MIN_WINDOW_HEIGHT),
        }
    }
}

/// A resize the window shell should carry out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowRequest {
    /// Keep the width and change the height; `immersive` tells which mode
    /// the new height belongs to
    Resize { height: f32, immersive: bool },
}

/// Window height that shows `lines_per_screen` lines plus a little chrome
pub fn immersive_height(settings: &ReaderSettings) -> f32 {
    (settings.line_height_px() * settings.lines_per_screen as f32).ceil() + IMMERSIVE_EXTRA_HEIGHT
}

pub fn enter_immersive_request(settings: &ReaderSettings) -> WindowRequest {
    WindowRequest::Resize {
        height: immersive_height(settings),
        immersive: true,
    }
}

pub fn exit_immersive_request() -> WindowRequest {
    WindowRequest::Resize {
        height: NORMAL_WINDOW_HEIGHT,
        immersive: false,
    }
}

/// Never ask for more than the monitor offers
pub fn clamp_to_monitor(requested: WindowSize, monitor: Option<WindowSize>) -> WindowSize {
    let size = match monitor {
        Some(screen) => WindowSize {
            width: requested.width.min(screen.width),
            height: requested.height.min(screen.height - SCREEN_BOTTOM_MARGIN),
        },
        None => requested,
    };
    WindowSize {
        width: size.width.max(MIN_WINDOW_WIDTH),
        height: size.height.max(MIN_WINDOW_HEIGHT),
    }
}

/// Whether leaving the window with the pointer hides it
pub fn should_auto_hide(settings: &ReaderSettings, immersive: bool, has_started_reading: bool) -> bool {
    immersive && has_started_reading && settings.auto_hide_in_immersive
}

/// Target window opacity for this frame
pub fn window_opacity(auto_hide: bool, pointer_inside: bool) -> f32 {
    if auto_hide && !pointer_inside { 0.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immersive_height() {
        let settings = ReaderSettings::default();
        // 18 * 1.8 * 20 = 648
        assert_eq!(immersive_height(&settings), 648.0 + 40.0);

        let settings = ReaderSettings {
            font_size: 17.0,
            line_height: 1.5,
            lines_per_screen: 3,
            ..Default::default()
        };
        // 76.5 rounds up
        assert_eq!(immersive_height(&settings), 77.0 + 40.0);
    }

    #[test]
    fn test_requests_carry_their_mode() {
        let settings = ReaderSettings::default();
        assert_eq!(
            enter_immersive_request(&settings),
            WindowRequest::Resize {
                height: immersive_height(&settings),
                immersive: true,
            }
        );
        assert_eq!(
            exit_immersive_request(),
            WindowRequest::Resize {
                height: NORMAL_WINDOW_HEIGHT,
                immersive: false,
            }
        );
    }

    #[test]
    fn test_clamp_to_monitor() {
        let screen = Some(WindowSize {
            width: 1440.0,
            height: 900.0,
        });
        let clamped = clamp_to_monitor(
            WindowSize {
                width: 2000.0,
                height: 1200.0,
            },
            screen,
        );
        assert_eq!(clamped.width, 1440.0);
        assert_eq!(clamped.height, 860.0);

        let tiny = clamp_to_monitor(
            WindowSize {
                width: 10.0,
                height: 10.0,
            },
            None,
        );
        assert_eq!(tiny.width, MIN_WINDOW_WIDTH);
        assert_eq!(tiny.height, MIN_WINDOW_HEIGHT);
    }

    #[test]
    fn test_window_size_sanitized() {
        let size = WindowSize {
            width: f32::NAN,
            height: 20.0,
        }
        .sanitized();
        assert_eq!(size.width, DEFAULT_WINDOW_WIDTH);
        assert_eq!(size.height, MIN_WINDOW_HEIGHT);
    }

    #[test]
    fn test_auto_hide_policy() {
        let settings = ReaderSettings::default();
        assert!(should_auto_hide(&settings, true, true));
        assert!(!should_auto_hide(&settings, true, false));
        assert!(!should_auto_hide(&settings, false, true));

        let off = ReaderSettings {
            auto_hide_in_immersive: false,
            ..Default::default()
        };
        assert!(!should_auto_hide(&off, true, true));

        assert_eq!(window_opacity(true, false), 0.0);
        assert_eq!(window_opacity(true, true), 1.0);
        assert_eq!(window_opacity(false, false), 1.0);
    }
}
