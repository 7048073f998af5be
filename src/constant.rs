// Window size constants
pub const DEFAULT_WINDOW_WIDTH: f32 = 1200.0;
pub const DEFAULT_WINDOW_HEIGHT: f32 = 800.0;
pub const MIN_WINDOW_WIDTH: f32 = 300.0;
pub const MIN_WINDOW_HEIGHT: f32 = 50.0;
pub const DEFAULT_WINDOW_TITLE: &str = "小说阅读器";

/// Application name and metadata constants
pub const APP_QUALIFIER: &str = "com";
pub const APP_ORGANIZATION: &str = "RetricSu";
pub const APP_NAME: &str = "Paper Reader";
pub const DATA_FILE_NAME: &str = "app-data.json";

/// Persistence store keys
pub const KEY_WINDOW_SIZE: &str = "windowSize";
pub const KEY_SETTINGS: &str = "settings";
pub const KEY_SHORTCUTS: &str = "shortcuts";
pub const KEY_BOOKSHELF: &str = "bookshelf";
pub const KEY_CURRENT_BOOK: &str = "currentBook";

/// Reader Magic Numbers
pub const PARAGRAPH_GAP: f32 = 8.0;
pub const OVERSCAN_ROWS: usize = 3;
pub const SAVE_DEBOUNCE_MS: u64 = 1000;
pub const RESTORE_SETTLE_MS: u64 = 100;
pub const RESTORE_RELEASE_MS: u64 = 200;

/// Immersive mode geometry
pub const IMMERSIVE_EXTRA_HEIGHT: f32 = 40.0;
pub const NORMAL_WINDOW_HEIGHT: f32 = 600.0;
pub const SCREEN_BOTTOM_MARGIN: f32 = 40.0;
pub const TITLE_BAR_HEIGHT: f32 = 48.0;
pub const DRAG_STRIP_HEIGHT: f32 = 24.0;
