use paper_reader::app::ReaderApp;
use paper_reader::backend::store::Store;
use paper_reader::config::Config;
use paper_reader::constant;
use paper_reader::ui;
use paper_reader::window::WindowSize;
use std::path::PathBuf;

fn main() -> eframe::Result {
    // Logging starts only after the config is known
    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();
    match (load_error, Config::config_path()) {
        (Some(e), _) => tracing::warn!("Using default config: {}", e),
        (None, Ok(path)) => tracing::info!("Load config from {:?}", path),
        (None, Err(e)) => tracing::warn!("Config path unavailable: {}", e),
    }

    let store = Store::new(config.data_file());
    tracing::info!("Reading data from {:?}", store.path());
    let window_size = store
        .load::<WindowSize>(constant::KEY_WINDOW_SIZE)
        .unwrap_or_default();

    let initial_file = std::env::args().nth(1).map(PathBuf::from);
    let options = ui::viewport::build_viewport(window_size);

    eframe::run_native(
        constant::DEFAULT_WINDOW_TITLE,
        options,
        Box::new(|cc| {
            // CJK-capable system font
            let fonts = ui::font::setup_fonts();
            cc.egui_ctx.set_fonts(fonts);

            Ok(Box::new(ReaderApp::new(cc, store, initial_file)))
        }),
    )
}
