use crate::backend::import::{FsSource, is_supported_file};
use crate::backend::store::Store;
use crate::constant::{
    DEFAULT_WINDOW_TITLE, DEFAULT_WINDOW_WIDTH, DRAG_STRIP_HEIGHT, KEY_WINDOW_SIZE,
    TITLE_BAR_HEIGHT,
};
use crate::messages::ResponseMessage;
use crate::reader::progress::ProgressTracker;
use crate::saver::{SaverMessage, spawn_saver};
use crate::shortcuts::ShortcutAction;
use crate::state::{AppState, OpenOutcome, StateEvent};
use crate::style::{self, configure_style};
use crate::ui::bookshelf::{BookshelfAction, BookshelfView, drop_overlay};
use crate::ui::keys::key_presses;
use crate::ui::reader_view::ReaderView;
use crate::ui::settings::{SettingsAction, SettingsWindow};
use crate::ui::title_bar::{self, TitleBar, TitleBarAction, TitleBarState};
use crate::window::{self, WindowRequest, WindowSize};
use egui::{Color32, Context, Frame, ViewportCommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct ReaderApp {
    state: AppState,
    events: Receiver<StateEvent>,
    saver_sender: Sender<SaverMessage>,
    saver_handle: Option<JoinHandle<()>>,
    pub response_sender: Sender<ResponseMessage>,
    response_receiver: Receiver<ResponseMessage>,
    tracker: ProgressTracker,
    reader: ReaderView,
    bookshelf: BookshelfView,
    settings_window: SettingsWindow,
    drag_hover: bool,
    /// Auto-hidden: nothing is painted and the window clears to transparent
    hidden: bool,
    /// Height of the last immersive resize, to follow setting changes
    immersive_height: Option<f32>,
}

impl ReaderApp {
    pub fn new(cc: &eframe::CreationContext<'_>, store: Store, initial_file: Option<PathBuf>) -> Self {
        configure_style(&cc.egui_ctx);

        let mut state = AppState::new();
        let events = state.subscribe();
        let (response_sender, response_receiver) = mpsc::channel();
        let repaint_ctx = cc.egui_ctx.clone();
        let (saver_sender, saver_handle) = spawn_saver(
            store.clone(),
            FsSource,
            response_sender.clone(),
            move || repaint_ctx.request_repaint(),
        );

        let resume = state.load_from_local(&store);
        let mut app = Self {
            state,
            events,
            saver_sender,
            saver_handle: Some(saver_handle),
            response_sender,
            response_receiver,
            tracker: ProgressTracker::default(),
            reader: ReaderView::default(),
            bookshelf: BookshelfView::default(),
            settings_window: SettingsWindow::new(),
            drag_hover: false,
            hidden: false,
            immersive_height: None,
        };
        // Loading is not an edit; nothing needs saving yet
        while app.events.try_recv().is_ok() {}

        match initial_file {
            Some(path) => {
                app.state.take_immersive_on_open();
                app.open_path(&path);
            }
            None => {
                if let Some(path) = resume {
                    info!("Resuming {:?}", path);
                    app.open_path(&path);
                }
            }
        }
        app
    }

    fn open_path(&mut self, path: &Path) {
        let ticket = self.state.begin_open(path);
        if let Err(e) = self.saver_sender.send(SaverMessage::Read(ticket)) {
            error!("Failed to send read message: {}", e);
        }
    }

    fn open_file_dialog(&self, ctx: &Context) {
        let sender = self.response_sender.clone();
        let ctx = ctx.clone();
        let start_dir = self
            .state
            .bookshelf()
            .books()
            .first()
            .and_then(|b| b.file_path.parent().map(Path::to_path_buf));
        std::thread::spawn(move || {
            let mut dialog = rfd::FileDialog::new().add_filter("文本文件", &["txt"]);
            if let Some(dir) = start_dir {
                dialog = dialog.set_directory(dir);
            }
            if let Some(path) = dialog.pick_file() {
                if let Err(e) = sender.send(ResponseMessage::OpenFile(path)) {
                    error!("Failed to send open message: {}", e);
                }
                ctx.request_repaint();
            }
        });
    }

    /// Write everything now, through the worker
    fn persist(&mut self) {
        self.tracker.flush();
        match self.state.snapshot().entries() {
            Ok(entries) => {
                if let Err(e) = self.saver_sender.send(SaverMessage::Persist(entries)) {
                    error!("Failed to send save message: {}", e);
                }
            }
            Err(e) => error!("Failed to serialize app data: {}", e),
        }
    }

    fn back_to_bookshelf(&mut self, ctx: &Context) {
        if let Some(request) = self.state.exit_immersive() {
            self.apply_window_request(ctx, request);
        }
        self.persist();
        self.state.back_to_bookshelf();
    }

    fn save_window_size(&self, ctx: &Context) {
        let Some(rect) = ctx.input(|i| i.viewport().inner_rect) else {
            warn!("Window size is unknown, not saving it");
            return;
        };
        let size = WindowSize {
            width: rect.width(),
            height: rect.height(),
        };
        match serde_json::to_value(size) {
            Ok(value) => {
                info!("Saving window size {}x{}", size.width, size.height);
                if let Err(e) = self
                    .saver_sender
                    .send(SaverMessage::Persist(vec![(KEY_WINDOW_SIZE, value)]))
                {
                    error!("Failed to send save message: {}", e);
                }
            }
            Err(e) => error!("Failed to serialize window size: {}", e),
        }
    }

    fn toggle_immersive(&mut self, ctx: &Context) {
        let request = self.state.toggle_immersive();
        self.apply_window_request(ctx, request);
    }

    fn apply_window_request(&mut self, ctx: &Context, request: WindowRequest) {
        let WindowRequest::Resize { height, immersive } = request;
        let (width, monitor) = ctx.input(|i| {
            (
                i.viewport().inner_rect.map(|r| r.width()),
                i.viewport().monitor_size,
            )
        });
        let requested = WindowSize {
            width: width.unwrap_or(DEFAULT_WINDOW_WIDTH),
            height,
        };
        let monitor = monitor.map(|m| WindowSize {
            width: m.x,
            height: m.y,
        });
        let size = window::clamp_to_monitor(requested, monitor);
        debug!(
            "Resizing window to {}x{} ({})",
            size.width,
            size.height,
            if immersive { "immersive" } else { "windowed" }
        );
        self.immersive_height = immersive.then_some(height);
        ctx.send_viewport_cmd(ViewportCommand::InnerSize(egui::vec2(size.width, size.height)));
    }

    fn run_action(&mut self, ctx: &Context, action: ShortcutAction) {
        debug!("Shortcut {:?}", action);
        match action {
            ShortcutAction::ToggleImmersive => self.toggle_immersive(ctx),
            ShortcutAction::ExitImmersive => {
                if let Some(request) = self.state.exit_immersive() {
                    self.apply_window_request(ctx, request);
                }
            }
            ShortcutAction::OpenFile => self.open_file_dialog(ctx),
            ShortcutAction::ToggleSettings => self.settings_window.toggle(&self.state),
            ShortcutAction::BackToBookshelf => self.back_to_bookshelf(ctx),
            ShortcutAction::SaveWindowSize => self.save_window_size(ctx),
        }
    }

    fn handle_responses(&mut self, ctx: &Context) {
        while let Ok(response) = self.response_receiver.try_recv() {
            match response {
                ResponseMessage::BookLoaded { ticket, result } => {
                    match self.state.finish_open(&ticket, result) {
                        OpenOutcome::Opened => {
                            if self.state.take_immersive_on_open() {
                                self.toggle_immersive(ctx);
                            }
                        }
                        OpenOutcome::Failed { path, file_name } => {
                            if self.state.bookshelf().find(&path).is_some() {
                                self.bookshelf.prompt_missing(path, file_name);
                            }
                        }
                        OpenOutcome::Stale => {}
                    }
                }
                ResponseMessage::Saved(Ok(())) => debug!("App data saved"),
                ResponseMessage::Saved(Err(e)) => warn!("Saving app data failed: {}", e),
                ResponseMessage::OpenFile(path) => self.open_path(&path),
            }
        }
    }

    fn handle_state_events(&mut self, ctx: &Context, now: Instant) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                StateEvent::BookOpened {
                    generation,
                    scroll_position,
                } => {
                    debug!("Showing content generation {}", generation);
                    self.reader.begin(scroll_position, now);
                    self.tracker.reset();
                    let title = self
                        .state
                        .current()
                        .map(|b| b.file_name.clone())
                        .unwrap_or_else(|| DEFAULT_WINDOW_TITLE.to_string());
                    ctx.send_viewport_cmd(ViewportCommand::Title(title));
                }
                StateEvent::BookClosed => {
                    self.reader.close();
                    ctx.send_viewport_cmd(ViewportCommand::Title(DEFAULT_WINDOW_TITLE.to_string()));
                }
                StateEvent::SettingsChanged => {
                    self.tracker.request_save(now);
                    self.follow_immersive_height(ctx);
                }
                StateEvent::BookshelfChanged | StateEvent::ShortcutsChanged => {
                    self.tracker.request_save(now);
                }
                StateEvent::ImmersiveChanged(_) | StateEvent::StartedReading => {}
            }
        }
    }

    /// Geometry settings changed while immersive; keep showing the configured
    /// number of lines
    fn follow_immersive_height(&mut self, ctx: &Context) {
        if !self.state.is_immersive() {
            return;
        }
        let request = window::enter_immersive_request(self.state.settings());
        let WindowRequest::Resize { height, .. } = request;
        if self.immersive_height != Some(height) {
            self.apply_window_request(ctx, request);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        for (key, ctrl) in key_presses(ctx) {
            if let Some(action) = self.state.dispatch_shortcut(&key, ctrl) {
                self.run_action(ctx, action);
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw
                    .dropped_files
                    .iter()
                    .filter_map(|f| f.path.clone())
                    .collect::<Vec<_>>(),
            )
        });
        if self.state.has_book() {
            self.drag_hover = false;
            return;
        }
        self.drag_hover = hovering;
        if dropped.is_empty() {
            return;
        }
        match dropped.iter().find(|p| is_supported_file(p)) {
            Some(path) => self.open_path(path),
            None => warn!("Ignoring dropped files without a .txt extension: {:?}", dropped),
        }
    }

    fn update_visibility(&mut self, ctx: &Context) {
        let auto_hide = window::should_auto_hide(
            self.state.settings(),
            self.state.is_immersive(),
            self.state.has_started_reading(),
        );
        let pointer_inside = ctx.input(|i| i.pointer.has_pointer());
        let hidden = window::window_opacity(auto_hide, pointer_inside) == 0.0;
        if hidden != self.hidden {
            debug!("Window {}", if hidden { "hidden" } else { "shown" });
            self.hidden = hidden;
        }
    }

    fn schedule_repaint(&self, ctx: &Context, now: Instant) {
        let next = [self.tracker.next_deadline(), self.reader.next_deadline()]
            .into_iter()
            .flatten()
            .min();
        if let Some(deadline) = next {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    fn show_title_bar(&mut self, ctx: &Context) {
        let mac = cfg!(target_os = "macos");
        let shortcuts = self.state.shortcuts();
        let hint = |action: ShortcutAction| {
            let shortcut = shortcuts.get(action);
            format!("{} ({})", shortcut.description, shortcut.label(mac))
        };
        let title = self
            .state
            .current()
            .map(|b| b.file_name.as_str())
            .unwrap_or(DEFAULT_WINDOW_TITLE);
        let title_state = TitleBarState {
            title,
            has_book: self.state.has_book(),
            open_hint: hint(ShortcutAction::OpenFile),
            settings_hint: hint(ShortcutAction::ToggleSettings),
            immersive_hint: hint(ShortcutAction::ToggleImmersive),
        };

        let action = egui::TopBottomPanel::top("title_bar_panel")
            .exact_height(TITLE_BAR_HEIGHT)
            .show(ctx, |ui| TitleBar::show(ui, title_state))
            .inner;

        match action {
            Some(TitleBarAction::BackToBookshelf) => self.back_to_bookshelf(ctx),
            Some(TitleBarAction::OpenFile) => self.open_file_dialog(ctx),
            Some(TitleBarAction::Settings) => self.settings_window.toggle(&self.state),
            Some(TitleBarAction::ToggleImmersive) => self.toggle_immersive(ctx),
            None => {}
        }
    }

    fn show_bookshelf(&mut self, ctx: &Context) {
        let frame = Frame::central_panel(&ctx.style()).fill(Color32::from_gray(248));
        let action = egui::CentralPanel::default()
            .frame(frame)
            .show(ctx, |ui| {
                if self.state.pending_open().is_some() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("正在打开…");
                    });
                }
                self.bookshelf.show(ui, self.state.bookshelf())
            })
            .inner;

        match action {
            Some(BookshelfAction::Import) => self.open_file_dialog(ctx),
            Some(BookshelfAction::Open(path)) => self.open_path(&path),
            Some(BookshelfAction::Remove(path)) => self.state.remove_book(&path),
            None => {}
        }
        if self.drag_hover {
            drop_overlay(ctx);
        }
    }

    fn show_reader(&mut self, ctx: &Context, now: Instant) {
        let page = style::page_color(self.state.settings());
        let immersive = self.state.is_immersive();
        egui::CentralPanel::default()
            .frame(Frame::new().fill(page))
            .show(ctx, |ui| {
                self.reader.show(ui, &mut self.state, &mut self.tracker, now);
                if immersive {
                    title_bar::drag_strip(ui, DRAG_STRIP_HEIGHT);
                }
            });
    }
}

impl eframe::App for ReaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        self.handle_responses(ctx);
        self.handle_shortcuts(ctx);
        self.handle_dropped_files(ctx);
        self.handle_state_events(ctx, now);
        self.update_visibility(ctx);

        if self.hidden {
            egui::CentralPanel::default()
                .frame(Frame::NONE)
                .show(ctx, |_ui| {});
        } else {
            if !self.state.is_immersive() {
                self.show_title_bar(ctx);
            }
            if self.state.has_book() {
                self.show_reader(ctx, now);
            } else {
                self.show_bookshelf(ctx);
            }
        }

        self.settings_window.show(ctx, &mut self.state);
        if let Some(SettingsAction::SaveWindowSize) = self.settings_window.take_pending_action() {
            self.save_window_size(ctx);
        }

        // Edits made this frame (scrolling, settings, removals)
        self.handle_state_events(ctx, now);

        if self.tracker.save_due(now) {
            self.persist();
        }
        self.schedule_repaint(ctx, now);
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        if self.hidden {
            [0.0; 4]
        } else {
            egui::Rgba::from(style::page_color(self.state.settings())).to_array()
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.persist();
        if let Err(e) = self.saver_sender.send(SaverMessage::Shutdown) {
            error!("Failed to send shutdown message: {}", e);
        }
        // The last save must land before the process exits
        if let Some(handle) = self.saver_handle.take()
            && handle.join().is_err()
        {
            error!("Saver thread panicked");
        }
    }
}
