//! Application state.
//!
//! One `AppState` is owned by the app and handed to views by reference. All
//! mutation goes through its methods, which publish [`StateEvent`]s to any
//! subscriber so views know what to refresh.

use crate::backend::bookshelf::{BookRecord, Bookshelf};
use crate::backend::import::{BookSource, ImportError, LoadedText, display_name};
use crate::backend::store::Store;
use crate::config::ReaderSettings;
use crate::constant::{KEY_BOOKSHELF, KEY_CURRENT_BOOK, KEY_SETTINGS, KEY_SHORTCUTS};
use crate::reader::paragraphs::Paragraphs;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::window::{self, WindowRequest};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    BookshelfChanged,
    SettingsChanged,
    ShortcutsChanged,
    /// New content is on screen; the renderer should restore `scroll_position`
    BookOpened { generation: u64, scroll_position: f32 },
    BookClosed,
    ImmersiveChanged(bool),
    StartedReading,
}

/// The book currently on screen
#[derive(Debug, Clone)]
pub struct OpenBook {
    pub path: PathBuf,
    pub file_name: String,
    pub paragraphs: Paragraphs,
    /// Bumped on every content swap; keys the layout cache
    pub generation: u64,
}

/// Identifies one in-flight read so a late answer can be recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTicket {
    pub id: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened,
    /// The file could not be read; the caller may offer removing it
    Failed { path: PathBuf, file_name: String },
    /// The user moved on before the read completed
    Stale,
}

/// Everything written by a save, taken from the state at save time
#[derive(Debug, Clone, PartialEq)]
pub struct PersistSnapshot {
    pub bookshelf: Vec<BookRecord>,
    pub current_book: Option<PathBuf>,
    pub settings: ReaderSettings,
    pub shortcuts: ShortcutMap,
}

impl PersistSnapshot {
    pub fn entries(&self) -> Result<Vec<(&'static str, Value)>, serde_json::Error> {
        Ok(vec![
            (KEY_BOOKSHELF, serde_json::to_value(&self.bookshelf)?),
            (KEY_CURRENT_BOOK, serde_json::to_value(&self.current_book)?),
            (KEY_SETTINGS, serde_json::to_value(&self.settings)?),
            (KEY_SHORTCUTS, serde_json::to_value(&self.shortcuts)?),
        ])
    }
}

#[derive(Default)]
pub struct AppState {
    settings: ReaderSettings,
    shortcuts: ShortcutMap,
    bookshelf: Bookshelf,
    current: Option<OpenBook>,
    scroll_position: f32,
    immersive: bool,
    has_started_reading: bool,
    pending_open: Option<OpenTicket>,
    next_ticket: u64,
    next_generation: u64,
    /// Last session's book; immersive mode comes back when it reopens
    resume: Option<PathBuf>,
    subscribers: Vec<Sender<StateEvent>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every future state change
    pub fn subscribe(&mut self) -> Receiver<StateEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    fn emit(&mut self, event: StateEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn shortcuts(&self) -> &ShortcutMap {
        &self.shortcuts
    }

    pub fn bookshelf(&self) -> &Bookshelf {
        &self.bookshelf
    }

    pub fn current(&self) -> Option<&OpenBook> {
        self.current.as_ref()
    }

    pub fn has_book(&self) -> bool {
        self.current.is_some()
    }

    pub fn scroll_position(&self) -> f32 {
        self.scroll_position
    }

    pub fn is_immersive(&self) -> bool {
        self.immersive
    }

    pub fn has_started_reading(&self) -> bool {
        self.has_started_reading
    }

    pub fn pending_open(&self) -> Option<&OpenTicket> {
        self.pending_open.as_ref()
    }

    /// Restore settings, shortcuts and the bookshelf. Returns the book that
    /// was open last time, if it is still on the shelf; the caller opens it
    /// and the reader enters immersive mode once it is on screen.
    pub fn load_from_local(&mut self, store: &Store) -> Option<PathBuf> {
        if let Some(settings) = store.load::<ReaderSettings>(KEY_SETTINGS) {
            self.settings = settings.clamped();
            self.emit(StateEvent::SettingsChanged);
        }
        if let Some(persisted) = store.load::<BTreeMap<String, Value>>(KEY_SHORTCUTS) {
            self.shortcuts.merge_persisted(persisted);
            self.emit(StateEvent::ShortcutsChanged);
        }
        if let Some(records) = store.load::<Vec<BookRecord>>(KEY_BOOKSHELF) {
            self.bookshelf = Bookshelf::from_records(records);
            info!("Loaded {} books from the shelf", self.bookshelf.len());
            self.emit(StateEvent::BookshelfChanged);
        }

        let current = store.load::<PathBuf>(KEY_CURRENT_BOOK)?;
        if self.bookshelf.find(&current).is_some() {
            self.resume = Some(current.clone());
            Some(current)
        } else {
            None
        }
    }

    /// What a save writes right now, with the open book's scroll position
    /// folded into its record
    pub fn snapshot(&self) -> PersistSnapshot {
        let mut bookshelf = self.bookshelf.clone();
        if let Some(book) = &self.current {
            bookshelf.sync_scroll_position(&book.path, self.scroll_position);
        }
        PersistSnapshot {
            bookshelf: bookshelf.books().to_vec(),
            current_book: self.current.as_ref().map(|b| b.path.clone()),
            settings: self.settings.clone(),
            shortcuts: self.shortcuts.clone(),
        }
    }

    /// Start opening a book; the read itself happens elsewhere
    pub fn begin_open(&mut self, path: &Path) -> OpenTicket {
        self.next_ticket += 1;
        let ticket = OpenTicket {
            id: self.next_ticket,
            path: path.to_path_buf(),
        };
        if self.resume.as_deref().is_some_and(|resume| resume != path) {
            self.resume = None;
        }
        self.pending_open = Some(ticket.clone());
        ticket
    }

    /// Apply the result of a read started with [`AppState::begin_open`]
    pub fn finish_open(
        &mut self,
        ticket: &OpenTicket,
        result: Result<LoadedText, ImportError>,
    ) -> OpenOutcome {
        if self.pending_open.as_ref() != Some(ticket) {
            info!("Discarding stale read of {:?}", ticket.path);
            return OpenOutcome::Stale;
        }
        self.pending_open = None;
        let path = ticket.path.clone();
        let file_name = self
            .bookshelf
            .find(&path)
            .map(|b| b.file_name.clone())
            .unwrap_or_else(|| display_name(&path));

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Failed to open book: {}", e);
                self.resume = None;
                return OpenOutcome::Failed { path, file_name };
            }
        };

        let scroll_position = self
            .bookshelf
            .find(&path)
            .map(|b| b.scroll_position)
            .unwrap_or(0.0);
        self.bookshelf.add_or_touch(&path, &file_name, &loaded.content);

        self.next_generation += 1;
        let generation = self.next_generation;
        info!(
            "Opened {:?} ({}), resuming at {}",
            path, loaded.encoding, scroll_position
        );
        self.current = Some(OpenBook {
            path,
            file_name,
            paragraphs: Paragraphs::from_content(&loaded.content),
            generation,
        });
        self.scroll_position = scroll_position;
        self.has_started_reading = false;

        self.emit(StateEvent::BookshelfChanged);
        self.emit(StateEvent::BookOpened {
            generation,
            scroll_position,
        });
        OpenOutcome::Opened
    }

    /// Open synchronously through `source`. Returns false when the file
    /// could not be read; the catalog is left untouched in that case.
    pub fn open_book(&mut self, path: &Path, source: &impl BookSource) -> bool {
        let ticket = self.begin_open(path);
        let result = source.read(path);
        self.finish_open(&ticket, result) == OpenOutcome::Opened
    }

    /// Whether the freshly opened book should bring up immersive mode
    pub fn take_immersive_on_open(&mut self) -> bool {
        self.resume.take().is_some()
    }

    pub fn remove_book(&mut self, path: &Path) {
        if !self.bookshelf.remove(path) {
            return;
        }
        info!("Removed {:?} from the shelf", path);
        self.emit(StateEvent::BookshelfChanged);
        if self.current.as_ref().is_some_and(|b| b.path == path) {
            self.close_current();
        }
    }

    /// Record a scroll observation on the matching record
    pub fn update_book_progress(&mut self, path: &Path, scroll_position: f32, total_height: f32) {
        if self
            .bookshelf
            .update_progress(path, scroll_position, total_height)
        {
            self.emit(StateEvent::BookshelfChanged);
        }
    }

    pub fn set_scroll_position(&mut self, position: f32) {
        self.scroll_position = position;
    }

    pub fn mark_started_reading(&mut self) {
        if !self.has_started_reading {
            self.has_started_reading = true;
            self.emit(StateEvent::StartedReading);
        }
    }

    /// Keep the reading position on the shelf and close the book
    pub fn back_to_bookshelf(&mut self) {
        if let Some(book) = &self.current {
            let path = book.path.clone();
            self.bookshelf
                .sync_scroll_position(&path, self.scroll_position);
            self.emit(StateEvent::BookshelfChanged);
        }
        self.pending_open = None;
        self.close_current();
    }

    fn close_current(&mut self) {
        self.current = None;
        self.scroll_position = 0.0;
        self.has_started_reading = false;
        self.emit(StateEvent::BookClosed);
    }

    pub fn update_settings(&mut self, update: impl FnOnce(&mut ReaderSettings)) {
        let mut settings = self.settings.clone();
        update(&mut settings);
        let settings = settings.clamped();
        if settings != self.settings {
            self.settings = settings;
            self.emit(StateEvent::SettingsChanged);
        }
    }

    pub fn rebind_shortcut(&mut self, action: ShortcutAction, key: String, ctrl: bool) {
        self.shortcuts.rebind(action, key, ctrl);
        self.emit(StateEvent::ShortcutsChanged);
    }

    pub fn toggle_immersive(&mut self) -> WindowRequest {
        if self.immersive {
            self.set_immersive(false);
            window::exit_immersive_request()
        } else {
            self.set_immersive(true);
            window::enter_immersive_request(&self.settings)
        }
    }

    pub fn exit_immersive(&mut self) -> Option<WindowRequest> {
        if !self.immersive {
            return None;
        }
        self.set_immersive(false);
        Some(window::exit_immersive_request())
    }

    fn set_immersive(&mut self, immersive: bool) {
        self.immersive = immersive;
        self.emit(StateEvent::ImmersiveChanged(immersive));
    }

    /// Resolve a key press to the first bound action allowed right now
    pub fn dispatch_shortcut(&self, key: &str, ctrl: bool) -> Option<ShortcutAction> {
        self.shortcuts
            .matching(key, ctrl)
            .into_iter()
            .find(|action| match action {
                ShortcutAction::ToggleImmersive => self.has_book(),
                ShortcutAction::ExitImmersive => self.immersive,
                ShortcutAction::OpenFile => !self.has_book(),
                ShortcutAction::BackToBookshelf => self.has_book(),
                ShortcutAction::ToggleSettings | ShortcutAction::SaveWindowSize => true,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::import::TextEncoding;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::fs;
    use std::io;
    use uuid::Uuid;

    /// In-memory files; counts reads
    #[derive(Default)]
    struct MemSource {
        files: HashMap<PathBuf, String>,
        reads: Cell<usize>,
    }

    impl MemSource {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(p, c)| (PathBuf::from(p), c.to_string()))
                    .collect(),
                reads: Cell::new(0),
            }
        }
    }

    impl BookSource for MemSource {
        fn read(&self, path: &Path) -> Result<LoadedText, ImportError> {
            self.reads.set(self.reads.get() + 1);
            self.files
                .get(path)
                .map(|content| LoadedText {
                    content: content.clone(),
                    encoding: TextEncoding::Utf8,
                })
                .ok_or_else(|| ImportError::Io {
                    path: path.to_path_buf(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                })
        }
    }

    fn drain(receiver: &Receiver<StateEvent>) -> Vec<StateEvent> {
        receiver.try_iter().collect()
    }

    #[test]
    fn test_open_imports_and_splits() {
        let source = MemSource::with(&[("/books/a.txt", "Title\n\nPara one.\nPara two.\n")]);
        let mut state = AppState::new();

        assert!(state.open_book(Path::new("/books/a.txt"), &source));

        let book = state.current().unwrap();
        assert_eq!(book.file_name, "a.txt");
        assert_eq!(
            book.paragraphs.iter().collect::<Vec<_>>(),
            vec!["Title", "Para one.", "Para two."]
        );
        assert_eq!(state.bookshelf().len(), 1);
        assert_eq!(state.scroll_position(), 0.0);
    }

    #[test]
    fn test_unreadable_unknown_book_leaves_catalog_unchanged() {
        let source = MemSource::with(&[("/books/a.txt", "a")]);
        let mut state = AppState::new();
        state.open_book(Path::new("/books/a.txt"), &source);
        let before = state.bookshelf().clone();

        let ticket = state.begin_open(Path::new("/missing.txt"));
        let outcome = state.finish_open(&ticket, source.read(Path::new("/missing.txt")));
        assert_eq!(
            outcome,
            OpenOutcome::Failed {
                path: PathBuf::from("/missing.txt"),
                file_name: "missing.txt".to_string()
            }
        );
        assert_eq!(state.bookshelf(), &before);
        assert_eq!(state.current().unwrap().path, PathBuf::from("/books/a.txt"));

        assert!(!state.open_book(Path::new("/missing.txt"), &source));
        assert_eq!(state.bookshelf(), &before);
    }

    #[test]
    fn test_progress_round_trip_through_open() {
        let source = MemSource::with(&[("/books/a.txt", "x\ny"), ("/books/b.txt", "z")]);
        let mut state = AppState::new();
        state.open_book(Path::new("/books/a.txt"), &source);

        state.set_scroll_position(500.0);
        state.update_book_progress(Path::new("/books/a.txt"), 500.0, 1000.0);
        let record = state.bookshelf().find(Path::new("/books/a.txt")).unwrap();
        assert_eq!(record.progress, 0.5);

        state.open_book(Path::new("/books/b.txt"), &source);
        assert_eq!(state.scroll_position(), 0.0);

        let events = state.subscribe();
        assert!(state.open_book(Path::new("/books/a.txt"), &source));
        assert_eq!(state.scroll_position(), 500.0);
        assert!(drain(&events).contains(&StateEvent::BookOpened {
            generation: 3,
            scroll_position: 500.0
        }));
        assert_eq!(
            state.bookshelf().books()[0].file_path,
            PathBuf::from("/books/a.txt")
        );
    }

    #[test]
    fn test_progress_for_unknown_path_is_ignored() {
        let mut state = AppState::new();
        let events = state.subscribe();
        state.update_book_progress(Path::new("/nowhere.txt"), 10.0, 100.0);
        assert!(state.bookshelf().is_empty());
        assert!(drain(&events).is_empty());
    }

    #[test]
    fn test_stale_read_is_discarded() {
        let source = MemSource::with(&[("/books/a.txt", "a"), ("/books/b.txt", "b")]);
        let mut state = AppState::new();

        let first = state.begin_open(Path::new("/books/a.txt"));
        let second = state.begin_open(Path::new("/books/b.txt"));

        let late = state.finish_open(&first, source.read(&first.path));
        assert_eq!(late, OpenOutcome::Stale);
        assert!(state.current().is_none());
        assert!(state.bookshelf().is_empty());

        assert_eq!(
            state.finish_open(&second, source.read(&second.path)),
            OpenOutcome::Opened
        );
        assert_eq!(state.current().unwrap().path, PathBuf::from("/books/b.txt"));

        // Going back to the shelf abandons an in-flight read too
        let third = state.begin_open(Path::new("/books/a.txt"));
        state.back_to_bookshelf();
        assert_eq!(
            state.finish_open(&third, source.read(&third.path)),
            OpenOutcome::Stale
        );
        assert!(state.current().is_none());
        assert_eq!(source.reads.get(), 3);
    }

    #[test]
    fn test_remove_current_book_closes_it() {
        let source = MemSource::with(&[("/books/a.txt", "a"), ("/books/b.txt", "b")]);
        let mut state = AppState::new();
        state.open_book(Path::new("/books/a.txt"), &source);
        state.open_book(Path::new("/books/b.txt"), &source);
        let events = state.subscribe();

        state.remove_book(Path::new("/books/a.txt"));
        assert!(state.has_book());

        state.remove_book(Path::new("/books/b.txt"));
        assert!(!state.has_book());
        assert!(state.bookshelf().is_empty());
        assert!(drain(&events).contains(&StateEvent::BookClosed));
    }

    #[test]
    fn test_back_to_bookshelf_keeps_position() {
        let source = MemSource::with(&[("/books/a.txt", "a")]);
        let mut state = AppState::new();
        state.open_book(Path::new("/books/a.txt"), &source);
        state.set_scroll_position(321.0);
        state.mark_started_reading();

        state.back_to_bookshelf();

        assert!(!state.has_book());
        assert!(!state.has_started_reading());
        assert_eq!(state.scroll_position(), 0.0);
        let record = state.bookshelf().find(Path::new("/books/a.txt")).unwrap();
        assert_eq!(record.scroll_position, 321.0);
    }

    #[test]
    fn test_snapshot_reflects_latest_state() {
        let source = MemSource::with(&[("/books/a.txt", "a")]);
        let mut state = AppState::new();
        state.open_book(Path::new("/books/a.txt"), &source);
        state.set_scroll_position(42.0);
        state.update_settings(|s| s.font_size = 24.0);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.current_book, Some(PathBuf::from("/books/a.txt")));
        assert_eq!(snapshot.bookshelf[0].scroll_position, 42.0);
        assert_eq!(snapshot.settings.font_size, 24.0);

        // The live shelf itself is untouched by taking a snapshot
        assert_eq!(state.bookshelf().books()[0].scroll_position, 0.0);
    }

    #[test]
    fn test_save_and_load_from_local() {
        let test_dir = std::env::temp_dir().join(format!("test_state_{}", Uuid::new_v4()));
        let store = Store::new(test_dir.join("app-data.json"));
        let source = MemSource::with(&[("/books/a.txt", "a\nb"), ("/books/b.txt", "c")]);

        let mut state = AppState::new();
        state.open_book(Path::new("/books/b.txt"), &source);
        state.open_book(Path::new("/books/a.txt"), &source);
        state.set_scroll_position(77.0);
        state.update_settings(|s| s.background_color = "#1e1e1e".to_string());
        state.rebind_shortcut(ShortcutAction::OpenFile, "p".to_string(), true);
        store.save_entries(state.snapshot().entries().unwrap()).unwrap();

        let mut restored = AppState::new();
        let current = restored.load_from_local(&store);
        assert_eq!(current, Some(PathBuf::from("/books/a.txt")));
        assert_eq!(restored.settings().background_color, "#1e1e1e");
        assert_eq!(restored.shortcuts().get(ShortcutAction::OpenFile).key, "p");
        assert_eq!(restored.bookshelf().len(), 2);

        assert!(restored.open_book(&current.unwrap(), &source));
        assert_eq!(restored.scroll_position(), 77.0);
        assert!(restored.take_immersive_on_open());
        assert!(!restored.take_immersive_on_open());

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn test_resume_superseded_by_another_book_stays_windowed() {
        let test_dir = std::env::temp_dir().join(format!("test_state_{}", Uuid::new_v4()));
        let store = Store::new(test_dir.join("app-data.json"));
        let source = MemSource::with(&[("/books/a.txt", "a"), ("/books/b.txt", "b")]);

        let mut state = AppState::new();
        state.open_book(Path::new("/books/b.txt"), &source);
        state.open_book(Path::new("/books/a.txt"), &source);
        store.save_entries(state.snapshot().entries().unwrap()).unwrap();

        let mut restored = AppState::new();
        let current = restored.load_from_local(&store).unwrap();
        let resume_ticket = restored.begin_open(&current);
        let other_ticket = restored.begin_open(Path::new("/books/b.txt"));

        let stale = source.read(&resume_ticket.path);
        assert_eq!(
            restored.finish_open(&resume_ticket, stale),
            OpenOutcome::Stale
        );
        let result = source.read(&other_ticket.path);
        assert_eq!(
            restored.finish_open(&other_ticket, result),
            OpenOutcome::Opened
        );
        assert!(!restored.take_immersive_on_open());

        // Reopening the resumed book itself keeps the request
        let mut again = AppState::new();
        let current = again.load_from_local(&store).unwrap();
        again.begin_open(&current);
        assert!(again.open_book(&current, &source));
        assert!(again.take_immersive_on_open());

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn test_load_from_empty_store_uses_defaults() {
        let test_dir = std::env::temp_dir().join(format!("test_state_{}", Uuid::new_v4()));
        let store = Store::new(test_dir.join("app-data.json"));

        let mut state = AppState::new();
        assert_eq!(state.load_from_local(&store), None);
        assert_eq!(state.settings(), &ReaderSettings::default());
        assert!(state.bookshelf().is_empty());

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn test_immersive_toggle_and_shortcut_guards() {
        let source = MemSource::with(&[("/books/a.txt", "a")]);
        let mut state = AppState::new();

        assert_eq!(state.dispatch_shortcut("Enter", true), None);
        assert_eq!(
            state.dispatch_shortcut("o", true),
            Some(ShortcutAction::OpenFile)
        );
        assert_eq!(state.dispatch_shortcut("Escape", false), None);

        state.open_book(Path::new("/books/a.txt"), &source);
        assert_eq!(state.dispatch_shortcut("o", true), None);
        assert_eq!(
            state.dispatch_shortcut("b", true),
            Some(ShortcutAction::BackToBookshelf)
        );

        let request = state.toggle_immersive();
        assert!(state.is_immersive());
        assert_eq!(
            request,
            WindowRequest::Resize {
                height: window::immersive_height(state.settings()),
                immersive: true
            }
        );
        assert_eq!(
            state.dispatch_shortcut("Escape", false),
            Some(ShortcutAction::ExitImmersive)
        );

        assert!(state.exit_immersive().is_some());
        assert!(state.exit_immersive().is_none());
        assert!(!state.is_immersive());
    }

    #[test]
    fn test_settings_updates_are_clamped_and_deduplicated() {
        let mut state = AppState::new();
        let events = state.subscribe();

        state.update_settings(|s| s.font_size = 100.0);
        assert_eq!(state.settings().font_size, 32.0);
        state.update_settings(|s| s.font_size = 40.0);

        let changes = drain(&events)
            .into_iter()
            .filter(|e| *e == StateEvent::SettingsChanged)
            .count();
        assert_eq!(changes, 1);
    }
}
