use crate::constant::SAVE_DEBOUNCE_MS;
use crate::state::AppState;
use std::time::{Duration, Instant};

/// Coalesces a burst of requests into one, `delay` after the last of them.
///
/// It only says *when* to act; whoever polls it reads the state to save at
/// that moment.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// (Re)arm the timer
    pub fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once per armed burst, when its deadline has passed
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Turns scroll observations into reading progress and schedules saves
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    save: Debounce,
    last_offset: Option<f32>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(SAVE_DEBOUNCE_MS))
    }
}

impl ProgressTracker {
    pub fn new(save_delay: Duration) -> Self {
        Self {
            save: Debounce::new(save_delay),
            last_offset: None,
        }
    }

    /// Forget the previous offset, e.g. after new content was loaded
    pub fn reset(&mut self) {
        self.last_offset = None;
    }

    /// Handle the scroll offset seen this frame. Unchanged offsets are not
    /// scroll events. While `restoring` the offset belongs to the restore,
    /// not to the reader, and is only remembered.
    /// Returns whether it counted as a scroll event.
    pub fn observe(
        &mut self,
        state: &mut AppState,
        offset: f32,
        total_height: f32,
        restoring: bool,
        now: Instant,
    ) -> bool {
        if self.last_offset == Some(offset) {
            return false;
        }
        self.last_offset = Some(offset);
        if restoring {
            return false;
        }
        state.set_scroll_position(offset);

        state.mark_started_reading();
        if let Some(path) = state.current().map(|b| b.path.clone())
            && total_height > 0.0
        {
            state.update_book_progress(&path, offset, total_height);
        }
        self.save.poke(now);
        true
    }

    /// Ask for a save outside of scrolling (settings edits, shelf changes)
    pub fn request_save(&mut self, now: Instant) {
        self.save.poke(now);
    }

    /// True when the debounced save should be written now
    pub fn save_due(&mut self, now: Instant) -> bool {
        self.save.fire_due(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.save.deadline()
    }

    /// A save is about to happen anyway (exit, back to shelf)
    pub fn flush(&mut self) {
        self.save.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::import::{BookSource, ImportError, LoadedText, TextEncoding};
    use std::path::Path;

    struct OneBook;

    impl BookSource for OneBook {
        fn read(&self, _path: &Path) -> Result<LoadedText, ImportError> {
            Ok(LoadedText {
                content: "第一章\n正文".to_string(),
                encoding: TextEncoding::Utf8,
            })
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn reading_state() -> AppState {
        let mut state = AppState::new();
        assert!(state.open_book(Path::new("/books/a.txt"), &OneBook));
        state
    }

    #[test]
    fn test_burst_of_scrolls_saves_once() {
        let start = Instant::now();
        let mut state = reading_state();
        let mut tracker = ProgressTracker::default();
        let mut saves = 0;

        // 10 scroll events 50ms apart, polling every 50ms for 3s
        for tick in 0..60u64 {
            let now = start + ms(tick * 50);
            if tick < 10 {
                tracker.observe(&mut state, (tick * 40) as f32, 4000.0, false, now);
            }
            if tracker.save_due(now) {
                saves += 1;
                assert!(now >= start + ms(9 * 50 + 1000));
            }
        }
        assert_eq!(saves, 1);
    }

    #[test]
    fn test_separate_bursts_save_separately() {
        let start = Instant::now();
        let mut state = reading_state();
        let mut tracker = ProgressTracker::default();

        tracker.observe(&mut state, 10.0, 100.0, false, start);
        assert!(!tracker.save_due(start + ms(999)));
        assert!(tracker.save_due(start + ms(1000)));
        assert!(!tracker.save_due(start + ms(1001)));

        tracker.observe(&mut state, 20.0, 100.0, false, start + ms(5000));
        assert!(tracker.save_due(start + ms(6000)));
    }

    #[test]
    fn test_observe_updates_progress_and_reading_flag() {
        let now = Instant::now();
        let mut state = reading_state();
        let mut tracker = ProgressTracker::default();

        assert!(tracker.observe(&mut state, 500.0, 1000.0, false, now));
        assert!(state.has_started_reading());
        assert_eq!(state.scroll_position(), 500.0);
        let record = state.bookshelf().find(Path::new("/books/a.txt")).unwrap();
        assert_eq!(record.progress, 0.5);

        // The same offset again is not a scroll
        assert!(!tracker.observe(&mut state, 500.0, 1000.0, false, now));
    }

    #[test]
    fn test_restoring_suppresses_side_effects() {
        let now = Instant::now();
        let mut state = reading_state();
        let mut tracker = ProgressTracker::default();

        assert!(!tracker.observe(&mut state, 800.0, 1000.0, true, now));
        assert_eq!(state.scroll_position(), 0.0);
        assert!(!state.has_started_reading());
        let record = state.bookshelf().find(Path::new("/books/a.txt")).unwrap();
        assert_eq!(record.progress, 0.0);
        assert!(tracker.next_deadline().is_none());
    }

    #[test]
    fn test_zero_total_height_gives_zero_progress() {
        let now = Instant::now();
        let mut state = reading_state();
        state.update_book_progress(Path::new("/books/a.txt"), 30.0, 0.0);
        let mut tracker = ProgressTracker::default();
        tracker.observe(&mut state, 30.0, 0.0, false, now);
        let record = state.bookshelf().find(Path::new("/books/a.txt")).unwrap();
        assert_eq!(record.progress, 0.0);
        assert!(tracker.next_deadline().is_some());

        tracker.flush();
        assert!(tracker.next_deadline().is_none());
    }
}
