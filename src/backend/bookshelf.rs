use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One imported book and where the reader left it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub file_path: PathBuf,
    pub file_name: String,
    /// Length of the content in characters
    pub total_length: usize,
    #[serde(default)]
    pub scroll_position: f32,
    #[serde(default)]
    pub progress: f32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_read: DateTime<Utc>,
}

impl BookRecord {
    pub fn new(file_path: PathBuf, file_name: String, content: &str) -> Self {
        Self {
            file_path,
            file_name,
            total_length: content.chars().count(),
            scroll_position: 0.0,
            progress: 0.0,
            last_read: Utc::now(),
        }
    }
}

/// Fraction of the estimated content height above the viewport top
pub fn compute_progress(scroll_position: f32, total_height: f32) -> f32 {
    if total_height > 0.0 && scroll_position.is_finite() {
        (scroll_position / total_height).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Imported books, most recently read first.
///
/// `file_path` is unique within the shelf; every insertion goes through
/// [`Bookshelf::add_or_touch`], which enforces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bookshelf {
    books: Vec<BookRecord>,
}

impl Bookshelf {
    /// Build from persisted records, dropping later duplicates of a path
    pub fn from_records(records: Vec<BookRecord>) -> Self {
        let mut books: Vec<BookRecord> = Vec::with_capacity(records.len());
        for record in records {
            if !books.iter().any(|b| b.file_path == record.file_path) {
                books.push(record);
            }
        }
        Self { books }
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn find(&self, path: &Path) -> Option<&BookRecord> {
        self.books.iter().find(|b| b.file_path == path)
    }

    fn find_mut(&mut self, path: &Path) -> Option<&mut BookRecord> {
        self.books.iter_mut().find(|b| b.file_path == path)
    }

    /// Refresh an existing record's `last_read` and move it to the front,
    /// or insert a fresh record at the front.
    pub fn add_or_touch(&mut self, path: &Path, name: &str, content: &str) {
        match self.books.iter().position(|b| b.file_path == path) {
            Some(index) => {
                let mut book = self.books.remove(index);
                book.last_read = Utc::now();
                self.books.insert(0, book);
            }
            None => {
                let book = BookRecord::new(path.to_path_buf(), name.to_string(), content);
                self.books.insert(0, book);
            }
        }
    }

    /// Returns whether a record was removed
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.books.len();
        self.books.retain(|b| b.file_path != path);
        self.books.len() != before
    }

    /// Record a scroll observation. Unknown paths are ignored.
    pub fn update_progress(&mut self, path: &Path, scroll_position: f32, total_height: f32) -> bool {
        match self.find_mut(path) {
            Some(book) => {
                book.scroll_position = scroll_position;
                book.progress = compute_progress(scroll_position, total_height);
                book.last_read = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Store the scroll position without recomputing progress
    pub fn sync_scroll_position(&mut self, path: &Path, scroll_position: f32) {
        if let Some(book) = self.find_mut(path) {
            book.scroll_position = scroll_position;
            book.last_read = Utc::now();
        }
    }
}
