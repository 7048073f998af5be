use crate::backend::import::{ImportError, LoadedText};
use crate::state::OpenTicket;
use std::path::PathBuf;

/// Response messages from background operations
pub enum ResponseMessage {
    BookLoaded {
        ticket: OpenTicket,
        result: Result<LoadedText, ImportError>,
    },
    Saved(Result<(), String>),
    /// Picked in the file dialog or passed on the command line
    OpenFile(PathBuf),
}
