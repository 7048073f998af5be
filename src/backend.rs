//! Disk-facing pieces: the JSON data store, the bookshelf records it holds,
//! and the file import boundary.

pub mod bookshelf;
pub mod import;
pub mod store;
