//! Paper Reader library
//!
//! A desktop reader for plain-text novels: a bookshelf that remembers where
//! each book was left, and a virtualized reading view with an immersive mode.

pub mod app;
pub mod backend;
pub mod config;
pub mod constant;
pub mod messages;
pub mod reader;
pub mod saver;
pub mod shortcuts;
pub mod state;
pub mod style;
pub mod ui;
pub mod window;
