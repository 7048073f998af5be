pub mod bookshelf;
pub mod font;
pub mod keys;
pub mod reader_view;
pub mod settings;
pub mod title_bar;
pub mod viewport;
