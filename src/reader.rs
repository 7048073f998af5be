//! The reading core: paragraphs, estimated layout, progress and scroll
//! restoration. Nothing in here touches egui.

pub mod layout;
pub mod paragraphs;
pub mod progress;
pub mod restore;
