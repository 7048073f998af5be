use crate::backend::bookshelf::{BookRecord, Bookshelf};
use crate::style::ACCENT;
use chrono::{DateTime, Local, Utc};
use egui::{Align, Color32, Context, CornerRadius, Layout, RichText, Sense, Stroke, Ui, UiBuilder};
use std::path::PathBuf;

const ROW_HEIGHT: f32 = 76.0;

pub enum BookshelfAction {
    Import,
    Open(PathBuf),
    Remove(PathBuf),
}

struct PendingBook {
    path: PathBuf,
    file_name: String,
}

/// The library screen shown while no book is open
#[derive(Default)]
pub struct BookshelfView {
    confirm_remove: Option<PendingBook>,
    missing: Option<PendingBook>,
}

impl BookshelfView {
    /// Ask whether a book that could not be opened should leave the shelf
    pub fn prompt_missing(&mut self, path: PathBuf, file_name: String) {
        self.missing = Some(PendingBook { path, file_name });
    }

    pub fn show(&mut self, ui: &mut Ui, shelf: &Bookshelf) -> Option<BookshelfAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.heading("我的书架");
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("＋ 导入书籍").clicked() {
                    action = Some(BookshelfAction::Import);
                }
            });
        });
        ui.separator();

        if shelf.is_empty() {
            show_empty(ui);
        } else {
            let now = Utc::now();
            egui::ScrollArea::vertical()
                .id_salt("bookshelf_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for book in shelf.books() {
                        match show_row(ui, book, now) {
                            Some(RowClick::Open) => {
                                action = Some(BookshelfAction::Open(book.file_path.clone()));
                            }
                            Some(RowClick::Remove) => {
                                self.confirm_remove = Some(PendingBook {
                                    path: book.file_path.clone(),
                                    file_name: book.file_name.clone(),
                                });
                            }
                            None => {}
                        }
                    }
                });
        }

        if let Some(confirmed) = self.show_dialogs(ui.ctx()) {
            action = Some(BookshelfAction::Remove(confirmed));
        }
        action
    }

    /// Both confirmations end in removal; returns the path to remove
    fn show_dialogs(&mut self, ctx: &Context) -> Option<PathBuf> {
        if let Some(pending) = &self.confirm_remove {
            match confirm(ctx, "移除书籍", &format!("确定要从书架移除《{}》吗？", pending.file_name)) {
                Some(true) => return self.confirm_remove.take().map(|p| p.path),
                Some(false) => self.confirm_remove = None,
                None => {}
            }
        }
        if let Some(pending) = &self.missing {
            let message = format!(
                "文件不存在或无法读取：\n{}\n\n是否从书架移除？",
                pending.file_name
            );
            match confirm(ctx, "无法打开", &message) {
                Some(true) => return self.missing.take().map(|p| p.path),
                Some(false) => self.missing = None,
                None => {}
            }
        }
        None
    }
}

enum RowClick {
    Open,
    Remove,
}

fn show_row(ui: &mut Ui, book: &BookRecord, now: DateTime<Utc>) -> Option<RowClick> {
    let width = ui.available_width();
    // The row is allocated first so the remove button on top of it wins
    let (rect, row) = ui.allocate_exact_size(egui::vec2(width, ROW_HEIGHT), Sense::click());
    let hovered = ui.rect_contains_pointer(rect);

    let stroke = if hovered {
        Stroke::new(1.0, ACCENT.gamma_multiply(0.6))
    } else {
        Stroke::new(1.0, Color32::from_gray(225))
    };
    ui.painter()
        .rect(rect, CornerRadius::same(8), Color32::WHITE, stroke, egui::StrokeKind::Inside);

    let mut clicked = None;
    ui.scope_builder(UiBuilder::new().max_rect(rect.shrink(12.0)), |ui| {
        ui.style_mut().interaction.selectable_labels = false;
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.set_width((ui.available_width() - 48.0).max(0.0));
                ui.label(RichText::new(&book.file_name).strong().color(Color32::from_gray(40)));
                ui.label(
                    RichText::new(format!(
                        "阅读进度: {} · {}",
                        format_progress(book.progress),
                        format_last_read(book.last_read, now)
                    ))
                    .small()
                    .color(Color32::GRAY),
                );
                ui.add(
                    egui::ProgressBar::new(book.progress.clamp(0.0, 1.0))
                        .desired_height(6.0)
                        .fill(ACCENT),
                );
            });
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if hovered {
                    let remove = ui
                        .add(egui::Button::new("🗑").frame(false))
                        .on_hover_text("从书架移除");
                    if remove.clicked() {
                        clicked = Some(RowClick::Remove);
                    }
                }
            });
        });
    });

    if clicked.is_none() && row.clicked() {
        clicked = Some(RowClick::Open);
    }
    if hovered {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    ui.add_space(4.0);
    clicked
}

fn show_empty(ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space((ui.available_height() / 3.0).max(0.0));
        ui.label(RichText::new("📚").size(64.0).color(Color32::from_gray(200)));
        ui.label(RichText::new("书架空空如也").size(20.0).color(Color32::GRAY));
        ui.label(
            RichText::new("点击上方按钮导入书籍，或将 TXT 文件拖放至此处")
                .color(Color32::from_gray(160)),
        );
    });
}

/// Modal yes/no question. `None` while unanswered.
fn confirm(ctx: &Context, title: &str, message: &str) -> Option<bool> {
    let mut answer = None;
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(message);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("确定").clicked() {
                    answer = Some(true);
                }
                if ui.button("取消").clicked() {
                    answer = Some(false);
                }
            });
        });
    answer
}

/// Full-window hint while files are dragged over the window
pub fn drop_overlay(ctx: &Context) {
    egui::Area::new(egui::Id::new("drop_overlay"))
        .fixed_pos(egui::pos2(0.0, 0.0))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            let screen_rect = ctx.screen_rect();
            ui.painter()
                .rect_filled(screen_rect, 0.0, ACCENT.gamma_multiply(0.1));
            ui.painter().rect_stroke(
                screen_rect.shrink(12.0),
                CornerRadius::same(8),
                Stroke::new(2.0, ACCENT),
                egui::StrokeKind::Inside,
            );
            ui.painter().text(
                screen_rect.center(),
                egui::Align2::CENTER_CENTER,
                "释放以导入文件",
                egui::FontId::proportional(22.0),
                ACCENT,
            );
        });
}

/// `0.374` → `37%`
pub fn format_progress(progress: f32) -> String {
    let progress = if progress.is_finite() { progress } else { 0.0 };
    format!("{}%", (progress * 100.0).round() as i64)
}

/// Relative label for the last time a book was read
pub fn format_last_read(last_read: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(last_read);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if elapsed.num_seconds() < 60 {
        "刚刚".to_string()
    } else if minutes < 60 {
        format!("{}分钟前", minutes)
    } else if hours < 24 {
        format!("{}小时前", hours)
    } else if days < 7 {
        format!("{}天前", days)
    } else {
        last_read.with_timezone(&Local).format("%Y/%m/%d").to_string()
    }
}
