//! Virtualized reading surface. Only paragraphs near the viewport are laid
//! out; everything else is accounted for by the estimated heights.

use crate::config::ReaderSettings;
use crate::reader::layout::{LayoutParams, ParagraphLayout};
use crate::reader::paragraphs::{Paragraphs, is_chapter_heading};
use crate::reader::progress::ProgressTracker;
use crate::reader::restore::ScrollRestore;
use crate::state::AppState;
use crate::style;
use egui::scroll_area::{ScrollBarVisibility, ScrollSource};
use egui::text::LayoutJob;
use egui::{Align, Color32, FontId, Key, Rect, TextFormat, Ui};
use std::time::Instant;

/// Fraction of the viewport a page key moves
const PAGE_FRACTION: f32 = 0.9;

#[derive(Default)]
pub struct ReaderView {
    layout: ParagraphLayout,
    restore: ScrollRestore,
    /// Offset to apply on the next frame
    pending_scroll: Option<f32>,
    offset: f32,
}

impl ReaderView {
    /// New content is on screen; put the reader back at `scroll_position`
    pub fn begin(&mut self, scroll_position: f32, now: Instant) {
        self.restore.begin(scroll_position, now);
        self.pending_scroll = Some(0.0);
        self.offset = 0.0;
    }

    pub fn close(&mut self) {
        self.restore.cancel();
        self.layout.invalidate();
        self.pending_scroll = None;
        self.offset = 0.0;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.restore.next_deadline()
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        state: &mut AppState,
        tracker: &mut ProgressTracker,
        now: Instant,
    ) {
        let Some(book) = state.current() else {
            return;
        };
        let generation = book.generation;
        let settings = state.settings().clone();
        let immersive = state.is_immersive();

        if let Some(target) = self.restore.tick(now) {
            self.pending_scroll = Some(target);
        }

        let params = LayoutParams {
            font_size: settings.font_size,
            line_height: settings.line_height,
            padding: settings.padding,
            container_width: ui.available_width(),
        };
        self.layout
            .ensure(generation, params, book.paragraphs.char_counts());

        if let Some(delta) = self.scroll_input(ui, &settings) {
            self.pending_scroll = Some(self.offset + delta);
        }

        let show_bar = !immersive || settings.show_scrollbar_in_immersive;
        let mut area = egui::ScrollArea::vertical()
            .id_salt("reader_scroll")
            .auto_shrink([false, false])
            .scroll_source(ScrollSource::SCROLL_BAR | ScrollSource::DRAG)
            .scroll_bar_visibility(if show_bar {
                ScrollBarVisibility::VisibleWhenNeeded
            } else {
                ScrollBarVisibility::AlwaysHidden
            });
        if let Some(target) = self.pending_scroll.take() {
            let max = (self.layout.total_height() - ui.available_height()).max(0.0);
            area = area.vertical_scroll_offset(target.clamp(0.0, max));
        }

        let layout = &self.layout;
        let paragraphs = &book.paragraphs;
        let output = area.show_viewport(ui, |ui, viewport| {
            ui.set_min_height(layout.total_height());
            ui.set_min_width(ui.available_width());
            paint_visible(ui, viewport, layout, paragraphs, &settings);
        });

        let offset = output.state.offset.y;
        self.offset = offset;
        let total = self.layout.total_height();
        tracker.observe(state, offset, total, self.restore.is_restoring(), now);
    }

    /// Wheel and key scrolling, scaled by the scroll speed setting
    fn scroll_input(&self, ui: &Ui, settings: &ReaderSettings) -> Option<f32> {
        let line = settings.line_height_px();
        let page = ui.available_height() * PAGE_FRACTION;
        let pointer_inside = ui.ui_contains_pointer();
        let typing = ui.ctx().wants_keyboard_input();

        let delta = ui.input(|i| {
            let mut delta = 0.0;
            if pointer_inside {
                delta -= i.smooth_scroll_delta.y;
            }
            if !typing {
                if i.key_pressed(Key::ArrowDown) {
                    delta += line;
                }
                if i.key_pressed(Key::ArrowUp) {
                    delta -= line;
                }
                if i.key_pressed(Key::PageDown) || i.key_pressed(Key::Space) {
                    delta += page;
                }
                if i.key_pressed(Key::PageUp) {
                    delta -= page;
                }
            }
            delta
        });
        (delta != 0.0).then(|| delta * settings.scroll_speed)
    }
}

fn paint_visible(
    ui: &mut Ui,
    viewport: Rect,
    layout: &ParagraphLayout,
    paragraphs: &Paragraphs,
    settings: &ReaderSettings,
) {
    let origin = ui.max_rect().min;
    let width = ui.max_rect().width();
    let text_width = (width - settings.padding * 2.0).max(settings.font_size);
    let color = style::text_color(settings);

    for index in layout.visible_range(viewport.min.y, viewport.height()) {
        let Some(text) = paragraphs.get(index) else {
            continue;
        };
        let top = origin.y + layout.offset(index);
        let left = origin.x + settings.padding;
        let galley = ui
            .painter()
            .layout_job(paragraph_job(text, text_width, settings, color));
        if is_chapter_heading(text) {
            // No bold face is loaded; a second pass half a point over thickens the strokes
            let pos = egui::pos2(left + text_width / 2.0, top);
            ui.painter().galley(pos, galley.clone(), color);
            ui.painter().galley(pos + egui::vec2(0.5, 0.0), galley, color);
        } else {
            ui.painter().galley(egui::pos2(left, top), galley, color);
        }
    }
}

fn paragraph_job(text: &str, width: f32, settings: &ReaderSettings, color: Color32) -> LayoutJob {
    let heading = is_chapter_heading(text);
    let mut job = LayoutJob::default();
    let format = TextFormat {
        font_id: FontId::proportional(settings.font_size),
        color,
        line_height: Some(settings.line_height_px()),
        ..Default::default()
    };
    let indent = if heading { 0.0 } else { settings.font_size * 2.0 };
    job.append(text, indent, format);
    job.wrap.max_width = width;
    job.wrap.break_anywhere = true;
    if heading {
        job.halign = Align::Center;
    }
    job
}
