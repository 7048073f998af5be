//! Paragraph height estimation and the prefix-offset cache the virtualized
//! list is driven by.
//!
//! Every character is assumed to be `font_size` wide. That is right for CJK
//! text and generous for Latin text; the estimate only has to be stable so
//! that a saved scroll offset lands on the same paragraph next time.

use crate::constant::{OVERSCAN_ROWS, PARAGRAPH_GAP};
use std::ops::Range;

const MIN_FONT_SIZE: f32 = 1.0;
const MIN_LINE_HEIGHT: f32 = 1.0;

/// Inputs that invalidate every cached height when they change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub font_size: f32,
    pub line_height: f32,
    pub padding: f32,
    pub container_width: f32,
}

impl LayoutParams {
    fn sanitized(self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        Self {
            font_size: finite_or(self.font_size, MIN_FONT_SIZE).max(MIN_FONT_SIZE),
            line_height: finite_or(self.line_height, MIN_LINE_HEIGHT).max(MIN_LINE_HEIGHT),
            padding: finite_or(self.padding, 0.0).max(0.0),
            container_width: finite_or(self.container_width, 0.0).max(0.0),
        }
    }

    /// Height of a single rendered line
    pub fn line_px(&self) -> f32 {
        let p = self.sanitized();
        p.font_size * p.line_height
    }

    pub fn chars_per_line(&self) -> usize {
        let p = self.sanitized();
        let available = p.container_width - p.padding * 2.0;
        let per_line = (available / p.font_size).floor();
        if per_line >= 1.0 { per_line as usize } else { 1 }
    }

    /// Estimated pixel height of a paragraph of `char_count` characters,
    /// including the gap below it. Never less than one line.
    pub fn item_size(&self, char_count: usize) -> f32 {
        let lines = char_count.div_ceil(self.chars_per_line()).max(1);
        let line_px = self.line_px();
        (lines as f32 * line_px).max(line_px) + PARAGRAPH_GAP
    }
}

/// Heights and top offsets for every paragraph of the open book
#[derive(Debug, Clone, Default)]
pub struct ParagraphLayout {
    key: Option<(u64, LayoutParams)>,
    heights: Vec<f32>,
    /// `offsets[i]` is the top of paragraph `i`; one extra entry holds the total
    offsets: Vec<f32>,
}

impl ParagraphLayout {
    /// Rebuild if the content generation or any layout input changed.
    /// Returns whether a rebuild happened.
    pub fn ensure(&mut self, generation: u64, params: LayoutParams, char_counts: &[usize]) -> bool {
        if self.key == Some((generation, params)) && self.heights.len() == char_counts.len() {
            return false;
        }
        self.heights = char_counts.iter().map(|&n| params.item_size(n)).collect();
        self.offsets = Vec::with_capacity(self.heights.len() + 1);
        let mut top = 0.0;
        self.offsets.push(top);
        for height in &self.heights {
            top += height;
            self.offsets.push(top);
        }
        self.key = Some((generation, params));
        true
    }

    /// Drop the cache so the next `ensure` always rebuilds
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn total_height(&self) -> f32 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    /// Height of paragraph `index`; one line for out-of-range indices
    pub fn height(&self, index: usize) -> f32 {
        match self.heights.get(index) {
            Some(&h) => h,
            None => self.key.map(|(_, p)| p.line_px()).unwrap_or(MIN_LINE_HEIGHT),
        }
    }

    pub fn offset(&self, index: usize) -> f32 {
        self.offsets
            .get(index.min(self.heights.len()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Paragraph whose box contains `y`
    pub fn index_at(&self, y: f32) -> usize {
        if self.heights.is_empty() {
            return 0;
        }
        // First offset strictly greater than y, minus one
        let upper = self.offsets.partition_point(|&top| top <= y.max(0.0));
        upper.saturating_sub(1).min(self.heights.len() - 1)
    }

    /// Paragraph indices intersecting `[scroll_offset, scroll_offset + viewport_height)`,
    /// widened by a few rows on each side
    pub fn visible_range(&self, scroll_offset: f32, viewport_height: f32) -> Range<usize> {
        if self.heights.is_empty() {
            return 0..0;
        }
        let first = self.index_at(scroll_offset);
        let bottom = scroll_offset + viewport_height.max(0.0);
        let last = self.index_at(bottom);
        let start = first.saturating_sub(OVERSCAN_ROWS);
        let end = (last + 1 + OVERSCAN_ROWS).min(self.heights.len());
        start..end
    }
}
