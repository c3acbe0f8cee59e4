//! The note layout engine: a pure reducer from classified lines to positioned text runs.
//!
//! Coordinates are measured from the top-left corner of the page; a run's `y` is its
//! baseline. The PDF writer flips them into PDF user space.

mod config;

pub use config::{LayoutConfig, LineStyle, StyleSheet};

use crate::fonts::FontMetrics;
use crate::markdown::{Line, LineKind, Span, classify, split_spans};
use crate::model::{Document, FontWeight, Page, TextRun};

/// Everything a layout step reads but never changes.
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    pub metrics: &'a dyn FontMetrics,
    pub config: &'a LayoutConfig,
}

impl LayoutContext<'_> {
    fn width(&self, text: &str, weight: FontWeight, font_size: f32) -> f32 {
        self.metrics.measure_text(text, weight, font_size)
    }
}

/// Pages emitted so far plus the writing cursor on the last one.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutState {
    pages: Vec<Page>,
    cursor_x: f32,
    cursor_y: f32,
}

impl LayoutState {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            pages: vec![Page::new(config.page_width, config.page_height)],
            cursor_x: config.margin,
            cursor_y: config.margin,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Current (x, y) cursor on the last page.
    pub fn cursor(&self) -> (f32, f32) {
        (self.cursor_x, self.cursor_y)
    }

    /// Emit the document title at the top margin.
    pub fn title(mut self, topic: &str, ctx: &LayoutContext<'_>) -> Self {
        let style = ctx.config.styles.title;
        let margin = ctx.config.margin;
        self.emit(topic.to_string(), margin, margin, style.weight, &style, ctx);
        self.cursor_y += style.advance;
        self
    }

    pub fn apply(mut self, line: &Line<'_>, ctx: &LayoutContext<'_>) -> Self {
        match line.kind {
            LineKind::Heading1 | LineKind::Heading2 | LineKind::Heading3 => {
                let style = *ctx.config.styles.for_kind(line.kind);
                self.heading(line.text, &style, ctx);
            }
            LineKind::Bullet => self.bullet(line.text, ctx),
            LineKind::Blank => self.cursor_y += ctx.config.blank_gap,
            LineKind::Body => self.body(line.text, ctx),
        }
        self
    }

    pub fn finish(self, title: &str, subject: &str) -> Document {
        Document {
            title: title.to_string(),
            subject: subject.to_string(),
            pages: self.pages,
        }
    }

    /// Start a new page if the cursor has passed the bottom margin.
    fn ensure_room(&mut self, config: &LayoutConfig) -> bool {
        if self.cursor_y <= config.bottom_limit() {
            return false;
        }
        self.pages
            .push(Page::new(config.page_width, config.page_height));
        self.cursor_y = config.margin;
        true
    }

    /// Place a run at `x`, or at `break_x` when a page break happens first.
    /// Returns the x actually used.
    fn emit(
        &mut self,
        text: String,
        x: f32,
        break_x: f32,
        weight: FontWeight,
        style: &LineStyle,
        ctx: &LayoutContext<'_>,
    ) -> f32 {
        let x = if self.ensure_room(ctx.config) { break_x } else { x };

        let width = ctx.width(&text, weight, style.font_size);
        if width > ctx.config.right_limit() - x {
            log::debug!(
                "Run overflows right margin by {:.1}pt: {text:?}",
                width - (ctx.config.right_limit() - x)
            );
        }

        let run = TextRun {
            text,
            x,
            y: self.cursor_y,
            weight,
            font_size: style.font_size,
            color: style.color,
        };
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(run);
        }
        self.cursor_x = x + width;
        x
    }

    // Headings are never wrapped.
    fn heading(&mut self, text: &str, style: &LineStyle, ctx: &LayoutContext<'_>) {
        if !text.trim().is_empty() {
            let margin = ctx.config.margin;
            self.emit(text.to_string(), margin, margin, style.weight, style, ctx);
        }
        self.cursor_y += style.advance;
    }

    /// Bullets wrap like body text but restart at the indent. The glyph leads the first
    /// plain span, or stands alone when the item opens with a bold span.
    fn bullet(&mut self, text: &str, ctx: &LayoutContext<'_>) {
        let config = ctx.config;
        let spans = split_spans(text);
        let (lead, rest) = match spans.split_first() {
            Some((first, rest)) if !first.bold => {
                (format!("{} {}", config.bullet_glyph, first.text), rest)
            }
            _ => (format!("{} ", config.bullet_glyph), &spans[..]),
        };

        let mut line = vec![Span {
            text: &lead,
            bold: false,
        }];
        line.extend_from_slice(rest);

        let style = config.styles.bullet;
        self.spans(&line, &style, config.margin + config.bullet_indent, ctx);
    }

    fn body(&mut self, text: &str, ctx: &LayoutContext<'_>) {
        let style = ctx.config.styles.body;
        self.spans(&split_spans(text), &style, ctx.config.margin, ctx);
    }

    /// Lay out one line span by span. Spans share the x cursor, so a bold span can sit
    /// next to plain text; every wrap and page break restarts at `wrap_x`.
    fn spans(
        &mut self,
        spans: &[Span<'_>],
        style: &LineStyle,
        wrap_x: f32,
        ctx: &LayoutContext<'_>,
    ) {
        let limit = ctx.config.right_limit();

        let mut x = wrap_x;
        let mut line_has_text = false;
        let mut prev_ended_with_ws = false;
        let mut prev_space_w = 0.0;

        for span in spans {
            let weight = if span.bold {
                FontWeight::Bold
            } else {
                style.weight
            };
            let space_w = ctx.width(" ", weight, style.font_size);
            let starts_with_ws = span.text.starts_with(char::is_whitespace);

            // The gap belongs to whichever span owns the whitespace.
            let gap = if !line_has_text {
                0.0
            } else if starts_with_ws {
                space_w
            } else if prev_ended_with_ws {
                prev_space_w
            } else {
                0.0
            };

            let mut seg_x = x + gap;
            let mut segment = String::new();
            for word in span.text.split_whitespace() {
                let candidate = if segment.is_empty() {
                    word.to_string()
                } else {
                    format!("{segment} {word}")
                };
                let fits = seg_x + ctx.width(&candidate, weight, style.font_size) <= limit;
                if fits || (segment.is_empty() && !line_has_text) {
                    segment = candidate;
                    continue;
                }
                if !segment.is_empty() {
                    let done = std::mem::take(&mut segment);
                    self.emit(done, seg_x, wrap_x, weight, style, ctx);
                }
                self.cursor_y += style.advance;
                seg_x = wrap_x;
                line_has_text = false;
                segment = word.to_string();
            }

            if !segment.is_empty() {
                self.emit(segment, seg_x, wrap_x, weight, style, ctx);
                x = self.cursor_x;
                line_has_text = true;
            }
            prev_ended_with_ws = span.text.ends_with(char::is_whitespace);
            prev_space_w = space_w;
        }

        self.cursor_y += style.advance;
        self.cursor_x = ctx.config.margin;
    }
}

/// Lay out a topic title and lesson text into pages.
///
/// `subject` is only carried into the document metadata.
pub fn layout_notes(
    topic: &str,
    subject: &str,
    text: &str,
    metrics: &dyn FontMetrics,
    config: &LayoutConfig,
) -> Document {
    let ctx = LayoutContext { metrics, config };
    text.lines()
        .map(classify)
        .fold(LayoutState::new(config).title(topic, &ctx), |state, line| {
            state.apply(&line, &ctx)
        })
        .finish(topic, subject)
}
