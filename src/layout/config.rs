use crate::markdown::LineKind;
use crate::model::{A4_HEIGHT, A4_WIDTH, FontWeight};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub font_size: f32,
    pub weight: FontWeight,
    pub color: [u8; 3],
    /// Vertical advance after each emitted line of this style.
    pub advance: f32,
}

impl LineStyle {
    const fn new(font_size: f32, weight: FontWeight, color: [u8; 3], advance: f32) -> Self {
        Self {
            font_size,
            weight,
            color,
            advance,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyleSheet {
    pub title: LineStyle,
    pub heading1: LineStyle,
    pub heading2: LineStyle,
    pub heading3: LineStyle,
    pub bullet: LineStyle,
    pub body: LineStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            title: LineStyle::new(24.0, FontWeight::Bold, [0, 51, 204], 40.0),
            heading1: LineStyle::new(20.0, FontWeight::Bold, [204, 0, 0], 35.0),
            heading2: LineStyle::new(18.0, FontWeight::Bold, [153, 77, 0], 28.0),
            heading3: LineStyle::new(16.0, FontWeight::Bold, [26, 102, 26], 26.0),
            bullet: LineStyle::new(12.0, FontWeight::Regular, [0, 0, 0], 17.0),
            body: LineStyle::new(12.0, FontWeight::Regular, [0, 0, 0], 18.0),
        }
    }
}

impl StyleSheet {
    /// Style for a text-bearing line kind; `Blank` has no style and maps to body.
    pub fn for_kind(&self, kind: LineKind) -> &LineStyle {
        match kind {
            LineKind::Heading1 => &self.heading1,
            LineKind::Heading2 => &self.heading2,
            LineKind::Heading3 => &self.heading3,
            LineKind::Bullet => &self.bullet,
            LineKind::Blank | LineKind::Body => &self.body,
        }
    }
}

/// Page geometry and styling for one layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub bullet_indent: f32,
    pub bullet_glyph: char,
    pub blank_gap: f32,
    pub styles: StyleSheet,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: 50.0,
            bullet_indent: 15.0,
            bullet_glyph: '\u{2022}',
            blank_gap: 10.0,
            styles: StyleSheet::default(),
        }
    }
}

impl LayoutConfig {
    pub fn right_limit(&self) -> f32 {
        self.page_width - self.margin
    }

    pub fn bottom_limit(&self) -> f32 {
        self.page_height - self.margin
    }
}
