#![allow(dead_code)]

use std::collections::HashMap;

use lesson_notes_pdf::layout::LayoutConfig;
use lesson_notes_pdf::{Document, FontMetrics, FontWeight, TextRun, layout_notes};

/// Every character advances `default_1000` units unless overridden.
pub struct StubMetrics {
    pub default_1000: f32,
    pub overrides: HashMap<char, f32>,
}

impl StubMetrics {
    /// 500/1000 em per char: 6pt per char at 12pt.
    pub fn uniform() -> Self {
        Self {
            default_1000: 500.0,
            overrides: HashMap::new(),
        }
    }
}

impl FontMetrics for StubMetrics {
    fn char_width_1000(&self, ch: char, _weight: FontWeight) -> f32 {
        self.overrides.get(&ch).copied().unwrap_or(self.default_1000)
    }
}

pub fn layout(topic: &str, text: &str) -> Document {
    layout_notes(topic, "Science", text, &StubMetrics::uniform(), &LayoutConfig::default())
}

pub fn layout_with(text: &str, config: &LayoutConfig) -> Document {
    layout_notes("Topic", "Science", text, &StubMetrics::uniform(), config)
}

/// Config whose right limit leaves exactly `content` points between margin and limit.
pub fn narrow_config(content: f32) -> LayoutConfig {
    let base = LayoutConfig::default();
    LayoutConfig {
        page_width: 2.0 * base.margin + content,
        ..base
    }
}

pub fn runs(doc: &Document) -> Vec<&TextRun> {
    doc.runs().collect()
}

pub fn width(run: &TextRun) -> f32 {
    StubMetrics::uniform().measure_text(&run.text, run.weight, run.font_size)
}

/// All run text concatenated with bullet glyphs and whitespace removed.
pub fn compact_text(doc: &Document, bullet: char) -> String {
    doc.runs()
        .flat_map(|r| r.text.chars())
        .filter(|&c| c != bullet && !c.is_whitespace())
        .collect()
}

pub fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}
