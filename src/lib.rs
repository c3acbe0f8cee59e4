mod error;
pub mod fonts;
pub mod layout;
pub mod markdown;
pub mod model;
mod pdf;

pub use error::Error;
pub use fonts::{DEFAULT_FONT_FAMILY, FontMetrics, FontSet, FontSource};
pub use layout::{LayoutConfig, layout_notes};
pub use model::{Document, FontWeight, Page, TextRun};

use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, Default)]
pub struct NoteOptions {
    pub fonts: FontSource,
    pub layout: LayoutConfig,
}

/// A finished rendering pass: the laid-out pages and their PDF serialization.
pub struct GeneratedNotes {
    pub document: Document,
    pub pdf: Vec<u8>,
}

/// Load fonts and lay out the notes without producing PDF bytes.
pub fn plan_notes(
    topic: &str,
    subject: &str,
    text: &str,
    options: &NoteOptions,
) -> Result<Document, Error> {
    check_topic(topic)?;
    let fonts = FontSet::load(&options.fonts)?;
    Ok(layout_notes(topic, subject, text, &fonts, &options.layout))
}

pub fn generate_notes(
    topic: &str,
    subject: &str,
    text: &str,
    options: &NoteOptions,
) -> Result<GeneratedNotes, Error> {
    check_topic(topic)?;
    let t0 = Instant::now();

    let fonts = FontSet::load(&options.fonts)?;
    let t_fonts = t0.elapsed();

    let document = layout_notes(topic, subject, text, &fonts, &options.layout);
    let t_layout = t0.elapsed();

    let pdf = pdf::render(&document, &fonts)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: fonts={:.1}ms, layout={:.1}ms, render={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        document.pages.len(),
        pdf.len(),
    );

    Ok(GeneratedNotes { document, pdf })
}

fn check_topic(topic: &str) -> Result<(), Error> {
    if topic.trim().is_empty() {
        return Err(Error::EmptyTopic);
    }
    Ok(())
}

/// Render and write the PDF. Nothing is written when generation fails.
pub fn generate_notes_to_file(
    topic: &str,
    subject: &str,
    text: &str,
    options: &NoteOptions,
    output: &Path,
) -> Result<Document, Error> {
    let notes = generate_notes(topic, subject, text, options)?;
    std::fs::write(output, &notes.pdf)?;
    Ok(notes.document)
}

/// Storage key for a companion's notes: `{companion}-{unix millis}.pdf`.
pub fn notes_file_name(companion: &str, generated_at: SystemTime) -> String {
    let millis = generated_at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{companion}-{millis}.pdf")
}
