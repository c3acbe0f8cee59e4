use std::collections::{HashMap, HashSet};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{FontEntry, FontSet, register_font};
use crate::model::{Document, FontWeight, Page};

const PRODUCER: &str = concat!("lesson-notes-pdf ", env!("CARGO_PKG_VERSION"));

/// Serialize a laid-out document. Every run is drawn at its baseline, flipped into
/// PDF user space (origin bottom-left).
pub fn render(doc: &Document, fonts: &FontSet) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: collect used characters per weight and embed only the faces in use
    let mut used_chars: HashMap<FontWeight, HashSet<char>> = HashMap::new();
    for run in doc.runs() {
        used_chars
            .entry(run.weight)
            .or_default()
            .extend(run.text.chars());
    }
    for chars in used_chars.values_mut() {
        chars.insert(' ');
    }

    let mut seen_fonts: HashMap<FontWeight, FontEntry> = HashMap::new();
    for weight in [FontWeight::Regular, FontWeight::Bold] {
        let Some(chars) = used_chars.get(&weight) else {
            continue;
        };
        let pdf_name = format!("F{}", seen_fonts.len() + 1);
        let entry = register_font(&mut pdf, fonts.face(weight), pdf_name, &mut alloc, chars)?;
        seen_fonts.insert(weight, entry);
    }

    let t_fonts = t0.elapsed();

    // Phase 2: one content stream per page
    let contents: Vec<Content> = doc
        .pages
        .iter()
        .map(|page| draw_page(page, &seen_fonts))
        .collect();

    let t_layout = t0.elapsed();

    // Phase 3: allocate page and content IDs now that page count is known
    let n = contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let mut font_pairs: Vec<(&str, Ref)> = seen_fonts
        .values()
        .map(|e| (e.pdf_name.as_str(), e.font_ref))
        .collect();
    font_pairs.sort_unstable_by_key(|&(name, _)| name);

    for (i, page_model) in doc.pages.iter().enumerate() {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, page_model.width, page_model.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        {
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for &(name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), font_ref);
            }
        }
    }

    pdf.document_info(info_id)
        .title(TextStr(&doc.title))
        .subject(TextStr(&doc.subject))
        .producer(TextStr(PRODUCER));

    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: font_embed={:.1}ms, content={:.1}ms, assembly={:.1}ms ({} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}

fn draw_page(page: &Page, seen_fonts: &HashMap<FontWeight, FontEntry>) -> Content {
    let mut content = Content::new();
    if page.runs.is_empty() {
        return content;
    }

    let mut current_color: Option<[u8; 3]> = None;
    let mut current_font: Option<(FontWeight, f32)> = None;
    let mut td_x = 0.0_f32;
    let mut td_y = 0.0_f32;

    content.begin_text();
    for run in &page.runs {
        let Some(entry) = seen_fonts.get(&run.weight) else {
            continue;
        };

        if current_color != Some(run.color) {
            let [r, g, b] = run.color;
            content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
            current_color = Some(run.color);
        }

        if current_font != Some((run.weight, run.font_size)) {
            content.set_font(Name(entry.pdf_name.as_bytes()), run.font_size);
            current_font = Some((run.weight, run.font_size));
        }

        let x = run.x;
        let y = page.height - run.y;
        content.next_line(x - td_x, y - td_y);
        td_x = x;
        td_y = y;

        content.show(Str(&entry.encode(&run.text)));
    }
    content.end_text();
    content
}
