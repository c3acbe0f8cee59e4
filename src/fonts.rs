use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::{Face, GlyphId};

use crate::error::Error;
use crate::model::FontWeight;

/// Text measurement capability used by the layout engine.
pub trait FontMetrics {
    /// Advance width of `ch` in 1000-units of em.
    fn char_width_1000(&self, ch: char, weight: FontWeight) -> f32;

    fn measure_text(&self, text: &str, weight: FontWeight, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch, weight) * font_size / 1000.0)
            .sum()
    }
}

/// Family embedded by default; it covers Greek, Cyrillic, arrows and most math symbols.
pub const DEFAULT_FONT_FAMILY: &str = "DejaVu Sans";

/// Where the regular and bold faces come from.
#[derive(Clone, Debug, PartialEq)]
pub enum FontSource {
    /// Standard-14 Helvetica / Helvetica-Bold, not embedded, WinAnsi only.
    Builtin,
    /// Explicit TrueType/OpenType files.
    Files { regular: PathBuf, bold: PathBuf },
    /// Family name looked up in the system font directories.
    Family(String),
}

impl Default for FontSource {
    fn default() -> Self {
        FontSource::Family(DEFAULT_FONT_FAMILY.to_string())
    }
}

pub(crate) struct TrueTypeFace {
    ps_name: String,
    data: Vec<u8>,
    face_index: u32,
    char_widths_1000: HashMap<char, f32>,
    missing_width_1000: f32,
}

pub(crate) enum FontFace {
    Standard {
        base_font: &'static str,
        widths_1000: &'static [u16; 95],
    },
    TrueType(TrueTypeFace),
}

impl FontFace {
    fn char_width_1000(&self, ch: char) -> f32 {
        match self {
            FontFace::Standard { widths_1000, .. } => standard_char_width(widths_1000, ch),
            FontFace::TrueType(tt) => tt
                .char_widths_1000
                .get(&ch)
                .copied()
                .unwrap_or(tt.missing_width_1000),
        }
    }
}

/// The regular and bold faces used for one rendering pass.
pub struct FontSet {
    regular: FontFace,
    bold: FontFace,
}

impl FontSet {
    pub fn builtin() -> Self {
        Self {
            regular: FontFace::Standard {
                base_font: "Helvetica",
                widths_1000: &HELVETICA_WIDTHS,
            },
            bold: FontFace::Standard {
                base_font: "Helvetica-Bold",
                widths_1000: &HELVETICA_BOLD_WIDTHS,
            },
        }
    }

    pub fn load(source: &FontSource) -> Result<Self, Error> {
        let t0 = std::time::Instant::now();
        let set = match source {
            FontSource::Builtin => Self::builtin(),
            FontSource::Files { regular, bold } => Self {
                regular: FontFace::TrueType(load_truetype_file(regular, 0)?),
                bold: FontFace::TrueType(load_truetype_file(bold, 0)?),
            },
            FontSource::Family(family) => {
                let (path, face_index) = find_font_file(family, false).ok_or_else(|| {
                    Error::FontUnavailable(format!("no regular face for family {family:?}"))
                })?;
                let regular = load_truetype_file(&path, face_index)?;
                let bold = match find_font_file(family, true) {
                    Some((bold_path, bold_index)) => load_truetype_file(&bold_path, bold_index)?,
                    None => {
                        log::warn!("No bold face for {family}, using the regular face for bold text");
                        load_truetype_file(&path, face_index)?
                    }
                };
                Self {
                    regular: FontFace::TrueType(regular),
                    bold: FontFace::TrueType(bold),
                }
            }
        };
        log::debug!(
            "Font load: {:?} → {:.1}ms",
            source,
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(set)
    }

    pub(crate) fn face(&self, weight: FontWeight) -> &FontFace {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

impl FontMetrics for FontSet {
    fn char_width_1000(&self, ch: char, weight: FontWeight) -> f32 {
        self.face(weight).char_width_1000(ch)
    }
}

fn load_truetype_file(path: &Path, face_index: u32) -> Result<TrueTypeFace, Error> {
    let data = std::fs::read(path)
        .map_err(|e| Error::FontUnavailable(format!("{}: {e}", path.display())))?;
    let fallback_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Font")
        .to_string();
    load_truetype(data, face_index, &fallback_name)
        .map_err(|e| Error::FontUnavailable(format!("{}: {e}", path.display())))
}

fn load_truetype(
    data: Vec<u8>,
    face_index: u32,
    fallback_name: &str,
) -> Result<TrueTypeFace, ttf_parser::FaceParsingError> {
    let (ps_name, char_widths_1000, missing_width_1000) = {
        let face = Face::parse(&data, face_index)?;
        let units = face.units_per_em() as f32;
        let to_1000 = |adv: u16| adv as f32 / units * 1000.0;

        let mut widths = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|cp| {
                    if let Some(ch) = char::from_u32(cp)
                        && let Some(gid) = subtable.glyph_index(cp)
                        && let Some(adv) = face.glyph_hor_advance(gid)
                    {
                        widths.entry(ch).or_insert(to_1000(adv));
                    }
                });
            }
        }
        let missing = face.glyph_hor_advance(GlyphId(0)).map(to_1000).unwrap_or(0.0);
        let name = postscript_name(&face)
            .or_else(|| font_family_name(&face).map(|f| f.replace(' ', "")))
            .unwrap_or_else(|| fallback_name.replace(' ', ""));
        (name, widths, missing)
    };

    Ok(TrueTypeFace {
        ps_name,
        data,
        face_index,
        char_widths_1000,
        missing_width_1000,
    })
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn postscript_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME && n.is_unicode())
        .and_then(|n| n.to_string())
}

fn font_family_name(face: &Face) -> Option<String> {
    // ID 1 (Family) keeps "DejaVu Sans" apart from "DejaVu Sans Mono";
    // ID 16 (Typographic Family) would group them.
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold(), face.is_italic()))
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("LESSON_NOTES_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for part in val.split(sep) {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                dirs.push(PathBuf::from(trimmed));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut files_scanned = 0u32;
    let mut visited_dirs: HashSet<PathBuf> = HashSet::new();

    let mut stack: Vec<PathBuf> = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited_dirs.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            // SAFETY: font files are opened read-only and only parsed while mapped.
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                if let Some((family, bold, italic)) = read_font_style(&data, face_idx) {
                    index
                        .entry((family.to_lowercase(), bold, italic))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} dirs, {} files parsed → {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        visited_dirs.len(),
        files_scanned,
        index.len(),
    );

    index
}

fn get_font_index() -> &'static FontLookup {
    FONT_INDEX.get_or_init(scan_font_dirs)
}

/// Look up an upright face by family name and weight.
fn find_font_file(family: &str, bold: bool) -> Option<(PathBuf, u32)> {
    get_font_index()
        .get(&(family.to_lowercase(), bold, false))
        .cloned()
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95, // bullet
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes, dropping unmappable chars.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.extend_from_slice(&gid.to_be_bytes());
    }
    out
}

fn standard_char_width(widths_1000: &[u16; 95], ch: char) -> f32 {
    match char_to_winansi(ch) {
        0 => 0.0,
        b @ 32..=126 => widths_1000[(b - 32) as usize] as f32,
        0x95 => 350.0,
        _ => 556.0,
    }
}

/// Helvetica advance widths for ASCII 32..=126.
#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for ASCII 32..=126.
#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// A font written into the PDF and the encoding its content streams need.
pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    char_to_gid: Option<HashMap<char, u16>>,
}

impl FontEntry {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    tt: &TrueTypeFace,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>, Error> {
    let face = Face::parse(&tt.data, tt.face_index)
        .map_err(|e| Error::FontUnavailable(format!("{}: {e}", tt.ps_name)))?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    let mut sorted_chars: Vec<char> = used_chars.iter().copied().collect();
    sorted_chars.sort_unstable();
    for ch in sorted_chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0);
            gid_widths.push((new_gid, w));
        } else {
            log::warn!("{}: no glyph for {ch:?}", tt.ps_name);
        }
    }

    let subset_data = subsetter::subset(&tt.data, tt.face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {}: {e}, embedding full font", tt.ps_name);
        tt.data.clone()
    });

    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::FontUnavailable(format!("{}: font too large", tt.ps_name)))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = tt.ps_name.as_bytes();

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        gid_widths.sort_by_key(|&(gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", tt.ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}

pub(crate) fn register_font(
    pdf: &mut Pdf,
    face: &FontFace,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> Result<FontEntry, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match face {
        FontFace::Standard { base_font, .. } => {
            pdf.type1_font(font_ref)
                .base_font(Name(base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            let dropped: Vec<char> = used_chars
                .iter()
                .copied()
                .filter(|&ch| char_to_winansi(ch) == 0)
                .collect();
            if !dropped.is_empty() {
                log::warn!(
                    "{base_font}: {} characters outside WinAnsi will not be drawn: {dropped:?}",
                    dropped.len()
                );
            }
            None
        }
        FontFace::TrueType(tt) => Some(embed_truetype(pdf, font_ref, tt, used_chars, alloc)?),
    };

    log::debug!(
        "register_font: {pdf_name} ({} chars) → {:.1}ms",
        used_chars.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(FontEntry {
        pdf_name,
        font_ref,
        char_to_gid,
    })
}
