//! Text-only PDF rendering on top of `lopdf`.
//!
//! Produces a PDF 1.4 file using one of the standard base-14 fonts, so no
//! font data has to be embedded. Line breaking uses an average glyph width
//! per font family, which is close enough for prose.

use super::{DocumentRenderer, RenderConfig, RenderedDocument};
use crate::constants::{MAX_EXPORT_PAGES, PAGE_HEIGHT_PT, PAGE_MARGIN_PT, PAGE_WIDTH_PT};
use crate::errors::{AppResult, ExportError};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, warn};

const FONT_RESOURCE: &str = "F1";

/// Renders entries onto US Letter pages.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    max_pages: usize,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        PdfRenderer {
            max_pages: MAX_EXPORT_PAGES,
        }
    }
}

impl PdfRenderer {
    /// A renderer that stops after `max_pages` pages.
    pub fn with_max_pages(max_pages: usize) -> Self {
        PdfRenderer {
            max_pages: max_pages.max(1),
        }
    }
}

/// Base-14 font standing in for a family name, with its average glyph width
/// as a fraction of the font size.
fn base_font(family: &str) -> (&'static str, f32) {
    let family = family.to_lowercase();
    if family.contains("courier") || family.contains("mono") {
        ("Courier", 0.6)
    } else if ["helvetica", "arial", "sans", "lato", "system"]
        .iter()
        .any(|name| family.contains(name))
    {
        ("Helvetica", 0.52)
    } else {
        ("Times-Roman", 0.47)
    }
}

/// Greedy word wrap. Blank lines are kept; overlong words are split.
fn wrap_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                let needed = if line_len == 0 { piece.len() } else { line_len + 1 + piece.len() };
                if needed > max_chars && line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                if line_len > 0 {
                    line.push(' ');
                    line_len += 1;
                }
                line.extend(piece);
                line_len += piece.len();
            }
        }
        lines.push(line);
    }
    lines
}

/// Encodes a line in WinAnsi, the encoding declared for the base-14 font.
/// Characters it cannot represent become `?`.
fn win_ansi(line: &str) -> Vec<u8> {
    line.chars()
        .map(|ch| match ch {
            '\t' => b' ',
            ' '..='~' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{A0}'..='\u{FF}' => ch as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Text operations for one page, starting at the top margin.
fn page_content(lines: &[String], font_size: f32, leading: f32) -> Content {
    let top = PAGE_HEIGHT_PT - PAGE_MARGIN_PT - font_size;
    let mut operations = vec![
        Operation::new("rg", vec![0.2_f32.into(), 0.2_f32.into(), 0.2_f32.into()]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![FONT_RESOURCE.into(), font_size.into()]),
        Operation::new("TL", vec![leading.into()]),
        Operation::new("Td", vec![PAGE_MARGIN_PT.into(), top.into()]),
    ];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(line), StringFormat::Literal)],
        ));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

fn render_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Render(e.to_string())
}

/// Assembles the page tree and serializes the document.
fn build_document(pages: &[&[String]], font_name: &str, font_size: f32, leading: f32) -> AppResult<Vec<u8>> {
    let mut doc = Document::with_version("1.4");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font_name,
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in pages {
        let content = page_content(lines, font_size, leading)
            .encode()
            .map_err(render_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH_PT.into(), PAGE_HEIGHT_PT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(render_error)?;
    Ok(bytes)
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, text: &str, config: &RenderConfig) -> AppResult<RenderedDocument> {
        if !(config.font_size.is_finite() && config.font_size > 0.0) {
            return Err(ExportError::Render(format!("invalid font size {}", config.font_size)).into());
        }
        if !(config.line_height_multiple.is_finite() && config.line_height_multiple > 0.0) {
            return Err(ExportError::Render(format!(
                "invalid line height multiple {}",
                config.line_height_multiple
            ))
            .into());
        }

        let (font_name, glyph_width) = base_font(&config.font);
        let content_width = PAGE_WIDTH_PT - 2.0 * PAGE_MARGIN_PT;
        let content_height = PAGE_HEIGHT_PT - 2.0 * PAGE_MARGIN_PT;
        let leading = config.font_size * config.line_height_multiple;
        let max_chars = ((content_width / (config.font_size * glyph_width)) as usize).max(1);
        let lines_per_page = ((content_height / leading) as usize).max(1);

        let lines = wrap_lines(text.trim(), max_chars);
        let mut pages: Vec<&[String]> = lines.chunks(lines_per_page).collect();
        if pages.is_empty() {
            pages.push(&[]);
        }
        let truncated = pages.len() > self.max_pages;
        if truncated {
            warn!(
                "Export reached the {} page limit, stopping early",
                self.max_pages
            );
            pages.truncate(self.max_pages);
        }
        debug!(
            "Rendering {} lines on {} pages with {}",
            lines.len(),
            pages.len(),
            font_name
        );

        Ok(RenderedDocument {
            bytes: build_document(&pages, font_name, config.font_size, leading)?,
            pages: pages.len(),
            truncated,
        })
    }
}
