//! Paginated A4 PDF of a report.
//!
//! Pages are laid out from the plain-text report view. Thai text needs a
//! TrueType font with Thai glyphs; without one the built-in Helvetica is
//! used and characters it cannot show are replaced with `?`.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};

use super::Report;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const FONT_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 5.0;
/// Characters per line at [`FONT_SIZE`] across the printable width.
const LINE_CHARS: usize = 90;
/// Body lines per page, leaving room for the footer.
pub const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2.0 * MARGIN - 2.0 * LINE_HEIGHT) / LINE_HEIGHT) as usize;

/// Fonts tried when `HRIA_PDF_FONT` is not set.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/tlwg/Garuda.ttf",
    "/usr/share/fonts/truetype/tlwg/Loma.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansThai-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansThai-Regular.ttf",
    "/usr/share/fonts/google-noto/NotoSansThai-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Tahoma.ttf",
    "C:\\Windows\\Fonts\\tahoma.ttf",
];

/// Errors from PDF rendering.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("Failed to read PDF font {path}: {source}")]
    Font {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to build PDF: {0}")]
    Render(String),
}

/// Font selection for PDF export.
#[derive(Debug, Clone, Default)]
pub struct PdfOptions {
    /// TrueType font to embed; `None` uses built-in Helvetica.
    pub font: Option<PathBuf>,
}

impl PdfOptions {
    /// `HRIA_PDF_FONT`, else the first installed Thai-capable font.
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var("HRIA_PDF_FONT") {
            if !path.trim().is_empty() {
                return Self {
                    font: Some(PathBuf::from(path)),
                };
            }
        }
        let font = FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
            .map(Path::to_path_buf);
        if let Some(path) = &font {
            debug!("Using PDF font {}", path.display());
        }
        Self { font }
    }

    pub fn with_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font = Some(path.into());
        self
    }
}

/// Split `text` into pages of wrapped lines.
pub fn paginate(text: &str) -> Vec<Vec<String>> {
    let lines: Vec<String> = text.lines().flat_map(wrap_line).collect();
    let mut pages: Vec<Vec<String>> = lines
        .chunks(LINES_PER_PAGE)
        .map(|chunk| chunk.to_vec())
        .collect();
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

fn wrap_line(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= LINE_CHARS {
        return vec![line.to_string()];
    }
    chars
        .chunks(LINE_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Keep only what the built-in font's encoding can show.
fn builtin_safe(line: &str) -> String {
    line.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

/// Render `text` (the plain report view of `report`) as an A4 PDF.
pub fn render_pdf(report: &Report, text: &str, options: &PdfOptions) -> Result<Vec<u8>, PdfError> {
    let title = format!("HRIA Report - {}", report.info.name);
    let (doc, first_page, first_layer) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");

    let (font, embedded) = load_font(&doc, options)?;
    if !embedded {
        warn!("No Thai font for PDF export; set HRIA_PDF_FONT to a .ttf with Thai glyphs");
    }

    let pages = paginate(text);
    let total = pages.len();
    for (number, lines) in pages.iter().enumerate() {
        let (page, layer) = if number == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report")
        };
        let layer = doc.get_page(page).get_layer(layer);

        let mut y = PAGE_HEIGHT - MARGIN;
        for line in lines {
            let line = if embedded {
                line.clone()
            } else {
                builtin_safe(line)
            };
            layer.use_text(line, FONT_SIZE, Mm(MARGIN), Mm(y), &font);
            y -= LINE_HEIGHT;
        }

        let footer = format!(
            "HRIA Report - {} | {}/{} | {}",
            report.info.name,
            number + 1,
            total,
            report.last_updated.format("%Y-%m-%d")
        );
        let footer = if embedded {
            footer
        } else {
            builtin_safe(&footer)
        };
        layer.use_text(footer, FONT_SIZE - 2.0, Mm(MARGIN), Mm(MARGIN / 2.0), &font);
    }

    doc.save_to_bytes()
        .map_err(|e| PdfError::Render(format!("{:?}", e)))
}

fn load_font(
    doc: &PdfDocumentReference,
    options: &PdfOptions,
) -> Result<(IndirectFontRef, bool), PdfError> {
    if let Some(path) = &options.font {
        let bytes = fs::read(path).map_err(|source| PdfError::Font {
            path: path.clone(),
            source,
        })?;
        let font = doc
            .add_external_font(Cursor::new(bytes))
            .map_err(|e| PdfError::Render(format!("{:?}", e)))?;
        return Ok((font, true));
    }
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Render(format!("{:?}", e)))?;
    Ok((font, false))
}
