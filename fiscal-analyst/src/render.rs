//! Markdown report to a paginated A4 PDF.

use std::fs;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Color, Mm, PdfDocument, Rgb};
use tracing::{debug, info, instrument};

use crate::document::Document;
use crate::error::{AnalystError, Result};
use crate::layout::{self, FOOTER_Y_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, Placed, Style};
use crate::report::AnalysisReport;

pub const REPORT_TITLE: &str = "Análise Legal de NF-e";

const LAYER: &str = "report";
const FOOTER_SIZE_PT: f32 = 9.0;

/// `<stem>_analise.pdf` inside `out_dir`, or next to the source when `out_dir` is `None`.
pub fn report_path(doc: &Document, out_dir: Option<&Path>) -> PathBuf {
    let name = format!("{}_analise.pdf", doc.stem());
    match out_dir {
        Some(dir) => dir.join(name),
        None => doc
            .path
            .parent()
            .map(|p| p.join(&name))
            .unwrap_or_else(|| PathBuf::from(&name)),
    }
}

/// Lays `markdown` out on A4 pages and encodes them as a PDF with a page-numbered footer.
///
/// # Errors
/// The `printpdf` error text when a font cannot be registered or the document cannot be encoded.
pub fn to_pdf(markdown: &str, footer: &str) -> std::result::Result<Vec<u8>, String> {
    let pages = layout::paginate(&layout::blocks(markdown));
    debug!(target: "fiscal_analyst::render", pages = pages.len(), "report laid out");

    let (doc, first_page, first_layer) =
        PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER);
    let font = |f: BuiltinFont| doc.add_builtin_font(f).map_err(|e| e.to_string());
    let regular = font(BuiltinFont::Helvetica)?;
    let bold = font(BuiltinFont::HelveticaBold)?;
    let mono = font(BuiltinFont::Courier)?;

    let total = pages.len();
    let mut first = Some((first_page, first_layer));
    for (n, lines) in pages.iter().enumerate() {
        let (page, layer) = match first.take() {
            Some(ids) => ids,
            None => doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER),
        };
        let layer = doc.get_page(page).get_layer(layer);

        for Placed { text, style, x_mm, y_mm } in lines {
            let font = match style {
                Style::Title | Style::Section => &bold,
                Style::Body => &regular,
                Style::Mono => &mono,
            };
            let (r, g, b) = style.color();
            layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
            layer.use_text(text.as_str(), style.size_pt(), Mm(*x_mm), Mm(*y_mm), font);
        }

        let (text, x) = layout::footer_line(footer, n + 1, total);
        layer.set_fill_color(Color::Rgb(Rgb::new(0.4, 0.4, 0.4, None)));
        layer.use_text(text, FOOTER_SIZE_PT, Mm(x), Mm(FOOTER_Y_MM), &regular);
    }

    doc.save_to_bytes().map_err(|e| e.to_string())
}

/// Writes the rendered report. Fallback reports are skipped and yield `Ok(None)`.
///
/// # Errors
/// [`AnalystError::Render`] when the PDF cannot be produced or the file cannot be written.
#[instrument(skip_all, fields(doc = %doc.path.display()))]
pub fn render_report(
    report: &AnalysisReport,
    doc: &Document,
    out_dir: Option<&Path>,
    footer: &str,
) -> Result<Option<PathBuf>> {
    if report.fallback {
        info!(target: "fiscal_analyst::render", "fallback report, rendering skipped");
        return Ok(None);
    }

    let path = report_path(doc, out_dir);
    let render_err = |reason: String| AnalystError::Render {
        path: path.clone(),
        reason,
    };

    let bytes = to_pdf(&report.markdown, footer).map_err(render_err)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| render_err(e.to_string()))?;
    }
    fs::write(&path, &bytes).map_err(|e| render_err(e.to_string()))?;

    info!(target: "fiscal_analyst::render", path = %path.display(), bytes = bytes.len(), "report written");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str) -> Document {
        Document {
            path: PathBuf::from(path),
            text: String::new(),
        }
    }

    #[test]
    fn report_named_after_source() {
        assert_eq!(
            report_path(&doc("/in/nfe_42.xml"), None),
            PathBuf::from("/in/nfe_42_analise.pdf")
        );
        assert_eq!(
            report_path(&doc("/in/nfe_42.xml"), Some(Path::new("/out"))),
            PathBuf::from("/out/nfe_42_analise.pdf")
        );
    }

    #[test]
    fn pdf_is_produced_for_multi_page_reports() {
        let body: String = (0..150).map(|i| format!("- item {i} com texto\n")).collect();
        let bytes = to_pdf(&format!("# Análise\n\n## Resumo da NF-e\n\n{body}"), "Confidencial")
            .expect("pdf");
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
