//! Markdown to positioned lines on A4 pages.
//!
//! Two steps: [`blocks`] flattens the markdown event stream into headings,
//! paragraphs, list items and code, then [`paginate`] wraps them to the text
//! width and assigns each line a page and a baseline. Coordinates are in
//! millimetres from the bottom-left corner, as PDF expects.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 25.0;
/// Baseline of the footer line, inside the bottom margin.
pub const FOOTER_Y_MM: f32 = 15.0;

const PT_TO_MM: f32 = 0.3528;
const LINE_SPACING: f32 = 1.5;
const LIST_INDENT_MM: f32 = 6.0;

/// One structural element of the report.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Item { depth: usize, marker: String, text: String },
    Code(String),
    Rule,
}

/// Font family and colour of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Title,
    Section,
    Body,
    Mono,
}

impl Style {
    pub fn size_pt(self) -> f32 {
        match self {
            Style::Title => 18.0,
            Style::Section => 14.0,
            Style::Body => 11.0,
            Style::Mono => 9.5,
        }
    }

    /// RGB in `0.0..=1.0`.
    pub fn color(self) -> (f32, f32, f32) {
        match self {
            Style::Title => (0.0, 0.302, 0.6),
            Style::Section => (0.2, 0.4, 0.8),
            Style::Body | Style::Mono => (0.2, 0.2, 0.2),
        }
    }

    /// Average glyph advance as a fraction of the font size.
    fn advance(self) -> f32 {
        match self {
            Style::Mono => 0.6,
            Style::Title | Style::Section => 0.58,
            Style::Body => 0.52,
        }
    }

    fn line_height_mm(self) -> f32 {
        self.size_pt() * PT_TO_MM * LINE_SPACING
    }
}

/// A line of text at its final position.
#[derive(Clone, Debug, PartialEq)]
pub struct Placed {
    pub text: String,
    pub style: Style,
    pub x_mm: f32,
    pub y_mm: f32,
}

/// Flattens `markdown` into [`Block`]s. Inline markup is reduced to its text.
pub fn blocks(markdown: &str) -> Vec<Block> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = Vec::new();
    let mut buf = String::new();
    let mut heading: Option<u8> = None;
    let mut in_code = false;
    // next ordinal per open list; `None` for bullet lists
    let mut lists: Vec<Option<u64>> = Vec::new();
    // marker of each open item, taken by its first line
    let mut markers: Vec<Option<String>> = Vec::new();

    for event in Parser::new_ext(markdown, opts) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                buf.clear();
                heading = Some(match level {
                    HeadingLevel::H1 => 1,
                    HeadingLevel::H2 => 2,
                    _ => 3,
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                let text = buf.trim().to_string();
                buf.clear();
                if let Some(level) = heading.take() {
                    out.push(Block::Heading { level, text });
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if markers.is_empty() {
                    let text = buf.trim().to_string();
                    buf.clear();
                    if !text.is_empty() {
                        out.push(Block::Paragraph(text));
                    }
                } else {
                    buf.push(' ');
                }
            }
            Event::Start(Tag::List(first)) => {
                if !markers.is_empty() {
                    flush_item(&mut buf, &mut out, lists.len(), &mut markers);
                }
                lists.push(first);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
            }
            Event::Start(Tag::Item) => {
                let marker = match lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{n}.");
                        *n += 1;
                        m
                    }
                    _ => "•".to_string(),
                };
                markers.push(Some(marker));
            }
            Event::End(TagEnd::Item) => {
                flush_item(&mut buf, &mut out, lists.len(), &mut markers);
                markers.pop();
            }
            Event::Start(Tag::CodeBlock(_)) => {
                buf.clear();
                in_code = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code = false;
                out.push(Block::Code(buf.trim_end().to_string()));
                buf.clear();
            }
            Event::End(TagEnd::TableCell) => buf.push_str(" | "),
            Event::End(TagEnd::TableHead | TagEnd::TableRow) => {
                let text = buf.trim().trim_end_matches('|').trim().to_string();
                buf.clear();
                if !text.is_empty() {
                    out.push(Block::Paragraph(text));
                }
            }
            Event::Text(t) | Event::Code(t) => buf.push_str(&t),
            Event::SoftBreak => buf.push(if in_code { '\n' } else { ' ' }),
            Event::HardBreak => buf.push('\n'),
            Event::Rule => out.push(Block::Rule),
            _ => {}
        }
    }

    let rest = buf.trim();
    if !rest.is_empty() {
        out.push(Block::Paragraph(rest.to_string()));
    }
    out
}

fn flush_item(
    buf: &mut String,
    out: &mut Vec<Block>,
    open_lists: usize,
    markers: &mut [Option<String>],
) {
    let text = buf.trim().to_string();
    buf.clear();
    if text.is_empty() {
        return;
    }
    let marker = markers.last_mut().and_then(Option::take).unwrap_or_default();
    out.push(Block::Item {
        depth: open_lists.saturating_sub(1),
        marker,
        text,
    });
}

/// Greedy word wrap to `width` characters. Words longer than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let mut line = String::new();
        let mut len = 0;
        for word in raw.split_whitespace() {
            let mut word = word;
            loop {
                let wlen = word.chars().count();
                let gap = usize::from(len > 0);
                if len + gap + wlen <= width {
                    if gap == 1 {
                        line.push(' ');
                    }
                    line.push_str(word);
                    len += gap + wlen;
                    break;
                }
                if len > 0 {
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                    continue;
                }
                let split = word
                    .char_indices()
                    .nth(width)
                    .map_or(word.len(), |(i, _)| i);
                lines.push(word[..split].to_string());
                word = &word[split..];
                if word.is_empty() {
                    break;
                }
            }
        }
        if len > 0 || lines.is_empty() {
            lines.push(line);
        }
    }
    lines
}

fn chars_per_line(style: Style, width_mm: f32) -> usize {
    let glyph_mm = style.size_pt() * PT_TO_MM * style.advance();
    (width_mm / glyph_mm).floor().max(1.0) as usize
}

/// Lays `blocks` out on A4 pages. Always yields at least one page.
///
/// A heading is moved to the next page when it would otherwise be the last
/// thing on a page.
pub fn paginate(blocks: &[Block]) -> Vec<Vec<Placed>> {
    let text_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let top = PAGE_HEIGHT_MM - MARGIN_MM;
    let bottom = MARGIN_MM;

    let mut pages: Vec<Vec<Placed>> = vec![Vec::new()];
    let mut y = top;

    for block in blocks {
        let (style, indent, lines, before, after) = match block {
            Block::Heading { level, text } => {
                let style = if *level == 1 { Style::Title } else { Style::Section };
                let before = if *level == 1 { 0.0 } else { 6.0 };
                (style, 0.0, wrap(text, chars_per_line(style, text_width)), before, 3.0)
            }
            Block::Paragraph(text) => {
                (Style::Body, 0.0, wrap(text, chars_per_line(Style::Body, text_width)), 0.0, 2.5)
            }
            Block::Item { depth, marker, text } => {
                let indent = LIST_INDENT_MM * (*depth as f32 + 1.0);
                let width = chars_per_line(Style::Body, text_width - indent);
                let mut lines = wrap(text, width.saturating_sub(3).max(1));
                if let Some(first) = lines.first_mut() {
                    *first = format!("{marker} {first}");
                }
                (Style::Body, indent, lines, 0.0, 1.0)
            }
            Block::Code(text) => {
                let indent = 4.0;
                let lines = wrap_code(text, chars_per_line(Style::Mono, text_width - indent));
                (Style::Mono, indent, lines, 1.0, 3.0)
            }
            Block::Rule => {
                let rule = "_".repeat(chars_per_line(Style::Body, text_width));
                (Style::Body, 0.0, vec![rule], 1.0, 3.0)
            }
        };

        let lh = style.line_height_mm();
        let keep_with_next = matches!(block, Block::Heading { .. });
        let needed = if keep_with_next { lh * 3.0 } else { lh };
        if y - before - needed < bottom && !pages.last().is_some_and(Vec::is_empty) {
            pages.push(Vec::new());
            y = top;
        } else if y < top {
            y -= before;
        }

        for text in lines {
            if y - lh < bottom {
                pages.push(Vec::new());
                y = top;
            }
            y -= lh;
            if let Some(page) = pages.last_mut() {
                page.push(Placed {
                    text,
                    style,
                    x_mm: MARGIN_MM + indent,
                    y_mm: y,
                });
            }
        }
        y -= after;
    }
    pages
}

/// Code keeps its own line breaks; long lines are cut, not reflowed.
fn wrap_code(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            out.push(String::new());
            continue;
        }
        out.extend(chars.chunks(width).map(|c| c.iter().collect::<String>()));
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Footer text for page `n` of `total`, right-aligned `x` in millimetres.
pub fn footer_line(footer: &str, n: usize, total: usize) -> (String, f32) {
    let text = if footer.trim().is_empty() {
        format!("{n} / {total}")
    } else {
        format!("{}  {n} / {total}", footer.trim())
    };
    let glyph_mm = 9.0 * PT_TO_MM * Style::Body.advance();
    let width = text.chars().count() as f32 * glyph_mm;
    let x = (PAGE_WIDTH_MM - MARGIN_MM - width).max(MARGIN_MM);
    (text, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn headings_paragraphs_and_lists() {
        let md = "# Análise\n\n## Resumo\n\nTexto **forte** e `código`.\n\n- um\n- dois\n\n1. a\n2. b\n";
        assert_eq!(
            blocks(md),
            vec![
                Block::Heading { level: 1, text: "Análise".into() },
                Block::Heading { level: 2, text: "Resumo".into() },
                Block::Paragraph("Texto forte e código.".into()),
                Block::Item { depth: 0, marker: "•".into(), text: "um".into() },
                Block::Item { depth: 0, marker: "•".into(), text: "dois".into() },
                Block::Item { depth: 0, marker: "1.".into(), text: "a".into() },
                Block::Item { depth: 0, marker: "2.".into(), text: "b".into() },
            ]
        );
    }

    #[test]
    fn nested_list_keeps_parent_text() {
        let md = "- pai\n  - filho\n- outro\n";
        assert_eq!(
            blocks(md),
            vec![
                Block::Item { depth: 0, marker: "•".into(), text: "pai".into() },
                Block::Item { depth: 1, marker: "•".into(), text: "filho".into() },
                Block::Item { depth: 0, marker: "•".into(), text: "outro".into() },
            ]
        );
    }

    #[test]
    fn table_rows_become_lines() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        assert_eq!(
            blocks(md),
            vec![Block::Paragraph("a | b".into()), Block::Paragraph("1 | 2".into())]
        );
    }

    #[test]
    fn wrap_breaks_on_words_and_splits_long_ones() {
        assert_eq!(wrap("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap("", 10), vec![""]);
        assert!(wrap(&"palavra ".repeat(50), 20).iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn long_reports_span_pages_within_margins() {
        let md: String = (0..120).map(|i| format!("Parágrafo {i} com algum texto.\n\n")).collect();
        let pages = paginate(&blocks(&format!("# Título\n\n{md}")));

        assert!(pages.len() > 1);
        for page in &pages {
            assert!(!page.is_empty());
            assert!(page.iter().all(|l| l.y_mm >= MARGIN_MM && l.y_mm <= PAGE_HEIGHT_MM - MARGIN_MM));
            assert!(page.windows(2).all(|w| w[0].y_mm > w[1].y_mm));
        }
        assert_eq!(pages[0][0].style, Style::Title);
    }

    #[test]
    fn empty_markdown_still_has_a_page() {
        assert_eq!(paginate(&blocks("")), vec![Vec::new()]);
    }

    #[test]
    fn footer_shows_page_counter() {
        let (text, x) = footer_line("Confidencial", 2, 3);
        assert_eq!(text, "Confidencial  2 / 3");
        assert!(x > MARGIN_MM && x < PAGE_WIDTH_MM - MARGIN_MM);
    }
}
