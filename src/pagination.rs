//! Pagination – splits a flat list of positioned boxes into pages.
//!
//! Handles:
//! - Page boundaries derived from the page geometry
//! - Page-break-before / page-break-after hints
//! - Table row splitting across pages
//! - Line-by-line splitting of text taller than the space left on a page
//! - Running headers and footers with page number placeholders

use crate::layout::{face_for, BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::fonts::{line_height_px, FontFace};
use crate::style::{self, ComputedStyle, Typography};

/// Replaced by the current page number in headers and footers.
pub const PAGE_NUMBER_PLACEHOLDER: &str = "{PAGENO}";
/// Replaced by the total page count in headers and footers.
pub const PAGE_COUNT_PLACEHOLDER: &str = "{nbpg}";

/// Recursively expand any pure-container box whose height exceeds a single
/// page so its children can be split across pages individually.
fn flatten_for_pagination(boxes: &[PositionedBox], content_height: f32) -> Vec<&PositionedBox> {
    let mut result = Vec::new();
    for pbox in boxes {
        if pbox.height > content_height
            && matches!(pbox.content, BoxContent::None)
            && !pbox.children.is_empty()
        {
            result.extend(flatten_for_pagination(&pbox.children, content_height));
        } else {
            result.push(pbox);
        }
    }
    result
}

/// Accumulates pages while walking the flattened box list.
struct PageCursor {
    pages: Vec<PageLayout>,
    current: PageLayout,
    /// Document-space y at which the current page begins.
    page_start_doc_y: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: PageLayout {
                page_index: 0,
                boxes: Vec::new(),
            },
            page_start_doc_y: 0.0,
        }
    }

    fn is_empty(&self) -> bool {
        self.current.boxes.is_empty()
    }

    fn y_on_page(&self, doc_y: f32) -> f32 {
        (doc_y - self.page_start_doc_y).max(0.0)
    }

    /// Close the current page; the next one starts at `doc_y`.
    fn break_at(&mut self, doc_y: f32) {
        let next = PageLayout {
            page_index: self.pages.len() + 1,
            boxes: Vec::new(),
        };
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.page_start_doc_y = doc_y;
    }

    fn place(&mut self, pbox: &PositionedBox, geometry: &PageGeometry) {
        let abs_y = geometry.margin_top + self.y_on_page(pbox.y);
        self.current.boxes.push(build_layout_box(pbox, pbox.x, abs_y));
    }

    fn finish(mut self) -> Vec<PageLayout> {
        if !self.current.boxes.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Convert positioned boxes into a paginated LayoutConfig.
pub fn paginate(
    boxes: &[PositionedBox],
    geometry: &PageGeometry,
    metadata: DocumentMetadata,
) -> LayoutConfig {
    let mut config = LayoutConfig::new(geometry, metadata);
    let content_height = geometry.content_height();
    let flat = flatten_for_pagination(boxes, content_height);
    let mut cursor = PageCursor::new();

    for pbox in flat {
        if pbox.page_break_before() && !cursor.is_empty() {
            cursor.break_at(pbox.y);
        }

        let box_bottom = cursor.y_on_page(pbox.y) + pbox.height;
        if box_bottom > content_height && is_splittable_text(pbox, content_height) {
            split_text_box(pbox, &mut cursor, geometry, content_height);
            if pbox.page_break_after() {
                cursor.break_at(pbox.y + pbox.height);
            }
            continue;
        }
        if box_bottom > content_height && !cursor.is_empty() {
            if is_table_like(pbox) && !pbox.page_break_inside_avoid() {
                split_table_box(pbox, &mut cursor, geometry, content_height);
                continue;
            }
            cursor.break_at(pbox.y);
        }

        cursor.place(pbox, geometry);

        if pbox.page_break_after() {
            cursor.break_at(pbox.y + pbox.height);
        }
    }

    config.pages = cursor.finish();
    config
}

fn is_table_like(pbox: &PositionedBox) -> bool {
    pbox.style.display == style::Display::Grid && !pbox.children.is_empty()
}

fn split_table_box(
    pbox: &PositionedBox,
    cursor: &mut PageCursor,
    geometry: &PageGeometry,
    content_height: f32,
) {
    for row in &pbox.children {
        if cursor.y_on_page(row.y) + row.height > content_height && !cursor.is_empty() {
            cursor.break_at(row.y);
        }
        cursor.place(row, geometry);
    }
}

/// Multi-line text may be split unless it asks to stay whole and fits on a
/// page of its own.
fn is_splittable_text(pbox: &PositionedBox, content_height: f32) -> bool {
    match &pbox.content {
        BoxContent::Text { lines } => {
            lines.len() > 1 && (!pbox.page_break_inside_avoid() || pbox.height > content_height)
        }
        _ => false,
    }
}

/// Place a text box as a run of fragments, each holding the lines that fit
/// in the rest of the current page. Top padding stays with the first
/// fragment and bottom padding with the last.
fn split_text_box(
    pbox: &PositionedBox,
    cursor: &mut PageCursor,
    geometry: &PageGeometry,
    content_height: f32,
) {
    let BoxContent::Text { lines } = &pbox.content else {
        return;
    };
    let s = &pbox.style;
    let line_height = line_height_px(s.font_size, s.line_height);
    let mut remaining = lines.as_slice();
    let mut doc_y = pbox.y;
    let mut first = true;

    while !remaining.is_empty() {
        let pad_top = if first { s.padding_top } else { 0.0 };
        let room = content_height - cursor.y_on_page(doc_y) - pad_top;
        let mut count = ((room / line_height).floor().max(0.0) as usize).min(remaining.len());
        if count == 0 {
            if !cursor.is_empty() {
                cursor.break_at(doc_y);
                continue;
            }
            // Page shorter than one line: place it anyway.
            count = 1;
        }

        let last = count == remaining.len();
        let pad_bottom = if last { s.padding_bottom } else { 0.0 };
        let mut style = s.clone();
        style.padding_top = pad_top;
        style.padding_bottom = pad_bottom;
        let height = pad_top + count as f32 * line_height + pad_bottom;

        let fragment = PositionedBox {
            x: pbox.x,
            y: doc_y,
            width: pbox.width,
            height,
            style,
            content: BoxContent::Text {
                lines: remaining[..count].to_vec(),
            },
            children: Vec::new(),
        };
        cursor.place(&fragment, geometry);

        remaining = &remaining[count..];
        doc_y += height;
        first = false;
        if !remaining.is_empty() {
            cursor.break_at(doc_y);
        }
    }
}

/// Recursively build a LayoutBox tree where every box carries page-absolute
/// x/y coordinates (origin = top-left of the physical page).
///
/// PositionedBox.y values are document-space absolutes, so a child's
/// absolute y is `parent_abs_y + (child.y - parent.y)`. x is already
/// page-absolute.
fn build_layout_box(pbox: &PositionedBox, abs_x: f32, abs_y: f32) -> LayoutBox {
    let s = &pbox.style;
    let mut lb = LayoutBox::new(abs_x, abs_y, pbox.width, pbox.height);

    if !s.background_color.is_transparent() {
        lb.background_color = Some(rgba(s.background_color));
    }

    if s.border_width > 0.0 {
        lb.border = Some(BorderStyle {
            width: s.border_width,
            color: rgba(s.border_color),
        });
    }

    match &pbox.content {
        BoxContent::Text { lines } => {
            let face = face_for(s);
            let line_height = line_height_px(s.font_size, s.line_height);
            let inner_width = pbox.width - s.padding_left - s.padding_right;
            let text_lines = lines
                .iter()
                .enumerate()
                .map(|(i, line)| TextLine {
                    text: line.clone(),
                    x_offset: s.padding_left
                        + align_offset(s.text_align, inner_width, face.text_width(line, s.font_size)),
                    y_offset: s.padding_top + i as f32 * line_height,
                })
                .collect();
            lb.text = Some(text_content(s, face, text_lines, line_height, None));
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::ListItem { marker } => {
            // The marker is drawn in the left gutter; the item's text comes
            // from its child boxes.
            let line_height = line_height_px(s.font_size, s.line_height);
            let face = FontFace { italic: false, ..face_for(s) };
            lb.text = Some(text_content(s, face, Vec::new(), line_height, Some(marker.clone())));
        }
        BoxContent::None => {}
    }

    for child in &pbox.children {
        let child_abs_y = abs_y + (child.y - pbox.y);
        lb.children.push(build_layout_box(child, child.x, child_abs_y));
    }

    lb
}

fn text_content(
    s: &ComputedStyle,
    face: FontFace,
    lines: Vec<TextLine>,
    line_height: f32,
    list_marker: Option<String>,
) -> TextContent {
    TextContent {
        lines,
        face,
        font_size: s.font_size,
        color: rgba(s.color),
        line_height,
        underline: list_marker.is_none() && s.text_decoration == style::TextDecoration::Underline,
        list_marker,
    }
}

fn rgba(c: style::Color) -> [f32; 4] {
    [c.r, c.g, c.b, c.a]
}

fn align_offset(align: style::TextAlign, available: f32, used: f32) -> f32 {
    match align {
        style::TextAlign::Left => 0.0,
        style::TextAlign::Center => ((available - used) / 2.0).max(0.0),
        style::TextAlign::Right => (available - used).max(0.0),
    }
}

// ---------------------------------------------------------------------------
// Running headers / footers
// ---------------------------------------------------------------------------

/// Substitute page number placeholders.
pub fn expand_placeholders(template: &str, page_number: usize, page_count: usize) -> String {
    template
        .replace(PAGE_NUMBER_PLACEHOLDER, &page_number.to_string())
        .replace(PAGE_COUNT_PLACEHOLDER, &page_count.to_string())
}

/// Split `left|center|right` into its three segments. Text without a
/// separator is centred.
pub fn split_segments(template: &str) -> [&str; 3] {
    let mut parts = template.splitn(3, '|');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(left), Some(center), right) => [left, center, right.unwrap_or("")],
        (Some(only), None, _) => ["", only, ""],
        _ => ["", "", ""],
    }
}

/// Draw header and footer text on every page of `config`.
pub fn decorate_pages(
    config: &mut LayoutConfig,
    geometry: &PageGeometry,
    typography: &Typography,
    header: Option<&str>,
    footer: Option<&str>,
) {
    let page_count = config.pages.len();
    let style = ComputedStyle {
        font_family: typography.font_family.clone(),
        font_size: typography.font_size,
        line_height: typography.line_height,
        ..ComputedStyle::default()
    };
    let line_height = line_height_px(style.font_size, style.line_height);
    let footer_y = geometry.height - geometry.margin_footer - line_height;

    for page in &mut config.pages {
        let number = page.page_index + 1;
        for (template, y) in [(header, geometry.margin_header), (footer, footer_y)] {
            if let Some(template) = template.filter(|t| !t.trim().is_empty()) {
                let text = expand_placeholders(template, number, page_count);
                page.boxes.push(running_line(&text, y, geometry, &style, line_height));
            }
        }
    }
}

fn running_line(
    text: &str,
    y: f32,
    geometry: &PageGeometry,
    style: &ComputedStyle,
    line_height: f32,
) -> LayoutBox {
    let face = face_for(style);
    let width = geometry.content_width();
    let aligns = [
        style::TextAlign::Left,
        style::TextAlign::Center,
        style::TextAlign::Right,
    ];
    let lines = split_segments(text)
        .into_iter()
        .zip(aligns)
        .filter(|(segment, _)| !segment.trim().is_empty())
        .map(|(segment, align)| {
            let segment = segment.trim();
            TextLine {
                text: segment.to_string(),
                x_offset: align_offset(align, width, face.text_width(segment, style.font_size)),
                y_offset: 0.0,
            }
        })
        .collect();

    let mut lb = LayoutBox::new(geometry.margin_left, y, width, line_height);
    lb.text = Some(text_content(style, face, lines, line_height, None));
    lb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;
    use crate::dom::parse_html;
    use crate::layout::compute_layout;
    use crate::style::build_styled_tree;

    fn paginate_html(html: &str) -> LayoutConfig {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None, &Stylesheet::default());
        let geometry = PageGeometry::default();
        let boxes = compute_layout(&styled, &geometry).unwrap();
        paginate(&boxes, &geometry, DocumentMetadata::default())
    }

    #[test]
    fn single_page() {
        let config = paginate_html("<p>Short text</p>");
        assert_eq!(config.pages.len(), 1);
        let first = &config.pages[0].boxes[0];
        assert!((first.y - 40.0).abs() < 0.01, "content starts at the top margin");
    }

    #[test]
    fn multiple_pages() {
        let html: String = (0..60)
            .map(|i| format!("<p>Paragraph {i} with some text</p>"))
            .collect();
        let config = paginate_html(&html);
        assert!(
            config.pages.len() > 1,
            "Expected multiple pages, got {}",
            config.pages.len()
        );
        for (i, page) in config.pages.iter().enumerate() {
            assert_eq!(page.page_index, i);
        }
    }

    #[test]
    fn explicit_page_break() {
        let config = paginate_html(r#"<p>one</p><div style="page-break-before: always"></div><p>two</p>"#);
        assert_eq!(config.pages.len(), 2);
    }

    #[test]
    fn long_paragraph_continues_on_next_pages() {
        let html = format!("<p>{}</p>", "lorem ipsum dolor sit amet ".repeat(3000));
        let config = paginate_html(&html);
        let geometry = PageGeometry::default();
        assert!(config.pages.len() > 1, "got {} page(s)", config.pages.len());

        let mut total_lines = 0;
        for page in &config.pages {
            for b in &page.boxes {
                assert!(
                    b.y + b.height <= geometry.height - geometry.margin_bottom + 0.5,
                    "box at {} with height {} runs off page {}",
                    b.y,
                    b.height,
                    page.page_index
                );
                total_lines += b.text.as_ref().map_or(0, |t| t.lines.len());
            }
        }
        let first_line = &config.pages[1].boxes[0].text.as_ref().unwrap().lines[0];
        assert!(first_line.y_offset.abs() < 0.01, "continuation starts without padding");
        assert!(total_lines > 100);
    }

    #[test]
    fn short_unbreakable_text_stays_whole() {
        let filler = "<p>filler</p>".repeat(45);
        let html = format!(
            r#"{filler}<p style="page-break-inside: avoid">{}</p>"#,
            "word ".repeat(200)
        );
        let config = paginate_html(&html);
        let fragments: Vec<usize> = config
            .pages
            .iter()
            .flat_map(|page| page.boxes.iter())
            .filter_map(|b| b.text.as_ref())
            .filter(|t| t.lines.first().is_some_and(|l| l.text.starts_with("word")))
            .map(|t| t.lines.len())
            .collect();
        assert_eq!(fragments.len(), 1, "got fragments {fragments:?}");
        assert!(fragments[0] > 5);
    }

    #[test]
    fn empty_document_has_one_page() {
        let config = paginate_html("");
        assert_eq!(config.pages.len(), 1);
    }

    #[test]
    fn segments_and_placeholders() {
        assert_eq!(split_segments("a|b|c"), ["a", "b", "c"]);
        assert_eq!(split_segments("title"), ["", "title", ""]);
        assert_eq!(split_segments("|{PAGENO}"), ["", "{PAGENO}", ""]);
        assert_eq!(expand_placeholders("{PAGENO} / {nbpg}", 2, 5), "2 / 5");
    }

    #[test]
    fn headers_and_footers_on_every_page() {
        let mut config = paginate_html(
            r#"<p>one</p><div style="page-break-before: always"></div><p>two</p>"#,
        );
        let geometry = PageGeometry::default();
        decorate_pages(
            &mut config,
            &geometry,
            &Typography::default(),
            Some("Report||{PAGENO}"),
            Some("Page {PAGENO} of {nbpg}"),
        );
        let last = &config.pages[1];
        let texts: Vec<&str> = last
            .boxes
            .iter()
            .filter_map(|b| b.text.as_ref())
            .flat_map(|t| t.lines.iter().map(|l| l.text.as_str()))
            .collect();
        assert!(texts.contains(&"Report"));
        assert!(texts.contains(&"2"));
        assert!(texts.contains(&"Page 2 of 2"));
        let footer = last.boxes.last().unwrap();
        assert!(footer.y > geometry.height / 2.0);
    }
}
