//! Layout config – the intermediate representation between layout computation
//! and PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page.

use crate::fonts::FontFace;
use crate::format::MM_TO_PT;

/// Page size and margins, in PDF points (1 pt = 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    /// Distance from the top edge to the header baseline box.
    pub margin_header: f32,
    /// Distance from the bottom edge to the footer line box.
    pub margin_footer: f32,
}

impl PageGeometry {
    /// Build from a page size and margins given in millimetres, ordered
    /// top, right, bottom, left, header, footer.
    pub fn from_mm(width_mm: f32, height_mm: f32, margins_mm: [f32; 6]) -> Self {
        let [top, right, bottom, left, header, footer] = margins_mm.map(|m| m * MM_TO_PT);
        Self {
            width: width_mm * MM_TO_PT,
            height: height_mm * MM_TO_PT,
            margin_top: top,
            margin_right: right,
            margin_bottom: bottom,
            margin_left: left,
            margin_header: header,
            margin_footer: footer,
        }
    }

    pub fn content_width(&self) -> f32 {
        (self.width - self.margin_left - self.margin_right).max(1.0)
    }

    pub fn content_height(&self) -> f32 {
        (self.height - self.margin_top - self.margin_bottom).max(1.0)
    }
}

impl Default for PageGeometry {
    /// A4 portrait with 40 pt margins.
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin_top: 40.0,
            margin_right: 40.0,
            margin_bottom: 40.0,
            margin_left: 40.0,
            margin_header: 20.0,
            margin_footer: 20.0,
        }
    }
}

/// Document information dictionary entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: Vec<String>,
    pub creator: String,
}

/// A complete document layout ready for rendering.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub metadata: DocumentMetadata,
    /// Width of each page in PDF points.
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,

    /// Content (mutually exclusive in practice)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub face: FontFace,
    pub font_size: f32,
    pub color: [f32; 4],
    pub line_height: f32,
    pub underline: bool,
    /// List bullet/number prefix (e.g. "• " or "1. ")
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (for alignment)
    pub x_offset: f32,
    /// Y offset from the top of the text content area
    pub y_offset: f32,
}

#[derive(Debug, Clone)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// An empty document for the given geometry.
    pub fn new(geometry: &PageGeometry, metadata: DocumentMetadata) -> Self {
        Self {
            metadata,
            page_width_pt: geometry.width,
            page_height_pt: geometry.height,
            pages: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_from_millimetres() {
        let g = PageGeometry::from_mm(210.0, 297.0, [16.0, 15.0, 16.0, 15.0, 9.0, 9.0]);
        assert!((g.width - 595.28).abs() < 0.01);
        assert!((g.height - 841.89).abs() < 0.01);
        assert!((g.margin_left - 42.52).abs() < 0.01);
        assert!((g.content_width() - (595.28 - 2.0 * 42.52)).abs() < 0.05);
    }
}
