//! Layout engine – uses Taffy to compute flexbox / grid layout from a styled
//! DOM tree, then converts the result into a flat list of positioned boxes.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::Result;
use crate::fonts::{line_height_px, wrap_text, FontFace};
use crate::layout_config::PageGeometry;
use crate::style::{self, ComputedStyle, FontStyle as CssFontStyle, FontWeight, StyledNode};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

impl PositionedBox {
    pub fn page_break_before(&self) -> bool {
        self.style.page_break_before
    }

    pub fn page_break_after(&self) -> bool {
        self.style.page_break_after
    }

    pub fn page_break_inside_avoid(&self) -> bool {
        self.style.page_break_inside_avoid
    }
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text { lines: Vec<String> },
    Image { src: String },
    /// List item marker
    ListItem { marker: String },
}

/// Face used to measure and draw text in `style`.
pub fn face_for(style: &ComputedStyle) -> FontFace {
    FontFace::new(
        &style.font_family,
        style.font_weight == FontWeight::Bold,
        style.font_style == CssFontStyle::Italic,
    )
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder {
    taffy: TaffyTree<()>,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    available_width: f32,
}

impl LayoutBuilder {
    fn new(available_width: f32) -> Self {
        Self {
            taffy: TaffyTree::new(),
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            available_width,
        }
    }

    /// Collect all text content from an inline subtree (spans, text nodes).
    fn collect_inline_text(node: &StyledNode) -> String {
        match node {
            StyledNode::Text { text, .. } => text.clone(),
            StyledNode::Element { children, .. } => {
                children.iter().map(Self::collect_inline_text).collect()
            }
        }
    }

    /// True when every child is a text node or an inline element with inline
    /// children only.
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => {
                matches!(
                    style.display,
                    style::Display::Inline | style::Display::InlineBlock
                ) && Self::all_inline(gc)
            }
        })
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> Result<NodeId> {
        match styled {
            StyledNode::Text { text, style } => {
                self.build_text_node(text, style, parent_width, false)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// Wrap `text` into a leaf sized to its lines. A `collapsed` paragraph
    /// keeps the margin and padding of its block.
    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        parent_width: f32,
        collapsed: bool,
    ) -> Result<NodeId> {
        let face = face_for(style);
        let font_size = style.font_size;
        let line_height = line_height_px(font_size, style.line_height);

        let max_w = if parent_width > 0.0 {
            parent_width
                - style.margin_left
                - style.margin_right
                - style.padding_left
                - style.padding_right
        } else {
            self.available_width
        };
        let lines = wrap_text(text.trim(), face, font_size, max_w);

        let text_width = lines
            .iter()
            .map(|l| face.text_width(l, font_size))
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height;

        let mut taffy_style = Style::default();
        let (mut pad_x, mut pad_y) = (0.0, 0.0);
        if collapsed {
            taffy_style.margin = margin_rect(style);
            taffy_style.padding = padding_rect(style);
            pad_x = style.padding_left + style.padding_right;
            pad_y = style.padding_top + style.padding_bottom;
        }
        // Sizes are border-box. Aligned text needs the full line box.
        taffy_style.size = Size {
            width: if style.text_align == style::TextAlign::Left {
                Dimension::Length(text_width + pad_x)
            } else {
                Dimension::Percent(1.0)
            },
            height: Dimension::Length(text_height + pad_y),
        };

        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(node, BoxContent::Text { lines });
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> Result<NodeId> {
        // Paragraph-like block elements whose children are all inline get their
        // text merged into a single wrapped text node so spans flow correctly.
        let is_paragraph = matches!(tag, Tag::P | Tag::H1 | Tag::H2 | Tag::H3);
        if is_paragraph && !children.is_empty() && Self::all_inline(children) {
            let raw: String = children.iter().map(Self::collect_inline_text).collect();
            let combined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if !combined.is_empty() {
                return self.build_text_node(&combined, style, parent_width, true);
            }
        }

        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width - style.margin_left - style.margin_right,
        };
        let inner_width = my_width - style.padding_left - style.padding_right - 2.0 * style.border_width;

        // Estimate per-child width for flex-row containers and table rows so
        // that text is word-wrapped to the right column width at build time.
        let is_flex_row =
            style.display == style::Display::Flex && style.flex_direction == style::FlexDirection::Row;
        let columns = if *tag == Tag::Tr || is_flex_row {
            children
                .iter()
                .filter(|c| matches!(c, StyledNode::Element { .. }))
                .count()
                .max(1)
        } else if style.display == style::Display::Grid && !style.grid_template_columns.is_empty() {
            style.grid_template_columns.len()
        } else {
            1
        };
        let gap_total = style.gap * columns.saturating_sub(1) as f32;
        let child_build_width = ((inner_width - gap_total) / columns as f32).max(1.0);

        let mut child_nodes = Vec::with_capacity(children.len());
        let mut list_counter = 0u32;

        for child in children {
            let child_id = self.build_node(child, child_build_width)?;

            // Record the marker so pagination can draw it in the left gutter.
            if let StyledNode::Element { tag: Tag::Li, .. } = child {
                list_counter += 1;
                let marker = if *tag == Tag::Ol {
                    format!("{list_counter}. ")
                } else {
                    "\u{2022} ".to_string()
                };
                self.node_content.insert(child_id, BoxContent::ListItem { marker });
            }
            child_nodes.push(child_id);
        }

        // Images with an auto dimension take it from the decoded bitmap.
        let style_override = if *tag == Tag::Img
            && (style.width == style::Dimension::Auto || style.height == style::Dimension::Auto)
        {
            let src = attrs.get("src").map(String::as_str).unwrap_or("");
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let taffy_style = computed_to_taffy(effective_style, tag);
        let node = self.taffy.new_with_children(taffy_style, &child_nodes)?;
        self.node_styles.insert(node, effective_style.clone());

        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox> {
        let layout = self.taffy.layout(node)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            children,
        })
    }
}

fn margin_rect(s: &ComputedStyle) -> Rect<LengthPercentageAuto> {
    Rect {
        top: LengthPercentageAuto::Length(s.margin_top),
        right: LengthPercentageAuto::Length(s.margin_right),
        bottom: LengthPercentageAuto::Length(s.margin_bottom),
        left: LengthPercentageAuto::Length(s.margin_left),
    }
}

fn padding_rect(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(s.padding_top),
        right: LengthPercentage::Length(s.padding_right),
        bottom: LengthPercentage::Length(s.padding_bottom),
        left: LengthPercentage::Length(s.padding_left),
    }
}

fn uniform(width: f32) -> Rect<LengthPercentage> {
    let w = LengthPercentage::Length(width);
    Rect {
        top: w,
        right: w,
        bottom: w,
        left: w,
    }
}

fn dim_to_taffy(d: style::Dimension) -> Dimension {
    match d {
        style::Dimension::Auto => Dimension::Auto,
        style::Dimension::Px(v) => Dimension::Length(v),
        style::Dimension::Percent(v) => Dimension::Percent(v / 100.0),
    }
}

fn computed_to_taffy(s: &ComputedStyle, tag: &Tag) -> Style {
    let mut ts = Style {
        margin: margin_rect(s),
        padding: padding_rect(s),
        border: uniform(s.border_width),
        ..Style::default()
    };

    // HTML table model: always flex regardless of computed display.
    match tag {
        Tag::Table => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
            ts.size.width = dim_to_taffy(s.width);
            ts.size.height = dim_to_taffy(s.height);
            ts.min_size.width = Dimension::Length(0.0);
            // Cells draw their own borders.
            ts.border = uniform(0.0);
            return ts;
        }
        Tag::Tr => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.align_items = Some(taffy::AlignItems::Stretch);
            ts.size.width = Dimension::Percent(1.0);
            ts.min_size.width = Dimension::Length(0.0);
            ts.padding = uniform(0.0);
            ts.border = uniform(0.0);
            return ts;
        }
        Tag::Td | Tag::Th => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
            ts.flex_grow = 1.0;
            ts.flex_shrink = 1.0;
            ts.flex_basis = Dimension::Length(0.0); // equal columns
            ts.min_size.width = Dimension::Length(0.0);
            return ts;
        }
        _ => {}
    }

    match s.display {
        style::Display::Flex => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = match s.flex_direction {
                style::FlexDirection::Row => taffy::FlexDirection::Row,
                style::FlexDirection::Column => taffy::FlexDirection::Column,
            };
            ts.flex_wrap = match s.flex_wrap {
                style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
            };
            ts.justify_content = Some(match s.justify_content {
                style::JustifyContent::Start => taffy::JustifyContent::Start,
                style::JustifyContent::End => taffy::JustifyContent::End,
                style::JustifyContent::Center => taffy::JustifyContent::Center,
                style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
            });
            ts.align_items = Some(match s.align_items {
                style::AlignItems::Start => taffy::AlignItems::Start,
                style::AlignItems::End => taffy::AlignItems::End,
                style::AlignItems::Center => taffy::AlignItems::Center,
                style::AlignItems::Stretch => taffy::AlignItems::Stretch,
            });
        }
        style::Display::Grid => {
            ts.display = taffy::Display::Grid;
            let cols = s.grid_template_columns.len().max(1);
            ts.grid_template_columns = vec![taffy::TrackSizingFunction::from_flex(1.0); cols];
        }
        style::Display::Block
        | style::Display::ListItem
        | style::Display::TableRow
        | style::Display::TableCell
        | style::Display::InlineBlock => {
            // Block-level elements stack vertically.
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
        }
        style::Display::Inline => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.flex_wrap = taffy::FlexWrap::Wrap;
        }
        style::Display::None => {
            ts.display = taffy::Display::None;
        }
    }

    ts.size = Size {
        width: dim_to_taffy(s.width),
        height: dim_to_taffy(s.height),
    };
    // Let flex items compress below their natural content size.
    ts.min_size = Size {
        width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
            Dimension::Length(0.0)
        } else {
            dim_to_taffy(s.min_width)
        },
        height: Dimension::Auto,
    };
    ts.max_size = Size {
        width: dim_to_taffy(s.max_width),
        height: Dimension::Auto,
    };
    ts.flex_grow = s.flex_grow;
    ts.flex_shrink = s.flex_shrink;
    ts.gap = Size {
        width: LengthPercentage::Length(s.gap),
        height: LengthPercentage::Length(s.gap),
    };
    ts
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Clone `style` with any `Auto` width/height replaced by values derived from
/// the intrinsic size of a base64 data-URI image.
///
/// Returns `None` when the src is not a decodable data URI or when both
/// dimensions are already specified.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    let (_, data) = src.strip_prefix("data:")?.split_once(";base64,")?;
    let bytes = BASE64_STD.decode(data.trim()).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        // Intrinsic size at 1 px = 1 pt, shrunk to fit the container.
        (None, None) => {
            let w = px_w.min(parent_width.max(1.0));
            s.width = style::Dimension::Px(w);
            s.height = style::Dimension::Px(w / aspect);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree, returning top-level positioned boxes in
/// document coordinates. `x` is page-absolute; `y` starts at 0 at the top of
/// the content area.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    geometry: &PageGeometry,
) -> Result<Vec<PositionedBox>> {
    let content_width = geometry.content_width();
    let mut builder = LayoutBuilder::new(content_width);

    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width))
        .collect::<Result<Vec<_>>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: Dimension::Length(content_width),
            height: Dimension::Auto,
        },
        ..Default::default()
    };
    let root = builder.taffy.new_with_children(root_style, &child_ids)?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(content_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    let root_box = builder.extract(root, geometry.margin_left, 0.0)?;
    Ok(root_box.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;

    fn layout(html: &str) -> Vec<PositionedBox> {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None, &Stylesheet::default());
        compute_layout(&styled, &PageGeometry::default()).unwrap()
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>");
        assert!(!boxes.is_empty(), "Should produce at least one box");
        let first = &boxes[0];
        assert!(first.width > 0.0, "Box should have width");
        assert!(first.height > 0.0, "Box should have height");
        assert!((first.x - 40.0).abs() < 0.01, "Box starts at the left margin");
    }

    #[test]
    fn layout_flex_row() {
        let boxes =
            layout(r#"<div class="flex"><div class="flex-1">A</div><div class="flex-1">B</div></div>"#);
        assert_eq!(boxes.len(), 1);
        let row = &boxes[0].children;
        assert_eq!(row.len(), 2);
        assert!(row[1].x > row[0].x, "Second column sits to the right");
    }

    #[test]
    fn list_items_carry_markers() {
        let boxes = layout("<ol><li>one</li><li>two</li></ol>");
        let markers: Vec<&str> = boxes[0]
            .children
            .iter()
            .filter_map(|b| match &b.content {
                BoxContent::ListItem { marker } => Some(marker.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["1. ", "2. "]);
    }

    #[test]
    fn hidden_elements_take_no_space() {
        let boxes = layout(r#"<p>a</p><div class="hidden"><p>b</p></div><p>c</p>"#);
        assert_eq!(boxes[1].height, 0.0);
    }
}
