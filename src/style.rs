//! Style resolver – cascades tag defaults, stylesheet rules, Tailwind-like
//! utility classes and inline `style` attributes into a flat
//! [`ComputedStyle`] consumed by the layout engine.
//!
//! Precedence, lowest first: tag defaults, inherited text properties,
//! stylesheet rules (by specificity, then source order), utility classes,
//! inline styles.

use std::collections::HashMap;

use crate::css::{parse_declarations, Stylesheet};
use crate::dom::{DomNode, ElementNode, Tag};
use crate::format::MM_TO_PT;

/// Body font size used when the document does not set one, in points.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Body font family used when the document does not set one.
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Grid
    pub grid_template_columns: Vec<GridTrack>,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Spacing (pt)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            grid_template_columns: Vec::new(),
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Normal,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.4,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

/// Document-level text defaults, seeded from the engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            line_height: 1.4,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Grid,
    Inline,
    InlineBlock,
    ListItem,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridTrack {
    Px(f32),
    Fr(f32),
    Auto,
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Parse a CSS colour: `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(...)`,
    /// `transparent`, or a basic colour keyword.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() < 3 {
                return None;
            }
            let channel = |s: &str| s.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0) / 255.0);
            let alpha = parts
                .get(3)
                .and_then(|a| a.parse::<f32>().ok())
                .unwrap_or(1.0);
            return Some(Self {
                r: channel(parts[0])?,
                g: channel(parts[1])?,
                b: channel(parts[2])?,
                a: alpha.clamp(0.0, 1.0),
            });
        }
        match lower.as_str() {
            "transparent" => Some(Self::TRANSPARENT),
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::rgb(255, 0, 0)),
            "green" => Some(Self::rgb(0, 128, 0)),
            "blue" => Some(Self::rgb(0, 0, 255)),
            "gray" | "grey" => Some(Self::rgb(128, 128, 128)),
            "silver" => Some(Self::rgb(192, 192, 192)),
            "navy" => Some(Self::rgb(0, 0, 128)),
            "maroon" => Some(Self::rgb(128, 0, 0)),
            "orange" => Some(Self::rgb(255, 165, 0)),
            "yellow" => Some(Self::rgb(255, 255, 0)),
            "purple" => Some(Self::rgb(128, 0, 128)),
            "teal" => Some(Self::rgb(0, 128, 128)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Style of the document root: the configured typography overridden by any
/// stylesheet rules targeting `html` or `body`.
pub fn root_style(typography: &Typography, sheet: &Stylesheet) -> ComputedStyle {
    let mut style = ComputedStyle {
        font_family: typography.font_family.clone(),
        font_size: typography.font_size,
        line_height: typography.line_height,
        ..ComputedStyle::default()
    };
    for tag in ["html", "body"] {
        for decl in sheet.declarations_for_tag(tag) {
            apply_css_property(&mut style, &decl.property, &decl.value);
        }
    }
    // Box properties of <body> belong to the page, not to its children.
    inherited_from(&style)
}

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(
    element: &ElementNode,
    parent: Option<&ComputedStyle>,
    sheet: &Stylesheet,
) -> ComputedStyle {
    let mut style = match parent {
        Some(p) => inherited_from(p),
        None => ComputedStyle::default(),
    };
    apply_tag_defaults(&mut style, &element.tag);

    for decl in sheet.declarations_for(element) {
        apply_css_property(&mut style, &decl.property, &decl.value);
    }

    for class in element.classes() {
        apply_tailwind_class(&mut style, class);
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    style
}

/// A fresh style carrying only the inheritable text properties of `parent`.
fn inherited_from(parent: &ComputedStyle) -> ComputedStyle {
    ComputedStyle {
        font_size: parent.font_size,
        font_weight: parent.font_weight,
        font_family: parent.font_family.clone(),
        color: parent.color,
        text_align: parent.text_align,
        line_height: parent.line_height,
        font_style: parent.font_style,
        ..ComputedStyle::default()
    }
}

/// Default styles based on tag semantics. Heading sizes scale with the
/// inherited font size.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    let base = s.font_size;
    match tag {
        Tag::H1 => {
            s.font_size = base * 2.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = base;
            s.margin_bottom = base * 0.75;
        }
        Tag::H2 => {
            s.font_size = base * 1.5;
            s.font_weight = FontWeight::Bold;
            s.margin_top = base * 0.875;
            s.margin_bottom = base * 0.625;
        }
        Tag::H3 => {
            s.font_size = base * 1.25;
            s.font_weight = FontWeight::Bold;
            s.margin_top = base * 0.75;
            s.margin_bottom = base * 0.5;
        }
        Tag::P => {
            s.margin_bottom = base * 0.625;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = base * 0.625;
            s.padding_left = 24.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 4.0;
        }
        Tag::Table => {
            s.display = Display::Grid;
            s.border_width = 1.0;
        }
        Tag::Tr => {
            s.display = Display::TableRow;
        }
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 4.0;
            s.padding_right = 8.0;
            s.padding_bottom = 4.0;
            s.padding_left = 8.0;
            s.border_width = 1.0;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
                s.background_color = Color::rgb(237, 237, 237);
            }
        }
        Tag::Span => {
            s.display = Display::Inline;
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
        }
        Tag::Div | Tag::Body | Tag::Html => {}
        Tag::Head | Tag::Style | Tag::Unknown(_) => {
            // Metadata and unrecognised elements are not rendered.
            s.display = Display::None;
        }
    }
}

/// Apply a single Tailwind utility class.
fn apply_tailwind_class(s: &mut ComputedStyle, class: &str) {
    match class {
        // Display
        "flex" => s.display = Display::Flex,
        "grid" => s.display = Display::Grid,
        "block" => s.display = Display::Block,
        "inline" => s.display = Display::Inline,
        "inline-block" => s.display = Display::InlineBlock,
        "hidden" => s.display = Display::None,

        // Flex
        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,
        "flex-wrap" => s.flex_wrap = FlexWrap::Wrap,
        "flex-nowrap" => s.flex_wrap = FlexWrap::NoWrap,
        "flex-grow" | "grow" => s.flex_grow = 1.0,
        "flex-shrink" | "shrink" => s.flex_shrink = 1.0,
        "flex-1" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
        }

        "justify-start" => s.justify_content = JustifyContent::Start,
        "justify-end" => s.justify_content = JustifyContent::End,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "justify-between" => s.justify_content = JustifyContent::SpaceBetween,
        "justify-around" => s.justify_content = JustifyContent::SpaceAround,
        "justify-evenly" => s.justify_content = JustifyContent::SpaceEvenly,

        "items-start" => s.align_items = AlignItems::Start,
        "items-end" => s.align_items = AlignItems::End,
        "items-center" => s.align_items = AlignItems::Center,
        "items-stretch" => s.align_items = AlignItems::Stretch,

        // Text
        "font-bold" => s.font_weight = FontWeight::Bold,
        "font-normal" => s.font_weight = FontWeight::Normal,
        "font-serif" => s.font_family = "Times".to_string(),
        "font-sans" => s.font_family = "Helvetica".to_string(),
        "font-mono" => s.font_family = "Courier".to_string(),
        "italic" => s.font_style = FontStyle::Italic,
        "not-italic" => s.font_style = FontStyle::Normal,
        "underline" => s.text_decoration = TextDecoration::Underline,
        "no-underline" => s.text_decoration = TextDecoration::None,
        "text-left" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,

        "text-xs" => s.font_size = 9.0,
        "text-sm" => s.font_size = 10.5,
        "text-base" => s.font_size = DEFAULT_FONT_SIZE,
        "text-lg" => s.font_size = 13.5,
        "text-xl" => s.font_size = 15.0,
        "text-2xl" => s.font_size = 18.0,
        "text-3xl" => s.font_size = 22.5,
        "text-4xl" => s.font_size = 27.0,

        // Width
        "w-full" => s.width = Dimension::Percent(100.0),
        "w-auto" => s.width = Dimension::Auto,
        "w-1/2" => s.width = Dimension::Percent(50.0),
        "w-1/3" => s.width = Dimension::Percent(33.333),
        "w-2/3" => s.width = Dimension::Percent(66.666),
        "w-1/4" => s.width = Dimension::Percent(25.0),
        "w-3/4" => s.width = Dimension::Percent(75.0),

        // Page break
        "break-before" => s.page_break_before = true,
        "break-after" => s.page_break_after = true,
        "break-inside-avoid" => s.page_break_inside_avoid = true,
        "page" | "page-break" => s.page_break_after = true,

        _ => {
            try_parse_spacing_class(s, class);
            try_parse_color_class(s, class);
            try_parse_prefixed_number(s, class);
        }
    }
}

fn try_parse_spacing_class(s: &mut ComputedStyle, class: &str) {
    // p-{n}, px-{n}, mt-{n}, ...  (1 unit = 4pt)
    let Some((prefix, value)) = class.rsplit_once('-') else {
        return;
    };
    let Ok(value) = value.parse::<f32>() else {
        return;
    };
    let value = value * 4.0;

    match prefix {
        "p" => set_box(&mut s.padding_top, &mut s.padding_right, &mut s.padding_bottom, &mut s.padding_left, [value; 4]),
        "px" => (s.padding_left, s.padding_right) = (value, value),
        "py" => (s.padding_top, s.padding_bottom) = (value, value),
        "pt" => s.padding_top = value,
        "pr" => s.padding_right = value,
        "pb" => s.padding_bottom = value,
        "pl" => s.padding_left = value,
        "m" => set_box(&mut s.margin_top, &mut s.margin_right, &mut s.margin_bottom, &mut s.margin_left, [value; 4]),
        "mx" => (s.margin_left, s.margin_right) = (value, value),
        "my" => (s.margin_top, s.margin_bottom) = (value, value),
        "mt" => s.margin_top = value,
        "mr" => s.margin_right = value,
        "mb" => s.margin_bottom = value,
        "ml" => s.margin_left = value,
        _ => {}
    }
}

/// Tailwind palette subset, by suffix.
const PALETTE: &[(&str, Color)] = &[
    ("red-500", Color::rgb(239, 68, 68)),
    ("red-700", Color::rgb(185, 28, 28)),
    ("blue-500", Color::rgb(59, 130, 246)),
    ("blue-700", Color::rgb(29, 78, 216)),
    ("green-500", Color::rgb(34, 197, 94)),
    ("green-700", Color::rgb(21, 128, 61)),
    ("yellow-500", Color::rgb(234, 179, 8)),
    ("gray-100", Color::rgb(243, 244, 246)),
    ("gray-200", Color::rgb(229, 231, 235)),
    ("gray-300", Color::rgb(209, 213, 219)),
    ("gray-500", Color::rgb(107, 114, 128)),
    ("gray-700", Color::rgb(55, 65, 81)),
    ("gray-900", Color::rgb(17, 24, 39)),
    ("white", Color::WHITE),
    ("black", Color::BLACK),
];

fn try_parse_color_class(s: &mut ComputedStyle, class: &str) {
    let (slot, name) = if let Some(name) = class.strip_prefix("text-") {
        (&mut s.color, name)
    } else if let Some(name) = class.strip_prefix("bg-") {
        (&mut s.background_color, name)
    } else if let Some(name) = class.strip_prefix("border-") {
        (&mut s.border_color, name)
    } else {
        return;
    };
    if let Some((_, color)) = PALETTE.iter().find(|(n, _)| *n == name) {
        *slot = *color;
    }
}

/// `gap-{n}`, `grid-cols-{n}`, `w-{n}`, `h-{n}`.
fn try_parse_prefixed_number(s: &mut ComputedStyle, class: &str) {
    if let Some(v) = class.strip_prefix("gap-").and_then(|r| r.parse::<f32>().ok()) {
        s.gap = v * 4.0;
    } else if let Some(n) = class.strip_prefix("grid-cols-").and_then(|r| r.parse::<usize>().ok()) {
        s.grid_template_columns = vec![GridTrack::Fr(1.0); n];
    } else if let Some(v) = class.strip_prefix("w-").and_then(|r| r.parse::<f32>().ok()) {
        s.width = Dimension::Px(v * 4.0);
    } else if let Some(v) = class.strip_prefix("h-").and_then(|r| r.parse::<f32>().ok()) {
        s.height = Dimension::Px(v * 4.0);
    }
}

// ---------------------------------------------------------------------------
// CSS declarations
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in parse_declarations(style_str) {
        apply_css_property(s, &decl.property, &decl.value);
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let em = s.font_size;
    let length = |v: &str| parse_length(v, em);
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "grid" => Display::Grid,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "font-size" => {
            if let Some(size) = parse_font_size(val, em) {
                s.font_size = size;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            if let Some(family) = val.split(',').map(|f| f.trim().trim_matches(['"', '\''])).find(|f| !f.is_empty()) {
                s.font_family = family.to_string();
            }
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "text-decoration" | "text-decoration-line" => {
            s.text_decoration = if val.split_whitespace().any(|v| v == "underline") {
                TextDecoration::Underline
            } else {
                TextDecoration::None
            }
        }
        "width" => s.width = parse_dimension(val, em),
        "height" => s.height = parse_dimension(val, em),
        "min-width" => s.min_width = parse_dimension(val, em),
        "max-width" => s.max_width = parse_dimension(val, em),
        "margin" => {
            if let Some(sides) = parse_box_shorthand(val, em) {
                set_box(&mut s.margin_top, &mut s.margin_right, &mut s.margin_bottom, &mut s.margin_left, sides);
            }
        }
        "padding" => {
            if let Some(sides) = parse_box_shorthand(val, em) {
                set_box(&mut s.padding_top, &mut s.padding_right, &mut s.padding_bottom, &mut s.padding_left, sides);
            }
        }
        "margin-top" | "margin-right" | "margin-bottom" | "margin-left" | "padding-top"
        | "padding-right" | "padding-bottom" | "padding-left" => {
            if let Some(v) = length(val) {
                let slot = match prop {
                    "margin-top" => &mut s.margin_top,
                    "margin-right" => &mut s.margin_right,
                    "margin-bottom" => &mut s.margin_bottom,
                    "margin-left" => &mut s.margin_left,
                    "padding-top" => &mut s.padding_top,
                    "padding-right" => &mut s.padding_right,
                    "padding-bottom" => &mut s.padding_bottom,
                    _ => &mut s.padding_left,
                };
                *slot = v;
            }
        }
        "border" => {
            for token in val.split_whitespace() {
                if token == "none" || token == "0" {
                    s.border_width = 0.0;
                } else if let Some(w) = length(token) {
                    s.border_width = w;
                } else if let Some(c) = Color::parse(token) {
                    s.border_color = c;
                }
            }
        }
        "border-width" => {
            if let Some(w) = length(val) {
                s.border_width = w;
            }
        }
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(v) = length(val) {
                s.line_height = v / s.font_size;
            }
        }
        "gap" => {
            if let Some(v) = length(val) {
                s.gap = v;
            }
        }
        "break-before" | "page-break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "break-after" | "page-break-after" => {
            s.page_break_after = val == "always" || val == "page";
        }
        "page-break-inside" | "break-inside" => {
            s.page_break_inside_avoid = val == "avoid";
        }
        _ => {}
    }
}

/// Parse a CSS length into points. `px` is treated as a point, as is a
/// unitless number; `em`/`rem` scale with `em`.
pub fn parse_length(value: &str, em: f32) -> Option<f32> {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f32 = number.trim().parse().ok()?;
    let scale = match unit.to_ascii_lowercase().as_str() {
        "" | "px" | "pt" => 1.0,
        "mm" => MM_TO_PT,
        "cm" => MM_TO_PT * 10.0,
        "in" => 72.0,
        "pc" => 12.0,
        "em" | "rem" => em,
        _ => return None,
    };
    Some(number * scale)
}

fn parse_font_size(value: &str, parent: f32) -> Option<f32> {
    let size = match value.trim() {
        "xx-small" => 7.0,
        "x-small" => 7.5,
        "small" => 10.0,
        "medium" => DEFAULT_FONT_SIZE,
        "large" => 14.0,
        "x-large" => 18.0,
        "xx-large" => 24.0,
        v if v.ends_with('%') => parent * v.trim_end_matches('%').parse::<f32>().ok()? / 100.0,
        v => parse_length(v, parent)?,
    };
    (size > 0.0).then_some(size)
}

fn parse_dimension(s: &str, em: f32) -> Dimension {
    let s = s.trim();
    if s == "auto" || s == "none" {
        Dimension::Auto
    } else if let Some(p) = s.strip_suffix('%') {
        p.trim()
            .parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s, em).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

/// 1–4 value box shorthand → [top, right, bottom, left].
fn parse_box_shorthand(val: &str, em: f32) -> Option<[f32; 4]> {
    let parts: Vec<f32> = val
        .split_whitespace()
        .map(|p| if p == "auto" { Some(0.0) } else { parse_length(p, em) })
        .collect::<Option<_>>()?;
    match parts[..] {
        [a] => Some([a; 4]),
        [v, h] => Some([v, h, v, h]),
        [t, h, b] => Some([t, h, b, h]),
        [t, r, b, l] => Some([t, r, b, l]),
        _ => None,
    }
}

fn set_box(top: &mut f32, right: &mut f32, bottom: &mut f32, left: &mut f32, sides: [f32; 4]) {
    [*top, *right, *bottom, *left] = sides;
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
    sheet: &Stylesheet,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                if matches!(e.tag, Tag::Style | Tag::Head) {
                    continue;
                }
                let style = resolve_style(e, parent_style, sheet);
                let children = build_styled_tree(&e.children, Some(&style), sheet);
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if !text.trim().is_empty() {
                    // Text nodes render inline: only text properties survive.
                    let style = match parent_style {
                        Some(p) => ComputedStyle {
                            text_decoration: p.text_decoration,
                            ..inherited_from(p)
                        },
                        None => ComputedStyle::default(),
                    };
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style,
                    });
                }
            }
        }
    }
    result
}
