//! HTML parser – converts an HTML string into a simple DOM tree.
//!
//! The engine understands a controlled subset of elements:
//! - Structural: div, p, h1-h3, ul, ol, li, table, tr, td, th, img
//! - Inline: span
//! - `<style>` blocks, kept as raw text for the stylesheet
//! - Styling via `class`, `id` and `style` attributes
//!
//! Void elements (`<br>`, `<meta>`, `<link>`, ...) never take children.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H1,
    H2,
    H3,
    Ul,
    Ol,
    Li,
    Table,
    Tr,
    Td,
    Th,
    Span,
    Img,
    Body,
    Html,
    Head,
    Style,
    /// Catch-all for unknown tags – they are kept but treated as divs.
    Unknown(String),
}

impl Tag {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" => Tag::Span,
            "img" => Tag::Img,
            "body" => Tag::Body,
            "html" => Tag::Html,
            "head" => Tag::Head,
            "style" => Tag::Style,
            _ => Tag::Unknown(s.to_ascii_lowercase()),
        }
    }

    /// Lower-case element name, as matched by CSS type selectors.
    pub fn name(&self) -> &str {
        match self {
            Tag::Div => "div",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Table => "table",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Span => "span",
            Tag::Img => "img",
            Tag::Body => "body",
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Style => "style",
            Tag::Unknown(name) => name,
        }
    }

    /// Elements that never have content or a closing tag.
    pub fn is_void(&self) -> bool {
        match self {
            Tag::Img => true,
            Tag::Unknown(name) => matches!(
                name.as_str(),
                "br" | "hr" | "meta" | "link" | "input" | "col" | "base" | "wbr" | "source"
            ),
            _ => false,
        }
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    let mut nodes = parser.parse_nodes();
    // Unbalanced closing tags at the top level are dropped.
    while parser.starts_with("</") {
        parser.skip_closing_tag();
        nodes.extend(parser.parse_nodes());
    }
    nodes
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace_preserve();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_comment();
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            // Skip doctype / processing instructions
            while !self.eof() && !self.starts_with(">") {
                self.advance(1);
            }
            if !self.eof() {
                self.advance(1); // skip '>'
            }
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        while !self.eof() && !self.starts_with("<") {
            self.advance(1);
        }
        let text = &self.input[start..self.pos];
        DomNode::Text(decode_entities(text))
    }

    fn parse_element(&mut self) -> DomNode {
        // Consume '<'
        self.advance(1);
        let tag_name = self.parse_tag_name();
        let tag = Tag::from_str(&tag_name);
        let mut elem = ElementNode::new(tag.clone());
        if tag_name.is_empty() {
            // A stray '<' in text: keep it as text.
            return DomNode::Text("<".to_string());
        }

        // Parse attributes
        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // A stray quote cannot start a name; drop it.
                self.advance(1);
            }
            if !key.is_empty() {
                elem.attributes.insert(key, value);
            }
        }

        if self.starts_with("/>") {
            self.advance(2);
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if tag.is_void() {
            return DomNode::Element(elem);
        }

        if tag == Tag::Style {
            // CSS may contain '>' and '<'; read raw up to the closing tag.
            let css = self.take_raw_until("</style");
            if !css.is_empty() {
                elem.children.push(DomNode::Text(css));
            }
        } else {
            elem.children = self.parse_nodes();
        }

        if self.starts_with("</") {
            self.skip_closing_tag();
        }

        DomNode::Element(elem)
    }

    fn skip_closing_tag(&mut self) {
        self.advance(2);
        self.parse_tag_name();
        self.skip_whitespace();
        if self.starts_with(">") {
            self.advance(1);
        }
    }

    fn parse_tag_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    /// Attribute names run up to whitespace, `=`, `>`, `/` or a quote, so
    /// `xml:lang`, `data.x` and `@click` are kept whole.
    fn parse_attribute_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || matches!(c, '=' | '>' | '/' | '"' | '\'') {
                break;
            }
            self.advance(1);
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_attribute_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        if self.starts_with("\"") {
            self.advance(1);
            let start = self.pos;
            while !self.eof() && !self.starts_with("\"") {
                self.advance(1);
            }
            let val = self.input[start..self.pos].to_string();
            if !self.eof() {
                self.advance(1);
            }
            decode_entities(&val)
        } else if self.starts_with("'") {
            self.advance(1);
            let start = self.pos;
            while !self.eof() && !self.starts_with("'") {
                self.advance(1);
            }
            let val = self.input[start..self.pos].to_string();
            if !self.eof() {
                self.advance(1);
            }
            decode_entities(&val)
        } else {
            let start = self.pos;
            while !self.eof() {
                let c = self.current_char();
                if c.is_whitespace() || c == '>' || c == '/' {
                    break;
                }
                self.advance(1);
            }
            self.input[start..self.pos].to_string()
        }
    }

    fn take_raw_until(&mut self, terminator: &str) -> String {
        let start = self.pos;
        let rest = &self.input[start..];
        let end = rest
            .to_ascii_lowercase()
            .find(terminator)
            .map(|i| start + i)
            .unwrap_or(self.input.len());
        self.pos = end;
        self.input[start..end].to_string()
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
    }

    fn skip_whitespace_preserve(&mut self) {
        // Skip runs of pure whitespace between elements.
        let saved = self.pos;
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
        // If we reached a tag or EOF, keep the skip. Otherwise revert.
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_comment(&mut self) {
        self.advance(4); // skip <!--
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(3);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Concatenate the text of every `<style>` element, in document order.
pub fn collect_style_blocks(nodes: &[DomNode]) -> String {
    let mut css = String::new();
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Style {
                for child in &e.children {
                    if let DomNode::Text(text) = child {
                        css.push_str(text);
                        css.push('\n');
                    }
                }
            } else {
                css.push_str(&collect_style_blocks(&e.children));
            }
        }
    }
    css
}

/// Find the `<body>` element and return its children, or return all nodes if
/// no `<body>` is present.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            // Recurse into <html>
            if e.tag == Tag::Html {
                let inner = body_children(&e.children);
                if !inner.is_empty() {
                    return inner;
                }
            }
        }
    }
    nodes.to_vec()
}
