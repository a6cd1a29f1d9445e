//! Stylesheet parsing and selector matching.
//!
//! Only compound selectors are understood: a type selector (or `*`)
//! optionally followed by `.class` and `#id` parts, e.g. `p`, `.lead`,
//! `td.total#sum`. Selectors with combinators, pseudo-classes or attribute
//! tests are dropped, as are at-rules (`@media`, `@font-face`, `@page`, ...).

use crate::dom::ElementNode;

/// A parsed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    selector: Selector,
    /// Position in source order, used to break specificity ties.
    order: usize,
    declarations: Vec<Declaration>,
}

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// A compound selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl Selector {
    /// Parse a single compound selector. Returns `None` for anything outside
    /// the supported subset.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty()
            || text
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '>' | '+' | '~' | ':' | '[' | ']' | '(' | ')'))
        {
            return None;
        }

        let mut selector = Selector::default();
        let mut rest = text;

        let tag_end = rest.find(|c: char| c == '.' || c == '#').unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        if !tag.is_empty() && tag != "*" {
            if !is_ident(tag) {
                return None;
            }
            selector.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while !rest.is_empty() {
            let marker = rest.as_bytes()[0];
            let body = &rest[1..];
            let end = body.find(|c: char| c == '.' || c == '#').unwrap_or(body.len());
            let name = &body[..end];
            if !is_ident(name) {
                return None;
            }
            match marker {
                b'.' => selector.classes.push(name.to_string()),
                b'#' => {
                    if selector.id.is_some() {
                        return None;
                    }
                    selector.id = Some(name.to_string());
                }
                _ => return None,
            }
            rest = &body[end..];
        }
        Some(selector)
    }

    /// (ids, classes, types), compared lexicographically.
    pub fn specificity(&self) -> (usize, usize, usize) {
        (
            usize::from(self.id.is_some()),
            self.classes.len(),
            usize::from(self.tag.is_some()),
        )
    }

    pub fn matches(&self, element: &ElementNode) -> bool {
        self.matches_parts(element.tag.name(), element.id(), &element.classes())
    }

    /// Match against bare element facts, for elements that are not part of the
    /// parsed tree (the document root).
    pub fn matches_parts(&self, tag: &str, id: Option<&str>, classes: &[&str]) -> bool {
        if let Some(t) = &self.tag {
            if t != tag {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if id != Some(want.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| classes.contains(&c.as_str()))
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
}

impl Stylesheet {
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let mut rules = Vec::new();
        let mut rest = css.as_str();

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            if rest.starts_with('@') {
                rest = skip_at_rule(rest);
                continue;
            }

            let Some(open) = rest.find('{') else {
                break;
            };
            let prelude = &rest[..open];
            let after = &rest[open + 1..];
            let close = after.find('}').unwrap_or(after.len());
            let block = &after[..close];
            rest = after.get(close + 1..).unwrap_or("");

            let declarations = parse_declarations(block);
            if declarations.is_empty() {
                continue;
            }
            for text in prelude.split(',') {
                match Selector::parse(text) {
                    Some(selector) => rules.push(Rule {
                        selector,
                        order: rules.len(),
                        declarations: declarations.clone(),
                    }),
                    None => log::debug!("ignoring unsupported selector {:?}", text.trim()),
                }
            }
        }

        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Declarations that apply to `element`, lowest precedence first.
    pub fn declarations_for(&self, element: &ElementNode) -> Vec<&Declaration> {
        self.collect(|selector| selector.matches(element))
    }

    /// Like [`Stylesheet::declarations_for`], for an element described by its
    /// tag name only.
    pub fn declarations_for_tag(&self, tag: &str) -> Vec<&Declaration> {
        self.collect(|selector| selector.matches_parts(tag, None, &[]))
    }

    fn collect(&self, pred: impl Fn(&Selector) -> bool) -> Vec<&Declaration> {
        let mut matched: Vec<&Rule> = self.rules.iter().filter(|r| pred(&r.selector)).collect();
        matched.sort_by_key(|r| (r.selector.specificity(), r.order));
        matched
            .into_iter()
            .flat_map(|r| r.declarations.iter())
            .collect()
    }
}

/// Parse `a: b; c: d` into declarations. `!important` is accepted and ignored.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    block
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration {
                property,
                value: value.to_string(),
            })
        })
        .collect()
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        rest = match rest[start + 2..].find("*/") {
            Some(end) => &rest[start + 2 + end + 2..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

/// Skip an at-rule: either `@x ...;` or `@x ... { ... }` with nested blocks.
fn skip_at_rule(input: &str) -> &str {
    let semi = input.find(';');
    let open = input.find('{');
    match (semi, open) {
        (Some(s), Some(o)) if s < o => &input[s + 1..],
        (Some(s), None) => &input[s + 1..],
        (_, Some(o)) => {
            let mut depth = 0usize;
            for (i, c) in input[o..].char_indices() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return &input[o + i + 1..];
                        }
                    }
                    _ => {}
                }
            }
            ""
        }
        (None, None) => "",
    }
}
