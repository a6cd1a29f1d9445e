//! Integration tests for the HTML → PDF pipeline.
//!
//! These tests validate:
//! - Layout config matches expected positions
//! - PDF output exists and has valid format
//! - All supported elements produce correct output
//! - Pagination, running headers and footers

use pdf_component::dom::{parse_html, DomNode, Tag};
use pdf_component::layout_config::{LayoutBox, LayoutConfig, PageGeometry};
use pdf_component::pipeline::{
    compute_layout_config, document_css, generate_pdf, generate_pdf_from_html, PipelineConfig,
};
use pdf_component::render::render_pdf;

// =====================================================================
// Helpers
// =====================================================================

const INVOICE: &str = r#"
<div class="flex justify-between mb-4">
  <div>
    <h1>Invoice #1042</h1>
    <p class="text-gray-600">Issued 2024-03-01</p>
  </div>
  <div class="text-right">
    <p class="font-bold">Acme Corp</p>
    <p>12 Market Street</p>
  </div>
</div>
<table class="w-full">
  <tr><th>Item</th><th>Qty</th><th>Price</th></tr>
  <tr><td>Widget</td><td>2</td><td>$20.00</td></tr>
  <tr><td>Gadget</td><td>1</td><td>$35.00</td></tr>
</table>
<p class="text-right font-bold mt-4">Total: $75.00</p>
"#;

const ALL_ELEMENTS: &str = r#"
<h1>Heading 1</h1>
<h2>Heading 2</h2>
<h3>Heading 3</h3>
<p>Paragraph with <span class="font-bold">bold</span>, <span class="italic">italic</span>
and <span class="underline">underlined</span> text.</p>
<ul><li>One</li><li>Two</li></ul>
<ol><li>First</li><li>Second</li></ol>
<div class="bg-gray-100 border p-4 rounded">Boxed content</div>
<table><tr><td>a</td><td>b</td></tr></table>
"#;

fn default_config() -> PipelineConfig {
    PipelineConfig::default()
}

fn layout(html: &str) -> LayoutConfig {
    compute_layout_config(html, "", &default_config()).unwrap()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn visit_box(lbox: &LayoutBox, f: &mut dyn FnMut(&LayoutBox)) {
    f(lbox);
    for child in &lbox.children {
        visit_box(child, f);
    }
}

fn page_texts(config: &LayoutConfig, page: usize) -> Vec<String> {
    let mut texts = Vec::new();
    for lbox in &config.pages[page].boxes {
        visit_box(lbox, &mut |b| {
            if let Some(text) = &b.text {
                texts.extend(text.lines.iter().map(|l| l.text.clone()));
            }
        });
    }
    texts
}

fn count_boxes(config: &LayoutConfig) -> usize {
    let mut count = 0;
    for page in &config.pages {
        for lbox in &page.boxes {
            visit_box(lbox, &mut |_| count += 1);
        }
    }
    count
}

// =====================================================================
// DOM parsing tests
// =====================================================================

#[test]
fn parse_heading_elements() {
    for (name, tag) in [("h1", Tag::H1), ("h2", Tag::H2), ("h3", Tag::H3)] {
        let dom = parse_html(&format!("<{0}>Title</{0}>", name));
        assert_eq!(dom.len(), 1);
        match &dom[0] {
            DomNode::Element(e) => assert_eq!(e.tag, tag),
            _ => panic!("Expected element for <{name}>"),
        }
    }
}

#[test]
fn parse_table_structure() {
    let html = r#"
        <table>
            <tr><th>Name</th><th>Value</th></tr>
            <tr><td>Alpha</td><td>100</td></tr>
            <tr><td>Beta</td><td>200</td></tr>
        </table>
    "#;
    let dom = parse_html(html);
    let table = dom
        .iter()
        .find(|n| matches!(n, DomNode::Element(e) if e.tag == Tag::Table));
    match table {
        Some(DomNode::Element(t)) => assert_eq!(t.children.len(), 3, "Table should have 3 rows"),
        _ => panic!("Should find a <table>"),
    }
}

#[test]
fn parse_image() {
    let dom = parse_html(r#"<img src="photo.jpg" style="width: 200px; height: 100px" />"#);
    assert_eq!(dom.len(), 1);
    match &dom[0] {
        DomNode::Element(img) => {
            assert_eq!(img.tag, Tag::Img);
            assert_eq!(img.src(), Some("photo.jpg"));
        }
        _ => panic!("Expected <img>"),
    }
}

// =====================================================================
// Layout config position tests
// =====================================================================

#[test]
fn layout_positions_are_within_page() {
    let config = layout(INVOICE);
    for page in &config.pages {
        for lbox in &page.boxes {
            assert!(
                lbox.x >= 0.0 && lbox.x < config.page_width_pt,
                "Box x={} outside page width={}",
                lbox.x,
                config.page_width_pt
            );
            assert!(
                lbox.y >= 0.0 && lbox.y < config.page_height_pt,
                "Box y={} outside page height={}",
                lbox.y,
                config.page_height_pt
            );
        }
    }
}

#[test]
fn layout_boxes_have_non_negative_dimensions() {
    let config = layout(ALL_ELEMENTS);
    for page in &config.pages {
        for lbox in &page.boxes {
            visit_box(lbox, &mut |b| {
                assert!(b.width >= 0.0, "Negative width: {}", b.width);
                assert!(b.height >= 0.0, "Negative height: {}", b.height);
            });
        }
    }
}

#[test]
fn layout_content_width_matches_page() {
    let cfg = default_config();
    let config = compute_layout_config(
        "<div class=\"w-full\"><p>Full width</p></div>",
        "",
        &cfg,
    )
    .unwrap();
    let content_width = cfg.geometry.content_width();
    for page in &config.pages {
        for lbox in &page.boxes {
            assert!(
                lbox.width <= content_width + 1.0,
                "Box width {} exceeds content width {}",
                lbox.width,
                content_width
            );
        }
    }
}

#[test]
fn custom_geometry_sets_page_size_and_left_margin() {
    let cfg = PipelineConfig {
        geometry: PageGeometry::from_mm(100.0, 150.0, [10.0, 10.0, 10.0, 20.0, 5.0, 5.0]),
        ..PipelineConfig::default()
    };
    let config = compute_layout_config("<p>Small page</p>", "", &cfg).unwrap();
    assert!((config.page_width_pt - cfg.geometry.width).abs() < 0.01);
    assert!((config.page_height_pt - cfg.geometry.height).abs() < 0.01);
    let first = &config.pages[0].boxes[0];
    assert!((first.x - cfg.geometry.margin_left).abs() < 0.5);
}

// =====================================================================
// Stylesheet handling
// =====================================================================

#[test]
fn stylesheet_argument_styles_body_html() {
    let config =
        compute_layout_config("<p class=\"big\">Styled</p>", ".big { font-size: 30px }", &default_config())
            .unwrap();
    let mut size = 0.0;
    visit_box(&config.pages[0].boxes[0], &mut |b| {
        if let Some(text) = &b.text {
            size = text.font_size;
        }
    });
    assert_eq!(size, 30.0);
}

#[test]
fn document_css_reads_style_blocks() {
    let html = "<html><head><style>p { color: red }</style></head><body><p>x</p></body></html>";
    assert!(document_css(html).contains("color: red"));
    assert!(!page_texts(&layout(html), 0).iter().any(|t| t.contains("color")));
}

// =====================================================================
// Pagination tests
// =====================================================================

#[test]
fn single_paragraph_fits_one_page() {
    assert_eq!(layout("<p>Short</p>").pages.len(), 1);
}

#[test]
fn many_paragraphs_create_multiple_pages() {
    let html: String = (0..80)
        .map(|i| {
            format!("<p>Paragraph {i} with enough text to take up some vertical space on the page.</p>")
        })
        .collect();
    let config = layout(&html);
    assert!(
        config.pages.len() > 1,
        "Expected multiple pages, got {}",
        config.pages.len()
    );
}

#[test]
fn long_paragraph_spans_pages() {
    let html = format!("<p>{}</p>", "lorem ipsum dolor sit amet ".repeat(3000));
    let config = layout(&html);
    assert!(config.pages.len() > 1, "got {} page(s)", config.pages.len());
    for page in &config.pages {
        for lbox in &page.boxes {
            assert!(
                lbox.y + lbox.height <= config.page_height_pt,
                "box at y={} height={} runs off page {}",
                lbox.y,
                lbox.height,
                page.page_index
            );
        }
    }
    assert!(page_texts(&config, config.pages.len() - 1)
        .iter()
        .any(|t| t.contains("lorem")));
}

#[test]
fn page_break_before() {
    let config = layout(r#"<p>Page 1 content</p><p class="break-before">Page 2 content</p>"#);
    assert!(config.pages.len() >= 2, "Expected at least 2 pages with break-before");
    assert!(page_texts(&config, 1).iter().any(|t| t.contains("Page 2")));
}

#[test]
fn footer_numbers_every_page() {
    let cfg = PipelineConfig {
        footer: Some("|{PAGENO} / {nbpg}|".into()),
        ..PipelineConfig::default()
    };
    let html = r#"<p>One</p><p class="break-before">Two</p>"#;
    let config = compute_layout_config(html, "", &cfg).unwrap();
    assert_eq!(config.pages.len(), 2);
    assert!(page_texts(&config, 0).contains(&"1 / 2".to_string()));
    assert!(page_texts(&config, 1).contains(&"2 / 2".to_string()));
}

#[test]
fn header_without_separator_is_drawn() {
    let cfg = PipelineConfig {
        header: Some("Quarterly report".into()),
        ..PipelineConfig::default()
    };
    let config = compute_layout_config("<p>Body</p>", "", &cfg).unwrap();
    assert!(page_texts(&config, 0).contains(&"Quarterly report".to_string()));
}

// =====================================================================
// PDF generation tests
// =====================================================================

#[test]
fn generate_pdf_from_invoice() {
    let (bytes, config) = generate_pdf(INVOICE, "", &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert!(!config.pages.is_empty());
}

#[test]
fn generate_pdf_from_all_elements() {
    let (bytes, config) = generate_pdf(ALL_ELEMENTS, "", &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert!(!config.pages.is_empty());
}

#[test]
fn generate_pdf_from_full_document() {
    let html = r#"<!DOCTYPE html>
<html>
<head><title>Doc</title><style>h1 { color: #1e40af } .note { font-style: italic }</style></head>
<body><h1>Title</h1><p class="note">Styled by its own style block.</p></body>
</html>"#;
    assert_valid_pdf(&generate_pdf_from_html(html).unwrap());
}

#[test]
fn render_from_computed_layout() {
    let config = layout(INVOICE);
    assert_valid_pdf(&render_pdf(&config, false).unwrap());
}

#[test]
fn metadata_is_carried_into_layout() {
    let mut cfg = default_config();
    cfg.metadata.title = "Invoice".into();
    cfg.metadata.keywords = vec!["billing".into(), "march".into()];
    let (bytes, config) = generate_pdf("<p>x</p>", "", &cfg).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(config.metadata.title, "Invoice");
    assert_eq!(config.metadata.keywords.len(), 2);
}

#[test]
fn pdf_output_size_is_stable() {
    let (bytes1, _) = generate_pdf(INVOICE, "", &default_config()).unwrap();
    let (bytes2, _) = generate_pdf(INVOICE, "", &default_config()).unwrap();

    // printpdf embeds timestamps, so byte-exact equality isn't guaranteed.
    let diff = (bytes1.len() as i64 - bytes2.len() as i64).unsigned_abs();
    assert!(
        diff < 200,
        "PDF outputs differ significantly: {} vs {} bytes",
        bytes1.len(),
        bytes2.len()
    );
}

// =====================================================================
// Element tests
// =====================================================================

#[test]
fn inline_spans_produce_text_content() {
    let config = layout(r#"<p>Hello <span class="font-bold">bold</span> world</p>"#);
    let texts = page_texts(&config, 0).join(" ");
    assert!(texts.contains("Hello"), "Got {texts:?}");
    assert!(texts.contains("world"), "Got {texts:?}");
}

#[test]
fn table_produces_grid_layout() {
    let html = r#"
        <table class="w-full">
            <tr><th>A</th><th>B</th></tr>
            <tr><td>1</td><td>2</td></tr>
        </table>
    "#;
    let config = layout(html);
    let total = count_boxes(&config);
    assert!(total >= 4, "Table should produce at least 4 boxes, got {total}");
}

#[test]
fn image_produces_image_content() {
    let config = layout(r#"<img src="test.png" style="width: 100px; height: 50px" />"#);
    let mut found_image = false;
    for page in &config.pages {
        for lbox in &page.boxes {
            visit_box(lbox, &mut |b| {
                if let Some(img) = &b.image {
                    assert_eq!(img.src, "test.png");
                    found_image = true;
                }
            });
        }
    }
    assert!(found_image, "Should find image content");
}

#[test]
fn missing_image_fails_only_when_strict() {
    let html = r#"<img src="/no/such/image.png" style="width: 10px; height: 10px" />"#;
    let lax = default_config();
    assert!(generate_pdf(html, "", &lax).is_ok());

    let strict = PipelineConfig {
        strict_images: true,
        ..PipelineConfig::default()
    };
    assert!(generate_pdf(html, "", &strict).is_err());
}

#[test]
fn ordered_list_layout() {
    let config = layout("<ol><li>First</li><li>Second</li><li>Third</li></ol>");
    let mut markers = Vec::new();
    for lbox in &config.pages[0].boxes {
        visit_box(lbox, &mut |b| {
            if let Some(marker) = b.text.as_ref().and_then(|t| t.list_marker.clone()) {
                markers.push(marker);
            }
        });
    }
    assert_eq!(markers.len(), 3, "Got markers {markers:?}");
    assert!(markers[0].starts_with('1'));
    assert!(markers[2].starts_with('3'));
}
